use std::{
  io::{
    self,
    Write,
  },
  process,
};

use yansi::Paint as _;

/// Lowercases the first character of a message unless it starts an acronym.
fn sentence_case(message: &str) -> String {
  let mut chars = message.chars();

  match (chars.next(), chars.next()) {
    (Some(first), Some(second)) if second.is_lowercase() => {
      first.to_lowercase().chain(message[first.len_utf8()..].chars()).collect()
    },

    _ => message.to_owned(),
  }
}

/// Prints the innermost cause first and the top-level error last.
fn report(error: &anyhow::Error, err: &mut impl Write) -> io::Result<()> {
  let mut chain = error.chain().rev().peekable();

  while let Some(cause) = chain.next() {
    let header = if chain.peek().is_none() {
      "error:"
    } else {
      "cause:"
    };

    writeln!(
      err,
      "{header} {message}",
      header = header.red().bold(),
      message = sentence_case(&cause.to_string()),
    )?;
  }

  Ok(())
}

fn main() {
  let Err(error) = powertuner::main() else {
    return;
  };

  let _ = report(&error, &mut io::stderr().lock());

  process::exit(1);
}
