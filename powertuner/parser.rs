use std::{
  error::Error,
  fmt,
  str::FromStr,
};

use crate::arguments::{
  ArgumentMap,
  Command,
};

/// One `key=value` token, split up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
  Scalar {
    name:  &'a str,
    value: &'a str,
  },
  Indexed {
    name:  &'a str,
    /// Verbatim bracket body. Empty means wildcard.
    index: &'a str,
    value: &'a str,
  },
}

/// Parses `name=value`, `name[]=value` and `name[index]=value`.
///
/// Returns `None` for anything that doesn't split into exactly one non-empty
/// name and one non-empty value.
pub fn parse_token(token: &str) -> Option<Token<'_>> {
  let mut parts = token.split('=').filter(|part| !part.is_empty());

  let (Some(key), Some(value), None) =
    (parts.next(), parts.next(), parts.next())
  else {
    return None;
  };

  let Some(head) = key.strip_suffix(']') else {
    return Some(Token::Scalar { name: key, value });
  };

  let (name, index) = head.split_once('[')?;

  if name.is_empty() || index.contains(['[', ']']) {
    return None;
  }

  Some(Token::Indexed { name, index, value })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStreamError {
  Empty,
  MissingArgument {
    flag:     &'static str,
    expected: &'static [&'static str],
  },
}

impl fmt::Display for TokenStreamError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Empty => write!(f, "no settings given"),

      Self::MissingArgument { flag, expected } => {
        write!(
          f,
          "'{flag}' expects {count} argument(s): {names}",
          count = expected.len(),
          names = expected.join(" "),
        )
      },
    }
  }
}

impl Error for TokenStreamError {}

/// A flag-like sub-command that may appear between settings tokens, with the
/// names of the positionals it consumes.
struct Flag {
  token:       &'static str,
  command:     Command,
  positionals: &'static [&'static str],
}

const FLAGS: &[Flag] = &[
  Flag {
    token:       "make-profile",
    command:     Command::MakeProfile,
    positionals: &["name"],
  },
  Flag {
    token:       "ps-reset-defaults",
    command:     Command::WinResetDefaults,
    positionals: &[],
  },
  Flag {
    token:       "ps-replace-defaults",
    command:     Command::WinReplaceDefaults,
    positionals: &[],
  },
  Flag {
    token:       "ps-active-scheme",
    command:     Command::WinActiveScheme,
    positionals: &["guid"],
  },
  Flag {
    token:       "ps-delete-schemes",
    command:     Command::WinDeleteSchemes,
    positionals: &["guids"],
  },
  Flag {
    token:       "ps-reset-schemes",
    command:     Command::WinResetSchemes,
    positionals: &["guids"],
  },
  Flag {
    token:       "ps-copy-settings",
    command:     Command::WinCopySchemeSettings,
    positionals: &["from_scheme", "from_mode", "to_scheme", "to_mode"],
  },
  Flag {
    token:       "ps-duplicate-scheme",
    command:     Command::WinDuplicateScheme,
    positionals: &["base_scheme", "name", "tmp_handle"],
  },
];

/// Positionals holding comma separated lists.
const LIST_POSITIONALS: &[&str] = &["guids"];

/// Builds the argument map for a `device-settings` token stream.
///
/// Malformed `key=value` tokens are logged and skipped. A flag missing one of
/// its positionals fails the whole stream.
pub fn parse_device_settings<S: AsRef<str>>(
  tokens: &[S],
) -> Result<ArgumentMap, TokenStreamError> {
  if tokens.is_empty() {
    return Err(TokenStreamError::Empty);
  }

  let mut map = ArgumentMap::new();
  let mut tokens = tokens.iter().map(AsRef::as_ref);

  while let Some(token) = tokens.next() {
    if let Some(flag) = FLAGS.iter().find(|flag| flag.token == token) {
      map.mark(flag.command);

      for &positional in flag.positionals {
        let Some(value) = tokens.next() else {
          return Err(TokenStreamError::MissingArgument {
            flag:     flag.token,
            expected: flag.positionals,
          });
        };

        if LIST_POSITIONALS.contains(&positional) {
          let values = value
            .split(',')
            .filter(|value| !value.is_empty())
            .map(str::to_owned)
            .collect();

          map.insert_list(flag.command, positional, values);
        } else {
          map.insert_scalar(flag.command, positional, value);
        }
      }

      continue;
    }

    match parse_token(token) {
      Some(Token::Scalar { name, value }) => {
        map.insert_scalar(Command::DeviceSettings, name, value);
      },

      Some(Token::Indexed { name, index, value }) => {
        map.insert_indexed(Command::DeviceSettings, name, index, value);
      },

      None => log::warn!("skipping malformed setting '{token}'"),
    }
  }

  Ok(map)
}

/// Which daemon a command talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DaemonTarget {
  /// Looked up in the persisted daemon list.
  Name(String),
  Address { address: String, port: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonTargetError {
  pub target: String,
}

impl fmt::Display for DaemonTargetError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "daemon address/port is not valid: '{target}', expected 'address;port'",
      target = self.target,
    )
  }
}

impl Error for DaemonTargetError {}

impl FromStr for DaemonTarget {
  type Err = DaemonTargetError;

  fn from_str(target: &str) -> Result<Self, Self::Err> {
    if !target.contains(';') {
      return Ok(Self::Name(target.to_owned()));
    }

    let error = || {
      DaemonTargetError {
        target: target.to_owned(),
      }
    };

    let mut parts = target.split(';').filter(|part| !part.is_empty());

    let (Some(address), Some(port), None) =
      (parts.next(), parts.next(), parts.next())
    else {
      return Err(error());
    };

    let port = port.parse().map_err(|_| error())?;

    Ok(Self::Address {
      address: address.to_owned(),
      port,
    })
  }
}

impl fmt::Display for DaemonTarget {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Name(name) => write!(f, "{name}"),
      Self::Address { address, port } => write!(f, "{address}:{port}"),
    }
  }
}
