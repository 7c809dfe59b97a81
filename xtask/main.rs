use std::io;

use clap::{
  CommandFactory,
  Parser as _,
};

#[derive(clap::Parser)]
struct Cli {
  #[clap(subcommand)]
  command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
  /// Generate completions for the powertuner binary.
  GenerateCompletions {
    #[arg(long)]
    shell: Shell,
  },
}

#[expect(clippy::enum_variant_names)]
#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum Shell {
  Bash,
  Elvish,
  Fish,
  PowerShell,
  Zsh,
  Nushell,
}

impl Shell {
  fn generator(self) -> &'static dyn clap_complete::Generator {
    match self {
      Self::Bash => &clap_complete::Shell::Bash,
      Self::Elvish => &clap_complete::Shell::Elvish,
      Self::Fish => &clap_complete::Shell::Fish,
      Self::PowerShell => &clap_complete::Shell::PowerShell,
      Self::Zsh => &clap_complete::Shell::Zsh,
      Self::Nushell => &clap_complete_nushell::Nushell,
    }
  }
}

fn main() {
  let cli = Cli::parse();

  match cli.command {
    Command::GenerateCompletions { shell } => {
      let mut command = powertuner::Cli::command();
      command.set_bin_name("powertuner");
      command.build();

      shell.generator().generate(&command, &mut io::stdout());
    },
  }
}
