use std::path::{
  Path,
  PathBuf,
};

use anyhow::{
  Context as _,
  bail,
};
use clap::{
  CommandFactory as _,
  Parser as _,
  error::ErrorKind,
};
use yansi::Paint as _;

pub mod arguments;
pub mod feature;
pub mod field;
pub mod parser;

pub mod bind;
pub mod packet;
pub mod ranges;

pub mod client;
pub mod fs;
pub mod settings;

use crate::{
  bind::LogDiagnostics,
  client::{
    Snapshot,
    SnapshotTransport,
    Transport,
  },
  parser::DaemonTarget,
  ranges::RangeTable,
  settings::{
    ClientSettings,
    Daemon,
  },
};

#[derive(clap::Parser, Debug)]
#[command(version, about)]
pub struct Cli {
  #[command(flatten)]
  verbosity: clap_verbosity_flag::Verbosity<clap_verbosity_flag::InfoLevel>,

  /// The client settings path.
  #[arg(long, global = true, env = "POWERTUNER_SETTINGS")]
  settings: Option<PathBuf>,

  /// A range table overriding the builtin clamp bounds.
  #[arg(long, global = true, env = "POWERTUNER_RANGES")]
  ranges: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
  /// Print client state.
  #[command(subcommand)]
  Get(GetCommand),

  /// Change client state or device settings.
  #[command(subcommand)]
  Set(SetCommand),
}

#[derive(clap::Subcommand, Debug)]
enum GetCommand {
  /// List the known daemons.
  Daemons,

  /// Print the client data directory.
  DataPath,

  /// Print a daemon's device identity and capabilities.
  DeviceInfo {
    /// Snapshot of the device. Defaults to the daemon's snapshot in the data
    /// directory.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// A daemon name, or ADDRESS;PORT.
    daemon: DaemonTarget,
  },

  /// List the stored profiles.
  Profiles,

  /// Copy stored profiles into a directory. Exports all when none are given.
  ExportProfiles {
    path: PathBuf,

    #[arg(value_name = "PROFILE")]
    profiles: Vec<String>,
  },
}

#[derive(clap::Subcommand, Debug)]
enum SetCommand {
  /// Restore the default daemon list.
  ResetSettings,

  /// Add or replace daemons, given as NAME ADDRESS PORT triples.
  AddDaemons {
    #[arg(required = true, value_names = ["NAME", "ADDRESS", "PORT"])]
    daemons: Vec<String>,
  },

  /// Remove every daemon matching a name or address.
  RemoveDaemons {
    #[arg(required = true, value_name = "NAME|ADDRESS")]
    daemons: Vec<String>,
  },

  /// Bind settings tokens against a daemon's device and hand them over.
  DeviceSettings {
    /// Snapshot of the device to bind against. Defaults to the daemon's
    /// snapshot in the data directory.
    #[arg(long)]
    snapshot: Option<PathBuf>,

    /// Where to write the bound packet. Defaults to stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// A daemon name, or ADDRESS;PORT.
    daemon: DaemonTarget,

    /// `key=value`, `key[index]=value` and flag tokens.
    #[arg(
      required = true,
      trailing_var_arg = true,
      allow_hyphen_values = true
    )]
    tokens: Vec<String>,
  },

  /// Delete a stored profile.
  DeleteProfile { profile: String },

  /// Hand a stored profile to a daemon.
  ApplyProfile {
    /// Where to write the packet. Defaults to stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// A daemon name, or ADDRESS;PORT.
    daemon: DaemonTarget,

    profile: String,
  },

  /// Copy profile files into the store, named after their file stem.
  ImportProfiles {
    #[arg(required = true, value_name = "FILE")]
    files: Vec<PathBuf>,
  },
}

fn structural_error(kind: ErrorKind, message: impl std::fmt::Display) -> ! {
  Cli::command().error(kind, message).exit()
}

fn parse_daemons(values: &[String]) -> Vec<Daemon> {
  if values.len() % 3 != 0 {
    structural_error(
      ErrorKind::WrongNumberOfValues,
      format!(
        "expected NAME ADDRESS PORT triples, got {count} values",
        count = values.len(),
      ),
    );
  }

  values
    .chunks_exact(3)
    .map(|triple| {
      let [name, address, port] = triple else {
        unreachable!("chunks_exact yields triples");
      };

      match port.parse::<u16>() {
        Ok(port) if port != 0 && !address.is_empty() => {
          Daemon {
            name:    name.clone(),
            address: address.clone(),
            port,
          }
        },

        _ => {
          structural_error(
            ErrorKind::ValueValidation,
            format!(
              "daemon address/port is not valid: '{address}' '{port}' for \
               '{name}'"
            ),
          )
        },
      }
    })
    .collect()
}

fn load_settings(path: &Path) -> anyhow::Result<ClientSettings> {
  ClientSettings::load_from(path).context("failed to load client settings")
}

/// The snapshot to read for `daemon`, `<data dir>/snapshots/<name>.json`
/// unless given.
fn snapshot_path(
  snapshot: Option<PathBuf>,
  daemon: &Daemon,
) -> anyhow::Result<PathBuf> {
  match snapshot {
    Some(path) => Ok(path),
    None => {
      Ok(
        settings::data_dir()?
          .join("snapshots")
          .join(format!("{name}.json", name = daemon.name)),
      )
    },
  }
}

fn reach(
  transport: &mut impl Transport,
  daemon: &Daemon,
) -> anyhow::Result<Snapshot> {
  transport
    .snapshot(daemon)
    .with_context(|| format!("failed to reach daemon '{}'", daemon.name))
}

pub fn main() -> anyhow::Result<()> {
  let cli = Cli::parse();

  yansi::whenever(yansi::Condition::TTY_AND_COLOR);

  env_logger::Builder::new()
    .filter_level(cli.verbosity.log_level_filter())
    .format_timestamp(None)
    .format_module_path(false)
    .init();

  let settings_path = match cli.settings {
    Some(path) => path,
    None => ClientSettings::default_path()?,
  };

  match cli.command {
    Command::Get(GetCommand::Daemons) => {
      let settings = load_settings(&settings_path)?;

      for daemon in &settings.daemons {
        println!(
          "{name} {address};{port}",
          name = daemon.name.cyan(),
          address = daemon.address,
          port = daemon.port,
        );
      }
    },

    Command::Get(GetCommand::DataPath) => {
      println!("{}", settings::data_dir()?.display());
    },

    Command::Get(GetCommand::DeviceInfo { snapshot, daemon }) => {
      let daemon = load_settings(&settings_path)?.resolve(&daemon)?;

      let mut transport =
        SnapshotTransport::new(snapshot_path(snapshot, &daemon)?, None);
      let Snapshot { device, .. } = reach(&mut transport, &daemon)?;

      let json = serde_json::to_string_pretty(&device)
        .context("failed to serialize device info")?;

      println!("{json}");
    },

    Command::Get(GetCommand::Profiles) => {
      for name in client::list_profiles(&settings::data_dir()?)? {
        println!("{}", name.cyan());
      }
    },

    Command::Get(GetCommand::ExportProfiles { path, profiles }) => {
      let exported =
        client::export_profiles(&settings::data_dir()?, &profiles, &path)?;

      for path in exported {
        log::info!("exported profile to '{path}'", path = path.display());
      }
    },

    Command::Set(SetCommand::ResetSettings) => {
      ClientSettings::default()
        .save_to(&settings_path)
        .context("failed to reset client settings")?;

      log::info!("restored default daemon list");
    },

    Command::Set(SetCommand::AddDaemons { daemons }) => {
      let daemons = parse_daemons(&daemons);

      let mut settings = load_settings(&settings_path)?;

      for daemon in daemons {
        log::info!("adding daemon '{name}'", name = daemon.name);
        settings.add(daemon);
      }

      settings
        .save_to(&settings_path)
        .context("failed to save client settings")?;
    },

    Command::Set(SetCommand::RemoveDaemons { daemons }) => {
      let mut settings = load_settings(&settings_path)?;

      for key in &daemons {
        if settings.remove(key) == 0 {
          log::warn!("no daemon named or at '{key}'");
        }
      }

      settings
        .save_to(&settings_path)
        .context("failed to save client settings")?;
    },

    Command::Set(SetCommand::DeviceSettings {
      snapshot,
      output,
      daemon,
      tokens,
    }) => {
      let arguments =
        parser::parse_device_settings(&tokens).unwrap_or_else(|error| {
          structural_error(ErrorKind::InvalidValue, error)
        });

      let daemon = load_settings(&settings_path)?.resolve(&daemon)?;

      let ranges = RangeTable::load_from(cli.ranges.as_deref())
        .context("failed to load range table")?;

      let mut transport =
        SnapshotTransport::new(snapshot_path(snapshot, &daemon)?, output);
      let Snapshot { device, packet } = reach(&mut transport, &daemon)?;

      if (packet.os, packet.vendor) != (device.os, device.vendor) {
        log::warn!(
          "settings packet of daemon '{name}' does not match its device",
          name = daemon.name,
        );
      }

      let packet = bind::bind_packet(
        packet,
        &device,
        &arguments,
        &ranges,
        &LogDiagnostics,
      );

      if arguments.is_set(arguments::Command::MakeProfile) {
        let name = arguments
          .scalar(arguments::Command::MakeProfile, "name")
          .unwrap_or_default();

        let path =
          client::save_profile(&settings::data_dir()?, name, &packet)?;

        log::info!(
          "saved profile '{name}' to '{path}'",
          path = path.display(),
        );
      }

      Transport::apply(&mut transport, &daemon, &packet)?;
    },

    Command::Set(SetCommand::DeleteProfile { profile }) => {
      client::delete_profile(&settings::data_dir()?, &profile)
        .with_context(|| format!("failed to delete profile '{profile}'"))?;

      log::info!("deleted profile '{profile}'");
    },

    Command::Set(SetCommand::ApplyProfile {
      output,
      daemon,
      profile,
    }) => {
      let daemon = load_settings(&settings_path)?.resolve(&daemon)?;
      let packet = client::load_profile(&settings::data_dir()?, &profile)?;

      // Profiles are applied as stored, nothing to bind.
      let mut transport =
        SnapshotTransport::new(snapshot_path(None, &daemon)?, output);
      Transport::apply(&mut transport, &daemon, &packet)?;

      log::info!(
        "applied profile '{profile}' to daemon '{name}'",
        name = daemon.name,
      );
    },

    Command::Set(SetCommand::ImportProfiles { files }) => {
      let imported = client::import_profiles(&settings::data_dir()?, &files)?;

      for name in &imported {
        log::info!("imported profile '{name}'");
      }

      if imported.len() != files.len() {
        bail!("failed to import some profiles");
      }
    },
  }

  Ok(())
}
