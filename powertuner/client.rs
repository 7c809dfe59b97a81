use std::{
  io::{
    self,
    Write as _,
  },
  path::{
    Path,
    PathBuf,
  },
};

use anyhow::{
  Context,
  bail,
};
use serde::{
  Deserialize,
  Serialize,
};

use crate::{
  fs,
  packet::{
    DeviceInfo,
    SettingsPacket,
  },
  settings::Daemon,
};

/// What a daemon reports before binding.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
  pub device: DeviceInfo,
  pub packet: SettingsPacket,
}

/// How the client talks to a daemon.
pub trait Transport {
  /// Device identity, capabilities and current settings.
  fn snapshot(&mut self, daemon: &Daemon) -> anyhow::Result<Snapshot>;

  /// Hands a bound packet over for application.
  fn apply(
    &mut self,
    daemon: &Daemon,
    packet: &SettingsPacket,
  ) -> anyhow::Result<()>;
}

/// A [`Transport`] over JSON files. Reads a captured snapshot and writes the
/// bound packet to a file or stdout.
#[derive(Debug, Clone)]
pub struct SnapshotTransport {
  snapshot: PathBuf,
  output:   Option<PathBuf>,
}

impl SnapshotTransport {
  pub fn new(snapshot: PathBuf, output: Option<PathBuf>) -> Self {
    Self { snapshot, output }
  }
}

impl Transport for SnapshotTransport {
  fn snapshot(&mut self, daemon: &Daemon) -> anyhow::Result<Snapshot> {
    let path = &self.snapshot;

    log::debug!(
      "loading snapshot of daemon '{name}' from '{path}'",
      name = daemon.name,
      path = path.display(),
    );

    let Some(contents) = fs::read(path)? else {
      bail!(
        "no snapshot of daemon '{name}' at '{path}'",
        name = daemon.name,
        path = path.display(),
      );
    };

    serde_json::from_str(&contents).with_context(|| {
      format!("failed to parse snapshot at '{path}'", path = path.display())
    })
  }

  fn apply(
    &mut self,
    daemon: &Daemon,
    packet: &SettingsPacket,
  ) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(packet)
      .context("failed to serialize settings packet")?;

    match &self.output {
      Some(path) => {
        log::info!(
          "writing settings for daemon '{name}' ({address}:{port}) to '{path}'",
          name = daemon.name,
          address = daemon.address,
          port = daemon.port,
          path = path.display(),
        );

        fs::write(path, &json)
      },

      None => {
        let mut stdout = io::stdout().lock();

        writeln!(stdout, "{json}").context("failed to write settings to stdout")
      },
    }
  }
}

fn profiles_dir(data_dir: &Path) -> PathBuf {
  data_dir.join("profiles")
}

/// Where profile `name` lives. Rejects names that would leave the store.
pub fn profile_path(data_dir: &Path, name: &str) -> anyhow::Result<PathBuf> {
  if name.is_empty()
    || name.contains(['/', '\\'])
    || name == "."
    || name == ".."
  {
    bail!("invalid profile name '{name}'");
  }

  Ok(profiles_dir(data_dir).join(format!("{name}.json")))
}

/// Stores `packet` as `<data dir>/profiles/<name>.json`.
pub fn save_profile(
  data_dir: &Path,
  name: &str,
  packet: &SettingsPacket,
) -> anyhow::Result<PathBuf> {
  let path = profile_path(data_dir, name)?;

  let json = serde_json::to_string_pretty(packet)
    .context("failed to serialize settings packet")?;

  fs::write(&path, &json)
    .with_context(|| format!("failed to save profile '{name}'"))?;

  Ok(path)
}

pub fn load_profile(
  data_dir: &Path,
  name: &str,
) -> anyhow::Result<SettingsPacket> {
  let path = profile_path(data_dir, name)?;

  let Some(contents) = fs::read(&path)? else {
    bail!("no profile named '{name}'");
  };

  serde_json::from_str(&contents)
    .with_context(|| format!("failed to parse profile '{name}'"))
}

/// Names of the stored profiles, sorted.
pub fn list_profiles(data_dir: &Path) -> anyhow::Result<Vec<String>> {
  let names = fs::files(profiles_dir(data_dir))?
    .into_iter()
    .filter(|path| {
      path
        .extension()
        .is_some_and(|extension| extension == "json")
    })
    .filter_map(|path| {
      path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .map(str::to_owned)
    })
    .collect();

  Ok(names)
}

pub fn delete_profile(data_dir: &Path, name: &str) -> anyhow::Result<()> {
  if !fs::remove(profile_path(data_dir, name)?)? {
    bail!("no profile named '{name}'");
  }

  Ok(())
}

/// Copies profile files into the store, named after their file stem. Files
/// that aren't settings packets are skipped. Returns the imported names.
pub fn import_profiles(
  data_dir: &Path,
  files: &[PathBuf],
) -> anyhow::Result<Vec<String>> {
  let mut imported = Vec::new();

  for file in files {
    let Some(name) = file.file_stem().and_then(|stem| stem.to_str()) else {
      log::warn!("cannot import profile '{file}', skip", file = file.display());
      continue;
    };

    let packet = fs::read(file)?.and_then(|contents| {
      serde_json::from_str::<SettingsPacket>(&contents).ok()
    });

    let Some(packet) = packet else {
      log::warn!("cannot import profile '{file}', skip", file = file.display());
      continue;
    };

    save_profile(data_dir, name, &packet)?;
    imported.push(name.to_owned());
  }

  Ok(imported)
}

/// Copies stored profiles into `destination`. An empty `names` exports every
/// profile. Returns the written paths.
pub fn export_profiles(
  data_dir: &Path,
  names: &[String],
  destination: &Path,
) -> anyhow::Result<Vec<PathBuf>> {
  let names = if names.is_empty() {
    list_profiles(data_dir)?
  } else {
    names.to_vec()
  };

  let mut exported = Vec::with_capacity(names.len());

  for name in &names {
    let Some(contents) = fs::read(profile_path(data_dir, name)?)? else {
      bail!("no profile named '{name}'");
    };

    let path = destination.join(format!("{name}.json"));

    fs::write(&path, &contents)
      .with_context(|| format!("failed to export profile '{name}'"))?;

    exported.push(path);
  }

  Ok(exported)
}

#[cfg(test)]
mod tests {
  use std::env;

  use super::*;
  use crate::packet::{
    Os,
    Vendor,
  };

  fn scratch(name: &str) -> PathBuf {
    env::temp_dir().join(format!(
      "powertuner-client-{name}-{pid}",
      pid = std::process::id()
    ))
  }

  #[test]
  fn snapshot_round_trips_through_files() {
    let directory = scratch("transport");
    let input = directory.join("snapshot.json");
    let output = directory.join("bound.json");

    let snapshot = Snapshot {
      device: serde_json::from_str(r#"{ "os": "linux", "vendor": "amd" }"#)
        .unwrap(),
      packet: SettingsPacket::new(Os::Linux, Vendor::Amd),
    };
    fs::write(&input, &serde_json::to_string(&snapshot).unwrap()).unwrap();

    let mut transport = SnapshotTransport::new(input, Some(output.clone()));
    let daemon = Daemon::local();

    let loaded = transport.snapshot(&daemon).unwrap();
    assert_eq!(loaded, snapshot);

    transport.apply(&daemon, &loaded.packet).unwrap();
    let written: SettingsPacket =
      serde_json::from_str(&fs::read(&output).unwrap().unwrap()).unwrap();
    assert_eq!(written, loaded.packet);

    std::fs::remove_dir_all(directory).unwrap();
  }

  #[test]
  fn missing_snapshot_is_an_error() {
    let mut transport =
      SnapshotTransport::new(scratch("missing").join("nothing.json"), None);

    assert!(transport.snapshot(&Daemon::local()).is_err());
  }

  #[test]
  fn profile_names_are_checked() {
    let directory = scratch("profiles");
    let packet = SettingsPacket::new(Os::Windows, Vendor::Intel);

    let path = save_profile(&directory, "quiet", &packet).unwrap();
    assert_eq!(path, directory.join("profiles").join("quiet.json"));

    assert!(save_profile(&directory, "../escape", &packet).is_err());
    assert!(save_profile(&directory, "", &packet).is_err());

    std::fs::remove_dir_all(directory).unwrap();
  }

  #[test]
  fn profiles_are_listed_loaded_and_deleted() {
    let directory = scratch("store");
    let quiet = SettingsPacket::new(Os::Linux, Vendor::Amd);
    let loud = SettingsPacket::new(Os::Linux, Vendor::Intel);

    assert!(list_profiles(&directory).unwrap().is_empty());

    save_profile(&directory, "quiet", &quiet).unwrap();
    save_profile(&directory, "loud", &loud).unwrap();
    fs::write(directory.join("profiles").join("notes.txt"), "").unwrap();

    assert_eq!(list_profiles(&directory).unwrap(), ["loud", "quiet"]);
    assert_eq!(load_profile(&directory, "quiet").unwrap(), quiet);

    delete_profile(&directory, "quiet").unwrap();
    assert_eq!(list_profiles(&directory).unwrap(), ["loud"]);

    assert!(delete_profile(&directory, "quiet").is_err());
    assert!(load_profile(&directory, "quiet").is_err());
    assert!(delete_profile(&directory, "..").is_err());

    std::fs::remove_dir_all(directory).unwrap();
  }

  #[test]
  fn profiles_move_in_and_out_of_the_store() {
    let directory = scratch("exchange");
    let store = directory.join("store");
    let outside = directory.join("outside");
    let packet = SettingsPacket::new(Os::Windows, Vendor::Amd);

    let good = outside.join("battery.json");
    let bad = outside.join("broken.json");
    fs::write(&good, &serde_json::to_string(&packet).unwrap()).unwrap();
    fs::write(&bad, "not a packet").unwrap();

    let imported =
      import_profiles(&store, &[good, bad, outside.join("gone.json")]).unwrap();
    assert_eq!(imported, ["battery"]);
    assert_eq!(load_profile(&store, "battery").unwrap(), packet);

    let exports = directory.join("exports");
    let written = export_profiles(&store, &[], &exports).unwrap();
    assert_eq!(written, [exports.join("battery.json")]);

    let exported: SettingsPacket =
      serde_json::from_str(&fs::read(&written[0]).unwrap().unwrap()).unwrap();
    assert_eq!(exported, packet);

    let missing = ["missing".to_owned()];
    assert!(export_profiles(&store, &missing, &exports).is_err());

    std::fs::remove_dir_all(directory).unwrap();
  }
}
