use std::{
  env,
  ffi::OsString,
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
  parser::DaemonTarget,
};

pub const DEFAULT_PORT: u16 = 56000;

/// A daemon the client knows how to reach.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Daemon {
  pub name:    String,
  pub address: String,
  pub port:    u16,
}

impl Daemon {
  pub fn local() -> Self {
    Self {
      name:    "local".to_owned(),
      address: "127.0.0.1".to_owned(),
      port:    DEFAULT_PORT,
    }
  }
}

/// Persisted client state.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ClientSettings {
  #[serde(rename = "daemon", default)]
  pub daemons: Vec<Daemon>,
}

impl Default for ClientSettings {
  fn default() -> Self {
    Self {
      daemons: vec![Daemon::local()],
    }
  }
}

/// `$XDG_DATA_HOME/powertuner/cli`, falling back to `~/.local/share`.
pub fn data_dir() -> anyhow::Result<PathBuf> {
  data_dir_from(env::var_os("XDG_DATA_HOME"), env::var_os("HOME"))
}

fn data_dir_from(
  xdg_data_home: Option<OsString>,
  home: Option<OsString>,
) -> anyhow::Result<PathBuf> {
  let base = match (xdg_data_home, home) {
    (Some(data), _) if !data.is_empty() => PathBuf::from(data),
    (_, Some(home)) if !home.is_empty() => {
      PathBuf::from(home).join(".local").join("share")
    },
    _ => bail!("neither XDG_DATA_HOME nor HOME is set"),
  };

  Ok(base.join("powertuner").join("cli"))
}

impl ClientSettings {
  pub fn default_path() -> anyhow::Result<PathBuf> {
    Ok(data_dir()?.join("settings.toml"))
  }

  /// Loads the settings at `path`. A missing file yields the defaults.
  pub fn load_from(path: &Path) -> anyhow::Result<Self> {
    let Some(contents) = fs::read(path)? else {
      log::debug!(
        "no client settings at '{path}', using defaults",
        path = path.display(),
      );

      return Ok(Self::default());
    };

    toml::from_str(&contents).with_context(|| {
      format!(
        "failed to parse client settings at '{path}'",
        path = path.display(),
      )
    })
  }

  pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
    let contents = toml::to_string_pretty(self)
      .context("failed to serialize client settings")?;

    fs::write(path, &contents)
  }

  /// Adds `daemon`, replacing any daemon with the same name.
  pub fn add(&mut self, daemon: Daemon) {
    match self
      .daemons
      .iter_mut()
      .find(|known| known.name == daemon.name)
    {
      Some(known) => *known = daemon,
      None => self.daemons.push(daemon),
    }
  }

  /// Removes every daemon whose name or address is `key`. Returns how many
  /// were removed.
  pub fn remove(&mut self, key: &str) -> usize {
    let before = self.daemons.len();

    self
      .daemons
      .retain(|daemon| daemon.name != key && daemon.address != key);

    before - self.daemons.len()
  }

  pub fn resolve(&self, target: &DaemonTarget) -> anyhow::Result<Daemon> {
    match target {
      DaemonTarget::Address { address, port } => {
        Ok(Daemon {
          name:    address.clone(),
          address: address.clone(),
          port:    *port,
        })
      },

      DaemonTarget::Name(name) => {
        match self.daemons.iter().find(|daemon| daemon.name == *name) {
          Some(daemon) => Ok(daemon.clone()),
          None => bail!("no daemon found with the given name: '{name}'"),
        }
      },
    }
  }
}
