use std::collections::BTreeMap;

/// Index key meaning "every target". `key[]=value` is stored under it.
pub const WILDCARD: &str = "all";

/// What the device-settings token stream can carry. Each flag-like sub-command
/// gets its own entry next to the plain `key=value` settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Command {
  DeviceSettings,
  MakeProfile,
  WinResetDefaults,
  WinReplaceDefaults,
  WinActiveScheme,
  WinDeleteSchemes,
  WinResetSchemes,
  WinCopySchemeSettings,
  WinDuplicateScheme,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
  Scalar(String),
  List(Vec<String>),
  Indexed(BTreeMap<String, String>),
}

/// Untyped arguments keyed by command, then by setting name.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ArgumentMap {
  commands: BTreeMap<Command, BTreeMap<String, Value>>,
}

impl ArgumentMap {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `command` even when it carries no values.
  pub fn mark(&mut self, command: Command) {
    self.commands.entry(command).or_default();
  }

  pub fn insert_scalar(
    &mut self,
    command: Command,
    name: impl Into<String>,
    value: impl Into<String>,
  ) {
    self
      .commands
      .entry(command)
      .or_default()
      .insert(name.into(), Value::Scalar(value.into()));
  }

  pub fn insert_list(
    &mut self,
    command: Command,
    name: impl Into<String>,
    values: Vec<String>,
  ) {
    self
      .commands
      .entry(command)
      .or_default()
      .insert(name.into(), Value::List(values));
  }

  /// Adds one `index -> value` entry. An empty index is the wildcard.
  pub fn insert_indexed(
    &mut self,
    command: Command,
    name: impl Into<String>,
    index: &str,
    value: impl Into<String>,
  ) {
    let index = if index.is_empty() { WILDCARD } else { index };

    let entry = self
      .commands
      .entry(command)
      .or_default()
      .entry(name.into())
      .or_insert_with(|| Value::Indexed(BTreeMap::new()));

    if !matches!(entry, Value::Indexed(_)) {
      *entry = Value::Indexed(BTreeMap::new());
    }

    if let Value::Indexed(table) = entry {
      table.insert(index.to_owned(), value.into());
    }
  }

  pub fn is_set(&self, command: Command) -> bool {
    self.commands.contains_key(&command)
  }

  pub fn get(&self, command: Command, name: &str) -> Option<&Value> {
    self.commands.get(&command)?.get(name)
  }

  pub fn contains(&self, command: Command, name: &str) -> bool {
    self.get(command, name).is_some()
  }

  /// Value of a scalar setting. An indexed setting answers with its wildcard
  /// entry.
  pub fn scalar(&self, command: Command, name: &str) -> Option<&str> {
    match self.get(command, name)? {
      Value::Scalar(value) => Some(value),
      Value::Indexed(table) => table.get(WILDCARD).map(String::as_str),
      Value::List(_) => None,
    }
  }

  /// Value of an indexed setting for `target`. A specific entry beats the
  /// wildcard, a scalar applies to every target.
  pub fn indexed(
    &self,
    command: Command,
    name: &str,
    target: &str,
  ) -> Option<&str> {
    match self.get(command, name)? {
      Value::Scalar(value) => Some(value),
      Value::Indexed(table) => {
        table
          .get(target)
          .or_else(|| table.get(WILDCARD))
          .map(String::as_str)
      },
      Value::List(_) => None,
    }
  }

  /// Every `index -> value` pair of an indexed setting, in index order.
  pub fn entries(
    &self,
    command: Command,
    name: &str,
  ) -> impl Iterator<Item = (&str, &str)> {
    let table = match self.get(command, name) {
      Some(Value::Indexed(table)) => Some(table),
      _ => None,
    };

    table
      .into_iter()
      .flatten()
      .map(|(index, value)| (index.as_str(), value.as_str()))
  }

  pub fn list(&self, command: Command, name: &str) -> &[String] {
    match self.get(command, name) {
      Some(Value::List(values)) => values,
      _ => &[],
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn specific_index_beats_wildcard() {
    let mut map = ArgumentMap::new();
    map.insert_indexed(Command::DeviceSettings, "cpu_min_freq", "", "500");
    map.insert_indexed(Command::DeviceSettings, "cpu_min_freq", "2", "900");

    let get =
      |target| map.indexed(Command::DeviceSettings, "cpu_min_freq", target);

    assert_eq!(get("0"), Some("500"));
    assert_eq!(get("2"), Some("900"));
    assert_eq!(
      map.scalar(Command::DeviceSettings, "cpu_min_freq"),
      Some("500")
    );
  }

  #[test]
  fn scalar_applies_to_every_target() {
    let mut map = ArgumentMap::new();
    map.insert_scalar(Command::DeviceSettings, "pstate_epp", "power");

    assert_eq!(
      map.indexed(Command::DeviceSettings, "pstate_epp", "7"),
      Some("power"),
    );
    assert_eq!(map.entries(Command::DeviceSettings, "pstate_epp").count(), 0);
  }

  #[test]
  fn later_values_overwrite_earlier_ones() {
    let mut map = ArgumentMap::new();
    map.insert_indexed(Command::DeviceSettings, "fan_mode", "f1", "0");
    map.insert_indexed(Command::DeviceSettings, "fan_mode", "f1", "1");

    assert_eq!(
      map.entries(Command::DeviceSettings, "fan_mode").collect::<Vec<_>>(),
      [("f1", "1")],
    );
  }

  #[test]
  fn marked_commands_are_set() {
    let mut map = ArgumentMap::new();
    assert!(!map.is_set(Command::WinResetDefaults));

    map.mark(Command::WinResetDefaults);
    assert!(map.is_set(Command::WinResetDefaults));
    assert!(map.list(Command::WinDeleteSchemes, "guids").is_empty());
  }
}
