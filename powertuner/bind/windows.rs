use std::collections::BTreeMap;

use crate::{
  arguments::Command,
  bind::{
    Binder,
    Context,
    Diagnostic,
    Target,
  },
  feature::Feature,
  packet::{
    SettingsPacket,
    WindowsData,
    windows::{
      PowerScheme,
      PowerSettingValue,
    },
  },
};

const POWER_SCHEME: &str = "power_scheme";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
  Ac,
  Dc,
  All,
}

impl Mode {
  fn parse(value: &str) -> Option<Self> {
    match value {
      "ac" => Some(Self::Ac),
      "dc" => Some(Self::Dc),
      "all" => Some(Self::All),
      _ => None,
    }
  }

  fn read(self, value: PowerSettingValue) -> i32 {
    match self {
      Self::Dc => value.dc,
      Self::Ac | Self::All => value.ac,
    }
  }

  fn write(self, slot: &mut PowerSettingValue, value: i32) {
    match self {
      Self::Ac => slot.ac = value,
      Self::Dc => slot.dc = value,

      Self::All => {
        slot.ac = value;
        slot.dc = value;
      },
    }
  }
}

/// Windows power schemes.
pub struct WindowsScheme;

impl Binder for WindowsScheme {
  fn name(&self) -> &'static str {
    "windows"
  }

  fn bind(&self, packet: &mut SettingsPacket, context: &Context<'_>) {
    let Some(windows) = packet.windows.as_mut() else {
      return;
    };

    if !context.has(Feature::PwrSchemeGroup) {
      windows.schemes.clear();
      windows.scheme_options.clear();
      windows.active_scheme.ignore();
      return;
    }

    let arguments = context.arguments;

    duplicate_scheme(windows, context);
    copy_settings(windows, context);
    set_power_settings(windows, context);

    windows.replace_default_schemes =
      arguments.is_set(Command::WinReplaceDefaults);
    windows.reset_default_schemes = arguments.is_set(Command::WinResetDefaults);

    flag_schemes(windows, context, Command::WinDeleteSchemes, |scheme| {
      scheme.delete = true;
    });
    flag_schemes(windows, context, Command::WinResetSchemes, |scheme| {
      scheme.reset = true;
    });

    set_active_scheme(windows, context);

    windows.scheme_options.clear();
  }
}

/// Wraps a GUID in braces unless it already is.
fn braced(guid: &str) -> String {
  if guid.starts_with('{') && guid.ends_with('}') {
    guid.to_owned()
  } else {
    format!("{{{guid}}}")
  }
}

/// Key of a scheme created by this client, before the daemon assigns it a
/// GUID.
fn pending_key(handle: &str) -> String {
  format!("{{guid-tbd-{handle}}}")
}

/// `^[\w-]+$`
fn is_valid_handle(handle: &str) -> bool {
  !handle.is_empty()
    && handle
      .chars()
      .all(|char| char.is_alphanumeric() || char == '_' || char == '-')
}

/// Finds a scheme by GUID, falling back to a pending scheme by handle.
fn resolve(
  schemes: &BTreeMap<String, PowerScheme>,
  guid: &str,
) -> Option<String> {
  [braced(guid), pending_key(guid)]
    .into_iter()
    .find(|key| schemes.contains_key(key))
}

fn resolve_or_report(
  windows: &WindowsData,
  guid: &str,
  context: &Context<'_>,
) -> Option<String> {
  let key = resolve(&windows.schemes, guid);

  if key.is_none() {
    context.report(Diagnostic::SchemeNotFound {
      scheme: guid.to_owned(),
    });
  }

  key
}

fn duplicate_scheme(windows: &mut WindowsData, context: &Context<'_>) {
  let command = Command::WinDuplicateScheme;
  let arguments = context.arguments;

  if !arguments.is_set(command) {
    return;
  }

  let base = arguments.scalar(command, "base_scheme").unwrap_or_default();
  let name = arguments.scalar(command, "name").unwrap_or_default();
  let handle = arguments.scalar(command, "tmp_handle").unwrap_or_default();

  if !is_valid_handle(handle) {
    context.invalid_value("ps-duplicate-scheme", Target::Scalar, handle);
    return;
  }

  let Some(base) = resolve_or_report(windows, base, context) else {
    return;
  };

  let Some(scheme) = windows.schemes.get(&base) else {
    return;
  };

  let scheme = PowerScheme {
    friendly_name: name.to_owned(),
    settings: scheme.settings.clone(),
    delete: false,
    reset: false,
  };

  windows.schemes.insert(pending_key(handle), scheme);
}

fn copy_settings(windows: &mut WindowsData, context: &Context<'_>) {
  let command = Command::WinCopySchemeSettings;
  let arguments = context.arguments;

  if !arguments.is_set(command) {
    return;
  }

  let from_mode = arguments.scalar(command, "from_mode").unwrap_or_default();
  let to_mode = arguments.scalar(command, "to_mode").unwrap_or_default();

  let Some(from_mode) = Mode::parse(from_mode).filter(|mode| *mode != Mode::All)
  else {
    context.invalid_value("ps-copy-settings", Target::Scalar, from_mode);
    return;
  };

  let Some(to_mode) = Mode::parse(to_mode) else {
    context.invalid_value("ps-copy-settings", Target::Scalar, to_mode);
    return;
  };

  let from = arguments.scalar(command, "from_scheme").unwrap_or_default();
  let to = arguments.scalar(command, "to_scheme").unwrap_or_default();

  let (Some(from), Some(to)) = (
    resolve_or_report(windows, from, context),
    resolve_or_report(windows, to, context),
  ) else {
    return;
  };

  let source = match windows.schemes.get(&from) {
    Some(scheme) => scheme.settings.clone(),
    None => return,
  };

  let Some(destination) = windows.schemes.get_mut(&to) else {
    return;
  };

  for (setting, value) in source {
    match destination.settings.get_mut(&setting) {
      Some(slot) => to_mode.write(slot, from_mode.read(value)),

      None => {
        context.report(Diagnostic::SchemeSettingNotFound {
          scheme: to.clone(),
          setting,
        });
      },
    }
  }
}

/// `power_scheme[scheme;setting;mode]=value`
fn set_power_settings(windows: &mut WindowsData, context: &Context<'_>) {
  let entries: Vec<_> = context
    .arguments
    .entries(Command::DeviceSettings, POWER_SCHEME)
    .collect();

  if entries.is_empty() {
    return;
  }

  let Some(options) = windows.scheme_options.valid() else {
    context.invalid_packet("power scheme options", Target::Scalar);
    return;
  };

  for (index, value) in entries {
    let target = Target::Index(index);
    let parts: Vec<&str> = index.split(';').collect();

    let [scheme, setting, mode, ..] = parts[..] else {
      context.invalid_value(POWER_SCHEME, target, index);
      continue;
    };

    let Some(mode) = Mode::parse(mode).filter(|mode| *mode != Mode::All) else {
      context.invalid_value(POWER_SCHEME, target, mode);
      continue;
    };

    let Some(scheme) = resolve(&windows.schemes, scheme).or_else(|| {
      context.report(Diagnostic::SchemeNotFound {
        scheme: scheme.to_owned(),
      });
      None
    }) else {
      continue;
    };

    let Ok(number) = value.trim().parse::<i32>() else {
      context.invalid_value(POWER_SCHEME, target, value);
      continue;
    };

    let setting = braced(setting);
    let number = match options.get(&setting).and_then(|option| option.range) {
      Some(range) => range.clamp(number),
      None => number,
    };

    let slot = windows
      .schemes
      .get_mut(&scheme)
      .and_then(|power_scheme| power_scheme.settings.get_mut(&setting));

    match slot {
      Some(slot) => mode.write(slot, number),
      None => {
        context.report(Diagnostic::SchemeSettingNotFound { scheme, setting });
      },
    }
  }
}

fn flag_schemes(
  windows: &mut WindowsData,
  context: &Context<'_>,
  command: Command,
  flag: impl Fn(&mut PowerScheme),
) {
  for guid in context.arguments.list(command, "guids") {
    let Some(key) = resolve_or_report(windows, guid, context) else {
      continue;
    };

    if let Some(scheme) = windows.schemes.get_mut(&key) {
      flag(scheme);
    }
  }
}

fn set_active_scheme(windows: &mut WindowsData, context: &Context<'_>) {
  let command = Command::WinActiveScheme;

  if !context.arguments.is_set(command) {
    return;
  }

  let guid = context.arguments.scalar(command, "guid").unwrap_or_default();

  let key = resolve(&windows.schemes, guid).filter(|key| {
    windows
      .schemes
      .get(key)
      .is_some_and(|scheme| !scheme.delete)
  });

  match key {
    Some(key) => windows.active_scheme.set(key),

    None => {
      context.report(Diagnostic::ActiveSchemeUnavailable {
        scheme: guid.to_owned(),
      });
    },
  }
}
