use std::{
  cell::RefCell,
  fmt,
};

use crate::{
  arguments::{
    ArgumentMap,
    Command,
  },
  feature::{
    Feature,
    FeatureSet,
  },
  field::{
    Field,
    Range,
  },
  packet::{
    Os,
    Vendor,
  },
  ranges::RangeProvider,
};

/// Something a binder could not apply. None of these abort binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
  /// The daemon did not populate a field the binder needs.
  InvalidPacketData {
    what:   &'static str,
    target: Option<String>,
  },
  InvalidValue {
    setting: &'static str,
    target:  Option<String>,
    value:   String,
  },
  UnknownTarget {
    setting: &'static str,
    target:  String,
  },
  MissingCapabilities {
    what: &'static str,
  },
  NoGpuFeatures {
    index: u32,
  },
  SchemeNotFound {
    scheme: String,
  },
  SchemeSettingNotFound {
    scheme:  String,
    setting: String,
  },
  ActiveSchemeUnavailable {
    scheme: String,
  },
  Daemon {
    message: String,
  },
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::InvalidPacketData { what, target: None } => {
        write!(f, "invalid data in packet for {what}")
      },
      Self::InvalidPacketData {
        what,
        target: Some(target),
      } => write!(f, "invalid data in packet for {what} {target}"),

      Self::InvalidValue {
        setting,
        target: None,
        value,
      } => write!(f, "{setting}: invalid value '{value}'"),
      Self::InvalidValue {
        setting,
        target: Some(target),
        value,
      } => write!(f, "{setting}[{target}]: invalid value '{value}'"),

      Self::UnknownTarget { setting, target } => {
        write!(f, "{setting}: unknown target '{target}'")
      },

      Self::MissingCapabilities { what } => {
        write!(f, "failed to get capabilities for {what}")
      },

      Self::NoGpuFeatures { index } => {
        write!(f, "GPU {index}: no features for this GPU")
      },

      Self::SchemeNotFound { scheme } => {
        write!(f, "power scheme '{scheme}' not found")
      },

      Self::SchemeSettingNotFound { scheme, setting } => {
        write!(f, "setting '{setting}' not found in power scheme '{scheme}'")
      },

      Self::ActiveSchemeUnavailable { scheme } => {
        write!(
          f,
          "cannot set active power scheme '{scheme}': not found or flagged for \
           deletion"
        )
      },

      Self::Daemon { message } => write!(f, "daemon reported: {message}"),
    }
  }
}

/// Where binders send their [`Diagnostic`]s.
pub trait Diagnostics {
  fn report(&self, diagnostic: Diagnostic);
}

/// Forwards every diagnostic to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
  fn report(&self, diagnostic: Diagnostic) {
    log::warn!("{diagnostic}");
  }
}

/// Keeps every diagnostic in memory.
#[derive(Debug, Default)]
pub struct RecordingDiagnostics {
  diagnostics: RefCell<Vec<Diagnostic>>,
}

impl RecordingDiagnostics {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn take(&self) -> Vec<Diagnostic> {
    self.diagnostics.take()
  }
}

impl Diagnostics for RecordingDiagnostics {
  fn report(&self, diagnostic: Diagnostic) {
    self.diagnostics.borrow_mut().push(diagnostic);
  }
}

/// Which entry of a setting to look up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
  /// Package or device wide setting.
  Scalar,
  /// Core, thread, GPU, fan or device key.
  Index(&'a str),
}

impl Target<'_> {
  fn label(self) -> Option<String> {
    match self {
      Self::Scalar => None,
      Self::Index(index) => Some(index.to_owned()),
    }
  }
}

/// Everything a binder reads. Captured once before any binder runs.
pub struct Context<'a> {
  pub arguments:   &'a ArgumentMap,
  pub features:    &'a FeatureSet,
  pub ranges:      &'a dyn RangeProvider,
  pub diagnostics: &'a dyn Diagnostics,
  pub os:          Os,
  pub vendor:      Vendor,
  pub cores:       u32,
  pub threads:     u32,
}

impl Context<'_> {
  pub fn has(&self, feature: Feature) -> bool {
    self.features.has(feature)
  }

  pub fn has_all(&self, features: &[Feature]) -> bool {
    self.features.has_all(features)
  }

  pub fn gpu_has(&self, index: u32, feature: Feature) -> bool {
    self.features.gpu_has(index, feature)
  }

  pub fn report(&self, diagnostic: Diagnostic) {
    self.diagnostics.report(diagnostic);
  }

  pub fn invalid_packet(&self, what: &'static str, target: Target<'_>) {
    self.report(Diagnostic::InvalidPacketData {
      what,
      target: target.label(),
    });
  }

  pub fn invalid_value(
    &self,
    setting: &'static str,
    target: Target<'_>,
    value: impl Into<String>,
  ) {
    self.report(Diagnostic::InvalidValue {
      setting,
      target: target.label(),
      value: value.into(),
    });
  }

  /// Whether any of `settings` has an override that reaches `target`.
  pub fn targets(&self, settings: &[&str], target: Target<'_>) -> bool {
    settings
      .iter()
      .any(|setting| self.value(setting, target).is_some())
  }

  /// Raw override for `target`. A specific index beats the wildcard.
  pub fn value(&self, setting: &str, target: Target<'_>) -> Option<&str> {
    match target {
      Target::Scalar => self.arguments.scalar(Command::DeviceSettings, setting),
      Target::Index(index) => {
        self
          .arguments
          .indexed(Command::DeviceSettings, setting, index)
      },
    }
  }

  pub fn int(&self, setting: &'static str, target: Target<'_>) -> Option<i32> {
    let value = self.value(setting, target)?;

    match value.trim().parse() {
      Ok(number) => Some(number),

      Err(_) => {
        self.invalid_value(setting, target, value);
        None
      },
    }
  }

  pub fn flag(
    &self,
    setting: &'static str,
    target: Target<'_>,
  ) -> Option<bool> {
    let value = self.value(setting, target)?;

    match value.trim() {
      "1" | "true" => Some(true),
      "0" | "false" => Some(false),

      _ => {
        self.invalid_value(setting, target, value);
        None
      },
    }
  }

  pub fn clamped(
    &self,
    setting: &'static str,
    target: Target<'_>,
    range: Range,
  ) -> Option<i32> {
    self.int(setting, target).map(|value| range.clamp(value))
  }

  /// Override checked against a list of accepted strings.
  pub fn choice<S: AsRef<str>>(
    &self,
    setting: &'static str,
    target: Target<'_>,
    valid: &[S],
  ) -> Option<String> {
    let value = self.value(setting, target)?;

    if valid.iter().any(|candidate| candidate.as_ref() == value) {
      Some(value.to_owned())
    } else {
      self.invalid_value(setting, target, value);
      None
    }
  }

  /// Override checked against a list of accepted integers.
  pub fn one_of(
    &self,
    setting: &'static str,
    target: Target<'_>,
    valid: &[i32],
  ) -> Option<i32> {
    let value = self.int(setting, target)?;

    if valid.contains(&value) {
      Some(value)
    } else {
      self.invalid_value(setting, target, value.to_string());
      None
    }
  }

  pub fn assign_clamped(
    &self,
    slot: &mut i32,
    setting: &'static str,
    target: Target<'_>,
    range: Range,
  ) {
    if let Some(value) = self.clamped(setting, target, range) {
      *slot = value;
    }
  }

  pub fn assign_flag(
    &self,
    slot: &mut bool,
    setting: &'static str,
    target: Target<'_>,
  ) {
    if let Some(value) = self.flag(setting, target) {
      *slot = value;
    }
  }

  /// Updates a composite field in place when any of `settings` reaches
  /// `target`.
  ///
  /// Reports and skips when the daemon did not populate the field.
  pub fn edit<T>(
    &self,
    field: &mut Field<T>,
    what: &'static str,
    target: Target<'_>,
    settings: &[&str],
    apply: impl FnOnce(&mut T),
  ) {
    if !self.targets(settings, target) {
      return;
    }

    let Some(value) = field.valid_mut() else {
      self.invalid_packet(what, target);
      return;
    };

    apply(value);
  }

  /// Replaces a single-value field when `setting` reaches `target` and
  /// `resolve` yields a value.
  ///
  /// Reports and skips when the daemon did not populate the field.
  pub fn replace<T>(
    &self,
    field: &mut Field<T>,
    what: &'static str,
    target: Target<'_>,
    setting: &str,
    resolve: impl FnOnce() -> Option<T>,
  ) {
    self.edit(field, what, target, &[setting], |slot| {
      if let Some(value) = resolve() {
        *slot = value;
      }
    });
  }
}

/// Marks `field` ignored when the device can't take it. Returns `supported`.
pub fn gate<T>(field: &mut Field<T>, supported: bool) -> bool {
  if !supported {
    field.ignore();
  }

  supported
}
