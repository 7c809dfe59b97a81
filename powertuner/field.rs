use serde::{
  Deserialize,
  Serialize,
};

/// A single settings value as exchanged with the daemon.
///
/// The daemon populates every field it knows about, the binders then either
/// leave it alone, overwrite it with a validated value, or drop it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(tag = "state", content = "value", rename_all = "kebab-case")]
pub enum Field<T> {
  /// Never populated by the daemon, or scrubbed before transmission.
  Unset,
  /// Populated, but the daemon flagged the data as unusable.
  Invalid,
  /// Not applicable to this device, dropped before transmission.
  Ignored,
  Valid(T),
}

impl<T> Default for Field<T> {
  fn default() -> Self {
    Self::Unset
  }
}

impl<T> Field<T> {
  pub fn valid(&self) -> Option<&T> {
    match self {
      Self::Valid(value) => Some(value),
      _ => None,
    }
  }

  pub fn valid_mut(&mut self) -> Option<&mut T> {
    match self {
      Self::Valid(value) => Some(value),
      _ => None,
    }
  }

  pub fn is_valid(&self) -> bool {
    matches!(self, Self::Valid(_))
  }

  /// Whether the field will be left out of the transmitted packet.
  pub fn is_absent(&self) -> bool {
    matches!(self, Self::Unset | Self::Ignored)
  }

  pub fn set(&mut self, value: T) {
    *self = Self::Valid(value);
  }

  pub fn ignore(&mut self) {
    *self = Self::Ignored;
  }

  pub fn clear(&mut self) {
    *self = Self::Unset;
  }
}

impl<T> From<T> for Field<T> {
  fn from(value: T) -> Self {
    Self::Valid(value)
  }
}

/// An inclusive `[min, max]` pair.
#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(deny_unknown_fields)]
pub struct Range {
  pub min: i32,
  pub max: i32,
}

impl Range {
  pub const fn new(min: i32, max: i32) -> Self {
    Self { min, max }
  }

  /// Bounds `value` into the range. An inverted range resolves to `min`,
  /// never panics.
  pub fn clamp(self, value: i32) -> i32 {
    value.min(self.max).max(self.min)
  }

  pub fn contains(self, value: i32) -> bool {
    (self.min..=self.max).contains(&value)
  }
}
