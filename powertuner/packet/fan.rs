use serde::{
  Deserialize,
  Serialize,
};

use crate::field::Field;

/// Fan speed in percent at a temperature. A curve with a single point at
/// temperature `0` is a fixed speed.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CurvePoint {
  pub temperature: i32,
  pub speed:       i32,
}

impl CurvePoint {
  pub const fn new(temperature: i32, speed: i32) -> Self {
    Self { temperature, speed }
  }
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Fan {
  /// `0` is automatic, `1` is manual.
  pub mode:  Field<i32>,
  /// Sorted by temperature.
  pub curve: Field<Vec<CurvePoint>>,
}
