use std::collections::BTreeMap;

use serde::{
  Deserialize,
  Serialize,
};

use crate::field::{
  Field,
  Range,
};

/// AC and DC value of one power setting.
#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct PowerSettingValue {
  pub ac: i32,
  pub dc: i32,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct PowerScheme {
  pub friendly_name: String,
  /// Keyed by brace-wrapped setting GUID.
  pub settings:      BTreeMap<String, PowerSettingValue>,
  pub delete:        bool,
  pub reset:         bool,
}

/// Metadata of one power setting, shared by every scheme.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct SchemeOption {
  pub label: String,
  pub range: Option<Range>,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct WindowsData {
  /// Keyed by brace-wrapped scheme GUID. Schemes created by this client use
  /// `{guid-tbd-<handle>}` until the daemon assigns a real GUID.
  pub schemes:                 BTreeMap<String, PowerScheme>,
  pub scheme_options:          Field<BTreeMap<String, SchemeOption>>,
  pub active_scheme:           Field<String>,
  pub replace_default_schemes: bool,
  pub reset_default_schemes:   bool,
}
