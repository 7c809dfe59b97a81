use std::collections::BTreeMap;

use serde::{
  Deserialize,
  Serialize,
};

use crate::feature::FeatureSet;

pub mod amd;
pub mod fan;
pub mod intel;
pub mod linux;
pub mod windows;

pub use amd::AmdData;
pub use fan::{
  CurvePoint,
  Fan,
};
pub use intel::IntelData;
pub use linux::{
  LinuxAmdData,
  LinuxData,
};
pub use windows::WindowsData;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Os {
  Linux,
  Windows,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Vendor {
  Intel,
  Amd,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct CpuInfo {
  pub brand:   String,
  pub cores:   u32,
  pub threads: u32,
}

/// Identity and capabilities of the device behind a daemon.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
  #[serde(default)]
  pub product:  String,
  pub os:       Os,
  pub vendor:   Vendor,
  #[serde(default)]
  pub cpu:      CpuInfo,
  #[serde(default)]
  pub features: FeatureSet,
}

/// Every setting of one device, in the shape the daemon exchanges them.
///
/// Domains the device doesn't have are `None`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct SettingsPacket {
  pub os:        Os,
  pub vendor:    Vendor,
  /// Errors the daemon hit while collecting the snapshot. Never sent back.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub errors:    Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub linux:     Option<LinuxData>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub linux_amd: Option<LinuxAmdData>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub windows:   Option<WindowsData>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub intel:     Option<IntelData>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub amd:       Option<AmdData>,
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub fans:      BTreeMap<String, Fan>,
}

impl SettingsPacket {
  pub fn new(os: Os, vendor: Vendor) -> Self {
    Self {
      os,
      vendor,
      errors: Vec::new(),
      linux: None,
      linux_amd: None,
      windows: None,
      intel: None,
      amd: None,
      fans: BTreeMap::new(),
    }
  }
}
