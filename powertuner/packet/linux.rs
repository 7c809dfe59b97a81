use std::collections::BTreeMap;

use serde::{
  Deserialize,
  Serialize,
};

use crate::field::{
  Field,
  Range,
};

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct BlockDevice {
  /// Human readable model name.
  pub label:                Field<String>,
  pub scheduler:            Field<String>,
  pub available_schedulers: Field<Vec<String>>,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct MiscPmDevice {
  pub label:         Field<String>,
  /// Path of the runtime PM `control` file, used as the device key.
  pub control:       String,
  pub control_value: Field<String>,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct IntelGpu {
  /// RPn to RP0.
  pub rps_limits:      Field<Range>,
  pub frequency:       Field<Range>,
  pub boost_frequency: Field<i32>,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ForcePerfLevel {
  pub level: String,
  pub sclk:  Range,
  pub reset: bool,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AmdGpu {
  /// Overdrive shader clock range.
  pub od_sclk:          Field<Range>,
  pub power_dpm_state:  Field<String>,
  pub force_perf_level: Field<ForcePerfLevel>,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LinuxThread {
  pub core_id:               Field<i32>,
  pub online:                Field<bool>,
  pub logical_off_available: Field<bool>,
  pub frequency_limits:      Field<Range>,
  pub frequency:             Field<Range>,
  pub available_governors:   Field<Vec<String>>,
  pub governor:              Field<String>,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LinuxData {
  pub smt_state:                   Field<String>,
  pub cpuidle_available_governors: Field<Vec<String>>,
  pub cpuidle_governor:            Field<String>,
  /// Keyed by block device name, e.g. `nvme0n1`.
  pub block_devices:               BTreeMap<String, BlockDevice>,
  pub misc_pm_devices:             Vec<MiscPmDevice>,
  /// Keyed by GPU index.
  pub intel_gpus:                  BTreeMap<u32, IntelGpu>,
  pub amd_gpus:                    BTreeMap<u32, AmdGpu>,
  pub threads:                     Vec<LinuxThread>,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LinuxAmdThread {
  pub epp:           Field<String>,
  pub available_epp: Field<Vec<String>>,
}

/// `amd-pstate` driver state.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct LinuxAmdData {
  pub pstate_status: Field<String>,
  pub threads:       Vec<LinuxAmdThread>,
}
