use serde::{
  Deserialize,
  Serialize,
};

use crate::field::{
  Field,
  Range,
};

#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct PstateCurrentLimit {
  pub current_limit: i32,
  pub max_value:     i32,
}

impl PstateCurrentLimit {
  pub fn range(self) -> Range {
    Range::new(self.current_limit, self.max_value)
  }
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct CppcCapability {
  pub lowest_perf:  i32,
  pub highest_perf: i32,
}

impl CppcCapability {
  pub fn range(self) -> Range {
    Range::new(self.lowest_perf, self.highest_perf)
  }
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct CppcRequest {
  pub min_perf:     i32,
  pub max_perf:     i32,
  pub desired_perf: i32,
  pub epp:          i32,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AmdCore {
  pub curve_optimizer: Field<i32>,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AmdThread {
  pub pstate_cmd:              Field<i32>,
  /// Set means boost is disabled.
  pub core_perf_boost_disable: Field<bool>,
  pub cppc_capability:         Field<CppcCapability>,
  pub cppc_request:            Field<CppcRequest>,
}

/// RyzenAdj and MSR settings.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AmdData {
  pub stapm_limit:          Field<i32>,
  pub fast_limit:           Field<i32>,
  pub slow_limit:           Field<i32>,
  pub apu_slow:             Field<i32>,
  pub tctl_temp:            Field<i32>,
  pub apu_skin_temp:        Field<i32>,
  pub dgpu_skin_temp:       Field<i32>,
  pub vrm_current:          Field<i32>,
  pub vrm_soc_current:      Field<i32>,
  pub vrm_max_current:      Field<i32>,
  pub vrm_soc_max_current:  Field<i32>,
  pub static_gfx_clock:     Field<i32>,
  pub min_gfx_clock:        Field<i32>,
  pub max_gfx_clock:        Field<i32>,
  pub power_profile:        Field<i32>,
  /// All-core curve optimizer offset.
  pub curve_optimizer:      Field<i32>,
  pub cppc_enable:          Field<bool>,
  pub pstate_current_limit: Field<PstateCurrentLimit>,
  pub cores:                Vec<AmdCore>,
  pub threads:              Vec<AmdThread>,
}
