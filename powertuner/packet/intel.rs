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
pub struct PkgPowerLimit {
  pub pl1:        i32,
  pub pl2:        i32,
  pub pl1_time:   i32,
  pub pl2_time:   i32,
  pub pl1_clamp:  bool,
  pub pl2_clamp:  bool,
  pub pl1_enable: bool,
  pub pl2_enable: bool,
  pub lock:       bool,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct VrCurrentConfig {
  pub pl4:  i32,
  pub lock: bool,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Pp1CurrentConfig {
  pub limit: i32,
  pub lock:  bool,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct TurboPowerCurrentLimit {
  pub tdp_limit:    i32,
  pub tdp_override: bool,
  pub tdc_limit:    i32,
  pub tdc_override: bool,
}

/// Max turbo ratio by active core count, 1C first.
#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct TurboRatioLimit {
  pub ratios: [i32; 8],
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct MiscProcFeatures {
  pub enhanced_speedstep: bool,
  pub disable_turbo:      bool,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct PowerCtl {
  pub bd_prochot:                          bool,
  pub c1e_enable:                          bool,
  pub sapm_imc_c2_policy:                  bool,
  pub fast_brk_snp_enable:                 bool,
  pub power_performance_platform_override: bool,
  pub disable_energy_efficiency_opt:       bool,
  pub disable_race_to_halt_opt:            bool,
  pub prochot_output_disable:              bool,
  pub prochot_configurable_response:       bool,
  pub vr_therm_alert_disable_lock:         bool,
  pub vr_therm_alert_disable:              bool,
  pub ring_ee_disable:                     bool,
  pub sa_optimization_disable:             bool,
  pub ook_disable:                         bool,
  pub hwp_autonomous_disable:              bool,
  pub cstate_prewake_disable:              bool,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct MiscPwrMgmt {
  pub eist_hw_coordination_disable: bool,
}

/// FIVR voltage offsets in millivolts.
#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct Undervolt {
  pub cpu:     i32,
  pub gpu:     i32,
  pub cache:   i32,
  pub unslice: i32,
  pub sa:      i32,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct HwpCapabilities {
  pub lowest_perf:  i32,
  pub highest_perf: i32,
}

impl HwpCapabilities {
  pub fn range(self) -> Range {
    Range::new(self.lowest_perf, self.highest_perf)
  }
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct HwpRequestPkg {
  pub min:     i32,
  pub max:     i32,
  pub desired: i32,
  pub epp:     i32,
  /// Activity window in microseconds.
  pub acw:     i32,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct HwpRequest {
  pub request:         HwpRequestPkg,
  pub package_control: bool,
  pub min_valid:       bool,
  pub max_valid:       bool,
  pub desired_valid:   bool,
  pub epp_valid:       bool,
  pub acw_valid:       bool,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct PkgCstConfigControl {
  pub package_cstate_limit:         i32,
  pub max_core_cstate:              i32,
  pub io_mwait_redirection_enable:  bool,
  pub cfg_lock:                     bool,
  pub c3_state_autodemotion_enable: bool,
  pub c1_state_autodemotion_enable: bool,
  pub c3_undemotion_enable:         bool,
  pub c1_undemotion_enable:         bool,
  pub pkgc_autodemotion_enable:     bool,
  pub pkgc_undemotion_enable:       bool,
  pub timed_mwait_enable:           bool,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct MchbarPkgRaplLimit {
  pub pl1:        i32,
  pub pl2:        i32,
  pub pl1_time:   i32,
  pub pl1_enable: bool,
  pub pl2_enable: bool,
  pub pl1_clamp:  bool,
  pub lock:       bool,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct IntelCore {
  pub pkg_cst_config_control: Field<PkgCstConfigControl>,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct IntelThread {
  pub hwp_capabilities: Field<HwpCapabilities>,
  pub hwp_request:      Field<HwpRequest>,
}

/// MSR and MCHBAR settings.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct IntelData {
  pub pkg_power_limit:           Field<PkgPowerLimit>,
  pub vr_current_config:         Field<VrCurrentConfig>,
  pub pp1_current_config:        Field<Pp1CurrentConfig>,
  pub turbo_power_current_limit: Field<TurboPowerCurrentLimit>,
  pub pp0_priority:              Field<i32>,
  pub pp1_priority:              Field<i32>,
  pub energy_perf_bias:          Field<i32>,
  pub turbo_ratio_limit:         Field<TurboRatioLimit>,
  pub misc_proc_features:        Field<MiscProcFeatures>,
  pub power_ctl:                 Field<PowerCtl>,
  pub misc_pwr_mgmt:             Field<MiscPwrMgmt>,
  pub undervolt:                 Field<Undervolt>,
  pub hwp_enable:                Field<bool>,
  pub hwp_pkg_ctl_polarity:      Field<bool>,
  /// Package-wide capabilities, when the daemon reports them directly.
  pub hwp_pkg_capabilities:      Field<HwpCapabilities>,
  pub hwp_request_pkg:           Field<HwpRequestPkg>,
  pub mchbar_pkg_rapl_limit:     Field<MchbarPkgRaplLimit>,
  pub cores:                     Vec<IntelCore>,
  pub threads:                   Vec<IntelThread>,
}
