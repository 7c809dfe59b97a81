use std::collections::{
  BTreeMap,
  BTreeSet,
};

use serde::{
  Deserialize,
  Serialize,
};

/// A capability reported by the daemon for the connected device.
///
/// `*Group` tokens gate a whole family of settings, the rest gate one setting
/// or one sub-field. AMD RyzenAdj settings come in read/write pairs: the
/// write token allows binding, the read token means the daemon can report the
/// current value back.
#[derive(
  Serialize,
  Deserialize,
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  PartialOrd,
  Ord,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Feature {
  // Linux sysfs.
  SysfsGroup,
  CpuSmtSysfs,
  CpuidleGovSysfs,
  CpuParkSysfs,
  CpufreqSysfs,
  AmdPstateSysfs,
  IntelGpuSysfsGroup,
  IntelGpuRpsFreqSysfs,
  IntelGpuBoostSysfs,
  AmdGpuSysfsGroup,
  AmdGpuPowerDpmStateSysfs,
  AmdGpuDpmForcePerfLevelSysfs,

  // Windows.
  PwrSchemeGroup,

  // AMD.
  AmdCpuGroup,
  AmdCpuRyGroup,
  AmdHwpstate,
  AmdCorePerformanceBoost,
  AmdCppc,
  AmdRyStapmLimitW,
  AmdRyFastLimitW,
  AmdRySlowLimitW,
  AmdRyApuSlowR,
  AmdRyApuSlowW,
  AmdRyTctlTempR,
  AmdRyTctlTempW,
  AmdRyApuSkinTempR,
  AmdRyApuSkinTempW,
  AmdRyDgpuSkinTempR,
  AmdRyDgpuSkinTempW,
  AmdRyVrmCurrentR,
  AmdRyVrmCurrentW,
  AmdRyVrmSocCurrentR,
  AmdRyVrmSocCurrentW,
  AmdRyVrmMaxCurrentR,
  AmdRyVrmMaxCurrentW,
  AmdRyVrmSocMaxCurrentR,
  AmdRyVrmSocMaxCurrentW,
  AmdRyStaticGfxClkW,
  AmdRyMinGfxClockR,
  AmdRyMinGfxClockW,
  AmdRyMaxGfxClockR,
  AmdRyMaxGfxClockW,
  AmdRyPowerProfileW,
  AmdRyCoAllW,
  AmdRyCoPerW,

  // Intel.
  IntelCpuGroup,
  IntelPkgPowerLimit,
  IntelVrCurrentCfg,
  IntelPp1CurrentCfg,
  IntelTurboPowerCurrentLimitRw,
  IntelCpuPowerBalance,
  IntelGpuPowerBalance,
  IntelEnergyPerfBias,
  IntelTurboRatioLimitRw,
  IntelIa32MiscEnableGroup,
  IntelEnhancedSpeedstep,
  IntelTurboBoost,
  IntelPowerCtl,
  IntelMiscPwrMgmt,
  IntelUndervoltGroup,
  IntelUndervoltCpu,
  IntelUndervoltGpu,
  IntelUndervoltCache,
  IntelUndervoltUnslice,
  IntelUndervoltSysagent,
  IntelHwpGroup,
  IntelHwpCtl,
  IntelHwpEpp,
  IntelHwpReqPkg,
  IntelHwpActWind,
  IntelHwpValidBits,
  IntelPkgCstConfigControl,
  IntelPkgCstConfigControlSb,
  IntelPkgCstConfigControlCu1,
  IntelMchbarGroup,
  IntelMchbarPkgRaplLimit,
}

/// Everything the daemon reported as supported for one device.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
#[serde(default, rename_all = "kebab-case")]
pub struct FeatureSet {
  pub cpu:  BTreeSet<Feature>,
  /// Per GPU index.
  pub gpus: BTreeMap<u32, BTreeSet<Feature>>,
  /// Ids of the fans the daemon can drive.
  pub fans: BTreeSet<String>,
}

impl FeatureSet {
  pub fn has(&self, feature: Feature) -> bool {
    self.cpu.contains(&feature)
  }

  pub fn has_all(&self, features: &[Feature]) -> bool {
    features.iter().all(|&feature| self.has(feature))
  }

  pub fn gpu(&self, index: u32) -> Option<&BTreeSet<Feature>> {
    self.gpus.get(&index)
  }

  pub fn gpu_has(&self, index: u32, feature: Feature) -> bool {
    self.gpu(index).is_some_and(|features| features.contains(&feature))
  }
}

impl FromIterator<Feature> for FeatureSet {
  fn from_iter<I: IntoIterator<Item = Feature>>(iter: I) -> Self {
    Self {
      cpu: iter.into_iter().collect(),
      ..Self::default()
    }
  }
}
