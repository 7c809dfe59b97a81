use std::{
  fs,
  path::Path,
};

use anyhow::{
  Context,
  bail,
};
use serde::{
  Deserialize,
  Serialize,
};

use crate::field::Range;

/// The setting families whose clamp bounds come from a [`RangeProvider`]
/// instead of the device snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeKey {
  AmdPowerLimit,
  AmdApuSlow,
  AmdTctl,
  AmdApuSkinTemp,
  AmdDgpuSkinTemp,
  AmdVrmCurrent,
  AmdVrmSocCurrent,
  AmdGfxClock,
  AmdCurveOptimizer,
  IntelPowerLimit,
  IntelPl4,
  IntelPp1,
  IntelTurboPowerTdp,
  IntelTurboPowerTdc,
  IntelFivr,
}

/// Numeric bounds lookup, consulted by the binders for every clamped setting
/// the device does not report limits for.
pub trait RangeProvider {
  fn range(&self, key: RangeKey) -> Range;
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct AmdRanges {
  pub power_limit:     Range,
  pub apu_slow:        Range,
  pub tctl:            Range,
  pub apu_skin_temp:   Range,
  pub dgpu_skin_temp:  Range,
  pub vrm_current:     Range,
  pub vrm_soc_current: Range,
  pub gfx_clock:       Range,
  pub curve_optimizer: Range,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct IntelRanges {
  pub power_limit:     Range,
  pub pl4:             Range,
  pub pp1:             Range,
  pub turbo_power_tdp: Range,
  pub turbo_power_tdc: Range,
  pub fivr:            Range,
}

/// A [`RangeProvider`] backed by a TOML table.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct RangeTable {
  pub amd:   AmdRanges,
  pub intel: IntelRanges,
}

impl RangeTable {
  const DEFAULT: &str = include_str!("ranges.toml");

  pub fn load_from(path: Option<&Path>) -> anyhow::Result<Self> {
    let contents = if let Some(path) = path {
      log::info!("loading ranges from '{path}'", path = path.display());

      &fs::read_to_string(path).with_context(|| {
        format!("failed to read ranges from '{path}'", path = path.display())
      })?
    } else {
      log::debug!("loading default ranges");

      Self::DEFAULT
    };

    let table: Self = toml::from_str(contents).with_context(|| {
      path.map_or(
        "failed to parse builtin default ranges, this is a bug".to_owned(),
        |p| format!("failed to parse file at '{path}'", path = p.display()),
      )
    })?;

    for (name, range) in table.entries() {
      if range.min > range.max {
        bail!(
          "range '{name}' has a minimum ({min}) above its maximum ({max})",
          min = range.min,
          max = range.max,
        );
      }
    }

    log::debug!("loaded ranges: {table:#?}");

    Ok(table)
  }

  fn entries(&self) -> [(&'static str, Range); 15] {
    let Self { amd, intel } = self;

    [
      ("amd.power-limit", amd.power_limit),
      ("amd.apu-slow", amd.apu_slow),
      ("amd.tctl", amd.tctl),
      ("amd.apu-skin-temp", amd.apu_skin_temp),
      ("amd.dgpu-skin-temp", amd.dgpu_skin_temp),
      ("amd.vrm-current", amd.vrm_current),
      ("amd.vrm-soc-current", amd.vrm_soc_current),
      ("amd.gfx-clock", amd.gfx_clock),
      ("amd.curve-optimizer", amd.curve_optimizer),
      ("intel.power-limit", intel.power_limit),
      ("intel.pl4", intel.pl4),
      ("intel.pp1", intel.pp1),
      ("intel.turbo-power-tdp", intel.turbo_power_tdp),
      ("intel.turbo-power-tdc", intel.turbo_power_tdc),
      ("intel.fivr", intel.fivr),
    ]
  }
}

impl RangeProvider for RangeTable {
  fn range(&self, key: RangeKey) -> Range {
    let Self { amd, intel } = self;

    match key {
      RangeKey::AmdPowerLimit => amd.power_limit,
      RangeKey::AmdApuSlow => amd.apu_slow,
      RangeKey::AmdTctl => amd.tctl,
      RangeKey::AmdApuSkinTemp => amd.apu_skin_temp,
      RangeKey::AmdDgpuSkinTemp => amd.dgpu_skin_temp,
      RangeKey::AmdVrmCurrent => amd.vrm_current,
      RangeKey::AmdVrmSocCurrent => amd.vrm_soc_current,
      RangeKey::AmdGfxClock => amd.gfx_clock,
      RangeKey::AmdCurveOptimizer => amd.curve_optimizer,
      RangeKey::IntelPowerLimit => intel.power_limit,
      RangeKey::IntelPl4 => intel.pl4,
      RangeKey::IntelPp1 => intel.pp1,
      RangeKey::IntelTurboPowerTdp => intel.turbo_power_tdp,
      RangeKey::IntelTurboPowerTdc => intel.turbo_power_tdc,
      RangeKey::IntelFivr => intel.fivr,
    }
  }
}

/// Returns the same range for every key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedRange(pub Range);

impl RangeProvider for FixedRange {
  fn range(&self, _key: RangeKey) -> Range {
    self.0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn builtin_table_parses() {
    let table = RangeTable::load_from(None).unwrap();

    assert_eq!(table.range(RangeKey::AmdTctl), Range::new(60, 105));
    assert_eq!(table.range(RangeKey::IntelFivr), Range::new(-250, 0));
  }

  #[test]
  fn inverted_range_is_rejected() {
    let contents = RangeTable::DEFAULT.replace(
      "tctl            = { min = 60, max = 105 }",
      "tctl = { min = 106, max = 105 }",
    );

    let dir = std::env::temp_dir().join(format!(
      "powertuner-ranges-{pid}",
      pid = std::process::id()
    ));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("ranges.toml");
    fs::write(&path, contents).unwrap();

    let error = RangeTable::load_from(Some(&path)).unwrap_err();
    assert!(error.to_string().contains("amd.tctl"));

    fs::remove_dir_all(&dir).unwrap();
  }
}
