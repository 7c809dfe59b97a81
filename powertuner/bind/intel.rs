use crate::{
  bind::{
    Binder,
    Context,
    Diagnostic,
    Target,
    gate,
  },
  feature::Feature,
  field::Range,
  packet::{
    IntelData,
    SettingsPacket,
    intel::{
      IntelCore,
      IntelThread,
      PowerCtl,
    },
  },
  ranges::RangeKey,
};

const PACKAGE: Target<'static> = Target::Scalar;

const POWER_LIMIT_TIME: Range = Range::new(0, 56000);
const POWER_PRIORITY: Range = Range::new(0, 31);
const ENERGY_PERF_BIAS: Range = Range::new(0, 15);
const TURBO_RATIO: Range = Range::new(1, 255);
const HWP_EPP: Range = Range::new(0, 255);
const HWP_ACTIVITY_WINDOW: Range = Range::new(0, 127000);

const SB_PACKAGE_CSTATE_LIMITS: &[i32] = &[0, 1, 2, 3, 4, 5, 7];
const CU1_PACKAGE_CSTATE_LIMITS: &[i32] = &[0, 1, 2, 3, 4, 5, 6, 7, 8];
const CU1_MAX_CORE_CSTATES: &[i32] = &[1, 2, 3];

const PKG_POWER_LIMIT: &[&str] = &[
  "pkg_limit_pl1",
  "pkg_limit_pl2",
  "pkg_limit_pl1_time",
  "pkg_limit_pl2_time",
  "pkg_limit_pl1_clamp",
  "pkg_limit_pl2_clamp",
  "pkg_limit_pl1_enable",
  "pkg_limit_pl2_enable",
  "pkg_limit_lock",
];

const VR_CURRENT_CONFIG: &[&str] =
  &["vr_current_cfg_pl4", "vr_current_cfg_lock"];
const PP1_CURRENT_CONFIG: &[&str] = &["pp1_current_limit", "pp1_current_lock"];

const TURBO_POWER_CURRENT_LIMIT: &[&str] = &[
  "turbo_pwr_current_tdp",
  "turbo_pwr_current_tdc",
  "turbo_pwr_current_tdp_enable",
  "turbo_pwr_current_tdc_enable",
];

const TURBO_RATIO_LIMITS: &[&str] = &[
  "turbo_ratio_limit_1c",
  "turbo_ratio_limit_2c",
  "turbo_ratio_limit_3c",
  "turbo_ratio_limit_4c",
  "turbo_ratio_limit_5c",
  "turbo_ratio_limit_6c",
  "turbo_ratio_limit_7c",
  "turbo_ratio_limit_8c",
];

const MISC_PROC_FEATURES: &[&str] =
  &["enhanced_speedstep_enable", "turbo_mode_disable"];

const POWER_CTL: &[(&str, fn(&mut PowerCtl) -> &mut bool)] = &[
  ("bd_prochot_enable", |ctl| &mut ctl.bd_prochot),
  ("c1e_enable", |ctl| &mut ctl.c1e_enable),
  ("self_refresh_pkg_c2_state_enable", |ctl| {
    &mut ctl.sapm_imc_c2_policy
  }),
  ("fast_vid_swing_rate_enable", |ctl| &mut ctl.fast_brk_snp_enable),
  ("power_performance_platform_override", |ctl| {
    &mut ctl.power_performance_platform_override
  }),
  ("energy_efficiency_opt_disable", |ctl| {
    &mut ctl.disable_energy_efficiency_opt
  }),
  ("race_to_halt_disable", |ctl| &mut ctl.disable_race_to_halt_opt),
  ("prochot_output_disable", |ctl| &mut ctl.prochot_output_disable),
  ("prochot_cfg_response_enable", |ctl| {
    &mut ctl.prochot_configurable_response
  }),
  ("prochot_bits_lock_enable", |ctl| {
    &mut ctl.vr_therm_alert_disable_lock
  }),
  ("vr_thermal_alert_signaling_disable", |ctl| {
    &mut ctl.vr_therm_alert_disable
  }),
  ("ring_ee_disable", |ctl| &mut ctl.ring_ee_disable),
  ("sa_opt_disable", |ctl| &mut ctl.sa_optimization_disable),
  ("ook_disable", |ctl| &mut ctl.ook_disable),
  ("hwp_autonomous_disable", |ctl| &mut ctl.hwp_autonomous_disable),
  ("cstate_prewake_disable", |ctl| &mut ctl.cstate_prewake_disable),
];

const UNDERVOLT: &[&str] = &[
  "uv_control_cpu",
  "uv_control_gpu",
  "uv_control_cache",
  "uv_control_unslice",
  "uv_control_sa",
];

const HWP_REQUEST_PKG: &[&str] = &[
  "hwp_request_pkg_min_perf",
  "hwp_request_pkg_max_perf",
  "hwp_request_pkg_desired_perf",
  "hwp_request_pkg_epp",
  "hwp_request_pkg_acw",
];

const HWP_REQUEST: &[&str] = &[
  "hwp_request_min_perf",
  "hwp_request_max_perf",
  "hwp_request_desired_perf",
  "hwp_request_epp",
  "hwp_request_acw",
  "hwp_request_pkg_control",
  "hwp_request_min_valid",
  "hwp_request_max_valid",
  "hwp_request_desired_valid",
  "hwp_request_epp_valid",
  "hwp_request_acw_valid",
];

const PKG_CST_CONFIG_CONTROL: &[&str] = &[
  "pkg_cst_cfg_control_cstate_limit",
  "pkg_cst_cfg_control_max_core_cstate",
  "pkg_cst_cfg_control_io_mwait_redirection_enable",
  "pkg_cst_cfg_control_cfg_lock_enable",
  "pkg_cst_cfg_control_c3_autodemotion_enable",
  "pkg_cst_cfg_control_c1_autodemotion_enable",
  "pkg_cst_cfg_control_c3_undemotion_enable",
  "pkg_cst_cfg_control_c1_undemotion_enable",
  "pkg_cst_cfg_control_pkgc_autodemotion_enable",
  "pkg_cst_cfg_control_pkgc_undemotion_enable",
  "pkg_cst_cfg_control_timed_mwait_enable",
];

const MCHBAR_PKG_RAPL_LIMIT: &[&str] = &[
  "pkg_rapl_limit_pl1",
  "pkg_rapl_limit_pl2",
  "pkg_rapl_limit_pl1_time",
  "pkg_rapl_limit_pl1_enable",
  "pkg_rapl_limit_pl2_enable",
  "pkg_rapl_limit_pl1_clamp",
  "pkg_rapl_limit_lock",
];

/// Intel MSRs, undervolt, HWP and MCHBAR settings.
pub struct IntelVendor;

impl Binder for IntelVendor {
  fn name(&self) -> &'static str {
    "intel"
  }

  fn bind(&self, packet: &mut SettingsPacket, context: &Context<'_>) {
    let Some(intel) = packet.intel.as_mut() else {
      return;
    };

    bind_power_limits(intel, context);
    bind_package_features(intel, context);
    bind_undervolt(intel, context);
    bind_hwp(intel, context);
    bind_mchbar(intel, context);

    let cst = context
      .has_all(&[Feature::IntelCpuGroup, Feature::IntelPkgCstConfigControl]);

    for (index, core) in intel.cores.iter_mut().enumerate() {
      let index = index.to_string();
      bind_core(core, Target::Index(&index), cst, context);
    }
  }
}

fn msr(context: &Context<'_>, feature: Feature) -> bool {
  context.has_all(&[Feature::IntelCpuGroup, feature])
}

fn bind_power_limits(intel: &mut IntelData, context: &Context<'_>) {
  let power_limit = context.ranges.range(RangeKey::IntelPowerLimit);

  if gate(
    &mut intel.pkg_power_limit,
    msr(context, Feature::IntelPkgPowerLimit),
  ) {
    context.edit(
      &mut intel.pkg_power_limit,
      "package power limit",
      PACKAGE,
      PKG_POWER_LIMIT,
      |limit| {
        context.assign_clamped(
          &mut limit.pl1,
          "pkg_limit_pl1",
          PACKAGE,
          power_limit,
        );
        context.assign_clamped(
          &mut limit.pl2,
          "pkg_limit_pl2",
          PACKAGE,
          power_limit,
        );
        context.assign_clamped(
          &mut limit.pl1_time,
          "pkg_limit_pl1_time",
          PACKAGE,
          POWER_LIMIT_TIME,
        );
        context.assign_clamped(
          &mut limit.pl2_time,
          "pkg_limit_pl2_time",
          PACKAGE,
          POWER_LIMIT_TIME,
        );
        context.assign_flag(
          &mut limit.pl1_clamp,
          "pkg_limit_pl1_clamp",
          PACKAGE,
        );
        context.assign_flag(
          &mut limit.pl2_clamp,
          "pkg_limit_pl2_clamp",
          PACKAGE,
        );
        context.assign_flag(
          &mut limit.pl1_enable,
          "pkg_limit_pl1_enable",
          PACKAGE,
        );
        context.assign_flag(
          &mut limit.pl2_enable,
          "pkg_limit_pl2_enable",
          PACKAGE,
        );
        context.assign_flag(&mut limit.lock, "pkg_limit_lock", PACKAGE);
      },
    );
  }

  if gate(
    &mut intel.vr_current_config,
    msr(context, Feature::IntelVrCurrentCfg),
  ) {
    let pl4 = context.ranges.range(RangeKey::IntelPl4);

    context.edit(
      &mut intel.vr_current_config,
      "VR current config",
      PACKAGE,
      VR_CURRENT_CONFIG,
      |config| {
        context.assign_clamped(
          &mut config.pl4,
          "vr_current_cfg_pl4",
          PACKAGE,
          pl4,
        );
        context.assign_flag(&mut config.lock, "vr_current_cfg_lock", PACKAGE);
      },
    );
  }

  if gate(
    &mut intel.pp1_current_config,
    msr(context, Feature::IntelPp1CurrentCfg),
  ) {
    let pp1 = context.ranges.range(RangeKey::IntelPp1);

    context.edit(
      &mut intel.pp1_current_config,
      "PP1 current config",
      PACKAGE,
      PP1_CURRENT_CONFIG,
      |config| {
        context.assign_clamped(
          &mut config.limit,
          "pp1_current_limit",
          PACKAGE,
          pp1,
        );
        context.assign_flag(&mut config.lock, "pp1_current_lock", PACKAGE);
      },
    );
  }

  if gate(
    &mut intel.turbo_power_current_limit,
    msr(context, Feature::IntelTurboPowerCurrentLimitRw),
  ) {
    let tdp = context.ranges.range(RangeKey::IntelTurboPowerTdp);
    let tdc = context.ranges.range(RangeKey::IntelTurboPowerTdc);

    context.edit(
      &mut intel.turbo_power_current_limit,
      "turbo power current limit",
      PACKAGE,
      TURBO_POWER_CURRENT_LIMIT,
      |limit| {
        context.assign_clamped(
          &mut limit.tdp_limit,
          "turbo_pwr_current_tdp",
          PACKAGE,
          tdp,
        );
        context.assign_clamped(
          &mut limit.tdc_limit,
          "turbo_pwr_current_tdc",
          PACKAGE,
          tdc,
        );
        context.assign_flag(
          &mut limit.tdp_override,
          "turbo_pwr_current_tdp_enable",
          PACKAGE,
        );
        context.assign_flag(
          &mut limit.tdc_override,
          "turbo_pwr_current_tdc_enable",
          PACKAGE,
        );
      },
    );
  }
}

fn bind_package_features(intel: &mut IntelData, context: &Context<'_>) {
  for (field, setting, feature) in [
    (
      &mut intel.pp0_priority,
      "pp0_priority",
      Feature::IntelCpuPowerBalance,
    ),
    (
      &mut intel.pp1_priority,
      "pp1_priority",
      Feature::IntelGpuPowerBalance,
    ),
  ] {
    if gate(field, msr(context, feature)) {
      context.replace(field, setting, PACKAGE, setting, || {
        context.clamped(setting, PACKAGE, POWER_PRIORITY)
      });
    }
  }

  // HWP EPP supersedes the bias when both exist.
  let energy_perf_bias = msr(context, Feature::IntelEnergyPerfBias)
    && !context.has(Feature::IntelHwpEpp);

  if gate(&mut intel.energy_perf_bias, energy_perf_bias) {
    context.replace(
      &mut intel.energy_perf_bias,
      "energy_perf_bias",
      PACKAGE,
      "energy_perf_bias",
      || context.clamped("energy_perf_bias", PACKAGE, ENERGY_PERF_BIAS),
    );
  }

  if gate(
    &mut intel.turbo_ratio_limit,
    msr(context, Feature::IntelTurboRatioLimitRw),
  ) {
    let cores = context.cores as usize;

    context.edit(
      &mut intel.turbo_ratio_limit,
      "turbo ratio limit",
      PACKAGE,
      TURBO_RATIO_LIMITS,
      |limit| {
        for (ratio, &setting) in
          limit.ratios.iter_mut().zip(TURBO_RATIO_LIMITS).take(cores)
        {
          context.assign_clamped(ratio, setting, PACKAGE, TURBO_RATIO);
        }
      },
    );
  }

  if gate(
    &mut intel.misc_proc_features,
    msr(context, Feature::IntelIa32MiscEnableGroup),
  ) {
    context.edit(
      &mut intel.misc_proc_features,
      "misc processor features",
      PACKAGE,
      MISC_PROC_FEATURES,
      |features| {
        if context.has(Feature::IntelEnhancedSpeedstep) {
          context.assign_flag(
            &mut features.enhanced_speedstep,
            "enhanced_speedstep_enable",
            PACKAGE,
          );
        }

        if context.has(Feature::IntelTurboBoost) {
          context.assign_flag(
            &mut features.disable_turbo,
            "turbo_mode_disable",
            PACKAGE,
          );
        }
      },
    );
  }

  if gate(&mut intel.power_ctl, msr(context, Feature::IntelPowerCtl)) {
    let settings: Vec<&str> = POWER_CTL.iter().map(|&(name, _)| name).collect();

    context.edit(
      &mut intel.power_ctl,
      "power control",
      PACKAGE,
      &settings,
      |ctl| {
        for &(setting, bit) in POWER_CTL {
          context.assign_flag(bit(ctl), setting, PACKAGE);
        }
      },
    );
  }

  if gate(
    &mut intel.misc_pwr_mgmt,
    msr(context, Feature::IntelMiscPwrMgmt),
  ) {
    context.edit(
      &mut intel.misc_pwr_mgmt,
      "misc power management",
      PACKAGE,
      &["eist_disable"],
      |management| {
        context.assign_flag(
          &mut management.eist_hw_coordination_disable,
          "eist_disable",
          PACKAGE,
        );
      },
    );
  }
}

fn bind_undervolt(intel: &mut IntelData, context: &Context<'_>) {
  if !gate(
    &mut intel.undervolt,
    msr(context, Feature::IntelUndervoltGroup),
  ) {
    return;
  }

  let fivr = context.ranges.range(RangeKey::IntelFivr);

  context.edit(
    &mut intel.undervolt,
    "undervolt",
    PACKAGE,
    UNDERVOLT,
    |undervolt| {
      for (offset, setting, feature) in [
        (&mut undervolt.cpu, "uv_control_cpu", Feature::IntelUndervoltCpu),
        (&mut undervolt.gpu, "uv_control_gpu", Feature::IntelUndervoltGpu),
        (
          &mut undervolt.cache,
          "uv_control_cache",
          Feature::IntelUndervoltCache,
        ),
        (
          &mut undervolt.unslice,
          "uv_control_unslice",
          Feature::IntelUndervoltUnslice,
        ),
        (&mut undervolt.sa, "uv_control_sa", Feature::IntelUndervoltSysagent),
      ] {
        if context.has(feature) {
          context.assign_clamped(offset, setting, PACKAGE, fivr);
        }
      }
    },
  );
}

/// Package-wide HWP capabilities. Falls back to the widest range any thread
/// reports.
fn package_capabilities(intel: &IntelData) -> Option<Range> {
  if let Some(capabilities) = intel.hwp_pkg_capabilities.valid() {
    return Some(capabilities.range());
  }

  intel
    .threads
    .iter()
    .filter_map(|thread| thread.hwp_capabilities.valid())
    .map(|capabilities| capabilities.range())
    .reduce(|widest, range| {
      Range::new(widest.min.min(range.min), widest.max.max(range.max))
    })
}

fn bind_hwp(intel: &mut IntelData, context: &Context<'_>) {
  let hwp = msr(context, Feature::IntelHwpGroup);
  let epp = context.has(Feature::IntelHwpEpp);
  let activity_window = context.has(Feature::IntelHwpActWind);

  if gate(&mut intel.hwp_enable, hwp) {
    context.replace(
      &mut intel.hwp_enable,
      "hwp_enable",
      PACKAGE,
      "hwp_enable",
      || context.flag("hwp_enable", PACKAGE),
    );
  }

  if gate(
    &mut intel.hwp_pkg_ctl_polarity,
    hwp && context.has(Feature::IntelHwpCtl),
  ) {
    context.replace(
      &mut intel.hwp_pkg_ctl_polarity,
      "hwp_pkg_ctl_polarity_enable",
      PACKAGE,
      "hwp_pkg_ctl_polarity_enable",
      || context.flag("hwp_pkg_ctl_polarity_enable", PACKAGE),
    );
  }

  let capabilities = package_capabilities(intel);
  intel.hwp_pkg_capabilities.clear();

  if gate(
    &mut intel.hwp_request_pkg,
    hwp && context.has(Feature::IntelHwpReqPkg),
  ) {
    context.edit(
      &mut intel.hwp_request_pkg,
      "HWP package request",
      PACKAGE,
      HWP_REQUEST_PKG,
      |request| {
        if context.targets(&HWP_REQUEST_PKG[..3], PACKAGE) {
          match capabilities {
            Some(range) => {
              context.assign_clamped(
                &mut request.min,
                "hwp_request_pkg_min_perf",
                PACKAGE,
                range,
              );
              context.assign_clamped(
                &mut request.max,
                "hwp_request_pkg_max_perf",
                PACKAGE,
                range,
              );
              context.assign_clamped(
                &mut request.desired,
                "hwp_request_pkg_desired_perf",
                PACKAGE,
                range,
              );
            },

            None => {
              context.report(Diagnostic::MissingCapabilities {
                what: "HWP package request",
              });
            },
          }
        }

        if epp {
          context.assign_clamped(
            &mut request.epp,
            "hwp_request_pkg_epp",
            PACKAGE,
            HWP_EPP,
          );
        }

        if activity_window {
          context.assign_clamped(
            &mut request.acw,
            "hwp_request_pkg_acw",
            PACKAGE,
            HWP_ACTIVITY_WINDOW,
          );
        }
      },
    );
  }

  for (index, thread) in intel.threads.iter_mut().enumerate() {
    let index = index.to_string();
    bind_thread(thread, Target::Index(&index), hwp, context);
  }
}

fn bind_thread(
  thread: &mut IntelThread,
  target: Target<'_>,
  hwp: bool,
  context: &Context<'_>,
) {
  let capabilities = thread.hwp_capabilities.valid().map(|caps| caps.range());
  thread.hwp_capabilities.clear();

  if !gate(&mut thread.hwp_request, hwp) {
    return;
  }

  let epp = context.has(Feature::IntelHwpEpp);
  let activity_window = context.has(Feature::IntelHwpActWind);
  let valid_bits = context.has(Feature::IntelHwpValidBits);

  context.edit(
    &mut thread.hwp_request,
    "HWP request",
    target,
    HWP_REQUEST,
    |request| {
      if context.targets(&HWP_REQUEST[..3], target) {
        match capabilities {
          Some(range) => {
            let perf = &mut request.request;

            context.assign_clamped(
              &mut perf.min,
              "hwp_request_min_perf",
              target,
              range,
            );
            context.assign_clamped(
              &mut perf.max,
              "hwp_request_max_perf",
              target,
              range,
            );
            context.assign_clamped(
              &mut perf.desired,
              "hwp_request_desired_perf",
              target,
              range,
            );
          },

          None => context.invalid_packet("HWP capabilities", target),
        }
      }

      if epp {
        context.assign_clamped(
          &mut request.request.epp,
          "hwp_request_epp",
          target,
          HWP_EPP,
        );
      }

      if activity_window {
        context.assign_clamped(
          &mut request.request.acw,
          "hwp_request_acw",
          target,
          HWP_ACTIVITY_WINDOW,
        );
      }

      if context.has(Feature::IntelHwpReqPkg) {
        context.assign_flag(
          &mut request.package_control,
          "hwp_request_pkg_control",
          target,
        );
      }

      if valid_bits {
        context.assign_flag(
          &mut request.min_valid,
          "hwp_request_min_valid",
          target,
        );
        context.assign_flag(
          &mut request.max_valid,
          "hwp_request_max_valid",
          target,
        );
        context.assign_flag(
          &mut request.desired_valid,
          "hwp_request_desired_valid",
          target,
        );
      }

      if valid_bits && epp {
        context.assign_flag(
          &mut request.epp_valid,
          "hwp_request_epp_valid",
          target,
        );
      }

      if valid_bits && activity_window {
        context.assign_flag(
          &mut request.acw_valid,
          "hwp_request_acw_valid",
          target,
        );
      }
    },
  );
}

fn bind_mchbar(intel: &mut IntelData, context: &Context<'_>) {
  let supported = context.has_all(&[
    Feature::IntelMchbarGroup,
    Feature::IntelMchbarPkgRaplLimit,
  ]);

  if !gate(&mut intel.mchbar_pkg_rapl_limit, supported) {
    return;
  }

  let power_limit = context.ranges.range(RangeKey::IntelPowerLimit);

  context.edit(
    &mut intel.mchbar_pkg_rapl_limit,
    "MCHBAR package RAPL limit",
    PACKAGE,
    MCHBAR_PKG_RAPL_LIMIT,
    |limit| {
      context.assign_clamped(
        &mut limit.pl1,
        "pkg_rapl_limit_pl1",
        PACKAGE,
        power_limit,
      );
      context.assign_clamped(
        &mut limit.pl2,
        "pkg_rapl_limit_pl2",
        PACKAGE,
        power_limit,
      );
      context.assign_clamped(
        &mut limit.pl1_time,
        "pkg_rapl_limit_pl1_time",
        PACKAGE,
        POWER_LIMIT_TIME,
      );
      context.assign_flag(
        &mut limit.pl1_enable,
        "pkg_rapl_limit_pl1_enable",
        PACKAGE,
      );
      context.assign_flag(
        &mut limit.pl2_enable,
        "pkg_rapl_limit_pl2_enable",
        PACKAGE,
      );
      context.assign_flag(
        &mut limit.pl1_clamp,
        "pkg_rapl_limit_pl1_clamp",
        PACKAGE,
      );
      context.assign_flag(&mut limit.lock, "pkg_rapl_limit_lock", PACKAGE);
    },
  );
}

fn bind_core(
  core: &mut IntelCore,
  target: Target<'_>,
  supported: bool,
  context: &Context<'_>,
) {
  if !gate(&mut core.pkg_cst_config_control, supported) {
    return;
  }

  let (cstate_limits, max_core_cstates): (&[i32], &[i32]) =
    if context.has(Feature::IntelPkgCstConfigControlSb) {
      (SB_PACKAGE_CSTATE_LIMITS, &[])
    } else if context.has(Feature::IntelPkgCstConfigControlCu1) {
      (CU1_PACKAGE_CSTATE_LIMITS, CU1_MAX_CORE_CSTATES)
    } else {
      (&[], &[])
    };

  context.edit(
    &mut core.pkg_cst_config_control,
    "package C-state config control",
    target,
    PKG_CST_CONFIG_CONTROL,
    |control| {
      if let Some(limit) = context.one_of(
        "pkg_cst_cfg_control_cstate_limit",
        target,
        cstate_limits,
      ) {
        control.package_cstate_limit = limit;
      }

      if let Some(cstate) = context.one_of(
        "pkg_cst_cfg_control_max_core_cstate",
        target,
        max_core_cstates,
      ) {
        control.max_core_cstate = cstate;
      }

      for (bit, setting) in [
        (
          &mut control.io_mwait_redirection_enable,
          "pkg_cst_cfg_control_io_mwait_redirection_enable",
        ),
        (&mut control.cfg_lock, "pkg_cst_cfg_control_cfg_lock_enable"),
        (
          &mut control.c3_state_autodemotion_enable,
          "pkg_cst_cfg_control_c3_autodemotion_enable",
        ),
        (
          &mut control.c1_state_autodemotion_enable,
          "pkg_cst_cfg_control_c1_autodemotion_enable",
        ),
        (
          &mut control.c3_undemotion_enable,
          "pkg_cst_cfg_control_c3_undemotion_enable",
        ),
        (
          &mut control.c1_undemotion_enable,
          "pkg_cst_cfg_control_c1_undemotion_enable",
        ),
        (
          &mut control.pkgc_autodemotion_enable,
          "pkg_cst_cfg_control_pkgc_autodemotion_enable",
        ),
        (
          &mut control.pkgc_undemotion_enable,
          "pkg_cst_cfg_control_pkgc_undemotion_enable",
        ),
        (
          &mut control.timed_mwait_enable,
          "pkg_cst_cfg_control_timed_mwait_enable",
        ),
      ] {
        context.assign_flag(bit, setting, target);
      }
    },
  );
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    bind::testing::Harness,
    field::Field,
    packet::{
      Os,
      Vendor,
      intel::{
        HwpCapabilities,
        HwpRequest,
        HwpRequestPkg,
        MchbarPkgRaplLimit,
        PkgCstConfigControl,
        PkgPowerLimit,
        TurboRatioLimit,
        Undervolt,
      },
    },
    ranges::FixedRange,
  };

  fn thread(lowest: i32, highest: i32) -> IntelThread {
    IntelThread {
      hwp_capabilities: Field::Valid(HwpCapabilities {
        lowest_perf:  lowest,
        highest_perf: highest,
      }),
      hwp_request:      Field::Valid(HwpRequest::default()),
    }
  }

  fn packet() -> SettingsPacket {
    let mut packet = SettingsPacket::new(Os::Linux, Vendor::Intel);
    packet.intel = Some(IntelData {
      pkg_power_limit: Field::Valid(PkgPowerLimit {
        pl1: 28,
        pl2: 64,
        ..PkgPowerLimit::default()
      }),
      pp0_priority: Field::Valid(16),
      energy_perf_bias: Field::Valid(6),
      turbo_ratio_limit: Field::Valid(TurboRatioLimit { ratios: [40; 8] }),
      undervolt: Field::Valid(Undervolt::default()),
      hwp_request_pkg: Field::Valid(HwpRequestPkg::default()),
      mchbar_pkg_rapl_limit: Field::Valid(MchbarPkgRaplLimit::default()),
      cores: vec![
        IntelCore {
          pkg_cst_config_control: Field::Valid(PkgCstConfigControl::default()),
        };
        2
      ],
      threads: vec![thread(1, 40), thread(5, 48)],
      ..IntelData::default()
    });
    packet
  }

  fn harness(tokens: &[&str], features: &[Feature]) -> Harness {
    let mut harness = Harness::new(Os::Linux, Vendor::Intel, tokens)
      .with([Feature::IntelCpuGroup])
      .with(features.iter().copied());
    harness.ranges = FixedRange(Range::new(5, 100));
    harness.cores = 2;
    harness
  }

  #[test]
  fn power_limits_are_clamped() {
    let harness = harness(
      &["pkg_limit_pl1=200", "pkg_limit_pl1_time=99999", "pkg_limit_lock=1"],
      &[Feature::IntelPkgPowerLimit],
    );
    let mut packet = packet();

    harness.bind(&IntelVendor, &mut packet);

    let intel = packet.intel.unwrap();
    assert_eq!(
      intel.pkg_power_limit,
      Field::Valid(PkgPowerLimit {
        pl1: 100,
        pl2: 64,
        pl1_time: 56000,
        lock: true,
        ..PkgPowerLimit::default()
      })
    );
    assert!(harness.diagnostics().is_empty());
  }

  #[test]
  fn unsupported_package_fields_are_ignored() {
    let harness = harness(&["pp0_priority=3"], &[]);
    let mut packet = packet();

    harness.bind(&IntelVendor, &mut packet);

    let intel = packet.intel.unwrap();
    assert_eq!(intel.pkg_power_limit, Field::Ignored);
    assert_eq!(intel.pp0_priority, Field::Ignored);
    assert_eq!(intel.turbo_ratio_limit, Field::Ignored);
    assert_eq!(intel.hwp_request_pkg, Field::Ignored);
    assert!(
      intel
        .threads
        .iter()
        .all(|thread| thread.hwp_request == Field::Ignored)
    );
  }

  #[test]
  fn unpopulated_package_fields_are_reported() {
    let harness = harness(
      &["pp0_priority=40", "pp1_priority=3", "hwp_enable=1"],
      &[
        Feature::IntelCpuPowerBalance,
        Feature::IntelGpuPowerBalance,
        Feature::IntelHwpGroup,
      ],
    );
    let mut packet = packet();

    harness.bind(&IntelVendor, &mut packet);

    let intel = packet.intel.unwrap();
    assert_eq!(intel.pp0_priority, Field::Valid(31));
    assert_eq!(intel.pp1_priority, Field::Unset);
    assert_eq!(intel.hwp_enable, Field::Unset);
    assert_eq!(harness.diagnostics(), [
      Diagnostic::InvalidPacketData {
        what:   "pp1_priority",
        target: None,
      },
      Diagnostic::InvalidPacketData {
        what:   "hwp_enable",
        target: None,
      },
    ]);
  }

  #[test]
  fn turbo_ratios_follow_core_count() {
    let harness = harness(
      &["turbo_ratio_limit_1c=48", "turbo_ratio_limit_3c=300"],
      &[Feature::IntelTurboRatioLimitRw],
    );
    let mut packet = packet();

    harness.bind(&IntelVendor, &mut packet);

    let intel = packet.intel.unwrap();
    assert_eq!(
      intel.turbo_ratio_limit,
      Field::Valid(TurboRatioLimit {
        ratios: [48, 40, 40, 40, 40, 40, 40, 40],
      })
    );
  }

  #[test]
  fn energy_perf_bias_yields_to_hwp_epp() {
    let tokens = &["energy_perf_bias=20"];

    let harness = self::harness(tokens, &[Feature::IntelEnergyPerfBias]);
    let mut packet = packet();
    harness.bind(&IntelVendor, &mut packet);
    assert_eq!(packet.intel.unwrap().energy_perf_bias, Field::Valid(15));

    let harness = self::harness(tokens, &[
      Feature::IntelEnergyPerfBias,
      Feature::IntelHwpEpp,
    ]);
    let mut packet = self::packet();
    harness.bind(&IntelVendor, &mut packet);
    assert_eq!(packet.intel.unwrap().energy_perf_bias, Field::Ignored);
  }

  #[test]
  fn undervolt_respects_plane_tokens() {
    let harness = harness(
      &["uv_control_cpu=-80", "uv_control_gpu=-50"],
      &[Feature::IntelUndervoltGroup, Feature::IntelUndervoltCpu],
    );
    let mut packet = packet();

    harness.bind(&IntelVendor, &mut packet);

    let intel = packet.intel.unwrap();
    assert_eq!(
      intel.undervolt,
      Field::Valid(Undervolt {
        cpu: 5,
        ..Undervolt::default()
      })
    );
  }

  #[test]
  fn package_request_uses_widest_thread_capabilities() {
    let harness = harness(
      &[
        "hwp_request_pkg_min_perf=0",
        "hwp_request_pkg_max_perf=255",
        "hwp_request_pkg_epp=300",
        "hwp_request_max_perf[1]=255",
        "hwp_request_epp_valid[]=1",
      ],
      &[
        Feature::IntelHwpGroup,
        Feature::IntelHwpReqPkg,
        Feature::IntelHwpEpp,
        Feature::IntelHwpValidBits,
      ],
    );
    let mut packet = packet();

    harness.bind(&IntelVendor, &mut packet);

    let intel = packet.intel.unwrap();
    assert_eq!(
      intel.hwp_request_pkg,
      Field::Valid(HwpRequestPkg {
        min: 1,
        max: 48,
        epp: 255,
        ..HwpRequestPkg::default()
      })
    );

    let second = intel.threads[1].hwp_request.valid().unwrap();
    assert_eq!(second.request.max, 48);
    assert!(second.epp_valid);
    assert!(
      intel
        .threads
        .iter()
        .all(|thread| thread.hwp_capabilities.is_absent())
    );
  }

  #[test]
  fn missing_capabilities_are_reported() {
    let harness = harness(&["hwp_request_pkg_min_perf=10"], &[
      Feature::IntelHwpGroup,
      Feature::IntelHwpReqPkg,
    ]);
    let mut packet = packet();
    packet.intel.as_mut().unwrap().threads.clear();

    harness.bind(&IntelVendor, &mut packet);

    assert_eq!(harness.diagnostics(), [Diagnostic::MissingCapabilities {
      what: "HWP package request",
    }]);
  }

  #[test]
  fn cstate_limit_depends_on_generation() {
    let tokens = &[
      "pkg_cst_cfg_control_cstate_limit[]=6",
      "pkg_cst_cfg_control_max_core_cstate[1]=2",
      "pkg_cst_cfg_control_cfg_lock_enable[0]=true",
    ];

    let harness = harness(tokens, &[
      Feature::IntelPkgCstConfigControl,
      Feature::IntelPkgCstConfigControlCu1,
    ]);
    let mut packet = packet();
    harness.bind(&IntelVendor, &mut packet);

    let intel = packet.intel.unwrap();
    let first = intel.cores[0].pkg_cst_config_control.valid().unwrap();
    let second = intel.cores[1].pkg_cst_config_control.valid().unwrap();
    assert_eq!((first.package_cstate_limit, first.cfg_lock), (6, true));
    assert_eq!((second.max_core_cstate, second.cfg_lock), (2, false));

    let harness = self::harness(tokens, &[
      Feature::IntelPkgCstConfigControl,
      Feature::IntelPkgCstConfigControlSb,
    ]);
    let mut packet = self::packet();
    harness.bind(&IntelVendor, &mut packet);

    let intel = packet.intel.unwrap();
    let second = intel.cores[1].pkg_cst_config_control.valid().unwrap();
    assert_eq!((second.package_cstate_limit, second.max_core_cstate), (0, 0));
    // 6 on both cores, 2 on core 1.
    assert_eq!(harness.diagnostics().len(), 3);
  }

  #[test]
  fn mchbar_limits() {
    let harness = harness(
      &["pkg_rapl_limit_pl2=90", "pkg_rapl_limit_pl1_enable=1"],
      &[Feature::IntelMchbarGroup, Feature::IntelMchbarPkgRaplLimit],
    );
    let mut packet = packet();

    harness.bind(&IntelVendor, &mut packet);

    assert_eq!(
      packet.intel.unwrap().mchbar_pkg_rapl_limit,
      Field::Valid(MchbarPkgRaplLimit {
        pl2: 90,
        pl1_enable: true,
        ..MchbarPkgRaplLimit::default()
      })
    );
  }
}
