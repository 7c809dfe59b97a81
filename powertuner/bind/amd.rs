use crate::{
  bind::{
    Binder,
    Context,
    Target,
    gate,
  },
  feature::Feature,
  field::{
    Field,
    Range,
  },
  packet::{
    AmdData,
    SettingsPacket,
    amd::AmdThread,
  },
  ranges::RangeKey,
};

const CPPC_EPP: Range = Range::new(0, 255);
const POWER_PROFILES: &[i32] = &[0, 1];

const CPPC_REQUEST: &[&str] = &[
  "cppc_request_min_perf",
  "cppc_request_max_perf",
  "cppc_request_desired_perf",
  "cppc_request_epp",
];

/// How an override is validated.
#[derive(Debug, Clone, Copy)]
enum Check {
  Clamp(RangeKey),
  OneOf(&'static [i32]),
}

/// What happens to a field nobody set.
#[derive(Debug, Clone, Copy)]
enum Absent {
  /// Send the current value back.
  Keep,
  /// Send it back only when the device can read it.
  IgnoreUnlessReadable(Feature),
  /// Write-only, there is nothing to send back.
  Ignore,
}

/// A package-wide RyzenAdj setting.
struct Setting {
  name:   &'static str,
  write:  Feature,
  check:  Check,
  absent: Absent,
  field:  fn(&mut AmdData) -> &mut Field<i32>,
}

const SETTINGS: &[Setting] = &[
  Setting {
    name:   "stapm_limit",
    write:  Feature::AmdRyStapmLimitW,
    check:  Check::Clamp(RangeKey::AmdPowerLimit),
    absent: Absent::Keep,
    field:  |amd| &mut amd.stapm_limit,
  },
  Setting {
    name:   "fast_limit",
    write:  Feature::AmdRyFastLimitW,
    check:  Check::Clamp(RangeKey::AmdPowerLimit),
    absent: Absent::Keep,
    field:  |amd| &mut amd.fast_limit,
  },
  Setting {
    name:   "slow_limit",
    write:  Feature::AmdRySlowLimitW,
    check:  Check::Clamp(RangeKey::AmdPowerLimit),
    absent: Absent::Keep,
    field:  |amd| &mut amd.slow_limit,
  },
  Setting {
    name:   "apu_slow",
    write:  Feature::AmdRyApuSlowW,
    check:  Check::Clamp(RangeKey::AmdApuSlow),
    absent: Absent::IgnoreUnlessReadable(Feature::AmdRyApuSlowR),
    field:  |amd| &mut amd.apu_slow,
  },
  Setting {
    name:   "tctl_temp",
    write:  Feature::AmdRyTctlTempW,
    check:  Check::Clamp(RangeKey::AmdTctl),
    absent: Absent::IgnoreUnlessReadable(Feature::AmdRyTctlTempR),
    field:  |amd| &mut amd.tctl_temp,
  },
  Setting {
    name:   "apu_skin_temp",
    write:  Feature::AmdRyApuSkinTempW,
    check:  Check::Clamp(RangeKey::AmdApuSkinTemp),
    absent: Absent::IgnoreUnlessReadable(Feature::AmdRyApuSkinTempR),
    field:  |amd| &mut amd.apu_skin_temp,
  },
  Setting {
    name:   "dgpu_skin_temp",
    write:  Feature::AmdRyDgpuSkinTempW,
    check:  Check::Clamp(RangeKey::AmdDgpuSkinTemp),
    absent: Absent::IgnoreUnlessReadable(Feature::AmdRyDgpuSkinTempR),
    field:  |amd| &mut amd.dgpu_skin_temp,
  },
  Setting {
    name:   "vrm_current",
    write:  Feature::AmdRyVrmCurrentW,
    check:  Check::Clamp(RangeKey::AmdVrmCurrent),
    absent: Absent::IgnoreUnlessReadable(Feature::AmdRyVrmCurrentR),
    field:  |amd| &mut amd.vrm_current,
  },
  Setting {
    name:   "vrm_soc_current",
    write:  Feature::AmdRyVrmSocCurrentW,
    check:  Check::Clamp(RangeKey::AmdVrmSocCurrent),
    absent: Absent::IgnoreUnlessReadable(Feature::AmdRyVrmSocCurrentR),
    field:  |amd| &mut amd.vrm_soc_current,
  },
  Setting {
    name:   "vrm_max_current",
    write:  Feature::AmdRyVrmMaxCurrentW,
    check:  Check::Clamp(RangeKey::AmdVrmCurrent),
    absent: Absent::IgnoreUnlessReadable(Feature::AmdRyVrmMaxCurrentR),
    field:  |amd| &mut amd.vrm_max_current,
  },
  Setting {
    name:   "vrm_soc_max_current",
    write:  Feature::AmdRyVrmSocMaxCurrentW,
    check:  Check::Clamp(RangeKey::AmdVrmSocCurrent),
    absent: Absent::IgnoreUnlessReadable(Feature::AmdRyVrmSocMaxCurrentR),
    field:  |amd| &mut amd.vrm_soc_max_current,
  },
  Setting {
    name:   "static_gfx_clk",
    write:  Feature::AmdRyStaticGfxClkW,
    check:  Check::Clamp(RangeKey::AmdGfxClock),
    absent: Absent::Ignore,
    field:  |amd| &mut amd.static_gfx_clock,
  },
  Setting {
    name:   "min_gfx_clk",
    write:  Feature::AmdRyMinGfxClockW,
    check:  Check::Clamp(RangeKey::AmdGfxClock),
    absent: Absent::IgnoreUnlessReadable(Feature::AmdRyMinGfxClockR),
    field:  |amd| &mut amd.min_gfx_clock,
  },
  Setting {
    name:   "max_gfx_clk",
    write:  Feature::AmdRyMaxGfxClockW,
    check:  Check::Clamp(RangeKey::AmdGfxClock),
    absent: Absent::IgnoreUnlessReadable(Feature::AmdRyMaxGfxClockR),
    field:  |amd| &mut amd.max_gfx_clock,
  },
  Setting {
    name:   "amd_power_profile",
    write:  Feature::AmdRyPowerProfileW,
    check:  Check::OneOf(POWER_PROFILES),
    absent: Absent::Ignore,
    field:  |amd| &mut amd.power_profile,
  },
  Setting {
    name:   "co_all",
    write:  Feature::AmdRyCoAllW,
    check:  Check::Clamp(RangeKey::AmdCurveOptimizer),
    absent: Absent::Ignore,
    field:  |amd| &mut amd.curve_optimizer,
  },
];

/// RyzenAdj limits, per-core curve optimizer and the per-thread MSRs.
pub struct AmdVendor;

impl Binder for AmdVendor {
  fn name(&self) -> &'static str {
    "amd"
  }

  fn bind(&self, packet: &mut SettingsPacket, context: &Context<'_>) {
    let Some(amd) = packet.amd.as_mut() else {
      return;
    };

    let ryzenadj = context.has(Feature::AmdCpuRyGroup);
    let msr = context.has(Feature::AmdCpuGroup);

    for setting in SETTINGS {
      bind_setting(amd, setting, ryzenadj, context);
    }

    let cppc = msr && context.has(Feature::AmdCppc);

    if gate(&mut amd.cppc_enable, cppc) {
      if context.targets(&["cppc_enable"], Target::Scalar) {
        context.replace(
          &mut amd.cppc_enable,
          "cppc_enable",
          Target::Scalar,
          "cppc_enable",
          || context.flag("cppc_enable", Target::Scalar),
        );
      } else {
        amd.cppc_enable.ignore();
      }
    }

    let curve_optimizer = ryzenadj && context.has(Feature::AmdRyCoPerW);
    let range = context.ranges.range(RangeKey::AmdCurveOptimizer);

    for (index, core) in amd.cores.iter_mut().enumerate() {
      let index = index.to_string();
      let target = Target::Index(&index);

      if !gate(&mut core.curve_optimizer, curve_optimizer) {
        continue;
      }

      if !context.targets(&["co_per"], target) {
        core.curve_optimizer.ignore();
        continue;
      }

      context.replace(
        &mut core.curve_optimizer,
        "curve optimizer",
        target,
        "co_per",
        || context.clamped("co_per", target, range),
      );
    }

    let pstate_limit =
      amd.pstate_current_limit.valid().map(|limit| limit.range());
    amd.pstate_current_limit.clear();

    for (index, thread) in amd.threads.iter_mut().enumerate() {
      let index = index.to_string();
      bind_thread(thread, Target::Index(&index), msr, pstate_limit, context);
    }
  }
}

fn bind_setting(
  amd: &mut AmdData,
  setting: &Setting,
  ryzenadj: bool,
  context: &Context<'_>,
) {
  let field = (setting.field)(amd);

  if !gate(field, ryzenadj && context.has(setting.write)) {
    return;
  }

  let targeted = context.targets(&[setting.name], Target::Scalar);
  let mut applied = false;

  context.replace(field, setting.name, Target::Scalar, setting.name, || {
    let value = match setting.check {
      Check::Clamp(key) => {
        let range = context.ranges.range(key);
        context.clamped(setting.name, Target::Scalar, range)
      },
      Check::OneOf(valid) => {
        context.one_of(setting.name, Target::Scalar, valid)
      },
    };

    applied = value.is_some();
    value
  });

  // Already reported as invalid packet data.
  if applied || (targeted && field.valid().is_none()) {
    return;
  }

  // An override that failed validation counts as no override.
  match setting.absent {
    Absent::Keep => {},
    Absent::IgnoreUnlessReadable(read) if context.has(read) => {},
    _ => field.ignore(),
  }
}

fn bind_thread(
  thread: &mut AmdThread,
  target: Target<'_>,
  msr: bool,
  pstate_limit: Option<Range>,
  context: &Context<'_>,
) {
  let hwpstate = msr && context.has(Feature::AmdHwpstate);

  if gate(&mut thread.pstate_cmd, hwpstate) {
    context.replace(
      &mut thread.pstate_cmd,
      "P-state command",
      target,
      "pstate_cmd",
      || {
        let Some(range) = pstate_limit else {
          context.invalid_packet("P-state limits", target);
          return None;
        };

        context.clamped("pstate_cmd", target, range)
      },
    );
  }

  let boost = msr && context.has(Feature::AmdCorePerformanceBoost);

  if gate(&mut thread.core_perf_boost_disable, boost) {
    context.replace(
      &mut thread.core_perf_boost_disable,
      "core performance boost",
      target,
      "core_perf_boost_disable",
      || context.flag("core_perf_boost_disable", target),
    );
  }

  let capability = thread.cppc_capability.valid().copied();
  thread.cppc_capability.clear();

  if !gate(&mut thread.cppc_request, msr && context.has(Feature::AmdCppc)) {
    return;
  }

  if !context.targets(CPPC_REQUEST, target) {
    thread.cppc_request.ignore();
    return;
  }

  context.edit(
    &mut thread.cppc_request,
    "CPPC request",
    target,
    CPPC_REQUEST,
    |request| {
      if context.targets(&CPPC_REQUEST[..3], target) {
        match capability {
          Some(capability) => {
            let range = capability.range();

            context.assign_clamped(
              &mut request.min_perf,
              "cppc_request_min_perf",
              target,
              range,
            );
            context.assign_clamped(
              &mut request.max_perf,
              "cppc_request_max_perf",
              target,
              range,
            );
            context.assign_clamped(
              &mut request.desired_perf,
              "cppc_request_desired_perf",
              target,
              range,
            );
          },

          None => context.invalid_packet("CPPC capability", target),
        }
      }

      context.assign_clamped(
        &mut request.epp,
        "cppc_request_epp",
        target,
        CPPC_EPP,
      );
    },
  );
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    bind::{
      Diagnostic,
      testing::Harness,
    },
    packet::{
      Os,
      Vendor,
      amd::{
        AmdCore,
        CppcCapability,
        CppcRequest,
        PstateCurrentLimit,
      },
    },
    ranges::FixedRange,
  };

  fn packet() -> SettingsPacket {
    let thread = AmdThread {
      pstate_cmd:              Field::Valid(0),
      core_perf_boost_disable: Field::Valid(false),
      cppc_capability:         Field::Valid(CppcCapability {
        lowest_perf:  10,
        highest_perf: 200,
      }),
      cppc_request:            Field::Valid(CppcRequest {
        min_perf:     10,
        max_perf:     200,
        desired_perf: 0,
        epp:          128,
      }),
    };

    let mut packet = SettingsPacket::new(Os::Linux, Vendor::Amd);
    packet.amd = Some(AmdData {
      stapm_limit: Field::Valid(25),
      fast_limit: Field::Valid(30),
      slow_limit: Field::Valid(28),
      tctl_temp: Field::Valid(95),
      apu_skin_temp: Field::Valid(45),
      static_gfx_clock: Field::Valid(0),
      cppc_enable: Field::Valid(false),
      pstate_current_limit: Field::Valid(PstateCurrentLimit {
        current_limit: 0,
        max_value:     2,
      }),
      cores: vec![
        AmdCore {
          curve_optimizer: Field::Valid(0),
        };
        2
      ],
      threads: vec![thread; 2],
      ..AmdData::default()
    });
    packet
  }

  fn ryzenadj(tokens: &[&str]) -> Harness {
    let mut harness = Harness::new(Os::Linux, Vendor::Amd, tokens).with([
      Feature::AmdCpuRyGroup,
      Feature::AmdRyStapmLimitW,
      Feature::AmdRyFastLimitW,
      Feature::AmdRySlowLimitW,
      Feature::AmdRyTctlTempW,
      Feature::AmdRyTctlTempR,
      Feature::AmdRyApuSkinTempW,
      Feature::AmdRyStaticGfxClkW,
      Feature::AmdRyCoPerW,
    ]);
    harness.ranges = FixedRange(Range::new(5, 54));
    harness
  }

  #[test]
  fn limits_are_clamped_and_unset_fields_resolved() {
    let harness =
      ryzenadj(&["stapm_limit=80", "slow_limit=20", "co_per[1]=-40"]);
    let mut packet = packet();

    harness.bind(&AmdVendor, &mut packet);

    let amd = packet.amd.unwrap();
    assert_eq!(amd.stapm_limit, Field::Valid(54));
    assert_eq!(amd.slow_limit, Field::Valid(20));
    assert_eq!(amd.fast_limit, Field::Valid(30));
    // Readable, so the current value goes back.
    assert_eq!(amd.tctl_temp, Field::Valid(95));
    // Not readable, nothing to send back.
    assert_eq!(amd.apu_skin_temp, Field::Ignored);
    assert_eq!(amd.static_gfx_clock, Field::Ignored);
    // No write capability.
    assert_eq!(amd.vrm_current, Field::Ignored);
    assert_eq!(amd.power_profile, Field::Ignored);

    assert_eq!(amd.cores[0].curve_optimizer, Field::Ignored);
    assert_eq!(amd.cores[1].curve_optimizer, Field::Valid(5));
    assert!(harness.diagnostics().is_empty());
  }

  #[test]
  fn unpopulated_limit_is_left_alone() {
    let harness = ryzenadj(&["stapm_limit=20", "static_gfx_clk=1000"]);
    let mut packet = packet();

    let amd = packet.amd.as_mut().unwrap();
    amd.stapm_limit = Field::Unset;
    amd.static_gfx_clock = Field::Invalid;

    harness.bind(&AmdVendor, &mut packet);

    let amd = packet.amd.unwrap();
    assert_eq!(amd.stapm_limit, Field::Unset);
    assert_eq!(amd.static_gfx_clock, Field::Invalid);
    assert_eq!(harness.diagnostics(), [
      Diagnostic::InvalidPacketData {
        what:   "stapm_limit",
        target: None,
      },
      Diagnostic::InvalidPacketData {
        what:   "static_gfx_clk",
        target: None,
      },
    ]);
  }

  #[test]
  fn rejected_write_only_value_is_not_sent() {
    let harness = ryzenadj(&["static_gfx_clk=fast"]);
    let mut packet = packet();

    harness.bind(&AmdVendor, &mut packet);

    let amd = packet.amd.unwrap();
    assert_eq!(amd.static_gfx_clock, Field::Ignored);
    assert_eq!(harness.diagnostics().len(), 1);
  }

  #[test]
  fn no_ryzenadj_group_drops_every_limit() {
    let harness = Harness::new(Os::Linux, Vendor::Amd, &["stapm_limit=20"])
      .with([Feature::AmdRyStapmLimitW]);
    let mut packet = packet();

    harness.bind(&AmdVendor, &mut packet);

    let amd = packet.amd.unwrap();
    assert_eq!(amd.stapm_limit, Field::Ignored);
    assert_eq!(amd.fast_limit, Field::Ignored);
  }

  #[test]
  fn thread_msrs() {
    let harness = Harness::new(Os::Linux, Vendor::Amd, &[
      "pstate_cmd[]=7",
      "core_perf_boost_disable[1]=1",
      "cppc_request_min_perf[0]=1",
      "cppc_request_epp[0]=300",
      "cppc_enable=true",
    ])
    .with([
      Feature::AmdCpuGroup,
      Feature::AmdHwpstate,
      Feature::AmdCorePerformanceBoost,
      Feature::AmdCppc,
    ]);
    let mut packet = packet();

    harness.bind(&AmdVendor, &mut packet);

    let amd = packet.amd.unwrap();
    assert_eq!(amd.cppc_enable, Field::Valid(true));
    assert_eq!(amd.pstate_current_limit, Field::Unset);

    let [first, second] = &amd.threads[..] else {
      panic!("expected two threads");
    };

    assert_eq!(first.pstate_cmd, Field::Valid(2));
    assert_eq!(second.pstate_cmd, Field::Valid(2));
    assert_eq!(first.core_perf_boost_disable, Field::Valid(false));
    assert_eq!(second.core_perf_boost_disable, Field::Valid(true));

    assert_eq!(
      first.cppc_request,
      Field::Valid(CppcRequest {
        min_perf:     10,
        max_perf:     200,
        desired_perf: 0,
        epp:          255,
      })
    );
    assert_eq!(first.cppc_capability, Field::Unset);
    assert_eq!(second.cppc_request, Field::Ignored);
    assert!(harness.diagnostics().is_empty());
  }

  #[test]
  fn missing_pstate_limit_is_reported() {
    let harness = Harness::new(Os::Linux, Vendor::Amd, &["pstate_cmd[0]=1"])
      .with([Feature::AmdCpuGroup, Feature::AmdHwpstate]);
    let mut packet = packet();
    packet.amd.as_mut().unwrap().pstate_current_limit = Field::Invalid;

    harness.bind(&AmdVendor, &mut packet);

    let amd = packet.amd.unwrap();
    assert_eq!(amd.threads[0].pstate_cmd, Field::Valid(0));
    assert_eq!(harness.diagnostics(), [Diagnostic::InvalidPacketData {
      what:   "P-state limits",
      target: Some("0".to_owned()),
    }]);
  }
}
