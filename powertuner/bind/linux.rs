use crate::{
  bind::{
    Binder,
    Context,
    Diagnostic,
    Target,
    gate,
  },
  feature::Feature,
  packet::{
    SettingsPacket,
    linux::{
      AmdGpu,
      BlockDevice,
      IntelGpu,
      LinuxData,
      LinuxThread,
      MiscPmDevice,
    },
  },
};

const SMT_STATES: &[&str] = &["on", "off", "forceoff"];
const RUNTIME_PM_VALUES: &[&str] = &["auto", "on"];
const DPM_STATES: &[&str] = &["battery", "balanced", "performance"];
const FORCE_PERF_LEVELS: &[&str] = &[
  "auto",
  "low",
  "high",
  "manual",
  "profile_standard",
  "profile_min_sclk",
  "profile_min_mclk",
  "profile_peak",
];

/// sysfs settings shared by every Linux device.
pub struct LinuxCommon;

impl Binder for LinuxCommon {
  fn name(&self) -> &'static str {
    "linux"
  }

  fn bind(&self, packet: &mut SettingsPacket, context: &Context<'_>) {
    let Some(linux) = packet.linux.as_mut() else {
      return;
    };

    bind_cpu(linux, context);

    for (name, device) in &mut linux.block_devices {
      bind_block_device(device, Target::Index(name), context);
    }

    for device in &mut linux.misc_pm_devices {
      bind_misc_pm_device(device, context);
    }

    for (&index, gpu) in &mut linux.intel_gpus {
      bind_intel_gpu(gpu, index, context);
    }

    for (&index, gpu) in &mut linux.amd_gpus {
      bind_amd_gpu(gpu, index, context);
    }

    for (index, thread) in linux.threads.iter_mut().enumerate() {
      bind_thread(thread, Target::Index(&index.to_string()), context);
    }
  }
}

fn bind_cpu(linux: &mut LinuxData, context: &Context<'_>) {
  let smt = context.has_all(&[Feature::SysfsGroup, Feature::CpuSmtSysfs]);

  if gate(&mut linux.smt_state, smt) {
    context.replace(
      &mut linux.smt_state,
      "SMT state",
      Target::Scalar,
      "smt_state",
      || context.choice("smt_state", Target::Scalar, SMT_STATES),
    );
  }

  let cpuidle =
    context.has_all(&[Feature::SysfsGroup, Feature::CpuidleGovSysfs]);

  if gate(&mut linux.cpuidle_governor, cpuidle) {
    let available = linux.cpuidle_available_governors.valid();

    context.replace(
      &mut linux.cpuidle_governor,
      "cpuidle governor",
      Target::Scalar,
      "cpu_idle_governor",
      || {
        let Some(available) = available else {
          context.invalid_packet("cpuidle governors", Target::Scalar);
          return None;
        };

        context.choice(
          "cpu_idle_governor",
          Target::Scalar,
          available.as_slice(),
        )
      },
    );
  }

  linux.cpuidle_available_governors.clear();
}

fn bind_block_device(
  device: &mut BlockDevice,
  target: Target<'_>,
  context: &Context<'_>,
) {
  device.label.clear();

  let available = device.available_schedulers.valid();

  context.replace(
    &mut device.scheduler,
    "block device scheduler",
    target,
    "block_device_que_sched",
    || {
      let Some(available) = available else {
        context.invalid_packet("block device schedulers", target);
        return None;
      };

      context.choice("block_device_que_sched", target, available.as_slice())
    },
  );

  device.available_schedulers.clear();
}

fn bind_misc_pm_device(device: &mut MiscPmDevice, context: &Context<'_>) {
  device.label.clear();

  let target = Target::Index(&device.control);

  context.replace(
    &mut device.control_value,
    "runtime PM control",
    target,
    "misc_device_pm",
    || context.choice("misc_device_pm", target, RUNTIME_PM_VALUES),
  );
}

fn bind_intel_gpu(gpu: &mut IntelGpu, index: u32, context: &Context<'_>) {
  let key = index.to_string();
  let target = Target::Index(&key);
  let rps_limits = gpu.rps_limits.valid().copied();

  gpu.rps_limits.clear();

  if context.features.gpu(index).is_none() {
    context.report(Diagnostic::NoGpuFeatures { index });
    gpu.frequency.ignore();
    gpu.boost_frequency.ignore();
    return;
  }

  let group = context.gpu_has(index, Feature::IntelGpuSysfsGroup);
  let rps = group && context.gpu_has(index, Feature::IntelGpuRpsFreqSysfs);
  let boost = group && context.gpu_has(index, Feature::IntelGpuBoostSysfs);

  if gate(&mut gpu.frequency, rps) {
    context.edit(
      &mut gpu.frequency,
      "GPU frequency",
      target,
      &["gpu_rps_min_freq", "gpu_rps_max_freq"],
      |frequency| {
        let Some(limits) = rps_limits else {
          context.invalid_packet("GPU RPS limits", target);
          return;
        };

        context.assign_clamped(
          &mut frequency.min,
          "gpu_rps_min_freq",
          target,
          limits,
        );
        context.assign_clamped(
          &mut frequency.max,
          "gpu_rps_max_freq",
          target,
          limits,
        );
      },
    );
  }

  if gate(&mut gpu.boost_frequency, boost) {
    context.replace(
      &mut gpu.boost_frequency,
      "GPU boost frequency",
      target,
      "gpu_rps_max_boost",
      || {
        let Some(limits) = rps_limits else {
          context.invalid_packet("GPU RPS limits", target);
          return None;
        };

        context.clamped("gpu_rps_max_boost", target, limits)
      },
    );
  }
}

fn bind_amd_gpu(gpu: &mut AmdGpu, index: u32, context: &Context<'_>) {
  let key = index.to_string();
  let target = Target::Index(&key);
  let od_sclk = gpu.od_sclk.valid().copied();

  gpu.od_sclk.clear();

  if context.features.gpu(index).is_none() {
    context.report(Diagnostic::NoGpuFeatures { index });
    gpu.power_dpm_state.ignore();
    gpu.force_perf_level.ignore();
    return;
  }

  let group = context.gpu_has(index, Feature::AmdGpuSysfsGroup);
  let dpm_state =
    group && context.gpu_has(index, Feature::AmdGpuPowerDpmStateSysfs);
  let force_perf_level =
    group && context.gpu_has(index, Feature::AmdGpuDpmForcePerfLevelSysfs);

  if gate(&mut gpu.power_dpm_state, dpm_state) {
    context.replace(
      &mut gpu.power_dpm_state,
      "GPU power DPM state",
      target,
      "power_dpm_state",
      || context.choice("power_dpm_state", target, DPM_STATES),
    );
  }

  if gate(&mut gpu.force_perf_level, force_perf_level) {
    context.edit(
      &mut gpu.force_perf_level,
      "GPU performance level",
      target,
      &[
        "power_dpm_force_perf_level",
        "power_dpm_force_perf_min_sclk",
        "power_dpm_force_perf_max_sclk",
        "power_dpm_force_perf_reset",
      ],
      |perf| {
        if let Some(level) = context.choice(
          "power_dpm_force_perf_level",
          target,
          FORCE_PERF_LEVELS,
        ) {
          perf.level = level;
        }

        if context.targets(
          &["power_dpm_force_perf_min_sclk", "power_dpm_force_perf_max_sclk"],
          target,
        ) {
          match od_sclk {
            Some(range) => {
              context.assign_clamped(
                &mut perf.sclk.min,
                "power_dpm_force_perf_min_sclk",
                target,
                range,
              );
              context.assign_clamped(
                &mut perf.sclk.max,
                "power_dpm_force_perf_max_sclk",
                target,
                range,
              );
            },

            None => context.invalid_packet("GPU overdrive sclk range", target),
          }
        }

        context.assign_flag(
          &mut perf.reset,
          "power_dpm_force_perf_reset",
          target,
        );
      },
    );
  }
}

fn bind_thread(
  thread: &mut LinuxThread,
  target: Target<'_>,
  context: &Context<'_>,
) {
  let park = context.has_all(&[Feature::SysfsGroup, Feature::CpuParkSysfs]);
  let cpufreq = context.has_all(&[Feature::SysfsGroup, Feature::CpufreqSysfs]);

  if gate(&mut thread.online, park) && context.targets(&["cpu_status"], target)
  {
    match thread.logical_off_available.valid() {
      Some(&true) => {
        context.replace(
          &mut thread.online,
          "CPU status",
          target,
          "cpu_status",
          || context.flag("cpu_status", target),
        );
      },

      // cpu0 and friends can't be taken offline.
      Some(&false) => {},

      None => context.invalid_packet("CPU status", target),
    }
  }

  if gate(&mut thread.frequency, cpufreq) {
    let limits = thread.frequency_limits.valid().copied();

    context.edit(
      &mut thread.frequency,
      "CPU frequency",
      target,
      &["cpu_min_freq", "cpu_max_freq"],
      |frequency| {
        let Some(limits) = limits else {
          context.invalid_packet("CPU frequency limits", target);
          return;
        };

        context.assign_clamped(
          &mut frequency.min,
          "cpu_min_freq",
          target,
          limits,
        );
        context.assign_clamped(
          &mut frequency.max,
          "cpu_max_freq",
          target,
          limits,
        );
      },
    );
  }

  if gate(&mut thread.governor, cpufreq) {
    let available = thread.available_governors.valid();

    context.replace(
      &mut thread.governor,
      "CPU governor",
      target,
      "cpu_scaling_governor",
      || {
        let Some(available) = available else {
          context.invalid_packet("CPU governors", target);
          return None;
        };

        context.choice("cpu_scaling_governor", target, available.as_slice())
      },
    );
  }

  thread.core_id.clear();
  thread.logical_off_available.clear();
  thread.frequency_limits.clear();
  thread.available_governors.clear();
}
