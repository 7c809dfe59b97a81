use crate::{
  bind::{
    Binder,
    Context,
    Target,
    gate,
  },
  feature::Feature,
  packet::SettingsPacket,
};

const PSTATE_STATUSES: &[&str] = &["disable", "active", "passive", "guided"];

/// `amd-pstate` driver mode and per-thread energy preference.
pub struct LinuxAmd;

impl Binder for LinuxAmd {
  fn name(&self) -> &'static str {
    "linux-amd"
  }

  fn bind(&self, packet: &mut SettingsPacket, context: &Context<'_>) {
    let Some(data) = packet.linux_amd.as_mut() else {
      return;
    };

    let supported =
      context.has_all(&[Feature::SysfsGroup, Feature::AmdPstateSysfs]);

    if gate(&mut data.pstate_status, supported) {
      context.replace(
        &mut data.pstate_status,
        "amd-pstate status",
        Target::Scalar,
        "pstate_status",
        || context.choice("pstate_status", Target::Scalar, PSTATE_STATUSES),
      );
    }

    for (index, thread) in data.threads.iter_mut().enumerate() {
      let index = index.to_string();
      let target = Target::Index(&index);

      if gate(&mut thread.epp, supported) {
        let available = thread.available_epp.valid();

        context.replace(&mut thread.epp, "EPP", target, "pstate_epp", || {
          let Some(available) = available else {
            context.invalid_packet("EPP preferences", target);
            return None;
          };

          context.choice("pstate_epp", target, available.as_slice())
        });
      }

      thread.available_epp.clear();
    }
  }
}
