use crate::{
  bind::{
    Binder,
    Context,
    Diagnostic,
  },
  packet::{
    Os,
    SettingsPacket,
    Vendor,
  },
};

/// Surfaces daemon errors and drops domains that don't belong to the device.
pub struct Generic;

impl Binder for Generic {
  fn name(&self) -> &'static str {
    "generic"
  }

  fn bind(&self, packet: &mut SettingsPacket, context: &Context<'_>) {
    for message in packet.errors.drain(..) {
      context.report(Diagnostic::Daemon { message });
    }

    match context.os {
      Os::Linux => packet.windows = None,

      Os::Windows => {
        packet.linux = None;
        packet.linux_amd = None;
      },
    }

    match context.vendor {
      Vendor::Intel => {
        packet.amd = None;
        packet.linux_amd = None;
      },

      Vendor::Amd => packet.intel = None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    bind::testing::Harness,
    packet::{
      AmdData,
      IntelData,
      LinuxAmdData,
      LinuxData,
      WindowsData,
    },
  };

  fn full_packet() -> SettingsPacket {
    let mut packet = SettingsPacket::new(Os::Linux, Vendor::Intel);
    packet.linux = Some(LinuxData::default());
    packet.linux_amd = Some(LinuxAmdData::default());
    packet.windows = Some(WindowsData::default());
    packet.intel = Some(IntelData::default());
    packet.amd = Some(AmdData::default());
    packet
  }

  #[test]
  fn drains_errors_and_foreign_domains() {
    let harness = Harness::new(Os::Linux, Vendor::Intel, &[]);

    let mut packet = full_packet();
    packet.errors = vec!["msr: permission denied".to_owned()];

    harness.bind(&Generic, &mut packet);

    assert!(packet.errors.is_empty());
    assert!(packet.linux.is_some());
    assert!(packet.intel.is_some());
    assert!(packet.linux_amd.is_none());
    assert!(packet.windows.is_none());
    assert!(packet.amd.is_none());

    assert_eq!(harness.diagnostics(), [Diagnostic::Daemon {
      message: "msr: permission denied".to_owned(),
    }]);
  }

  #[test]
  fn windows_amd_keeps_its_domains() {
    let harness = Harness::new(Os::Windows, Vendor::Amd, &[]);

    let mut packet = full_packet();
    harness.bind(&Generic, &mut packet);

    assert!(packet.windows.is_some());
    assert!(packet.amd.is_some());
    assert!(packet.linux.is_none());
    assert!(packet.linux_amd.is_none());
    assert!(packet.intel.is_none());
    assert!(harness.diagnostics().is_empty());
  }
}
