//! Settings binders. Each one owns a slice of the settings packet and
//! rewrites it from the argument map before the packet goes back to the
//! daemon.

mod amd;
mod context;
mod fan;
mod generic;
mod intel;
mod linux;
mod linux_amd;
mod windows;

pub use amd::AmdVendor;
pub use context::{
  Context,
  Diagnostic,
  Diagnostics,
  LogDiagnostics,
  RecordingDiagnostics,
  Target,
  gate,
};
pub use fan::FanControl;
pub use generic::Generic;
pub use intel::IntelVendor;
pub use linux::LinuxCommon;
pub use linux_amd::LinuxAmd;
pub use windows::WindowsScheme;

use crate::{
  arguments::ArgumentMap,
  packet::{
    DeviceInfo,
    Os,
    SettingsPacket,
    Vendor,
  },
  ranges::RangeProvider,
};

pub trait Binder {
  fn name(&self) -> &'static str;

  /// Rewrites the binder's domain of `packet`. Never fails, problems are
  /// reported through the context's diagnostics sink.
  fn bind(&self, packet: &mut SettingsPacket, context: &Context<'_>);
}

/// The binders for a device, in the order they must run.
pub fn binders(os: Os, vendor: Vendor) -> Vec<Box<dyn Binder>> {
  let mut binders: Vec<Box<dyn Binder>> = vec![Box::new(Generic)];

  match os {
    Os::Linux => binders.push(Box::new(LinuxCommon)),
    Os::Windows => binders.push(Box::new(WindowsScheme)),
  }

  match vendor {
    Vendor::Intel => binders.push(Box::new(IntelVendor)),

    Vendor::Amd => {
      binders.push(Box::new(AmdVendor));

      if os == Os::Linux {
        binders.push(Box::new(LinuxAmd));
      }
    },
  }

  binders.push(Box::new(FanControl));
  binders
}

/// Runs every binder for `device` over `packet` and returns it, ready to be
/// sent back.
pub fn bind_packet(
  mut packet: SettingsPacket,
  device: &DeviceInfo,
  arguments: &ArgumentMap,
  ranges: &dyn RangeProvider,
  diagnostics: &dyn Diagnostics,
) -> SettingsPacket {
  let context = Context {
    arguments,
    features: &device.features,
    ranges,
    diagnostics,
    os: device.os,
    vendor: device.vendor,
    cores: device.cpu.cores,
    threads: device.cpu.threads,
  };

  for binder in binders(device.os, device.vendor) {
    log::debug!("running {name} binder", name = binder.name());
    binder.bind(&mut packet, &context);
  }

  packet
}

#[cfg(test)]
pub(crate) mod testing {
  use super::*;
  use crate::{
    feature::{
      Feature,
      FeatureSet,
    },
    field::Range,
    parser::parse_device_settings,
    ranges::FixedRange,
  };

  /// Owns everything a [`Context`] borrows.
  pub struct Harness {
    pub arguments:   ArgumentMap,
    pub features:    FeatureSet,
    pub ranges:      FixedRange,
    pub diagnostics: RecordingDiagnostics,
    pub os:          Os,
    pub vendor:      Vendor,
    pub cores:       u32,
    pub threads:     u32,
  }

  impl Harness {
    pub fn new(os: Os, vendor: Vendor, tokens: &[&str]) -> Self {
      let arguments = if tokens.is_empty() {
        ArgumentMap::new()
      } else {
        parse_device_settings(tokens).unwrap()
      };

      Self {
        arguments,
        features: FeatureSet::default(),
        ranges: FixedRange(Range::new(0, 100)),
        diagnostics: RecordingDiagnostics::new(),
        os,
        vendor,
        cores: 4,
        threads: 8,
      }
    }

    pub fn with(mut self, features: impl IntoIterator<Item = Feature>) -> Self {
      self.features.cpu.extend(features);
      self
    }

    pub fn context(&self) -> Context<'_> {
      Context {
        arguments:   &self.arguments,
        features:    &self.features,
        ranges:      &self.ranges,
        diagnostics: &self.diagnostics,
        os:          self.os,
        vendor:      self.vendor,
        cores:       self.cores,
        threads:     self.threads,
      }
    }

    pub fn bind(&self, binder: &dyn Binder, packet: &mut SettingsPacket) {
      binder.bind(packet, &self.context());
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
      self.diagnostics.take()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn names(os: Os, vendor: Vendor) -> Vec<&'static str> {
    binders(os, vendor)
      .iter()
      .map(|binder| binder.name())
      .collect()
  }

  #[test]
  fn binder_order() {
    assert_eq!(names(Os::Linux, Vendor::Intel), [
      "generic",
      "linux",
      "intel",
      "fan"
    ]);
    assert_eq!(names(Os::Linux, Vendor::Amd), [
      "generic",
      "linux",
      "amd",
      "linux-amd",
      "fan"
    ]);
    assert_eq!(names(Os::Windows, Vendor::Amd), [
      "generic", "windows", "amd", "fan"
    ]);
    assert_eq!(names(Os::Windows, Vendor::Intel), [
      "generic", "windows", "intel", "fan"
    ]);
  }
}
