use std::collections::BTreeMap;

use crate::{
  arguments::{
    Command,
    Value,
    WILDCARD,
  },
  bind::{
    Binder,
    Context,
    Diagnostic,
    Target,
    gate,
  },
  field::Range,
  packet::{
    CurvePoint,
    SettingsPacket,
  },
};

const FAN_MODE: &str = "fan_mode";
const FAN_TRIP_POINT: &str = "fan_trip_point";
const FAN_MODES: &[i32] = &[0, 1];
const FAN_SPEED: Range = Range::new(0, 100);

/// Temperature to speed, per fan id.
type Curves<'a> = BTreeMap<&'a str, BTreeMap<i32, i32>>;

/// Fan modes and curves.
pub struct FanControl;

impl Binder for FanControl {
  fn name(&self) -> &'static str {
    "fan"
  }

  fn bind(&self, packet: &mut SettingsPacket, context: &Context<'_>) {
    let controllable = &context.features.fans;

    for (id, fan) in &mut packet.fans {
      let target = Target::Index(id);
      let supported = controllable.contains(id);

      gate(&mut fan.curve, supported);

      if gate(&mut fan.mode, supported) {
        context.replace(&mut fan.mode, "fan mode", target, FAN_MODE, || {
          context.one_of(FAN_MODE, target, FAN_MODES)
        });
      }
    }

    if controllable.is_empty() {
      return;
    }

    let modes = context.arguments.entries(Command::DeviceSettings, FAN_MODE);

    for (id, _) in modes {
      if id != WILDCARD && !packet.fans.contains_key(id) {
        context.report(Diagnostic::UnknownTarget {
          setting: FAN_MODE,
          target:  id.to_owned(),
        });
      }
    }

    let Some(curves) = parse_curves(packet, context) else {
      return;
    };

    for (id, fan) in &mut packet.fans {
      if !controllable.contains(id) {
        continue;
      }

      // Fans nobody asked for keep their current curve.
      let Some(points) = curves
        .get(id.as_str())
        .or_else(|| curves.get(WILDCARD))
        .filter(|points| !points.is_empty())
      else {
        continue;
      };

      let Some(curve) = fan.curve.valid_mut() else {
        context.invalid_packet("fan curve", Target::Index(id));
        continue;
      };

      *curve = points
        .iter()
        .map(|(&temperature, &speed)| CurvePoint::new(temperature, speed))
        .collect();
    }
  }
}

/// Groups the `fan_trip_point` entries by fan. `id:temp=speed` is one curve
/// point, `id=speed` a fixed speed.
fn parse_curves<'a>(
  packet: &SettingsPacket,
  context: &'a Context<'_>,
) -> Option<Curves<'a>> {
  let entries: Vec<(&str, &str)> =
    match context.arguments.get(Command::DeviceSettings, FAN_TRIP_POINT)? {
      Value::Scalar(speed) => vec![(WILDCARD, speed.as_str())],
      Value::Indexed(_) => {
        context
          .arguments
          .entries(Command::DeviceSettings, FAN_TRIP_POINT)
          .collect()
      },
      Value::List(_) => return None,
    };

  let mut curves = Curves::new();

  for (index, speed) in entries {
    let (id, temperature) = match index.split_once(':') {
      Some((id, temperature)) => (id, Some(temperature)),
      None => (index, None),
    };

    if id != WILDCARD && !packet.fans.contains_key(id) {
      context.report(Diagnostic::UnknownTarget {
        setting: FAN_TRIP_POINT,
        target:  id.to_owned(),
      });
      continue;
    }

    let temperature = temperature.map(|value| value.trim().parse::<i32>());

    let temperature = match temperature {
      None => 0,
      Some(Ok(temperature)) => temperature,

      Some(Err(_)) => {
        context.invalid_value(FAN_TRIP_POINT, Target::Index(index), index);
        continue;
      },
    };

    let Some(speed) = parse_speed(speed, index, context) else {
      continue;
    };

    curves.entry(id).or_default().insert(temperature, speed);
  }

  Some(curves)
}

fn parse_speed(value: &str, index: &str, context: &Context<'_>) -> Option<i32> {
  match value.trim().parse() {
    Ok(speed) => Some(FAN_SPEED.clamp(speed)),

    Err(_) => {
      context.invalid_value(FAN_TRIP_POINT, Target::Index(index), value);
      None
    },
  }
}

#[cfg(test)]
mod tests {
  use proptest::prelude::*;

  use super::*;
  use crate::{
    bind::testing::Harness,
    field::Field,
    packet::{
      Fan,
      Os,
      Vendor,
    },
  };

  fn fan(points: &[(i32, i32)]) -> Fan {
    Fan {
      mode:  Field::Valid(0),
      curve: Field::Valid(
        points
          .iter()
          .map(|&(temperature, speed)| CurvePoint::new(temperature, speed))
          .collect(),
      ),
    }
  }

  fn harness(tokens: &[&str]) -> Harness {
    let mut harness = Harness::new(Os::Linux, Vendor::Amd, tokens);
    harness.features.fans = ["f1".to_owned(), "f2".to_owned()].into();
    harness
  }

  fn packet() -> SettingsPacket {
    let mut packet = SettingsPacket::new(Os::Linux, Vendor::Amd);
    packet.fans.insert("f1".to_owned(), fan(&[(30, 10)]));
    packet.fans.insert("f2".to_owned(), fan(&[(50, 50)]));
    packet
  }

  fn curve(packet: &SettingsPacket, id: &str) -> Vec<(i32, i32)> {
    packet.fans[id]
      .curve
      .valid()
      .into_iter()
      .flatten()
      .map(|point| (point.temperature, point.speed))
      .collect()
  }

  #[test]
  fn trip_points_build_a_sorted_curve() {
    let harness =
      harness(&["fan_trip_point[f1:60]=80", "fan_trip_point[f1:40]=25"]);
    let mut packet = packet();

    harness.bind(&FanControl, &mut packet);

    assert_eq!(curve(&packet, "f1"), [(40, 25), (60, 80)]);
    assert_eq!(curve(&packet, "f2"), [(50, 50)]);
    assert!(harness.diagnostics().is_empty());
  }

  #[test]
  fn specific_fan_beats_wildcard_curve() {
    let harness = harness(&[
      "fan_trip_point[]=40",
      "fan_trip_point[f2:70]=150",
    ]);
    let mut packet = packet();

    harness.bind(&FanControl, &mut packet);

    assert_eq!(curve(&packet, "f1"), [(0, 40)]);
    assert_eq!(curve(&packet, "f2"), [(70, 100)]);
  }

  #[test]
  fn unknown_fans_and_bad_temperatures_are_reported() {
    let harness = harness(&[
      "fan_trip_point[f9:40]=20",
      "fan_trip_point[f1:hot]=20",
      "fan_mode[f9]=1",
    ]);
    let mut packet = packet();

    harness.bind(&FanControl, &mut packet);

    assert_eq!(curve(&packet, "f1"), [(30, 10)]);
    assert_eq!(harness.diagnostics(), [
      Diagnostic::UnknownTarget {
        setting: FAN_MODE,
        target:  "f9".to_owned(),
      },
      Diagnostic::InvalidValue {
        setting: FAN_TRIP_POINT,
        target:  Some("f1:hot".to_owned()),
        value:   "f1:hot".to_owned(),
      },
      Diagnostic::UnknownTarget {
        setting: FAN_TRIP_POINT,
        target:  "f9".to_owned(),
      },
    ]);
  }

  #[test]
  fn fan_mode_must_be_zero_or_one() {
    let harness = harness(&["fan_mode[]=1", "fan_mode[f2]=3"]);
    let mut packet = packet();

    harness.bind(&FanControl, &mut packet);

    assert_eq!(packet.fans["f1"].mode, Field::Valid(1));
    assert_eq!(packet.fans["f2"].mode, Field::Valid(0));
    assert_eq!(harness.diagnostics().len(), 1);
  }

  #[test]
  fn no_controllable_fans_ignores_modes() {
    let harness = Harness::new(Os::Linux, Vendor::Amd, &[
      "fan_mode[]=1",
      "fan_trip_point[]=40",
    ]);
    let mut packet = packet();

    harness.bind(&FanControl, &mut packet);

    for fan in packet.fans.values() {
      assert_eq!(fan.mode, Field::Ignored);
      assert_eq!(fan.curve, Field::Ignored);
    }
  }

  #[test]
  fn only_controllable_fans_take_curves() {
    let mut harness = harness(&["fan_trip_point[]=40"]);
    harness.features.fans = ["f1".to_owned()].into();
    let mut packet = packet();

    harness.bind(&FanControl, &mut packet);

    assert_eq!(curve(&packet, "f1"), [(0, 40)]);
    assert_eq!(packet.fans["f2"].curve, Field::Ignored);
    assert_eq!(packet.fans["f2"].mode, Field::Ignored);
  }

  #[test]
  fn unpopulated_curve_is_reported() {
    let harness = harness(&["fan_trip_point[f1:50]=60", "fan_mode[f2]=1"]);
    let mut packet = packet();
    packet.fans.get_mut("f1").unwrap().curve = Field::Invalid;
    packet.fans.get_mut("f2").unwrap().mode = Field::Unset;

    harness.bind(&FanControl, &mut packet);

    assert_eq!(packet.fans["f1"].curve, Field::Invalid);
    assert_eq!(packet.fans["f2"].mode, Field::Unset);
    assert_eq!(harness.diagnostics(), [
      Diagnostic::InvalidPacketData {
        what:   "fan mode",
        target: Some("f2".to_owned()),
      },
      Diagnostic::InvalidPacketData {
        what:   "fan curve",
        target: Some("f1".to_owned()),
      },
    ]);
  }

  proptest! {
    #[test]
    fn untouched_fans_keep_their_curve(
      temperature in 0..120i32,
      speed in -50..200i32,
    ) {
      let token = format!("fan_trip_point[f1:{temperature}]={speed}");
      let harness = harness(&[token.as_str()]);
      let mut packet = packet();

      harness.bind(&FanControl, &mut packet);

      prop_assert_eq!(curve(&packet, "f2"), [(50, 50)]);
      let speed = speed.clamp(0, 100);
      prop_assert_eq!(curve(&packet, "f1"), [(temperature, speed)]);
    }
  }
}
