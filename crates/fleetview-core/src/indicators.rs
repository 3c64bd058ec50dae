// ── Telemetry indicators ──
//
// Bucketing of raw telemetry into display levels: battery, cellular
// signal, the speed gauge and today's fuel estimate.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

// ── Battery ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum BatteryLevel {
    Full,
    High,
    Medium,
    Low,
    Critical,
    Empty,
}

impl BatteryLevel {
    pub fn from_percent(percent: f64) -> Self {
        if percent > 90.0 {
            Self::Full
        } else if percent > 60.0 {
            Self::High
        } else if percent > 30.0 {
            Self::Medium
        } else if percent > 20.0 {
            Self::Low
        } else if percent > 0.0 {
            Self::Critical
        } else {
            Self::Empty
        }
    }
}

// ── Signal ──────────────────────────────────────────────────────────

/// Signal strength bars (0-4) for an RSSI reading in dBm.
pub fn signal_bars(rssi_dbm: f64) -> u8 {
    if rssi_dbm > -70.0 {
        4
    } else if rssi_dbm > -85.0 {
        3
    } else if rssi_dbm > -100.0 {
        2
    } else if rssi_dbm > -110.0 {
        1
    } else {
        0
    }
}

// ── Speed ───────────────────────────────────────────────────────────

/// Display unit for speeds. Positions always carry knots.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SpeedUnit {
    #[default]
    Kmh,
    Mph,
    #[serde(alias = "knots")]
    #[strum(to_string = "kn", serialize = "knots")]
    Kn,
}

impl SpeedUnit {
    pub fn from_knots(self, knots: f64) -> f64 {
        match self {
            Self::Kmh => knots * 1.852,
            Self::Mph => knots * 1.150_78,
            Self::Kn => knots,
        }
    }

    /// Full-scale value of the speed gauge in this unit.
    pub fn gauge_max(self) -> f64 {
        match self {
            Self::Kmh => 120.0,
            Self::Mph => 80.0,
            Self::Kn => 65.0,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Self::Kmh => "km/h",
            Self::Mph => "mph",
            Self::Kn => "kn",
        }
    }

    pub fn format(self, knots: f64) -> String {
        format!("{:.0} {}", self.from_knots(knots), self.suffix())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum SpeedBand {
    Normal,
    Elevated,
    High,
    Overspeed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpeedGauge {
    /// Speed in `unit`.
    pub value: f64,
    pub unit: SpeedUnit,
    /// Share of the gauge's full scale, capped at 100.
    pub percent: f64,
    pub band: SpeedBand,
}

/// Build the gauge reading for a speed in knots.
///
/// Exceeding the device's own speed limit always reads `Overspeed`;
/// otherwise the band follows the share of the gauge's full scale.
pub fn speed_gauge(speed_knots: f64, unit: SpeedUnit, speed_limit_knots: Option<f64>) -> SpeedGauge {
    let value = unit.from_knots(speed_knots);
    let percent = (value / unit.gauge_max() * 100.0).clamp(0.0, 100.0);

    let band = if speed_limit_knots.is_some_and(|limit| limit > 0.0 && speed_knots > limit) {
        SpeedBand::Overspeed
    } else if percent > 90.0 {
        SpeedBand::High
    } else if percent > 70.0 {
        SpeedBand::Elevated
    } else {
        SpeedBand::Normal
    };

    SpeedGauge {
        value,
        unit,
        percent,
        band,
    }
}

// ── Fuel ────────────────────────────────────────────────────────────

/// Litres used today from the distance driven (metres) and the device's
/// consumption (km per litre). A consumption of zero is read as 1 km/l.
pub fn fuel_used_today(today_distance_m: Option<f64>, km_per_litre: Option<f64>) -> Option<f64> {
    let distance_km = today_distance_m? / 1000.0;
    let consumption = km_per_litre?;
    let consumption = if consumption > 0.0 { consumption } else { 1.0 };
    Some(distance_km / consumption)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn battery_buckets() {
        assert_eq!(BatteryLevel::from_percent(100.0), BatteryLevel::Full);
        assert_eq!(BatteryLevel::from_percent(90.0), BatteryLevel::High);
        assert_eq!(BatteryLevel::from_percent(45.0), BatteryLevel::Medium);
        assert_eq!(BatteryLevel::from_percent(25.0), BatteryLevel::Low);
        assert_eq!(BatteryLevel::from_percent(5.0), BatteryLevel::Critical);
        assert_eq!(BatteryLevel::from_percent(0.0), BatteryLevel::Empty);
    }

    #[test]
    fn signal_buckets() {
        assert_eq!(signal_bars(-60.0), 4);
        assert_eq!(signal_bars(-70.0), 3);
        assert_eq!(signal_bars(-95.0), 2);
        assert_eq!(signal_bars(-105.0), 1);
        assert_eq!(signal_bars(-120.0), 0);
    }

    #[test]
    fn unit_parsing_accepts_aliases() {
        assert_eq!("kmh".parse::<SpeedUnit>().unwrap(), SpeedUnit::Kmh);
        assert_eq!("MPH".parse::<SpeedUnit>().unwrap(), SpeedUnit::Mph);
        assert_eq!("knots".parse::<SpeedUnit>().unwrap(), SpeedUnit::Kn);
    }

    #[test]
    fn gauge_bands() {
        // 50 kn ≈ 92.6 km/h → 77 % of 120
        assert_eq!(speed_gauge(50.0, SpeedUnit::Kmh, None).band, SpeedBand::Elevated);
        // 60 kn ≈ 111 km/h → 92.6 %
        assert_eq!(speed_gauge(60.0, SpeedUnit::Kmh, None).band, SpeedBand::High);
        assert_eq!(speed_gauge(10.0, SpeedUnit::Kmh, None).band, SpeedBand::Normal);
    }

    #[test]
    fn gauge_caps_and_flags_overspeed() {
        let g = speed_gauge(100.0, SpeedUnit::Kn, Some(30.0));
        assert!((g.percent - 100.0).abs() < f64::EPSILON);
        assert_eq!(g.band, SpeedBand::Overspeed);

        let slow = speed_gauge(20.0, SpeedUnit::Kn, Some(30.0));
        assert_eq!(slow.band, SpeedBand::Normal);
    }

    #[test]
    fn fuel_estimate() {
        let litres = fuel_used_today(Some(84_000.0), Some(12.0)).unwrap();
        assert!((litres - 7.0).abs() < 1e-9);

        let zero_consumption = fuel_used_today(Some(5_000.0), Some(0.0)).unwrap();
        assert!((zero_consumption - 5.0).abs() < 1e-9);

        assert!(fuel_used_today(None, Some(10.0)).is_none());
        assert!(fuel_used_today(Some(1_000.0), None).is_none());
    }
}
