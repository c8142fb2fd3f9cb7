//! Wind speed unit conversions
//!
//! Wind is always stored in m/s internally; conversion happens only at the
//! boundaries (user input, display).

use serde::{Deserialize, Serialize};

const MS_PER_KMH: f64 = 1.0 / 3.6;
const MS_PER_MPH: f64 = 1.0 / 2.2369362920544;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindUnit {
    Ms,
    Kmh,
    Mph,
}

/// Convert an internal m/s value into the given display unit.
pub fn wind_ms_to_unit(ms: f64, unit: WindUnit) -> f64 {
    match unit {
        WindUnit::Ms => ms,
        WindUnit::Kmh => ms / MS_PER_KMH,
        WindUnit::Mph => ms / MS_PER_MPH,
    }
}

/// Convert a user-entered value in `unit` into internal m/s.
pub fn wind_unit_to_ms(value: f64, unit: WindUnit) -> f64 {
    match unit {
        WindUnit::Ms => value,
        WindUnit::Kmh => value * MS_PER_KMH,
        WindUnit::Mph => value * MS_PER_MPH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kmh_round_trip() {
        let ms = wind_unit_to_ms(36.0, WindUnit::Kmh);
        assert!((ms - 10.0).abs() < 1e-9);
        assert!((wind_ms_to_unit(ms, WindUnit::Kmh) - 36.0).abs() < 1e-9);
    }

    #[test]
    fn mph_uses_exact_factor() {
        let ms = wind_unit_to_ms(2.2369362920544, WindUnit::Mph);
        assert!((ms - 1.0).abs() < 1e-12);
    }

    #[test]
    fn ms_is_identity() {
        assert_eq!(wind_unit_to_ms(6.0, WindUnit::Ms), 6.0);
        assert_eq!(wind_ms_to_unit(6.0, WindUnit::Ms), 6.0);
    }
}
