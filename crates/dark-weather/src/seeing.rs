//! Seeing score derived from upper-air wind speeds
//!
//! A deterministic proxy for atmospheric stability: jet-stream wind, mid-level
//! wind, and the shear between them each contribute a clamped penalty. Inputs
//! are km/h as delivered by the provider.

use serde::{Deserialize, Serialize};

/// Label bucket for a seeing score, emitted as a key for the UI to localise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeeingLabel {
    Excellent,
    Good,
    Average,
    Poor,
}

impl SeeingLabel {
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => Self::Excellent,
            60..=79 => Self::Good,
            40..=59 => Self::Average,
            _ => Self::Poor,
        }
    }
}

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

fn mean2(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some((a + b) / 2.0),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

/// Score in [0, 100] from the four pressure-level wind speeds (km/h).
///
/// `None` when both levels of either band are missing.
pub fn seeing_score(
    v200: Option<f64>,
    v300: Option<f64>,
    v500: Option<f64>,
    v700: Option<f64>,
) -> Option<u8> {
    let v_jet = mean2(v200, v300)?;
    let v_mid = mean2(v500, v700)?;

    let pen_jet = clamp01((v_jet - 100.0) / (200.0 - 100.0));
    let pen_mid = clamp01((v_mid - 40.0) / (120.0 - 40.0));
    let pen_shear = clamp01(((v_jet - v_mid).abs() - 40.0) / (120.0 - 40.0));

    let penalty = 0.5 * pen_jet + 0.3 * pen_mid + 0.2 * pen_shear;
    let score = ((1.0 - penalty) * 100.0).round();
    Some(score.clamp(0.0, 100.0) as u8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calm_air_scores_perfect() {
        // All winds below every penalty onset.
        let score = seeing_score(Some(50.0), Some(50.0), Some(20.0), Some(20.0)).unwrap();
        assert_eq!(score, 100);
        assert_eq!(SeeingLabel::from_score(score), SeeingLabel::Excellent);
    }

    #[test]
    fn raging_jet_scores_zero() {
        let score = seeing_score(Some(250.0), Some(250.0), Some(150.0), Some(150.0)).unwrap();
        assert_eq!(score, 0);
        assert_eq!(SeeingLabel::from_score(score), SeeingLabel::Poor);
    }

    #[test]
    fn moderate_jet_only_penalises_half_weight() {
        // Vjet = 150, Vmid = 60: pJet 0.5, pMid 0.25, pShear 0.625.
        let score = seeing_score(Some(150.0), Some(150.0), Some(60.0), Some(60.0)).unwrap();
        // penalty = 0.25 + 0.075 + 0.125 = 0.45
        assert_eq!(score, 55);
    }

    #[test]
    fn one_missing_level_falls_back_to_the_other() {
        let full = seeing_score(Some(80.0), Some(80.0), Some(30.0), Some(30.0));
        let half = seeing_score(Some(80.0), None, Some(30.0), None);
        assert_eq!(full, half);
    }

    #[test]
    fn missing_band_yields_none() {
        assert_eq!(seeing_score(None, None, Some(30.0), Some(30.0)), None);
        assert_eq!(seeing_score(Some(80.0), Some(80.0), None, None), None);
    }

    #[test]
    fn label_buckets() {
        assert_eq!(SeeingLabel::from_score(80), SeeingLabel::Excellent);
        assert_eq!(SeeingLabel::from_score(79), SeeingLabel::Good);
        assert_eq!(SeeingLabel::from_score(60), SeeingLabel::Good);
        assert_eq!(SeeingLabel::from_score(59), SeeingLabel::Average);
        assert_eq!(SeeingLabel::from_score(40), SeeingLabel::Average);
        assert_eq!(SeeingLabel::from_score(39), SeeingLabel::Poor);
    }
}
