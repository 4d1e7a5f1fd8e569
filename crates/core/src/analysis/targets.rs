use super::{pct_change, round_to};
use crate::domain::quote::AnalystTargets;
use crate::domain::report::{AnalystConsensus, PriceLevel, RefinedTargets};
use crate::error::{require_positive_price, AnalysisError};

pub const TARGET1_MULTIPLIER: f64 = 1.03;
pub const TARGET2_MULTIPLIER: f64 = 1.06;
pub const TARGET3_MULTIPLIER: f64 = 1.09;
pub const STOP_LOSS_MULTIPLIER: f64 = 0.98;

pub fn refined_targets(current_price: f64) -> Result<RefinedTargets, AnalysisError> {
    let cp = require_positive_price("current_price", current_price)?;
    Ok(RefinedTargets {
        target1: offset_level(cp, TARGET1_MULTIPLIER, "1–2 months"),
        target2: offset_level(cp, TARGET2_MULTIPLIER, "3–6 months"),
        target3: offset_level(cp, TARGET3_MULTIPLIER, "6–12 months"),
        stop_loss: offset_level(cp, STOP_LOSS_MULTIPLIER, "below current price"),
    })
}

fn offset_level(cp: f64, multiplier: f64, horizon: &str) -> PriceLevel {
    let price = round_to(cp * multiplier, 2);
    PriceLevel {
        price,
        pct_from_current: pct_change(price, cp),
        horizon: horizon.to_string(),
    }
}

/// Analyst low/mean/high with their offsets from `current_price`.
///
/// All three must be present and non-zero; otherwise the first missing one is reported and the
/// consensus block is left out of the report.
pub fn analyst_consensus(
    targets: &AnalystTargets,
    current_price: f64,
) -> Result<AnalystConsensus, AnalysisError> {
    let low = present(targets.low, "target_low_price")?;
    let mean = present(targets.mean, "target_mean_price")?;
    let high = present(targets.high, "target_high_price")?;
    let cp = require_positive_price("current_price", current_price)?;

    Ok(AnalystConsensus {
        low: consensus_level(low, cp, "short-term possibility"),
        mean: consensus_level(mean, cp, "medium-term most likely"),
        high: consensus_level(high, cp, "long-term optimistic"),
    })
}

fn present(value: Option<f64>, field: &'static str) -> Result<f64, AnalysisError> {
    match value {
        Some(v) if v.is_finite() && v != 0.0 => Ok(v),
        _ => Err(AnalysisError::MissingField(field)),
    }
}

fn consensus_level(price: f64, cp: f64, horizon: &str) -> PriceLevel {
    PriceLevel {
        price,
        pct_from_current: pct_change(price, cp),
        horizon: horizon.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_level_law(level: &PriceLevel, cp: f64, multiplier: f64) {
        let expected = round_to(cp * multiplier, 2);
        assert_eq!(level.price, expected);
        assert_eq!(
            level.pct_from_current,
            round_to(((expected - cp) / cp) * 100.0, 1)
        );
    }

    #[test]
    fn refined_targets_follow_fixed_offsets() {
        for cp in [0.5, 1.0, 17.35, 100.0, 2543.8, 98_765.43] {
            let t = refined_targets(cp).unwrap();
            assert_level_law(&t.target1, cp, TARGET1_MULTIPLIER);
            assert_level_law(&t.target2, cp, TARGET2_MULTIPLIER);
            assert_level_law(&t.target3, cp, TARGET3_MULTIPLIER);
            assert_level_law(&t.stop_loss, cp, STOP_LOSS_MULTIPLIER);
        }
    }

    #[test]
    fn refined_targets_at_one_hundred() {
        let t = refined_targets(100.0).unwrap();
        assert_eq!(t.target1.price, 103.0);
        assert_eq!(t.target2.price, 106.0);
        assert_eq!(t.target3.price, 109.0);
        assert_eq!(t.stop_loss.price, 98.0);
        assert_eq!(t.target1.pct_from_current, 3.0);
        assert_eq!(t.target2.pct_from_current, 6.0);
        assert_eq!(t.target3.pct_from_current, 9.0);
        assert_eq!(t.stop_loss.pct_from_current, -2.0);
        assert_eq!(t.target2.horizon, "3–6 months");
    }

    #[test]
    fn refined_targets_match_decimal_rounding_of_stored_product() {
        let t = refined_targets(1.5).unwrap();
        assert_eq!(t.target1.price, 1.54);
        assert_eq!(t.target1.pct_from_current, 2.7);

        let t = refined_targets(0.25).unwrap();
        assert_eq!(t.stop_loss.price, 0.24);
        assert_eq!(t.stop_loss.pct_from_current, -4.0);

        let t = refined_targets(1.75).unwrap();
        assert_eq!(t.target2.price, 1.85);
        assert_eq!(t.target2.pct_from_current, 5.7);
    }

    #[test]
    fn refined_targets_reject_non_positive_price() {
        assert!(matches!(
            refined_targets(0.0),
            Err(AnalysisError::DegenerateInput { .. })
        ));
        assert!(matches!(
            refined_targets(-5.0),
            Err(AnalysisError::DegenerateInput { .. })
        ));
    }

    #[test]
    fn consensus_requires_all_three_targets() {
        let full = AnalystTargets {
            low: Some(90.0),
            mean: Some(120.0),
            high: Some(150.0),
        };
        let c = analyst_consensus(&full, 100.0).unwrap();
        assert_eq!(c.low.pct_from_current, -10.0);
        assert_eq!(c.mean.pct_from_current, 20.0);
        assert_eq!(c.high.pct_from_current, 50.0);
        assert_eq!(c.high.price, 150.0);

        let missing_mean = AnalystTargets {
            mean: None,
            ..full
        };
        assert!(matches!(
            analyst_consensus(&missing_mean, 100.0),
            Err(AnalysisError::MissingField("target_mean_price"))
        ));
    }

    #[test]
    fn zero_target_counts_as_absent() {
        let targets = AnalystTargets {
            low: Some(0.0),
            mean: Some(120.0),
            high: Some(150.0),
        };
        assert!(matches!(
            analyst_consensus(&targets, 100.0),
            Err(AnalysisError::MissingField("target_low_price"))
        ));
    }
}
