use crate::domain::report::{Recommendation, Suggestion};
use crate::error::{require_positive_price, AnalysisError};

pub const BUY_THRESHOLD: i64 = 105;
pub const HOLD_THRESHOLD: i64 = 100;

const BASIS: [&str; 3] = [
    "Analyst consensus targets",
    "Risk–reward structure",
    "Current price position",
];

/// floor(target2 / current_price * 100).
pub fn confidence_percent(target2: f64, current_price: f64) -> Result<i64, AnalysisError> {
    let cp = require_positive_price("current_price", current_price)?;
    Ok(((target2 / cp) * 100.0).floor() as i64)
}

/// Lower edges are inclusive: 105 is BUY, 100 is HOLD.
pub fn classify(confidence: i64) -> Suggestion {
    if confidence >= BUY_THRESHOLD {
        Suggestion::Buy
    } else if confidence >= HOLD_THRESHOLD {
        Suggestion::Hold
    } else {
        Suggestion::Avoid
    }
}

pub fn recommend(target2: f64, current_price: f64) -> Result<Recommendation, AnalysisError> {
    let confidence_percent = confidence_percent(target2, current_price)?;
    Ok(Recommendation {
        confidence_percent,
        label: classify(confidence_percent),
        basis: BASIS.iter().map(|s| s.to_string()).collect(),
    })
}
