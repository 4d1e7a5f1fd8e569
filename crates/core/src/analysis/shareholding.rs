use super::round_to;
use crate::domain::quote::Holdings;
use crate::domain::report::{ShareholdingBar, ShareholdingSplit};

pub const PROMOTERS_LABEL: &str = "Promoters";
pub const INSTITUTIONS_LABEL: &str = "Institutions (FII/DII)";
pub const PUBLIC_LABEL: &str = "Public / Retail";

/// Remainder after promoters and institutions. Not clamped: a negative value means the
/// upstream fractions are inconsistent.
pub fn public_percent(promoters_pct: f64, institutions_pct: f64) -> f64 {
    round_to(100.0 - promoters_pct - institutions_pct, 2)
}

pub fn shareholding_split(holdings: &Holdings) -> ShareholdingSplit {
    let promoters_pct = holdings.insiders.unwrap_or(0.0) * 100.0;
    let institutions_pct = holdings.institutions.unwrap_or(0.0) * 100.0;
    let public_pct = public_percent(promoters_pct, institutions_pct);

    let bars = [
        (PROMOTERS_LABEL, promoters_pct),
        (INSTITUTIONS_LABEL, institutions_pct),
        (PUBLIC_LABEL, public_pct),
    ]
    .into_iter()
    .map(|(label, value)| ShareholdingBar {
        label: label.to_string(),
        value,
        text: format!("{:.1}%", round_to(value, 1)),
    })
    .collect();

    ShareholdingSplit {
        promoters_pct,
        institutions_pct,
        public_pct,
        inconsistent: public_pct < 0.0,
        bars,
    }
}
