use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub symbol: String,
    pub generated_at: DateTime<Utc>,
    pub overview: CompanyOverview,
    pub financials: FinancialOverview,
    pub price_series: Vec<SeriesPoint>,
    pub volume_series: Vec<SeriesPoint>,
    pub shareholding: ShareholdingSplit,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyst_consensus: Option<AnalystConsensus>,
    pub refined_targets: RefinedTargets,
    pub recommendation: Recommendation,
    pub news: Vec<NewsHeadline>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub news_notice: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyOverview {
    pub name: String,
    pub sector: String,
    pub industry: String,
    pub summary_points: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialOverview {
    pub current_price: f64,
    pub fifty_two_week_high: f64,
    pub fifty_two_week_low: f64,
    pub market_cap: u64,
    pub market_cap_display: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// A derived price and its offset from the current price, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceLevel {
    pub price: f64,
    pub pct_from_current: f64,
    pub horizon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinedTargets {
    pub target1: PriceLevel,
    pub target2: PriceLevel,
    pub target3: PriceLevel,
    pub stop_loss: PriceLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalystConsensus {
    pub low: PriceLevel,
    pub mean: PriceLevel,
    pub high: PriceLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Suggestion {
    Buy,
    Hold,
    Avoid,
}

impl fmt::Display for Suggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Suggestion::Buy => "BUY",
            Suggestion::Hold => "HOLD",
            Suggestion::Avoid => "AVOID",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub confidence_percent: i64,
    pub label: Suggestion,
    pub basis: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareholdingSplit {
    pub promoters_pct: f64,
    pub institutions_pct: f64,
    pub public_pct: f64,
    /// Upstream fractions sum past 100%; `public_pct` is negative and left as-is.
    pub inconsistent: bool,
    pub bars: Vec<ShareholdingBar>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShareholdingBar {
    pub label: String,
    pub value: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsHeadline {
    pub title: String,
    pub published: String,
}
