//! Yahoo Finance response shapes. Only the fields the report uses are modelled.

use serde::Deserialize;

/// Yahoo wraps numbers as `{"raw": 123.4, "fmt": "123.40"}`, or `{}` when unknown.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct RawValue {
    #[serde(default)]
    pub raw: Option<f64>,
}

pub fn raw(v: &Option<RawValue>) -> Option<f64> {
    v.as_ref().and_then(|v| v.raw).filter(|x| x.is_finite())
}

#[derive(Debug, Clone, Deserialize)]
pub struct YahooError {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl std::fmt::Display for YahooError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {}",
            self.code.as_deref().unwrap_or("unknown"),
            self.description.as_deref().unwrap_or("no description")
        )
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteSummaryEnvelope {
    #[serde(rename = "quoteSummary")]
    pub quote_summary: QuoteSummary,
}

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteSummary {
    #[serde(default)]
    pub result: Option<Vec<QuoteSummaryResult>>,
    #[serde(default)]
    pub error: Option<YahooError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteSummaryResult {
    #[serde(default)]
    pub price: Option<PriceModule>,
    #[serde(default)]
    pub summary_detail: Option<SummaryDetailModule>,
    #[serde(default)]
    pub financial_data: Option<FinancialDataModule>,
    #[serde(default)]
    pub asset_profile: Option<AssetProfileModule>,
    #[serde(default)]
    pub default_key_statistics: Option<KeyStatisticsModule>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceModule {
    #[serde(default)]
    pub long_name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default)]
    pub regular_market_price: Option<RawValue>,
    #[serde(default)]
    pub market_cap: Option<RawValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryDetailModule {
    #[serde(default)]
    pub fifty_two_week_high: Option<RawValue>,
    #[serde(default)]
    pub fifty_two_week_low: Option<RawValue>,
    #[serde(default)]
    pub market_cap: Option<RawValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialDataModule {
    #[serde(default)]
    pub current_price: Option<RawValue>,
    #[serde(default)]
    pub target_low_price: Option<RawValue>,
    #[serde(default)]
    pub target_mean_price: Option<RawValue>,
    #[serde(default)]
    pub target_high_price: Option<RawValue>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetProfileModule {
    #[serde(default)]
    pub sector: Option<String>,
    #[serde(default)]
    pub industry: Option<String>,
    #[serde(default)]
    pub long_business_summary: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyStatisticsModule {
    #[serde(default)]
    pub held_percent_insiders: Option<RawValue>,
    #[serde(default)]
    pub held_percent_institutions: Option<RawValue>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartEnvelope {
    pub chart: Chart,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chart {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<YahooError>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChartResult {
    #[serde(default)]
    pub meta: ChartMeta,
    #[serde(default)]
    pub timestamp: Vec<i64>,
    #[serde(default)]
    pub indicators: ChartIndicators,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartMeta {
    /// Exchange offset from UTC, in seconds.
    #[serde(default)]
    pub gmtoffset: i32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartIndicators {
    #[serde(default)]
    pub quote: Vec<ChartQuote>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartQuote {
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<f64>>,
}

/// Items stay as raw JSON so one malformed headline does not fail the whole list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchEnvelope {
    #[serde(default)]
    pub news: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchNews {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub provider_publish_time: Option<i64>,
}
