use crate::analysis;
use crate::config::{DEFAULT_CURRENCY_SYMBOL, DEFAULT_HISTORY_DAYS, DEFAULT_NEWS_LIMIT};
use crate::domain::quote::{CompanyProfile, MarketSnapshot};
use crate::domain::report::{
    AnalysisReport, CompanyOverview, FinancialOverview, NewsHeadline, SeriesPoint,
};
use crate::error::AnalysisError;
use crate::provider::MarketDataProvider;
use crate::time::{format_publish_time, history_window};
use chrono::{DateTime, Utc};

const NOT_AVAILABLE: &str = "N/A";
const NO_SUMMARY: &str = "Information not available.";
const SUMMARY_POINTS: usize = 3;
pub const NEWS_NOTICE: &str = "Company-specific news is not always available from the market data provider's free API, so recent headlines may be missing.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportOptions {
    pub history_days: i64,
    pub news_limit: usize,
    pub currency_symbol: String,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            history_days: DEFAULT_HISTORY_DAYS,
            news_limit: DEFAULT_NEWS_LIMIT,
            currency_symbol: DEFAULT_CURRENCY_SYMBOL.to_string(),
        }
    }
}

/// Fetches one symbol and derives every figure once. Any provider failure aborts the whole
/// analysis; no partial report is produced.
pub async fn analyze(
    provider: &dyn MarketDataProvider,
    symbol: &str,
    now: DateTime<Utc>,
    options: &ReportOptions,
) -> Result<AnalysisReport, AnalysisError> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(AnalysisError::EmptySymbol);
    }

    let unavailable = |source: anyhow::Error| AnalysisError::ProviderUnavailable {
        symbol: symbol.to_string(),
        source,
    };

    let window = history_window(now, options.history_days).map_err(unavailable)?;
    let t0 = std::time::Instant::now();
    let snapshot = provider
        .fetch_snapshot(symbol, window, options.news_limit)
        .await
        .map_err(unavailable)?;

    tracing::info!(
        %symbol,
        provider = provider.provider_name(),
        bars = snapshot.history.len(),
        news = snapshot.news.len(),
        elapsed_ms = t0.elapsed().as_millis(),
        "market snapshot fetched"
    );

    build_report(&snapshot, now, options)
}

/// Pure assembly of a report from an already-fetched snapshot.
pub fn build_report(
    snapshot: &MarketSnapshot,
    now: DateTime<Utc>,
    options: &ReportOptions,
) -> Result<AnalysisReport, AnalysisError> {
    let quote = &snapshot.quote;
    let current_price = quote.current_price.unwrap_or(0.0);

    let refined_targets = analysis::refined_targets(current_price)?;
    let recommendation = analysis::recommend(refined_targets.target2.price, current_price)?;

    let analyst_consensus =
        match analysis::analyst_consensus(&snapshot.analyst_targets, current_price) {
            Ok(consensus) => Some(consensus),
            Err(AnalysisError::MissingField(field)) => {
                tracing::debug!(symbol = %quote.symbol, field, "analyst consensus omitted");
                None
            }
            Err(err) => return Err(err),
        };

    let news: Vec<NewsHeadline> = snapshot
        .news
        .iter()
        .take(options.news_limit)
        .map(|n| NewsHeadline {
            title: n.title.clone(),
            published: format_publish_time(&n.published_at),
        })
        .collect();
    let news_notice = news.is_empty().then(|| NEWS_NOTICE.to_string());

    Ok(AnalysisReport {
        symbol: quote.symbol.clone(),
        generated_at: now,
        overview: company_overview(&snapshot.profile),
        financials: FinancialOverview {
            current_price,
            fifty_two_week_high: quote.fifty_two_week_high.unwrap_or(0.0),
            fifty_two_week_low: quote.fifty_two_week_low.unwrap_or(0.0),
            market_cap: quote.market_cap,
            market_cap_display: analysis::format_market_cap(
                quote.market_cap,
                &options.currency_symbol,
            ),
        },
        price_series: snapshot
            .history
            .iter()
            .map(|b| SeriesPoint {
                date: b.date,
                value: b.close,
            })
            .collect(),
        volume_series: snapshot
            .history
            .iter()
            .map(|b| SeriesPoint {
                date: b.date,
                value: b.volume as f64,
            })
            .collect(),
        shareholding: analysis::shareholding_split(&snapshot.holdings),
        analyst_consensus,
        refined_targets,
        recommendation,
        news,
        news_notice,
    })
}

fn company_overview(profile: &CompanyProfile) -> CompanyOverview {
    let or_na = |v: &Option<String>| v.clone().unwrap_or_else(|| NOT_AVAILABLE.to_string());
    let summary = profile.business_summary.as_deref().unwrap_or(NO_SUMMARY);

    CompanyOverview {
        name: or_na(&profile.long_name),
        sector: or_na(&profile.sector),
        industry: or_na(&profile.industry),
        summary_points: summary_points(summary),
    }
}

/// First three '.'-separated pieces of the summary; blank pieces are dropped after the cut.
pub fn summary_points(summary: &str) -> Vec<String> {
    summary
        .split('.')
        .take(SUMMARY_POINTS)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
