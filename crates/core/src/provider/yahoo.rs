use crate::config::Settings;
use crate::domain::quote::{
    AnalystTargets, CompanyProfile, DailyBar, Holdings, MarketSnapshot, NewsItem, Quote,
};
use crate::provider::types::{
    raw, ChartEnvelope, ChartResult, QuoteSummaryEnvelope, QuoteSummaryResult, SearchEnvelope,
    SearchNews,
};
use crate::provider::MarketDataProvider;
use crate::time::{publish_time, HistoryWindow};
use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, FixedOffset};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

const SUMMARY_MODULES: &str =
    "price,summaryDetail,financialData,assetProfile,defaultKeyStatistics";
// quoteSummary rejects non-browser agents with 429s.
const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

#[derive(Debug)]
pub struct YahooProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    cookie_url: String,
    use_crumb: bool,

    // The crumb is bound to the session cookie held in `http`, so it lives as long as the client.
    crumb: tokio::sync::Mutex<Option<String>>,
}

impl YahooProvider {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(settings.data_provider_timeout_secs))
            .build()
            .context("failed to build data provider http client")?;

        Ok(Self {
            http,
            base_url: settings.data_provider_base_url.clone(),
            api_key: settings.data_provider_api_key.clone(),
            cookie_url: settings.data_provider_cookie_url.clone(),
            use_crumb: settings.data_provider_use_crumb,
            crumb: tokio::sync::Mutex::new(None),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("invalid DATA_PROVIDER_BASE_URL: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("DATA_PROVIDER_BASE_URL cannot carry a path: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        if let Some(api_key) = &self.api_key {
            headers.insert("x-api-key", HeaderValue::from_str(api_key)?);
        }
        Ok(headers)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, String)]) -> Result<T> {
        let res = self
            .http
            .get(url.clone())
            .headers(self.headers()?)
            .query(query)
            .send()
            .await
            .with_context(|| format!("data provider request failed: {}", url.path()))?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read provider response")?;
        if status == StatusCode::UNAUTHORIZED {
            // Stale crumb or expired session cookie; the next lookup starts a new session.
            self.forget_crumb().await;
        }
        let raw_json = serde_json::from_str::<Value>(&text)
            .with_context(|| format!("provider response is not valid JSON: {text}"))?;

        if !status.is_success() {
            bail!("data provider HTTP {status}: {raw_json}");
        }

        serde_json::from_value::<T>(raw_json)
            .with_context(|| format!("unexpected provider response shape at {}", url.path()))
    }

    /// Session crumb for quoteSummary, fetched once and reused until a 401 clears it.
    async fn crumb(&self) -> Result<Option<String>> {
        if !self.use_crumb {
            return Ok(None);
        }

        let mut guard = self.crumb.lock().await;
        if let Some(crumb) = guard.as_ref() {
            return Ok(Some(crumb.clone()));
        }

        // This page usually answers 404; only its Set-Cookie matters.
        if let Err(err) = self
            .http
            .get(&self.cookie_url)
            .headers(self.headers()?)
            .send()
            .await
        {
            tracing::warn!(cookie_url = %self.cookie_url, error = %err, "session cookie request failed");
        }

        let url = self.endpoint(&["v1", "test", "getcrumb"])?;
        let res = self
            .http
            .get(url)
            .headers(self.headers()?)
            .send()
            .await
            .context("crumb request failed")?;
        let status = res.status();
        let text = res.text().await.context("failed to read crumb response")?;
        let crumb = parse_crumb(status, &text)?;

        tracing::debug!("data provider session crumb issued");
        *guard = Some(crumb.clone());
        Ok(Some(crumb))
    }

    async fn forget_crumb(&self) {
        *self.crumb.lock().await = None;
    }

    async fn fetch_summary(&self, symbol: &str) -> Result<QuoteSummaryResult> {
        let crumb = match self.crumb().await {
            Ok(crumb) => crumb,
            Err(err) => {
                tracing::warn!(%symbol, error = %format!("{err:#}"), "crumb lookup failed; requesting quote summary without one");
                None
            }
        };
        let url = self.endpoint(&["v10", "finance", "quoteSummary", symbol])?;
        let envelope: QuoteSummaryEnvelope = self
            .get_json(url, &summary_query(crumb.as_deref()))
            .await?;
        first_summary(envelope)
    }

    async fn fetch_history(&self, symbol: &str, window: HistoryWindow) -> Result<Vec<DailyBar>> {
        let url = self.endpoint(&["v8", "finance", "chart", symbol])?;
        let envelope: ChartEnvelope = self
            .get_json(
                url,
                &[
                    ("period1", window.start.timestamp().to_string()),
                    ("period2", window.end.timestamp().to_string()),
                    ("interval", "1d".to_string()),
                ],
            )
            .await?;
        chart_into_bars(envelope)
    }

    async fn fetch_news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsItem>> {
        let url = self.endpoint(&["v1", "finance", "search"])?;
        let envelope: SearchEnvelope = self
            .get_json(
                url,
                &[
                    ("q", symbol.to_string()),
                    ("quotesCount", "0".to_string()),
                    ("newsCount", limit.to_string()),
                ],
            )
            .await?;
        Ok(search_into_news(envelope, limit))
    }
}

#[async_trait::async_trait]
impl MarketDataProvider for YahooProvider {
    fn provider_name(&self) -> &'static str {
        "yahoo_finance"
    }

    async fn fetch_snapshot(
        &self,
        symbol: &str,
        window: HistoryWindow,
        news_limit: usize,
    ) -> Result<MarketSnapshot> {
        let summary = self
            .fetch_summary(symbol)
            .await
            .with_context(|| format!("quote summary lookup failed for {symbol}"))?;
        let history = self
            .fetch_history(symbol, window)
            .await
            .with_context(|| format!("price history lookup failed for {symbol}"))?;

        // Headlines are optional; the report carries a notice instead.
        let news = match self.fetch_news(symbol, news_limit).await {
            Ok(news) => news,
            Err(err) => {
                tracing::warn!(%symbol, error = %err, "news lookup failed; continuing without headlines");
                Vec::new()
            }
        };

        let (quote, profile, holdings, analyst_targets) = summary_into_parts(symbol, summary);
        Ok(MarketSnapshot {
            quote,
            profile,
            holdings,
            analyst_targets,
            history,
            news,
        })
    }
}

fn summary_query(crumb: Option<&str>) -> Vec<(&'static str, String)> {
    let mut query = vec![("modules", SUMMARY_MODULES.to_string())];
    if let Some(crumb) = crumb {
        query.push(("crumb", crumb.to_string()));
    }
    query
}

/// The crumb endpoint answers with the bare token as text; anything else means no session.
pub(crate) fn parse_crumb(status: StatusCode, body: &str) -> Result<String> {
    let crumb = body.trim();
    if !status.is_success() {
        bail!("crumb endpoint HTTP {status}: {crumb}");
    }
    if crumb.is_empty() || crumb.contains('<') || crumb.contains(char::is_whitespace) {
        bail!("crumb endpoint returned no usable crumb");
    }
    Ok(crumb.to_string())
}

fn first_summary(envelope: QuoteSummaryEnvelope) -> Result<QuoteSummaryResult> {
    if let Some(err) = envelope.quote_summary.error {
        bail!("provider error: {err}");
    }
    envelope
        .quote_summary
        .result
        .and_then(|r| r.into_iter().next())
        .context("provider returned no quote data")
}

pub(crate) fn summary_into_parts(
    symbol: &str,
    summary: QuoteSummaryResult,
) -> (Quote, CompanyProfile, Holdings, AnalystTargets) {
    let price = summary.price.unwrap_or_default();
    let detail = summary.summary_detail.unwrap_or_default();
    let financial = summary.financial_data.unwrap_or_default();
    let profile = summary.asset_profile.unwrap_or_default();
    let stats = summary.default_key_statistics.unwrap_or_default();

    let market_cap = raw(&price.market_cap)
        .or_else(|| raw(&detail.market_cap))
        .filter(|v| *v >= 0.0)
        .map(|v| v as u64)
        .unwrap_or(0);

    let quote = Quote {
        symbol: symbol.to_string(),
        current_price: raw(&financial.current_price).or_else(|| raw(&price.regular_market_price)),
        fifty_two_week_high: raw(&detail.fifty_two_week_high),
        fifty_two_week_low: raw(&detail.fifty_two_week_low),
        market_cap,
    };

    let company = CompanyProfile {
        long_name: non_blank(price.long_name).or_else(|| non_blank(price.short_name)),
        sector: non_blank(profile.sector),
        industry: non_blank(profile.industry),
        business_summary: non_blank(profile.long_business_summary),
    };

    let holdings = Holdings {
        insiders: raw(&stats.held_percent_insiders),
        institutions: raw(&stats.held_percent_institutions),
    };

    let targets = AnalystTargets {
        low: raw(&financial.target_low_price),
        mean: raw(&financial.target_mean_price),
        high: raw(&financial.target_high_price),
    };

    (quote, company, holdings, targets)
}

pub(crate) fn chart_into_bars(envelope: ChartEnvelope) -> Result<Vec<DailyBar>> {
    if let Some(err) = envelope.chart.error {
        bail!("provider error: {err}");
    }
    let result: ChartResult = envelope
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .context("provider returned no price history")?;

    let offset = FixedOffset::east_opt(result.meta.gmtoffset)
        .with_context(|| format!("invalid exchange gmtoffset: {}", result.meta.gmtoffset))?;
    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();

    let mut bars = Vec::with_capacity(result.timestamp.len());
    for (idx, ts) in result.timestamp.iter().enumerate() {
        let Some(close) = quote.close.get(idx).copied().flatten() else {
            continue;
        };
        let Some(at) = DateTime::from_timestamp(*ts, 0) else {
            continue;
        };
        let volume = quote
            .volume
            .get(idx)
            .copied()
            .flatten()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v as u64)
            .unwrap_or(0);

        bars.push(DailyBar {
            date: at.with_timezone(&offset).date_naive(),
            close,
            volume,
        });
    }

    Ok(bars)
}

/// Items that fail to decode or lack a title or publish time are skipped, not fatal.
pub(crate) fn search_into_news(envelope: SearchEnvelope, limit: usize) -> Vec<NewsItem> {
    envelope
        .news
        .into_iter()
        .filter_map(|item| serde_json::from_value::<SearchNews>(item).ok())
        .filter_map(|n| {
            let title = non_blank(n.title)?;
            Some(NewsItem {
                title,
                published_at: publish_time(n.provider_publish_time?)?,
            })
        })
        .take(limit)
        .collect()
}

fn non_blank(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn provider(base_url: &str) -> YahooProvider {
        let settings = Settings {
            data_provider_base_url: base_url.to_string(),
            ..Settings::default()
        };
        YahooProvider::from_settings(&settings).unwrap()
    }

    #[test]
    fn endpoint_appends_escaped_segments() {
        let p = provider("https://query1.finance.yahoo.com/");
        let url = p.endpoint(&["v10", "finance", "quoteSummary", "BRK/B"]).unwrap();
        assert_eq!(
            url.as_str(),
            "https://query1.finance.yahoo.com/v10/finance/quoteSummary/BRK%2FB"
        );

        let p = provider("http://localhost:8080/proxy");
        let url = p.endpoint(&["v8", "finance", "chart", "TCS.NS"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/proxy/v8/finance/chart/TCS.NS");
    }

    #[test]
    fn parses_quote_summary_into_parts() {
        let v = json!({
            "quoteSummary": {
                "result": [{
                    "price": {
                        "longName": "Tata Consultancy Services Limited",
                        "regularMarketPrice": {"raw": 4010.5, "fmt": "4,010.50"},
                        "marketCap": {"raw": 14512345678901.0, "fmt": "14.51T"}
                    },
                    "summaryDetail": {
                        "fiftyTwoWeekHigh": {"raw": 4592.25},
                        "fiftyTwoWeekLow": {"raw": 3311.0}
                    },
                    "financialData": {
                        "currentPrice": {"raw": 4000.0},
                        "targetLowPrice": {"raw": 3500.0},
                        "targetMeanPrice": {"raw": 4300.0},
                        "targetHighPrice": {}
                    },
                    "assetProfile": {
                        "sector": "Technology",
                        "industry": "Information Technology Services",
                        "longBusinessSummary": "Provides IT services. Operates globally."
                    },
                    "defaultKeyStatistics": {
                        "heldPercentInsiders": {"raw": 0.7177},
                        "heldPercentInstitutions": {"raw": 0.2261}
                    }
                }],
                "error": null
            }
        });

        let envelope: QuoteSummaryEnvelope = serde_json::from_value(v).unwrap();
        let summary = first_summary(envelope).unwrap();
        let (quote, profile, holdings, targets) = summary_into_parts("TCS.NS", summary);

        assert_eq!(quote.symbol, "TCS.NS");
        assert_eq!(quote.current_price, Some(4000.0));
        assert_eq!(quote.fifty_two_week_high, Some(4592.25));
        assert_eq!(quote.market_cap, 14_512_345_678_901);
        assert_eq!(profile.sector.as_deref(), Some("Technology"));
        assert_eq!(holdings.insiders, Some(0.7177));
        assert_eq!(targets.low, Some(3500.0));
        assert_eq!(targets.high, None);
    }

    #[test]
    fn falls_back_to_regular_market_price() {
        let v = json!({
            "quoteSummary": {
                "result": [{
                    "price": {"shortName": "Apple", "regularMarketPrice": {"raw": 190.0}}
                }]
            }
        });
        let envelope: QuoteSummaryEnvelope = serde_json::from_value(v).unwrap();
        let (quote, profile, holdings, _) =
            summary_into_parts("AAPL", first_summary(envelope).unwrap());
        assert_eq!(quote.current_price, Some(190.0));
        assert_eq!(quote.market_cap, 0);
        assert_eq!(profile.long_name.as_deref(), Some("Apple"));
        assert_eq!(holdings, Holdings::default());
    }

    #[test]
    fn quote_summary_error_is_a_failure() {
        let v = json!({
            "quoteSummary": {
                "result": null,
                "error": {"code": "Not Found", "description": "Quote not found for symbol: NOPE"}
            }
        });
        let envelope: QuoteSummaryEnvelope = serde_json::from_value(v).unwrap();
        let err = first_summary(envelope).unwrap_err();
        assert!(err.to_string().contains("Not Found"));

        let empty: QuoteSummaryEnvelope =
            serde_json::from_value(json!({"quoteSummary": {"result": []}})).unwrap();
        assert!(first_summary(empty).is_err());
    }

    #[test]
    fn chart_skips_null_closes_and_uses_exchange_dates() {
        // 2026-01-26 22:00 UTC is 2026-01-27 03:30 in IST.
        let v = json!({
            "chart": {
                "result": [{
                    "meta": {"gmtoffset": 19800},
                    "timestamp": [1769464800, 1769551200, 1769637600],
                    "indicators": {"quote": [{
                        "close": [100.5, null, 102.25],
                        "volume": [1200, 1300, null]
                    }]}
                }],
                "error": null
            }
        });
        let envelope: ChartEnvelope = serde_json::from_value(v).unwrap();
        let bars = chart_into_bars(envelope).unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].date, NaiveDate::from_ymd_opt(2026, 1, 27).unwrap());
        assert_eq!(bars[0].close, 100.5);
        assert_eq!(bars[0].volume, 1200);
        assert_eq!(bars[1].close, 102.25);
        assert_eq!(bars[1].volume, 0);
    }

    #[test]
    fn chart_error_is_a_failure() {
        let v = json!({
            "chart": {"result": null, "error": {"code": "Not Found", "description": "No data found"}}
        });
        let envelope: ChartEnvelope = serde_json::from_value(v).unwrap();
        assert!(chart_into_bars(envelope).is_err());
    }

    #[test]
    fn news_is_trimmed_and_limited() {
        let v = json!({
            "news": [
                {"title": "  First headline ", "providerPublishTime": 1769526300},
                {"title": "", "providerPublishTime": 1769526300},
                {"title": "Second", "providerPublishTime": 1769526400},
                {"title": "Third", "providerPublishTime": 1769526500}
            ]
        });
        let envelope: SearchEnvelope = serde_json::from_value(v).unwrap();
        let news = search_into_news(envelope, 2);
        assert_eq!(news.len(), 2);
        assert_eq!(news[0].title, "First headline");
        assert_eq!(news[1].title, "Second");
    }

    #[test]
    fn malformed_news_items_are_skipped() {
        let v = json!({
            "news": [
                {"title": "No timestamp"},
                {"title": null, "providerPublishTime": 1769526300},
                {"title": 42, "providerPublishTime": 1769526300},
                {"title": "Stringly time", "providerPublishTime": "1769526300"},
                "not an object",
                {"uuid": "abc", "title": "Kept", "providerPublishTime": 1769526400, "thumbnail": null},
                {"title": "Also kept", "providerPublishTime": 1769526500}
            ]
        });
        let envelope: SearchEnvelope = serde_json::from_value(v).unwrap();
        let news = search_into_news(envelope, 5);
        let titles: Vec<&str> = news.iter().map(|n| n.title.as_str()).collect();
        assert_eq!(titles, vec!["Kept", "Also kept"]);
    }

    #[test]
    fn missing_news_key_is_empty() {
        let envelope: SearchEnvelope = serde_json::from_value(json!({"quotes": []})).unwrap();
        assert!(search_into_news(envelope, 5).is_empty());
    }

    #[test]
    fn headers_look_like_a_browser() {
        let p = provider("https://query1.finance.yahoo.com");
        let headers = p.headers().unwrap();
        assert!(headers[USER_AGENT].to_str().unwrap().starts_with("Mozilla/5.0"));
        assert!(headers.get("x-api-key").is_none());
    }

    #[test]
    fn crumb_body_must_be_a_bare_token() {
        assert_eq!(parse_crumb(StatusCode::OK, "  aB3.xY/9z\n").unwrap(), "aB3.xY/9z");
        assert!(parse_crumb(StatusCode::OK, "").is_err());
        assert!(parse_crumb(StatusCode::OK, "<html><body>Too Many Requests</body></html>").is_err());
        assert!(parse_crumb(StatusCode::TOO_MANY_REQUESTS, "Too Many Requests").is_err());
        assert!(parse_crumb(StatusCode::UNAUTHORIZED, "aB3xY").is_err());
    }

    #[test]
    fn summary_query_carries_crumb_when_present() {
        let query = summary_query(Some("aB3xY"));
        assert_eq!(query[0], ("modules", SUMMARY_MODULES.to_string()));
        assert_eq!(query[1], ("crumb", "aB3xY".to_string()));

        assert_eq!(summary_query(None).len(), 1);
    }

    #[tokio::test]
    async fn cached_crumb_is_reused_until_forgotten() {
        let p = provider("https://query1.finance.yahoo.com");
        *p.crumb.lock().await = Some("aB3xY".to_string());
        assert_eq!(p.crumb().await.unwrap().as_deref(), Some("aB3xY"));

        p.forget_crumb().await;
        assert!(p.crumb.lock().await.is_none());
    }

    #[tokio::test]
    async fn crumb_disabled_skips_session() {
        let settings = Settings {
            data_provider_use_crumb: false,
            ..Settings::default()
        };
        let p = YahooProvider::from_settings(&settings).unwrap();
        assert_eq!(p.crumb().await.unwrap(), None);
    }
}
