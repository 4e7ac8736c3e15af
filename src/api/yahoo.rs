use super::MarketDataProvider;
use crate::config::ProviderConfig;
use crate::models::{HistoryBar, LivePrice, QuoteFundamentals};
use crate::{Result, ScoutError};
use async_trait::async_trait;
use chrono::DateTime;
use governor::{Quota, RateLimiter};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0";
const QUOTE_MODULES: &str = "price,summaryDetail,financialData,defaultKeyStatistics,assetProfile";
const HISTORY_RANGE: &str = "1y";
const LIVE_RANGE: &str = "1d";

type YahooRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Yahoo Finance client for quotes, fundamentals and daily history
///
/// Cloneable; all clones share one rate limiter. Failed requests are not
/// retried here: the scanner skips the ticker and the next refresh tries again.
#[derive(Clone)]
pub struct YahooProvider {
    client: Client,
    base_url: String,
    symbol_suffix: String,
    rate_limiter: Arc<YahooRateLimiter>,
}

// ---- /v8/finance/chart ----

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    result: Option<Vec<ChartResult>>,
    error: Option<YahooError>,
}

#[derive(Debug, Deserialize)]
struct YahooError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    #[serde(default)]
    timestamp: Vec<i64>,
    #[serde(default)]
    indicators: ChartIndicators,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    regular_market_price: Option<f64>,
    previous_close: Option<f64>,
    chart_previous_close: Option<f64>,
    #[serde(default)]
    gmtoffset: i64,
}

#[derive(Debug, Default, Deserialize)]
struct ChartIndicators {
    #[serde(default)]
    quote: Vec<ChartQuote>,
}

#[derive(Debug, Default, Deserialize)]
struct ChartQuote {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<f64>>,
}

// ---- /v10/finance/quoteSummary ----

#[derive(Debug, Deserialize)]
struct QuoteSummaryResponse {
    #[serde(rename = "quoteSummary")]
    quote_summary: QuoteSummaryEnvelope,
}

#[derive(Debug, Deserialize)]
struct QuoteSummaryEnvelope {
    result: Option<Vec<QuoteModules>>,
    error: Option<YahooError>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteModules {
    #[serde(default)]
    price: PriceModule,
    #[serde(default)]
    summary_detail: SummaryDetail,
    #[serde(default)]
    financial_data: FinancialData,
    #[serde(default)]
    default_key_statistics: KeyStatistics,
    #[serde(default)]
    asset_profile: AssetProfile,
}

/// `{"raw": 12.3, "fmt": "12.30"}`; raw is sometimes a string like "Infinity"
#[derive(Debug, Default, Deserialize)]
struct RawValue {
    raw: Option<serde_json::Value>,
}

type Raw = Option<RawValue>;

fn raw(value: &Raw) -> Option<f64> {
    value
        .as_ref()
        .and_then(|v| v.raw.as_ref())
        .and_then(|v| v.as_f64())
        .filter(|v| v.is_finite())
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PriceModule {
    regular_market_price: Raw,
    regular_market_previous_close: Raw,
    market_cap: Raw,
    long_name: Option<String>,
    short_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SummaryDetail {
    previous_close: Raw,
    market_cap: Raw,
    #[serde(rename = "trailingPE")]
    trailing_pe: Raw,
    #[serde(rename = "forwardPE")]
    forward_pe: Raw,
    average_volume: Raw,
    fifty_two_week_high: Raw,
    fifty_two_week_low: Raw,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinancialData {
    current_price: Raw,
    return_on_equity: Raw,
    debt_to_equity: Raw,
}

#[derive(Debug, Default, Deserialize)]
struct KeyStatistics {
    #[serde(rename = "forwardPE")]
    forward_pe: Raw,
}

#[derive(Debug, Default, Deserialize)]
struct AssetProfile {
    sector: Option<String>,
}

impl QuoteModules {
    fn into_fundamentals(self) -> QuoteFundamentals {
        let QuoteModules {
            price,
            summary_detail: detail,
            financial_data: financial,
            default_key_statistics: stats,
            asset_profile: profile,
        } = self;

        QuoteFundamentals {
            market_cap: raw(&price.market_cap).or(raw(&detail.market_cap)),
            current_price: raw(&financial.current_price),
            regular_market_price: raw(&price.regular_market_price),
            previous_close: raw(&detail.previous_close)
                .or(raw(&price.regular_market_previous_close)),
            trailing_pe: raw(&detail.trailing_pe),
            forward_pe: raw(&detail.forward_pe).or(raw(&stats.forward_pe)),
            return_on_equity: raw(&financial.return_on_equity),
            debt_to_equity: raw(&financial.debt_to_equity),
            average_volume: raw(&detail.average_volume),
            fifty_two_week_high: raw(&detail.fifty_two_week_high),
            fifty_two_week_low: raw(&detail.fifty_two_week_low),
            sector: non_empty(profile.sector),
            long_name: non_empty(price.long_name),
            short_name: non_empty(price.short_name),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn describe(error: Option<YahooError>, fallback: String) -> ScoutError {
    let message = error
        .and_then(|e| match (e.code, e.description) {
            (Some(code), Some(description)) => Some(format!("{}: {}", code, description)),
            (code, description) => description.or(code),
        })
        .unwrap_or(fallback);
    ScoutError::Provider(message)
}

impl YahooProvider {
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        let per_minute = NonZeroU32::new(config.requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)));

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            symbol_suffix: config.symbol_suffix.clone(),
            rate_limiter,
        })
    }

    fn symbol(&self, ticker: &str) -> String {
        format!("{}{}", ticker, self.symbol_suffix)
    }

    /// Rate-limited GET that decodes a JSON body
    async fn get_json<T: DeserializeOwned>(&self, url: &str, query: &[(&str, &str)]) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScoutError::Provider(format!(
                "Yahoo returned {} for {}",
                status, url
            )));
        }

        Ok(response.json().await?)
    }

    async fn chart(&self, ticker: &str, range: &str) -> Result<ChartResult> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, self.symbol(ticker));
        let body: ChartResponse = self
            .get_json(&url, &[("range", range), ("interval", "1d")])
            .await?;

        let envelope = body.chart;
        envelope
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| describe(envelope.error, format!("no chart data for {}", ticker)))
    }
}

#[async_trait]
impl MarketDataProvider for YahooProvider {
    async fn fundamentals(&self, ticker: &str) -> Result<QuoteFundamentals> {
        let url = format!(
            "{}/v10/finance/quoteSummary/{}",
            self.base_url,
            self.symbol(ticker)
        );
        let body: QuoteSummaryResponse = self.get_json(&url, &[("modules", QUOTE_MODULES)]).await?;

        let envelope = body.quote_summary;
        envelope
            .result
            .and_then(|results| results.into_iter().next())
            .map(QuoteModules::into_fundamentals)
            .ok_or_else(|| describe(envelope.error, format!("no quote summary for {}", ticker)))
    }

    async fn history(&self, ticker: &str) -> Result<Vec<HistoryBar>> {
        let chart = self.chart(ticker, HISTORY_RANGE).await?;
        let quote = chart.indicators.quote.into_iter().next().unwrap_or_default();
        let offset = chart.meta.gmtoffset;

        let at = |column: &[Option<f64>], i: usize| column.get(i).copied().flatten();

        let bars = chart
            .timestamp
            .iter()
            .enumerate()
            .filter_map(|(i, &ts)| {
                let date = DateTime::from_timestamp(ts + offset, 0)?.date_naive();
                Some(HistoryBar {
                    date,
                    open: at(&quote.open, i),
                    high: at(&quote.high, i),
                    low: at(&quote.low, i),
                    close: at(&quote.close, i),
                    volume: at(&quote.volume, i),
                })
            })
            .collect();

        Ok(bars)
    }

    async fn live_price(&self, ticker: &str) -> Result<LivePrice> {
        let meta = self.chart(ticker, LIVE_RANGE).await?.meta;
        Ok(LivePrice {
            last_price: meta.regular_market_price,
            previous_close: meta.previous_close.or(meta.chart_previous_close),
        })
    }
}
