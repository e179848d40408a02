use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use pt_schemas::Bar;

#[derive(Debug)]
pub enum FetchError {
    RateLimited,
    Forbidden,
    Timeout,
    Http(String),
    Malformed(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::RateLimited => write!(f, "rate limited (429)"),
            FetchError::Forbidden => write!(f, "forbidden (403)"),
            FetchError::Timeout => write!(f, "request timed out"),
            FetchError::Http(s) => write!(f, "http error: {s}"),
            FetchError::Malformed(s) => write!(f, "malformed response: {s}"),
        }
    }
}

impl std::error::Error for FetchError {}

impl FetchError {
    /// The error class the cooldown backoff curve keys off of. Everything
    /// that isn't a 429 or 403 shares the same (gentler) curve.
    pub fn error_code(&self) -> &'static str {
        match self {
            FetchError::RateLimited => "429",
            FetchError::Forbidden => "403",
            FetchError::Timeout => "timeout",
            FetchError::Http(_) => "http",
            FetchError::Malformed(_) => "malformed",
        }
    }
}

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(3);
pub const USER_AGENT: &str = "pt-feed/0.1";

#[async_trait]
pub trait OhlcvProvider: Send + Sync {
    fn name(&self) -> &str;
    async fn fetch(&self, symbol: &str, timeframe: &str, limit: u32) -> Result<Vec<Bar>, FetchError>;
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(FETCH_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()
        .expect("reqwest client builds with static config")
}

fn classify_status(status: reqwest::StatusCode) -> FetchError {
    match status.as_u16() {
        429 => FetchError::RateLimited,
        403 => FetchError::Forbidden,
        other => FetchError::Http(format!("status {other}")),
    }
}

fn classify_reqwest_error(e: reqwest::Error) -> FetchError {
    if e.is_timeout() {
        FetchError::Timeout
    } else if let Some(status) = e.status() {
        classify_status(status)
    } else {
        FetchError::Http(e.to_string())
    }
}

/// Binance spot/perp kline provider. Binance interval strings match this
/// crate's timeframe spelling (`"1m"`, `"15m"`, `"1h"`, `"1d"`) directly.
pub struct BinanceProvider {
    name: String,
    host: String,
    client: reqwest::Client,
}

impl BinanceProvider {
    pub fn new(name: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: host.into(),
            client: client(),
        }
    }

    pub fn us() -> Self {
        Self::new("binance_us", "https://api.binance.us")
    }

    pub fn global() -> Self {
        Self::new("binance", "https://api.binance.com")
    }
}

#[async_trait]
impl OhlcvProvider for BinanceProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, symbol: &str, timeframe: &str, limit: u32) -> Result<Vec<Bar>, FetchError> {
        let url = format!(
            "{}/api/v3/klines?symbol={}&interval={}&limit={}",
            self.host, symbol, timeframe, limit
        );
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(classify_reqwest_error)?;
        if !resp.status().is_success() {
            return Err(classify_status(resp.status()));
        }
        let rows: Vec<Vec<serde_json::Value>> = resp
            .json()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        let mut bars = Vec::with_capacity(rows.len());
        for row in rows {
            bars.push(parse_binance_row(&row)?);
        }
        Ok(bars)
    }
}

fn parse_binance_row(row: &[serde_json::Value]) -> Result<Bar, FetchError> {
    let bad = || FetchError::Malformed("unexpected kline row shape".to_string());
    let open_time_ms = row.first().and_then(|v| v.as_i64()).ok_or_else(bad)?;
    let parse_f64 = |v: &serde_json::Value| -> Result<f64, FetchError> {
        v.as_str()
            .and_then(|s| s.parse::<f64>().ok())
            .or_else(|| v.as_f64())
            .ok_or_else(bad)
    };
    let open = parse_f64(row.get(1).ok_or_else(bad)?)?;
    let high = parse_f64(row.get(2).ok_or_else(bad)?)?;
    let low = parse_f64(row.get(3).ok_or_else(bad)?)?;
    let close = parse_f64(row.get(4).ok_or_else(bad)?)?;
    let volume = parse_f64(row.get(5).ok_or_else(bad)?)?;
    let ts = Utc
        .timestamp_millis_opt(open_time_ms)
        .single()
        .ok_or_else(bad)?;
    Ok(Bar {
        ts,
        open,
        high,
        low,
        close,
        volume,
    })
}

/// OKX candle provider. OKX spells the hour/day bar size in uppercase and
/// symbols with a dash before the quote asset.
pub struct OkxProvider {
    client: reqwest::Client,
    host: String,
}

impl OkxProvider {
    pub fn new() -> Self {
        Self {
            client: client(),
            host: "https://www.okx.com".to_string(),
        }
    }
}

impl Default for OkxProvider {
    fn default() -> Self {
        Self::new()
    }
}

fn okx_interval(timeframe: &str) -> String {
    match timeframe {
        "1h" => "1H".to_string(),
        "1d" => "1D".to_string(),
        other => other.to_string(),
    }
}

/// `"ETHUSDT"` -> `"ETH-USDT"`, `"BTCUSDT"` -> `"BTC-USDT"`. Falls back to
/// the input unchanged if no recognized quote-asset suffix is found.
fn okx_symbol(symbol: &str) -> String {
    for quote in ["USDT", "USDC", "USD"] {
        if let Some(base) = symbol.strip_suffix(quote) {
            if !base.is_empty() {
                return format!("{base}-{quote}");
            }
        }
    }
    symbol.to_string()
}

#[async_trait]
impl OhlcvProvider for OkxProvider {
    fn name(&self) -> &str {
        "okx"
    }

    async fn fetch(&self, symbol: &str, timeframe: &str, limit: u32) -> Result<Vec<Bar>, FetchError> {
        let url = format!(
            "{}/api/v5/market/candles?instId={}&bar={}&limit={}",
            self.host,
            okx_symbol(symbol),
            okx_interval(timeframe),
            limit
        );
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(classify_reqwest_error)?;
        if !resp.status().is_success() {
            return Err(classify_status(resp.status()));
        }
        #[derive(serde::Deserialize)]
        struct OkxEnvelope {
            data: Vec<Vec<String>>,
        }
        let envelope: OkxEnvelope = resp
            .json()
            .await
            .map_err(|e| FetchError::Malformed(e.to_string()))?;

        let mut bars = Vec::with_capacity(envelope.data.len());
        for row in envelope.data.iter().rev() {
            // OKX returns newest-first; reverse to chronological order.
            bars.push(parse_okx_row(row)?);
        }
        Ok(bars)
    }
}

fn parse_okx_row(row: &[String]) -> Result<Bar, FetchError> {
    let bad = || FetchError::Malformed("unexpected candle row shape".to_string());
    let parse_at = |i: usize| -> Result<f64, FetchError> {
        row.get(i).and_then(|s| s.parse::<f64>().ok()).ok_or_else(bad)
    };
    let ts_ms: i64 = row.first().and_then(|s| s.parse().ok()).ok_or_else(bad)?;
    let ts = Utc.timestamp_millis_opt(ts_ms).single().ok_or_else(bad)?;
    Ok(Bar {
        ts,
        open: parse_at(1)?,
        high: parse_at(2)?,
        low: parse_at(3)?,
        close: parse_at(4)?,
        volume: parse_at(5)?,
    })
}
