// src/infrastructure/quote/twelvedata.rs
// Twelve Data quote source

use async_trait::async_trait;
use hyper::client::HttpConnector;
use hyper::{Body, Client, Request, StatusCode, Uri};
use hyper_tls::HttpsConnector;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use tokio::time::{timeout, Duration};

use crate::domain::errors::{QuoteError, QuoteResult};
use crate::domain::repository::QuoteSource;

pub const DEFAULT_BASE_URL: &str = "https://api.twelvedata.com";

#[derive(Debug, Deserialize)]
struct TimeSeriesResponse {
    status: Option<String>,
    code: Option<i64>,
    message: Option<String>,
    values: Option<Vec<TimeSeriesValue>>,
}

#[derive(Debug, Deserialize)]
struct TimeSeriesValue {
    datetime: String,
    close: String,
}

pub struct TwelveDataQuoteSource {
    client: Client<HttpsConnector<HttpConnector>>,
    api_key: String,
    base_url: String,
    timeout_secs: u64,
}

impl TwelveDataQuoteSource {
    pub fn new(api_key: &str, base_url: &str, timeout_secs: u64) -> Self {
        let client = Client::builder().build::<_, Body>(HttpsConnector::new());
        Self {
            client,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
        }
    }

    fn endpoint(&self, symbol: &str) -> String {
        format!(
            "{}/time_series?symbol={}&interval=1min&outputsize=1&apikey={}",
            self.base_url, symbol, self.api_key
        )
    }

    async fn fetch(&self, uri: Uri) -> QuoteResult<(StatusCode, String)> {
        let request = Request::get(uri)
            .header("Content-Type", "application/json")
            .body(Body::empty())
            .map_err(|e| QuoteError::Request(e.to_string()))?;

        let response = self.client.request(request).await?;
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await?;
        let body = String::from_utf8(bytes.to_vec())
            .map_err(|e| QuoteError::Parse(format!("response is not UTF-8: {}", e)))?;

        Ok((status, body))
    }
}

#[async_trait]
impl QuoteSource for TwelveDataQuoteSource {
    async fn quote(&self, symbol: &str) -> QuoteResult<Decimal> {
        let symbol = symbol.trim().to_uppercase();
        if !is_valid_symbol(&symbol) {
            return Err(QuoteError::UnknownSymbol(symbol));
        }

        let uri: Uri = self
            .endpoint(&symbol)
            .parse()
            .map_err(|e: hyper::http::uri::InvalidUri| QuoteError::Request(e.to_string()))?;

        log::debug!("Fetching Twelve Data quote for {}", symbol);

        let (status, body) = timeout(Duration::from_secs(self.timeout_secs), self.fetch(uri))
            .await
            .map_err(|_| QuoteError::Timeout(self.timeout_secs))??;

        if !status.is_success() {
            // Error payloads still carry a useful message
            return match parse_time_series(&symbol, &body) {
                Err(e @ QuoteError::Api(_)) => Err(e),
                _ => Err(QuoteError::Api(format!("HTTP {} for {}", status, symbol))),
            };
        }

        let price = parse_time_series(&symbol, &body)?;
        log::debug!("Twelve Data quote {} = {}", symbol, price);
        Ok(price)
    }

    fn name(&self) -> &str {
        "twelvedata"
    }
}

fn is_valid_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '-' | ':'))
}

/// Extract the latest close from a `time_series` response body
pub(crate) fn parse_time_series(symbol: &str, body: &str) -> QuoteResult<Decimal> {
    let response: TimeSeriesResponse = serde_json::from_str(body)
        .map_err(|e| QuoteError::Parse(format!("invalid response for {}: {}", symbol, e)))?;

    if response.status.as_deref() == Some("error") || response.code == Some(400) {
        return Err(QuoteError::Api(
            response
                .message
                .unwrap_or_else(|| "API returned an error".to_string()),
        ));
    }

    let latest = response
        .values
        .and_then(|values| values.into_iter().next())
        .ok_or_else(|| QuoteError::NoData(symbol.to_string()))?;

    let price = Decimal::from_str(latest.close.trim()).map_err(|e| {
        QuoteError::Parse(format!(
            "bad close {:?} for {} at {}: {}",
            latest.close, symbol, latest.datetime, e
        ))
    })?;

    if price <= Decimal::ZERO {
        return Err(QuoteError::Parse(format!(
            "non-positive close {} for {}",
            price, symbol
        )));
    }

    Ok(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_latest_close() {
        let body = r#"{
            "meta": {"symbol": "AAPL", "interval": "1min"},
            "values": [
                {"datetime": "2024-05-01 15:59:00", "open": "169.5", "high": "169.9",
                 "low": "169.4", "close": "169.81", "volume": "1200"},
                {"datetime": "2024-05-01 15:58:00", "open": "169.2", "high": "169.6",
                 "low": "169.1", "close": "169.50", "volume": "900"}
            ],
            "status": "ok"
        }"#;
        assert_eq!(parse_time_series("AAPL", body).unwrap(), dec!(169.81));
    }

    #[test]
    fn test_parse_error_payload() {
        let body = r#"{"code": 400, "message": "**symbol** not found: XXXX", "status": "error"}"#;
        match parse_time_series("XXXX", body) {
            Err(QuoteError::Api(msg)) => assert!(msg.contains("not found")),
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_missing_values() {
        let body = r#"{"meta": {"symbol": "AAPL"}, "status": "ok"}"#;
        assert!(matches!(
            parse_time_series("AAPL", body),
            Err(QuoteError::NoData(_))
        ));

        let body = r#"{"values": [{"datetime": "x", "close": "0"}], "status": "ok"}"#;
        assert!(matches!(
            parse_time_series("AAPL", body),
            Err(QuoteError::Parse(_))
        ));
    }

    #[test]
    fn test_symbol_filter() {
        assert!(is_valid_symbol("BTC/USD"));
        assert!(is_valid_symbol("BRK.B"));
        assert!(!is_valid_symbol("AAPL&apikey=x"));
        assert!(!is_valid_symbol(""));
    }
}
