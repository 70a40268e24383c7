use crate::error::Result;
use crate::exchange::BinanceClient;
use crate::lenient::deserialize_f64_lenient;
use serde::Deserialize;

/// 24h statistics for one pair, reduced to what ranking needs.
#[derive(Debug, Clone, PartialEq)]
pub struct TickerSnapshot {
    pub symbol: String,
    pub quote_volume: f64,
}

#[derive(Deserialize, Debug)]
struct RawTicker {
    symbol: String,
    #[serde(rename = "quoteVolume", deserialize_with = "deserialize_f64_lenient", default)]
    quote_volume: Option<f64>,
}

impl From<RawTicker> for TickerSnapshot {
    fn from(raw: RawTicker) -> Self {
        let quote_volume = raw.quote_volume.filter(|v| v.is_finite()).unwrap_or(0.0);
        Self { symbol: raw.symbol, quote_volume }
    }
}

/// Fetches the all-symbol 24h ticker. A failure here ends the run.
pub async fn fetch_tickers(client: &BinanceClient) -> Result<Vec<TickerSnapshot>> {
    let raw: Vec<RawTicker> = client.get_json("/api/v3/ticker/24hr", &[]).await?;
    Ok(raw.into_iter().map(TickerSnapshot::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn parses_snapshot_and_zeroes_bad_volume() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/ticker/24hr"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"symbol": "BTCUSDT", "quoteVolume": "1500000.5", "lastPrice": "60000"},
                {"symbol": "ETHUSDT", "quoteVolume": "oops"},
                {"symbol": "XRPUSDT"}
            ])))
            .mount(&server)
            .await;

        let client = BinanceClient::new(&server.uri(), RetryPolicy::none()).unwrap();
        let tickers = fetch_tickers(&client).await.unwrap();

        assert_eq!(
            tickers,
            vec![
                TickerSnapshot { symbol: "BTCUSDT".into(), quote_volume: 1_500_000.5 },
                TickerSnapshot { symbol: "ETHUSDT".into(), quote_volume: 0.0 },
                TickerSnapshot { symbol: "XRPUSDT".into(), quote_volume: 0.0 },
            ]
        );
    }

    #[tokio::test]
    async fn snapshot_failure_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = BinanceClient::new(&server.uri(), RetryPolicy::none()).unwrap();
        assert!(fetch_tickers(&client).await.is_err());
    }
}
