//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! SignalFx metrics API client

use async_trait::async_trait;
use framebridge_core::{BridgeError, BridgeResult};
use reqwest::{Client, StatusCode, Url};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;
use std::fmt;
use tracing::debug;

use super::records::{DatapointRequest, MetricMetadata, Series, SeriesPoint};
use super::MetricsClient;

/// Header carrying the API token
pub const TOKEN_HEADER: &str = "X-SF-Token";

const METRIC_PATH: &str = "/v2/metric";
const TIMESERIES_WINDOW_PATH: &str = "/v1/timeserieswindow";
const METRIC_LIST_LIMIT: &str = "10000";

/// HTTP client for the metric catalog and timeseries window endpoints
pub struct SignalFxClient {
    http: Client,
    base_url: String,
    token: String,
}

impl SignalFxClient {
    /// Build a client for `host`. A host without a scheme is treated as https.
    pub fn new(host: &str, token: impl Into<String>) -> BridgeResult<Self> {
        let http = Client::builder().build().map_err(|e| {
            BridgeError::configuration_with_source("failed to build HTTP client", e)
        })?;
        Ok(Self {
            http,
            base_url: normalize_base_url(host),
            token: token.into(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> BridgeResult<Url> {
        Url::parse_with_params(&format!("{}{}", self.base_url, path), params).map_err(|e| {
            BridgeError::configuration_with_source(
                format!("invalid metrics API URL {}", self.base_url),
                e,
            )
        })
    }

    async fn get(&self, url: Url) -> BridgeResult<reqwest::Response> {
        debug!("GET {}", url.path());
        let response = self
            .http
            .get(url)
            .header(TOKEN_HEADER, &self.token)
            .send()
            .await
            .map_err(|e| transport_error("metrics API request failed", e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(status_error(status, &body))
    }
}

#[async_trait]
impl MetricsClient for SignalFxClient {
    async fn list_metrics(&self, filter: &str) -> BridgeResult<Vec<MetricMetadata>> {
        let mut params = vec![("limit", METRIC_LIST_LIMIT.to_string())];
        if !filter.trim().is_empty() {
            params.push(("query", filter.trim().to_string()));
        }
        let url = self.endpoint(METRIC_PATH, &params)?;
        let listing: MetricListResponse = self
            .get(url)
            .await?
            .json()
            .await
            .map_err(|e| transport_error("failed to decode metric listing", e))?;

        debug!(
            "Metric listing returned {} of {} results",
            listing.results.len(),
            listing.count
        );
        Ok(listing.results)
    }

    async fn get_datapoints(&self, request: &DatapointRequest) -> BridgeResult<Vec<Series>> {
        let mut params = vec![("query", request.program.clone())];
        if let Some(start) = request.start_ms {
            params.push(("startMS", start.to_string()));
        }
        if let Some(stop) = request.stop_ms {
            params.push(("endMS", stop.to_string()));
        }
        if request.resolution_ms > 0 {
            params.push(("resolution", request.resolution_ms.to_string()));
        }
        let url = self.endpoint(TIMESERIES_WINDOW_PATH, &params)?;
        let window: TimeseriesWindowResponse = self
            .get(url)
            .await?
            .json()
            .await
            .map_err(|e| transport_error("failed to decode timeseries window", e))?;

        if !window.errors.is_empty() {
            return Err(BridgeError::query(format!(
                "timeseries window reported errors: {}",
                serde_json::Value::Array(window.errors)
            )));
        }

        Ok(window
            .data
            .into_iter()
            .map(|(id, points)| Series {
                id,
                points: points
                    .into_iter()
                    .map(|(ts, value)| SeriesPoint::new(ts, value))
                    .collect(),
            })
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct MetricListResponse {
    #[serde(default)]
    count: u64,
    #[serde(default)]
    results: Vec<MetricMetadata>,
}

type RawSeries = Vec<(String, Vec<(i64, Option<f64>)>)>;

#[derive(Debug, Deserialize)]
struct TimeseriesWindowResponse {
    #[serde(default, deserialize_with = "series_in_response_order")]
    data: RawSeries,
    #[serde(default)]
    errors: Vec<serde_json::Value>,
}

/// Keep series in the order the API wrote them.
fn series_in_response_order<'de, D: Deserializer<'de>>(deserializer: D) -> Result<RawSeries, D::Error> {
    struct SeriesVisitor;

    impl<'de> Visitor<'de> for SeriesVisitor {
        type Value = RawSeries;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a map of series id to [timestamp, value] pairs")
        }

        fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
            let mut series = Vec::with_capacity(access.size_hint().unwrap_or(0));
            while let Some(entry) = access.next_entry()? {
                series.push(entry);
            }
            Ok(series)
        }
    }

    deserializer.deserialize_any(SeriesVisitor)
}

fn normalize_base_url(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

fn transport_error(context: &str, err: reqwest::Error) -> BridgeError {
    if err.is_timeout() {
        BridgeError::timeout_with_source(context, err)
    } else if err.is_connect() || err.is_request() {
        BridgeError::connection_with_source(context, err)
    } else if err.is_decode() {
        BridgeError::serialization_with_source(context, err)
    } else {
        BridgeError::query_with_source(context, err)
    }
}

fn status_error(status: StatusCode, body: &str) -> BridgeError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            BridgeError::authentication(format!("metrics API rejected the token: HTTP {}", status))
        }
        s if s.is_server_error() => {
            BridgeError::connection(format!("metrics API unavailable: HTTP {} {}", status, body))
        }
        _ => BridgeError::query(format!("metrics API request failed: HTTP {} {}", status, body)),
    }
}
