//! NAV history source backed by the free mfapi.in mutual fund API.
//!
//! mfapi.in serves the full published NAV history for an AMFI scheme code
//! in a single response. Dates arrive as `dd-mm-YYYY` strings and NAVs as
//! decimal strings; no API key is required.

use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::models::SchemeCode;
use crate::navdata::{NavPoint, NavSource};

const MFAPI_BASE_URL: &str = "https://api.mfapi.in";

/// Response from mfapi.in for one scheme.
#[derive(Debug, Deserialize)]
struct MfapiResponse {
    /// NAV rows, newest first. Empty (or absent) for unknown schemes.
    #[serde(default)]
    data: Vec<MfapiNavRow>,
}

#[derive(Debug, Deserialize)]
struct MfapiNavRow {
    /// `dd-mm-YYYY`.
    date: String,
    /// Decimal string, e.g. `"81.1916"`.
    nav: String,
}

/// mfapi.in NAV source.
#[derive(Debug, Clone)]
pub struct MfapiNavSource {
    client: Client,
    base_url: String,
}

impl MfapiNavSource {
    /// Creates a new mfapi.in source with a default HTTP client.
    pub fn new() -> Self {
        Self {
            client: Client::new(),
            base_url: MFAPI_BASE_URL.to_string(),
        }
    }

    /// Creates a source with a custom HTTP client.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Points the source at a different base URL (tests, mirrors).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn parse_rows(&self, scheme: SchemeCode, rows: Vec<MfapiNavRow>) -> Result<Vec<NavPoint>> {
        let fetched_at = Utc::now();
        let mut points = Vec::with_capacity(rows.len());

        for row in rows {
            let date = NaiveDate::parse_from_str(&row.date, "%d-%m-%Y")
                .with_context(|| format!("Invalid NAV date: {}", row.date))?;
            let nav = Decimal::from_str(row.nav.trim())
                .with_context(|| format!("Invalid NAV value: {}", row.nav))?;
            if nav <= Decimal::ZERO {
                // mfapi pads some histories with zero rows before launch.
                continue;
            }
            points.push(NavPoint::new(scheme, date, nav, self.name(), fetched_at));
        }

        // API order is newest-first; callers expect ascending.
        points.sort_by_key(|p| p.date);
        Ok(points)
    }
}

impl Default for MfapiNavSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl NavSource for MfapiNavSource {
    async fn fetch_history(&self, scheme: SchemeCode) -> Result<Vec<NavPoint>> {
        let url = format!("{}/mf/{}", self.base_url, scheme);

        let response = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .json::<MfapiResponse>()
            .await?;

        self.parse_rows(scheme, response.data)
    }

    fn name(&self) -> &str {
        "mfapi"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    /// Sample mfapi.in response for a scheme with three published NAVs.
    const SAMPLE_RESPONSE: &str = r#"{
        "meta": {
            "fund_house": "Example Mutual Fund",
            "scheme_type": "Open Ended Schemes",
            "scheme_code": 120503,
            "scheme_name": "Example Growth Fund - Direct Plan"
        },
        "data": [
            {"date": "07-03-2024", "nav": "81.1916"},
            {"date": "06-03-2024", "nav": "80.9500"},
            {"date": "05-03-2024", "nav": "81.0333"}
        ],
        "status": "SUCCESS"
    }"#;

    /// mfapi.in answers unknown schemes with an empty payload.
    const UNKNOWN_SCHEME_RESPONSE: &str = r#"{"meta": {}, "data": [], "status": "SUCCESS"}"#;

    #[test]
    fn test_parse_response_sorts_ascending() {
        let response: MfapiResponse = serde_json::from_str(SAMPLE_RESPONSE).unwrap();
        let source = MfapiNavSource::new();
        let points = source
            .parse_rows(SchemeCode::new(120503), response.data)
            .unwrap();

        assert_eq!(points.len(), 3);
        assert_eq!(points[0].date, NaiveDate::from_ymd_opt(2024, 3, 5).unwrap());
        assert_eq!(points[2].date, NaiveDate::from_ymd_opt(2024, 3, 7).unwrap());
        assert_eq!(points[2].nav, dec!(81.1916));
        assert_eq!(points[0].source, "mfapi");
    }

    #[test]
    fn test_parse_unknown_scheme_is_empty() {
        let response: MfapiResponse = serde_json::from_str(UNKNOWN_SCHEME_RESPONSE).unwrap();
        let source = MfapiNavSource::new();
        let points = source
            .parse_rows(SchemeCode::new(999999), response.data)
            .unwrap();
        assert!(points.is_empty());
    }

    #[test]
    fn test_parse_skips_zero_nav_placeholder_rows() {
        let rows = vec![
            MfapiNavRow {
                date: "02-01-2024".to_string(),
                nav: "10.5000".to_string(),
            },
            MfapiNavRow {
                date: "01-01-2024".to_string(),
                nav: "0.00000".to_string(),
            },
        ];
        let source = MfapiNavSource::new();
        let points = source.parse_rows(SchemeCode::new(120503), rows).unwrap();

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].nav, dec!(10.5));
    }

    #[test]
    fn test_parse_rejects_malformed_dates() {
        let rows = vec![MfapiNavRow {
            date: "2024-01-02".to_string(),
            nav: "10.5".to_string(),
        }];
        let source = MfapiNavSource::new();
        assert!(source
            .parse_rows(SchemeCode::new(120503), rows)
            .is_err());
    }

    #[test]
    fn test_source_name() {
        assert_eq!(MfapiNavSource::new().name(), "mfapi");
    }
}
