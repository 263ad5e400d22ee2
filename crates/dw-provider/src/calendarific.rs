//! calendarific.com holiday API.

use std::fmt;

use dw_core::{parse_date, Record};
use serde::Deserialize;
use tracing::debug;

use crate::config::CALENDARIFIC;
use crate::{check_status, HolidayProvider, ProviderError};

pub const CALENDARIFIC_BASE_URL: &str = "https://calendarific.com";

/// National holidays for one country.
///
/// The API key is passed in by the caller; it is never logged.
#[derive(Clone)]
pub struct CalendarificProvider {
    api_key: String,
    country: String,
    http: reqwest::Client,
    base_url: String,
}

impl fmt::Debug for CalendarificProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CalendarificProvider")
            .field("country", &self.country)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl CalendarificProvider {
    pub fn new(api_key: &str, country: &str) -> Self {
        Self::new_with_base_url(api_key, country, CALENDARIFIC_BASE_URL.to_string())
    }

    pub fn new_with_base_url(api_key: &str, country: &str, base_url: String) -> Self {
        Self {
            api_key: api_key.trim().to_string(),
            country: country.trim().to_string(),
            http: reqwest::Client::new(),
            base_url,
        }
    }

    fn build_url(&self) -> String {
        format!("{}/api/v2/holidays", self.base_url.trim_end_matches('/'))
    }

    async fn fetch_year(&self, year: i32, out: &mut Vec<Record>) -> Result<(), ProviderError> {
        let year_s = year.to_string();
        let resp = self
            .http
            .get(self.build_url())
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("type", "national"),
                ("country", self.country.as_str()),
                ("year", year_s.as_str()),
            ])
            .send()
            .await?;
        let resp = check_status(resp)?;
        let body: Envelope = resp.json().await?;

        // Errors come back as `"response": []` with a `meta.error_detail`.
        let list: HolidayList = serde_json::from_value(body.response)
            .map_err(|_| ProviderError::Decode("missing dates in response".to_string()))?;

        for h in &list.holidays {
            let iso = h.date.iso.get(..10).unwrap_or(&h.date.iso);
            let date = parse_date(iso).map_err(|e| ProviderError::Decode(e.to_string()))?;
            out.push(Record::holiday(date, h.name.clone(), CALENDARIFIC));
        }
        debug!(provider = CALENDARIFIC, year, count = list.holidays.len(), "year fetched");
        Ok(())
    }
}

#[async_trait::async_trait]
impl HolidayProvider for CalendarificProvider {
    fn source_name(&self) -> &'static str {
        CALENDARIFIC
    }

    async fn fetch_holidays(&self, year: i32) -> Result<Vec<Record>, ProviderError> {
        let mut out = Vec::new();
        self.fetch_year(year, &mut out).await?;
        self.fetch_year(year + 1, &mut out).await?;
        Ok(out)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    response: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct HolidayList {
    holidays: Vec<CalendarificHoliday>,
}

#[derive(Debug, Deserialize)]
struct CalendarificHoliday {
    name: String,
    date: CalendarificDate,
}

#[derive(Debug, Deserialize)]
struct CalendarificDate {
    iso: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_omits_key() {
        let p = CalendarificProvider::new("s3cr3t", "US");
        assert!(!format!("{p:?}").contains("s3cr3t"));
    }

    #[test]
    fn error_envelope_is_not_a_holiday_list() {
        let body: Envelope =
            serde_json::from_str(r#"{"meta":{"code":401,"error_detail":"bad key"},"response":[]}"#)
                .unwrap();
        assert!(serde_json::from_value::<HolidayList>(body.response).is_err());
    }
}
