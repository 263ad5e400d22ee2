//! date.nager.at public holiday API.

use dw_core::{parse_date, Record};
use serde::Deserialize;
use tracing::debug;

use crate::config::NAGER;
use crate::{check_status, HolidayProvider, ProviderError};

pub const NAGER_BASE_URL: &str = "https://date.nager.at";

/// Public holidays for one country, filtered to a region.
#[derive(Debug, Clone)]
pub struct NagerProvider {
    country: String,
    region: String,
    http: reqwest::Client,
    base_url: String,
}

impl NagerProvider {
    pub fn new(country: &str, region: &str) -> Self {
        Self::new_with_base_url(country, region, NAGER_BASE_URL.to_string())
    }

    pub fn new_with_base_url(country: &str, region: &str, base_url: String) -> Self {
        Self {
            country: country.trim().to_ascii_uppercase(),
            region: region.trim().to_ascii_uppercase(),
            http: reqwest::Client::new(),
            base_url,
        }
    }

    fn build_url(&self, year: i32) -> String {
        format!(
            "{}/api/v2/publicholidays/{}/{}",
            self.base_url.trim_end_matches('/'),
            year,
            self.country
        )
    }

    async fn fetch_year(&self, year: i32, out: &mut Vec<Record>) -> Result<(), ProviderError> {
        let resp = self.http.get(self.build_url(year)).send().await?;
        let resp = check_status(resp)?;
        let items: Vec<NagerHoliday> = resp.json().await?;

        let before = out.len();
        for item in items.into_iter().filter(|i| i.applies_to(&self.region)) {
            let date = parse_date(&item.date).map_err(|e| ProviderError::Decode(e.to_string()))?;
            out.push(Record::holiday(date, item.local_name, NAGER));
        }
        debug!(provider = NAGER, year, kept = out.len() - before, "year fetched");
        Ok(())
    }
}

#[async_trait::async_trait]
impl HolidayProvider for NagerProvider {
    fn source_name(&self) -> &'static str {
        NAGER
    }

    async fn fetch_holidays(&self, year: i32) -> Result<Vec<Record>, ProviderError> {
        let mut out = Vec::new();
        self.fetch_year(year, &mut out).await?;
        self.fetch_year(year + 1, &mut out).await?;
        Ok(out)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NagerHoliday {
    date: String,
    #[serde(default)]
    local_name: String,
    /// v2 payloads carry a single `type`.
    #[serde(rename = "type", default)]
    kind: Option<String>,
    /// Later payloads carry a `types` list instead.
    #[serde(default)]
    types: Vec<String>,
    #[serde(default)]
    counties: Option<Vec<String>>,
}

impl NagerHoliday {
    fn applies_to(&self, region: &str) -> bool {
        let public = self.kind.as_deref() == Some("Public") || self.types.iter().any(|t| t == "Public");
        let in_region = match &self.counties {
            None => true,
            Some(c) => c.is_empty() || c.iter().any(|x| x == region),
        };
        public && in_region
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(kind: &str, counties: Option<Vec<&str>>) -> NagerHoliday {
        NagerHoliday {
            date: "2024-01-06".to_string(),
            local_name: "Heilige Drei Könige".to_string(),
            kind: Some(kind.to_string()),
            types: Vec::new(),
            counties: counties.map(|c| c.into_iter().map(String::from).collect()),
        }
    }

    #[test]
    fn nationwide_public_holiday_applies_everywhere() {
        assert!(item("Public", None).applies_to("DE-BE"));
        assert!(item("Public", Some(vec![])).applies_to("DE-BE"));
    }

    #[test]
    fn regional_holiday_applies_only_to_listed_counties() {
        let h = item("Public", Some(vec!["DE-BW", "DE-BY"]));
        assert!(h.applies_to("DE-BY"));
        assert!(!h.applies_to("DE-BE"));
    }

    #[test]
    fn non_public_types_are_skipped() {
        assert!(!item("Observance", None).applies_to("DE-BY"));
        let mut h = item("Bank", None);
        h.kind = None;
        h.types = vec!["Bank".to_string(), "Public".to_string()];
        assert!(h.applies_to("DE-BY"));
    }

    #[test]
    fn url_uses_uppercase_country() {
        let p = NagerProvider::new_with_base_url("de", "de-by", "http://x/".to_string());
        assert_eq!(p.build_url(2024), "http://x/api/v2/publicholidays/2024/DE");
    }
}
