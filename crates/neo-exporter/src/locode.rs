//! Read-only UN/LOCODE lookup table.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::ExporterError;
use crate::fetcher::GeoFetcher;

/// Resolved geographic position of a location code.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Position {
    #[serde(rename = "LocationName")]
    pub location: String,
    #[serde(rename = "Latitude")]
    pub latitude: f64,
    #[serde(rename = "Longitude")]
    pub longitude: f64,
}

/// Records indexed by country code, then by location code.
#[derive(Debug, Default)]
pub struct LocodeDb {
    countries: HashMap<String, HashMap<String, Position>>,
}

impl LocodeDb {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ExporterError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ExporterError::Locode(format!("can't read {}: {e}", path.display())))?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ExporterError> {
        let countries = serde_json::from_str(raw)?;
        Ok(Self { countries })
    }

    pub fn len(&self) -> usize {
        self.countries.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Splits `"CC LLL"` into its country and location parts.
pub fn parse_locode(code: &str) -> Result<(&str, &str), ExporterError> {
    let bad = || ExporterError::Locode(format!("incorrect locode {code:?}"));
    let (country, location) = code.split_once(' ').ok_or_else(bad)?;
    if country.len() != 2 || !country.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(bad());
    }
    if location.len() != 3 || !location.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(bad());
    }
    Ok((country, location))
}

impl GeoFetcher for LocodeDb {
    fn get(&self, locode: &str) -> Result<Position, ExporterError> {
        let (country, location) = parse_locode(locode)?;
        self.countries
            .get(country)
            .and_then(|locations| locations.get(location))
            .cloned()
            .ok_or_else(|| ExporterError::Locode(format!("no record for {locode}")))
    }
}
