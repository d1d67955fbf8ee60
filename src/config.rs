/// Service configuration
///
/// Only the record-count path talks to anything external, so configuration
/// is mostly about where the aggregation service lives and which index
/// fields hold the per-resolution H3 cells and the sample locations.

use std::time::Duration;

use h3o::Resolution;
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MIN_CELLS;
use crate::error::{Result, SeeH3Error};

/// Prefix of the environment variables read by [`SeeH3Config::from_env`].
pub const ENV_PREFIX: &str = "SEEH3_";

/// Configuration for `seeh3`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeeH3Config {
    /// Base URL of the Solr service, without collection.
    /// Default: `http://localhost:8983/solr`
    pub solr_url: String,

    /// Collection holding the records.
    pub collection: String,

    /// Bucket field name minus its trailing resolution number.
    pub bucket_field_prefix: String,

    /// Point field used for bounding-box filters.
    pub location_field: String,

    /// Maximum number of buckets the facet expression returns.
    pub bucket_size_limit: usize,

    /// HTTP timeout for one aggregation request.
    pub request_timeout_secs: u64,

    /// `min_cells` used when a caller gives none.
    pub default_min_cells: usize,
}

impl Default for SeeH3Config {
    fn default() -> Self {
        Self {
            solr_url: "http://localhost:8983/solr".to_string(),
            collection: "isb_core_records".to_string(),
            bucket_field_prefix: "producedBy_samplingSite_location_h3_".to_string(),
            location_field: "producedBy_samplingSite_location_ll".to_string(),
            bucket_size_limit: 100_000,
            request_timeout_secs: 30,
            default_min_cells: DEFAULT_MIN_CELLS,
        }
    }
}

impl SeeH3Config {
    /// Parse a JSON configuration document; missing keys take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SeeH3Error::Config(format!("invalid config JSON: {e}")))
    }

    /// Defaults overridden by `SEEH3_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(format!("{ENV_PREFIX}{key}")).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each key
    /// (`SOLR_URL`, `COLLECTION`, `BUCKET_FIELD_PREFIX`, `LOCATION_FIELD`,
    /// `BUCKET_SIZE_LIMIT`, `REQUEST_TIMEOUT_SECS`, `DEFAULT_MIN_CELLS`).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(v) = lookup("SOLR_URL") {
            config.solr_url = v;
        }
        if let Some(v) = lookup("COLLECTION") {
            config.collection = v;
        }
        if let Some(v) = lookup("BUCKET_FIELD_PREFIX") {
            config.bucket_field_prefix = v;
        }
        if let Some(v) = lookup("LOCATION_FIELD") {
            config.location_field = v;
        }
        if let Some(v) = lookup("BUCKET_SIZE_LIMIT") {
            config.bucket_size_limit = parse_number("BUCKET_SIZE_LIMIT", &v)?;
        }
        if let Some(v) = lookup("REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = parse_number("REQUEST_TIMEOUT_SECS", &v)?;
        }
        if let Some(v) = lookup("DEFAULT_MIN_CELLS") {
            config.default_min_cells = parse_number("DEFAULT_MIN_CELLS", &v)?;
        }

        Ok(config)
    }

    /// Index field holding cell ids at `resolution`.
    pub fn bucket_field(&self, resolution: Resolution) -> String {
        format!("{}{}", self.bucket_field_prefix, u8::from(resolution))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| SeeH3Error::Config(format!("{ENV_PREFIX}{key} is not a number: {value:?}")))
}
