/// Per-cell record counts from the search index
///
/// Counts come from a Solr streaming `facet` expression bucketed on the
/// record's H3 cell field for the requested resolution. The response is a
/// list of `{<bucket field>: <cell>, "count(*)": <n>}` docs; anything else in
/// the list (e.g. the trailing `EOF` marker) is skipped. Failures are never
/// retried and never replaced with empty counts.

use std::collections::HashMap;

use async_trait::async_trait;
use h3o::CellIndex;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::SeeH3Config;
use crate::constants::COUNT_KEY;
use crate::density::{self, RecordCountEntry};
use crate::error::{Result, SeeH3Error};
use crate::pole_registry;

/// Source of bucketed record counts
#[async_trait]
pub trait BucketCountSource: Send + Sync {
    /// Raw bucket docs for records matching `query`, grouped by `bucket_field`
    async fn bucket_counts(&self, query: &str, bucket_field: &str) -> Result<Vec<Value>>;
}

/// Streaming-expression client for a Solr collection
pub struct SolrStreamClient {
    client: Client,
    stream_url: String,
    collection: String,
    bucket_size_limit: usize,
}

impl SolrStreamClient {
    pub fn new(config: &SeeH3Config) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("seeh3/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            stream_url: format!(
                "{}/{}/stream",
                config.solr_url.trim_end_matches('/'),
                config.collection
            ),
            collection: config.collection.clone(),
            bucket_size_limit: config.bucket_size_limit,
        })
    }

    #[cfg(test)]
    pub fn stream_url(&self) -> &str {
        &self.stream_url
    }

    /// Streaming expression counting records per bucket, largest first
    pub fn facet_expression(&self, query: &str, bucket_field: &str) -> String {
        format!(
            "facet({}, q=\"{}\", buckets=\"{}\", bucketSorts=\"count(*) desc\", bucketSizeLimit={}, count(*))",
            self.collection,
            escape_quotes(query),
            bucket_field,
            self.bucket_size_limit
        )
    }
}

#[async_trait]
impl BucketCountSource for SolrStreamClient {
    async fn bucket_counts(&self, query: &str, bucket_field: &str) -> Result<Vec<Value>> {
        let expr = self.facet_expression(query, bucket_field);
        debug!(url = %self.stream_url, %expr, "requesting bucket counts");

        let response = self
            .client
            .post(&self.stream_url)
            .form(&[("expr", expr.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(SeeH3Error::ServiceStatus {
                status: status.as_u16(),
                body,
            });
        }

        let value: Value = serde_json::from_str(&body)
            .map_err(|e| SeeH3Error::MalformedResponse(format!("invalid JSON: {e}")))?;
        let docs = extract_docs(value)?;
        debug!(docs = docs.len(), "received bucket docs");
        Ok(docs)
    }
}

fn escape_quotes(query: &str) -> String {
    query.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Pull `result-set.docs` out of a streaming response.
///
/// A doc carrying `EXCEPTION` means the expression failed server side.
pub fn extract_docs(response: Value) -> Result<Vec<Value>> {
    let Value::Object(mut root) = response else {
        return Err(SeeH3Error::MalformedResponse("response is not an object".to_string()));
    };
    let docs = root
        .remove("result-set")
        .and_then(|rs| match rs {
            Value::Object(mut rs) => rs.remove("docs"),
            _ => None,
        })
        .ok_or_else(|| SeeH3Error::MalformedResponse("missing result-set.docs".to_string()))?;
    let Value::Array(docs) = docs else {
        return Err(SeeH3Error::MalformedResponse("result-set.docs is not a list".to_string()));
    };

    if let Some(exception) = docs.iter().find_map(|doc| doc.get("EXCEPTION")) {
        let message = exception.as_str().map(str::to_owned).unwrap_or_else(|| exception.to_string());
        return Err(SeeH3Error::ServiceException(message));
    }

    Ok(docs)
}

fn count_value(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|f| f.is_finite() && *f >= 0.0 && f.fract() == 0.0)
            .map(|f| f as u64)
    })
}

/// Raw counts keyed by cell.
///
/// Docs without the bucket field or `count(*)`, or whose values are not a
/// cell id and a non-negative integer, are skipped.
pub fn parse_bucket_docs(docs: &[Value], bucket_field: &str) -> HashMap<CellIndex, u64> {
    let mut counts: HashMap<CellIndex, u64> = HashMap::new();
    let mut skipped = 0usize;

    for doc in docs {
        let cell = doc
            .get(bucket_field)
            .and_then(Value::as_str)
            .and_then(|s| s.parse::<CellIndex>().ok());
        let n = doc.get(COUNT_KEY).and_then(count_value);

        match (cell, n) {
            (Some(cell), Some(n)) => *counts.entry(cell).or_insert(0) += n,
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        debug!(skipped, "skipped bucket docs without a cell and count");
    }
    counts
}

/// Normalized record counts per cell for records matching `query`.
///
/// Pole cells are dropped before totals are computed so they never dilute
/// the other cells' frequencies.
pub async fn get_record_counts<S>(
    source: &S,
    query: &str,
    bucket_field: &str,
    exclude_poles: bool,
) -> Result<HashMap<CellIndex, RecordCountEntry>>
where
    S: BucketCountSource + ?Sized,
{
    let docs = source.bucket_counts(query, bucket_field).await.inspect_err(|err| {
        warn!(%err, bucket_field, "bucket count query failed");
    })?;

    let mut raw = parse_bucket_docs(&docs, bucket_field);
    if exclude_poles {
        raw.retain(|cell, _| !pole_registry::is_pole(*cell));
    }

    info!(cells = raw.len(), total = raw.values().sum::<u64>(), bucket_field, "record counts");
    Ok(density::normalize(&raw))
}
