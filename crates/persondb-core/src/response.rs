//! Search-engine shaped response envelope.
//!
//! Both the relational search paths and the index search path answer with
//! the same three-level structure:
//!
//! ```json
//! { "took": 3, "hits": { "total": 42, "hits": [ { "_source": { ... } } ] } }
//! ```

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse<T> {
    pub took: u64,
    pub hits: SearchHits<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHits<T> {
    pub total: u64,
    pub hits: Vec<SearchHit<T>>,
}

/// Wraps one payload under `_source`, the document-wrapper field name used
/// by search engines. It carries nothing else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit<T> {
    #[serde(rename = "_source")]
    pub source: T,
}

impl<T> SearchResponse<T> {
    pub fn total_hits(&self) -> u64 {
        self.hits.total
    }
}

/// Builds the envelope from an ordered result collection. `total` is the full
/// match count and may exceed the number of results.
pub fn build_response<T, I>(results: I, total: u64, took: Duration) -> SearchResponse<T>
where
    I: IntoIterator<Item = T>,
{
    let hits = results.into_iter().map(|source| SearchHit { source }).collect();
    SearchResponse {
        took: u64::try_from(took.as_millis()).unwrap_or(u64::MAX),
        hits: SearchHits { total, hits },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_input_order_and_total() {
        let r = build_response(vec!["c", "a", "b"], 10, Duration::from_millis(7));
        assert_eq!(r.took, 7);
        assert_eq!(r.total_hits(), 10);
        let order: Vec<_> = r.hits.hits.iter().map(|h| h.source).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
    }

    #[test]
    fn wire_shape_mirrors_search_engine() {
        let r = build_response(vec![serde_json::json!({"name": "Joe"})], 1, Duration::ZERO);
        let v = serde_json::to_value(&r).expect("serialize");
        assert_eq!(
            v,
            serde_json::json!({"took": 0, "hits": {"total": 1, "hits": [{"_source": {"name": "Joe"}}]}})
        );
    }

    #[test]
    fn empty_results_still_build_an_envelope() {
        let r: SearchResponse<String> = build_response(Vec::new(), 0, Duration::from_millis(1));
        assert!(r.hits.hits.is_empty());
        assert_eq!(r.hits.total, 0);
    }
}
