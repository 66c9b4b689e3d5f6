//! Query and search result types.

use serde::{Deserialize, Serialize};

/// One page of a SOQL query.
///
/// When `done` is false, `next_records_url` is the instance-relative path of
/// the next page.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult<T> {
    #[serde(default)]
    pub total_size: u64,
    #[serde(default = "default_done")]
    pub done: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_records_url: Option<String>,
    #[serde(default = "Vec::new")]
    pub records: Vec<T>,
}

fn default_done() -> bool {
    true
}

impl<T> Default for QueryResult<T> {
    fn default() -> Self {
        Self {
            total_size: 0,
            done: true,
            next_records_url: None,
            records: Vec::new(),
        }
    }
}

/// Result of a SOSL search.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResult<T> {
    #[serde(rename = "searchRecords", default = "Vec::new")]
    pub search_records: Vec<T>,
}

impl<T> Default for SearchResult<T> {
    fn default() -> Self {
        Self {
            search_records: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_query_result_pages() {
        let json = r#"{
            "totalSize": 3,
            "done": false,
            "nextRecordsUrl": "/services/data/v62.0/query/01gD0000002HU6KIAW-2000",
            "records": [{"attributes":{"type":"Account"},"Id":"001"}]
        }"#;
        let page: QueryResult<Value> = serde_json::from_str(json).unwrap();
        assert_eq!(page.total_size, 3);
        assert!(!page.done);
        assert_eq!(
            page.next_records_url.as_deref(),
            Some("/services/data/v62.0/query/01gD0000002HU6KIAW-2000")
        );
        assert_eq!(page.records[0]["Id"], "001");
    }

    #[test]
    fn test_count_query_has_no_records() {
        let page: QueryResult<Value> =
            serde_json::from_str(r#"{"totalSize":42,"done":true,"records":[]}"#).unwrap();
        assert_eq!(page.total_size, 42);
        assert!(page.records.is_empty());

        let empty: QueryResult<Value> = QueryResult::default();
        assert!(empty.done);
    }
}
