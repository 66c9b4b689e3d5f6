use forcelink_client::{urls, ApiError, ErrorKind as ClientErrorKind};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::query::{QueryResult, SearchResult};

impl super::ForceClient {
    /// Execute a SOQL query and return every record, following
    /// `nextRecordsUrl` until the result is done.
    ///
    /// `query_all` switches to the `queryAll` resource, which includes
    /// deleted and archived records.
    #[instrument(skip(self))]
    pub async fn query<T>(&self, soql: &str, query_all: bool) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let mut page: QueryResult<T> = self.query_page(soql, query_all).await?;
        let mut records = std::mem::take(&mut page.records);
        let mut pages = 1;

        while let Some(next) = next_page(&page) {
            page = self.query_more(&next).await?;
            records.append(&mut page.records);
            pages += 1;
        }

        debug!(pages, records = records.len(), "Query complete");
        Ok(records)
    }

    /// Fetch the first page of a SOQL query.
    #[instrument(skip(self))]
    pub async fn query_page<T>(&self, soql: &str, query_all: bool) -> Result<QueryResult<T>>
    where
        T: DeserializeOwned,
    {
        let url = urls::query(self.instance_url(), self.api_version(), soql, query_all)?;
        Ok(self.json.get(&url, &self.ctx).await?)
    }

    /// Fetch the page at a `nextRecordsUrl`.
    #[instrument(skip(self))]
    pub async fn query_more<T>(&self, next_records_url: &str) -> Result<QueryResult<T>>
    where
        T: DeserializeOwned,
    {
        let url = urls::instance_relative(self.instance_url(), next_records_url)?;
        Ok(self.json.get(&url, &self.ctx).await?)
    }

    /// Execute a query expected to match at most one record.
    ///
    /// More than one match is an API error.
    #[instrument(skip(self))]
    pub async fn query_single<T>(&self, soql: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let mut records: Vec<T> = self.query_page(soql, false).await?.records;
        match records.len() {
            0 => Ok(None),
            1 => Ok(records.pop()),
            n => Err(Error::from(forcelink_client::Error::new(
                ClientErrorKind::Api(ApiError::new(format!(
                    "Query returned {} records, expected at most one",
                    n
                ))),
            ))),
        }
    }

    /// Run a `SELECT COUNT() ...` query and return the total size.
    #[instrument(skip(self))]
    pub async fn count_query(&self, soql: &str) -> Result<u64> {
        let page: QueryResult<serde_json::Value> = self.query_page(soql, false).await?;
        Ok(page.total_size)
    }

    /// Execute a SOSL search.
    #[instrument(skip(self))]
    pub async fn search<T>(&self, sosl: &str) -> Result<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let url = urls::search(self.instance_url(), self.api_version(), sosl)?;
        let result: SearchResult<T> = self.json.get(&url, &self.ctx).await?;
        Ok(result.search_records)
    }
}

fn next_page<T>(page: &QueryResult<T>) -> Option<String> {
    if page.done {
        return None;
    }
    page.next_records_url.clone().filter(|url| !url.is_empty())
}
