use forcelink_client::{urls, RequestMethod, SObject, SerializationMode};
use serde_json::{json, Value};
use tracing::instrument;

use crate::composite::{BatchRequest, BatchResponse, CollectionRequest};
use crate::error::{Error, ErrorKind, Result};
use crate::sobject::SaveResult;

/// Maximum number of records in one `composite/sobjects` request.
const MAX_COLLECTION_SIZE: usize = 200;

impl super::ForceClient {
    /// Create up to 200 records of one type in a single request.
    ///
    /// Each record is filtered in create mode and tagged with
    /// `attributes.type`. With `all_or_none`, one failure rolls back every
    /// record; otherwise each [`SaveResult`] reports its own outcome.
    #[instrument(skip(self, records), fields(sobject = T::SOBJECT_TYPE_NAME, count = records.len()))]
    pub async fn create_records<T>(
        &self,
        all_or_none: bool,
        records: &[T],
    ) -> Result<Vec<SaveResult>>
    where
        T: SObject,
    {
        if records.is_empty() {
            return Ok(Vec::new());
        }
        if records.len() > MAX_COLLECTION_SIZE {
            return Err(Error::new(ErrorKind::InvalidArgument(format!(
                "records: at most {} per request, got {}",
                MAX_COLLECTION_SIZE,
                records.len()
            ))));
        }

        let records = records
            .iter()
            .map(typed_record)
            .collect::<Result<Vec<_>>>()?;
        let body = serde_json::to_string(&CollectionRequest {
            all_or_none,
            records,
        })?;

        let url = urls::sobjects_composite(self.instance_url(), self.api_version())?;
        Ok(self
            .json
            .send_json(RequestMethod::Post, &url, Some(body), &[], true, &self.ctx)
            .await?)
    }

    /// Execute up to 25 independent subrequests.
    ///
    /// Subrequest URLs are relative to `/services/data`. The batch succeeds
    /// as a whole even when subrequests fail; check
    /// [`BatchResponse::has_errors`].
    #[instrument(skip(self, request), fields(count = request.batch_requests.len()))]
    pub async fn composite_batch(&self, request: &BatchRequest) -> Result<BatchResponse> {
        if request.batch_requests.is_empty() {
            return Err(Error::new(ErrorKind::InvalidArgument(
                "batchRequests: at least one subrequest is required".to_string(),
            )));
        }
        if request.batch_requests.len() > BatchRequest::MAX_SUBREQUESTS {
            return Err(Error::new(ErrorKind::InvalidArgument(format!(
                "batchRequests: at most {} per batch, got {}",
                BatchRequest::MAX_SUBREQUESTS,
                request.batch_requests.len()
            ))));
        }

        let body = serde_json::to_string(request)?;
        let url = urls::batch(self.instance_url(), self.api_version())?;
        Ok(self
            .json
            .send_json(RequestMethod::Post, &url, Some(body), &[], true, &self.ctx)
            .await?)
    }
}

fn typed_record<T: SObject>(record: &T) -> Result<Value> {
    match forcelink_client::to_value(record, SerializationMode::Create)? {
        Value::Object(mut fields) => {
            fields.insert(
                "attributes".to_string(),
                json!({ "type": T::SOBJECT_TYPE_NAME }),
            );
            Ok(Value::Object(fields))
        }
        _ => Err(Error::new(ErrorKind::InvalidArgument(format!(
            "records: {} did not serialize to a JSON object",
            T::SOBJECT_TYPE_NAME
        )))),
    }
}
