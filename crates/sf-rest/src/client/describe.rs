use forcelink_client::urls;
use tracing::instrument;

use crate::describe::{
    ApiVersion, DescribeGlobalResult, DescribeSObjectResult, SObjectBasicInformation,
};
use crate::error::Result;

impl super::ForceClient {
    /// List the API versions the instance supports.
    #[instrument(skip(self))]
    pub async fn versions(&self) -> Result<Vec<ApiVersion>> {
        let url = urls::versions(self.instance_url())?;
        Ok(self.json.get(&url, &self.ctx).await?)
    }

    /// Get API limits for the org.
    #[instrument(skip(self))]
    pub async fn limits(&self) -> Result<serde_json::Value> {
        let url = urls::limits(self.instance_url(), self.api_version())?;
        Ok(self.json.get(&url, &self.ctx).await?)
    }

    /// List every SObject available to the session.
    #[instrument(skip(self))]
    pub async fn describe_global(&self) -> Result<DescribeGlobalResult> {
        let url = urls::describe_global(self.instance_url(), self.api_version())?;
        Ok(self.json.get(&url, &self.ctx).await?)
    }

    /// Object summary and recently viewed records.
    #[instrument(skip(self))]
    pub async fn object_basic_info(&self, sobject_name: &str) -> Result<SObjectBasicInformation> {
        let url = urls::sobject_basic_information(
            self.instance_url(),
            self.api_version(),
            sobject_name,
        )?;
        Ok(self.json.get(&url, &self.ctx).await?)
    }

    /// Full describe of one object, fields included.
    #[instrument(skip(self))]
    pub async fn object_describe(&self, sobject_name: &str) -> Result<DescribeSObjectResult> {
        let url = urls::sobject_describe(self.instance_url(), self.api_version(), sobject_name)?;
        Ok(self.json.get(&url, &self.ctx).await?)
    }
}
