use bytes::Bytes;
use forcelink_client::{serializer, urls, FieldPolicies, RequestMethod, SerializationMode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::sobject::CreateResponse;

impl super::ForceClient {
    /// Retrieve a record by id, optionally limited to `fields`.
    #[instrument(skip(self))]
    pub async fn get_object_by_id<T>(
        &self,
        sobject_name: &str,
        object_id: &str,
        fields: &[&str],
    ) -> Result<T>
    where
        T: DeserializeOwned + Default,
    {
        let url = urls::sobject_rows(
            self.instance_url(),
            self.api_version(),
            sobject_name,
            object_id,
            fields,
        )?;
        Ok(self.json.get(&url, &self.ctx).await?)
    }

    /// Create a record. Only creatable, non-null fields are sent.
    #[instrument(skip(self, record))]
    pub async fn create_record<T>(&self, sobject_name: &str, record: &T) -> Result<CreateResponse>
    where
        T: FieldPolicies + Serialize + ?Sized,
    {
        let url =
            urls::sobject_basic_information(self.instance_url(), self.api_version(), sobject_name)?;
        let created: CreateResponse = self.json.post(&url, record, &self.ctx).await?;
        debug!(id = %created.id, "Record created");
        Ok(created)
    }

    /// Update a record. Only updateable, non-null fields are sent.
    #[instrument(skip(self, record))]
    pub async fn update_record<T>(
        &self,
        sobject_name: &str,
        object_id: &str,
        record: &T,
    ) -> Result<()>
    where
        T: FieldPolicies + Serialize + ?Sized,
    {
        let url = urls::sobject_rows(
            self.instance_url(),
            self.api_version(),
            sobject_name,
            object_id,
            &[],
        )?;
        let body = serializer::serialize_for_update(record)?;
        self.json
            .send_json::<serde_json::Value>(
                RequestMethod::Patch,
                &url,
                Some(body),
                &[],
                false,
                &self.ctx,
            )
            .await?;
        Ok(())
    }

    /// Create or update the record whose `field_name` equals `field_value`.
    ///
    /// Returns `Some` when a record was inserted (201, or 200 on newer API
    /// versions) and `None` when an existing record was updated (204). More
    /// than one match is an API error listing the candidates in
    /// `object_urls`.
    #[instrument(skip(self, record))]
    pub async fn upsert_external<T>(
        &self,
        sobject_name: &str,
        field_name: &str,
        field_value: &str,
        record: &T,
    ) -> Result<Option<CreateResponse>>
    where
        T: FieldPolicies + Serialize + ?Sized,
    {
        let url = urls::sobject_rows_by_external_id(
            self.instance_url(),
            self.api_version(),
            sobject_name,
            field_name,
            field_value,
        )?;
        Ok(self
            .json
            .patch(&url, record, SerializationMode::Update, &self.ctx)
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn delete_record(&self, sobject_name: &str, object_id: &str) -> Result<()> {
        let url = urls::sobject_rows(
            self.instance_url(),
            self.api_version(),
            sobject_name,
            object_id,
            &[],
        )?;
        Ok(self.json.delete(&url, &self.ctx).await?)
    }

    /// Download a blob field such as `Attachment.Body` or
    /// `ContentVersion.VersionData`. The field defaults to `body`.
    #[instrument(skip(self))]
    pub async fn get_blob(
        &self,
        sobject_name: &str,
        object_id: &str,
        blob_field: Option<&str>,
    ) -> Result<Bytes> {
        let url = urls::sobject_blob_retrieve(
            self.instance_url(),
            self.api_version(),
            sobject_name,
            object_id,
            blob_field,
        )?;
        Ok(self.json.get_bytes(&url, &self.ctx).await?)
    }
}

#[cfg(test)]
mod tests {
    use crate::models::{SfAccount, SfContact};
    use crate::ForceClient;
    use forcelink_client::MULTIPLE_MATCHES_MESSAGE;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client(server: &MockServer) -> ForceClient {
        ForceClient::new(server.uri(), "v62.0", "token").unwrap()
    }

    #[tokio::test]
    async fn test_get_object_by_id_with_fields() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(
                "/services/data/v62.0/sobjects/Account/001D000000IqhSLIAZ",
            ))
            .and(query_param("fields", "Id,Name"))
            .and(header("Authorization", "Bearer token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "attributes": {"type": "Account"},
                "Id": "001D000000IqhSLIAZ",
                "Name": "Acme"
            })))
            .mount(&server)
            .await;

        let account: SfAccount = client(&server)
            .await
            .get_object_by_id("Account", "001D000000IqhSLIAZ", &["Id", "Name"])
            .await
            .unwrap();
        assert_eq!(account.name.as_deref(), Some("Acme"));
    }

    #[tokio::test]
    async fn test_create_record_sends_creatable_fields() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/services/data/v62.0/sobjects/Account"))
            .and(body_json(json!({"Name": "Acme"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "001D000000IqhSLIAZ", "success": true, "errors": []
            })))
            .mount(&server)
            .await;

        let account = SfAccount {
            id: Some("ignored".to_string()),
            name: Some("Acme".to_string()),
            last_activity_date: Some("2024-01-15".parse().unwrap()),
            ..Default::default()
        };
        let created = client(&server)
            .await
            .create_record("Account", &account)
            .await
            .unwrap();
        assert_eq!(created.id, "001D000000IqhSLIAZ");
        assert!(created.success);
    }

    #[tokio::test]
    async fn test_update_record_sends_updateable_fields() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/services/data/v62.0/sobjects/Contact/003D000000QV9n2IAD"))
            .and(body_json(json!({"LastName": "Jones"})))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let contact = SfContact {
            id: Some("003D000000QV9n2IAD".to_string()),
            last_name: Some("Jones".to_string()),
            name: Some("Jo Jones".to_string()),
            ..Default::default()
        };
        client(&server)
            .await
            .update_record("Contact", "003D000000QV9n2IAD", &contact)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_upsert_insert_update_and_ambiguous() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/services/data/v62.0/sobjects/Account/External_Id__c/new"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "id": "001D000000Kv3g5IAB", "success": true, "errors": [], "created": true
            })))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/services/data/v62.0/sobjects/Account/External_Id__c/existing"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/services/data/v62.0/sobjects/Account/External_Id__c/dup"))
            .respond_with(ResponseTemplate::new(300).set_body_json(json!([
                "/services/data/v62.0/sobjects/Account/001D000000Kv3g5IAB",
                "/services/data/v62.0/sobjects/Account/001D000000Kv3g6IAB"
            ])))
            .mount(&server)
            .await;

        let client = client(&server).await;
        let account = SfAccount {
            name: Some("Acme".to_string()),
            ..Default::default()
        };

        let inserted = client
            .upsert_external("Account", "External_Id__c", "new", &account)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(inserted.created, Some(true));

        let updated = client
            .upsert_external("Account", "External_Id__c", "existing", &account)
            .await
            .unwrap();
        assert!(updated.is_none());

        let err = client
            .upsert_external("Account", "External_Id__c", "dup", &account)
            .await
            .unwrap_err();
        let api = err.as_api_error().unwrap();
        assert_eq!(api.message, MULTIPLE_MATCHES_MESSAGE);
        assert_eq!(api.status, Some(300));
        assert_eq!(api.object_urls.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_record_maps_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/services/data/v62.0/sobjects/Account/001D000000IqhSLIAZ"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/services/data/v62.0/sobjects/Account/001000000000000AAA"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!([
                {"errorCode": "NOT_FOUND", "message": "The requested resource does not exist"}
            ])))
            .mount(&server)
            .await;

        let client = client(&server).await;
        client
            .delete_record("Account", "001D000000IqhSLIAZ")
            .await
            .unwrap();

        let err = client
            .delete_record("Account", "001000000000000AAA")
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(404));
        assert!(err
            .to_string()
            .contains("ErrorCode NOT_FOUND: The requested resource does not exist."));
    }

    #[tokio::test]
    async fn test_get_blob_default_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/services/data/v62.0/sobjects/Attachment/00PD000000AbCdE/body"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0x25, 0x50, 0x44, 0x46]))
            .mount(&server)
            .await;

        let bytes = client(&server)
            .await
            .get_blob("Attachment", "00PD000000AbCdE", None)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"%PDF");
    }
}
