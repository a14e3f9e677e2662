//! Appwrite REST API client using a server API key

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::document::{Account, DocumentList, DocumentStore, IdentityProvider, Query, StoreError};
use crate::config::Config;

/// Appwrite client for server-side database and user operations.
/// The API key bypasses document permissions - handle with care!
#[derive(Clone)]
pub struct AppwriteClient {
    client: Client,
    endpoint: String,
    project_id: String,
    api_key: String,
    database_id: String,
}

impl AppwriteClient {
    pub fn new(config: &Config) -> Self {
        Self::with_endpoint(
            &config.appwrite_endpoint,
            &config.appwrite_project_id,
            &config.appwrite_api_key,
            &config.appwrite_database_id,
        )
    }

    pub fn with_endpoint(endpoint: &str, project_id: &str, api_key: &str, database_id: &str) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.trim_end_matches('/').to_string(),
            project_id: project_id.to_string(),
            api_key: api_key.to_string(),
            database_id: database_id.to_string(),
        }
    }

    pub fn database_id(&self) -> &str {
        &self.database_id
    }

    /// Documents URL for a collection
    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.endpoint, self.database_id, collection
        )
    }

    /// Attach project and key headers
    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("X-Appwrite-Project", &self.project_id)
            .header("X-Appwrite-Key", &self.api_key)
            .header("Content-Type", "application/json")
    }

    /// Turn a non-success response into a `StoreError`
    async fn check(response: Response) -> Result<Response, StoreError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(StoreError::from_status(status, body))
    }

    /// POST an arbitrary JSON body to a path below the endpoint
    pub async fn post_json(&self, path: &str, body: &Value) -> Result<Value, StoreError> {
        let url = format!("{}{}", self.endpoint, path);
        debug!(%url, "appwrite POST");

        let response = self
            .authed(self.client.post(&url))
            .json(body)
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }
}

#[async_trait]
impl DocumentStore for AppwriteClient {
    async fn create_document(
        &self,
        collection: &str,
        document_id: &str,
        data: Value,
        permissions: &[String],
    ) -> Result<Value, StoreError> {
        let body = json!({
            "documentId": document_id,
            "data": data,
            "permissions": permissions,
        });

        let response = self
            .authed(self.client.post(self.documents_url(collection)))
            .json(&body)
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    async fn get_document(
        &self,
        collection: &str,
        document_id: &str,
    ) -> Result<Option<Value>, StoreError> {
        let url = format!("{}/{}", self.documents_url(collection), document_id);

        let response = self.authed(self.client.get(&url)).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        Ok(Some(Self::check(response).await?.json().await?))
    }

    async fn list_documents(
        &self,
        collection: &str,
        queries: &[Query],
    ) -> Result<DocumentList<Value>, StoreError> {
        let params: Vec<(&str, String)> = queries
            .iter()
            .map(|q| ("queries[]", q.to_param()))
            .collect();

        let response = self
            .authed(self.client.get(self.documents_url(collection)))
            .query(&params)
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    async fn update_document(
        &self,
        collection: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Value, StoreError> {
        let url = format!("{}/{}", self.documents_url(collection), document_id);

        let response = self
            .authed(self.client.patch(&url))
            .json(&json!({ "data": data }))
            .send()
            .await?;

        Ok(Self::check(response).await?.json().await?)
    }

    async fn delete_document(&self, collection: &str, document_id: &str) -> Result<(), StoreError> {
        let url = format!("{}/{}", self.documents_url(collection), document_id);

        let response = self.authed(self.client.delete(&url)).send().await?;

        Self::check(response).await?;
        Ok(())
    }
}

/// User or session payload; both carry the fields we need
#[derive(Debug, Deserialize)]
struct UserPayload {
    #[serde(rename = "$id")]
    id: String,
    #[serde(rename = "userId")]
    user_id: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(rename = "providerUid", default)]
    provider_uid: Option<String>,
}

#[async_trait]
impl IdentityProvider for AppwriteClient {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        name: &str,
    ) -> Result<Account, StoreError> {
        let body = json!({
            "userId": super::document::new_document_id(),
            "email": email,
            "password": password,
            "name": name,
        });

        let response = self
            .authed(self.client.post(format!("{}/users", self.endpoint)))
            .json(&body)
            .send()
            .await?;

        let user: UserPayload = Self::check(response).await?.json().await?;
        Ok(Account {
            user_id: user.id,
            email: user.email.unwrap_or_else(|| email.to_string()),
        })
    }

    async fn verify_credentials(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Option<Account>, StoreError> {
        // Sessions are created on the account API as the client would
        let response = self
            .client
            .post(format!("{}/account/sessions/email", self.endpoint))
            .header("X-Appwrite-Project", &self.project_id)
            .header("Content-Type", "application/json")
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::BAD_REQUEST
        ) {
            return Ok(None);
        }

        let session: UserPayload = Self::check(response).await?.json().await?;
        Ok(Some(Account {
            user_id: session.user_id.unwrap_or(session.id),
            email: session.provider_uid.unwrap_or_else(|| email.to_string()),
        }))
    }
}
