//! HTTP adapter speaking the admin API's JSON envelope.

use std::marker::PhantomData;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{AssignmentStore, Collection, Resource};
use crate::auth::API_KEY_HEADER;
use crate::errors::{AppError, ErrorDetails};
use crate::models::{
    Assignment, AssignmentPair, CreateAssignmentRequest, ExistsQuery, GroupedUser, Page,
    ReplaceAssignmentsRequest,
};
use crate::sync::{FilterState, ReconcileReport};

/// Response envelope as sent by the API, success or failure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    success: bool,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<ErrorDetails>,
}

/// Thin client for the admin API.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    http: Client,
    base_url: String,
}

impl RemoteClient {
    /// Build a client for `base_url` (e.g. `http://127.0.0.1:8080`), sending `api_key` if given.
    pub fn new(base_url: impl Into<String>, api_key: Option<&str>) -> Result<Self, AppError> {
        let mut headers = HeaderMap::new();
        if let Some(key) = api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|e| AppError::BadRequest(format!("Invalid API key header: {}", e)))?;
            headers.insert(API_KEY_HEADER, value);
        }

        let http = Client::builder().default_headers(headers).build()?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Typed view of one resource.
    pub fn collection<R: Resource>(&self) -> RemoteCollection<R> {
        RemoteCollection {
            client: self.clone(),
            _resource: PhantomData,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path)
    }

    /// Send `request` and unwrap the envelope into `T`.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, AppError> {
        let response = request.send().await?;
        let status = response.status();
        let envelope: Envelope = response.json().await.map_err(|e| {
            AppError::Remote(format!("Unreadable response (HTTP {}): {}", status, e))
        })?;

        if !envelope.success {
            let details = envelope.error.ok_or_else(|| {
                AppError::Remote(format!("HTTP {} without error details", status))
            })?;
            return Err(AppError::from_code(&details.code, details.message));
        }

        let data = envelope.data.unwrap_or(serde_json::Value::Null);
        serde_json::from_value(data)
            .map_err(|e| AppError::Remote(format!("Unexpected response shape: {}", e)))
    }

    /// Deduplicated users view of one page.
    pub async fn grouped_users(&self, filters: &FilterState) -> Result<Page<GroupedUser>, AppError> {
        self.send(
            self.http
                .get(self.url("users/grouped"))
                .query(&filters.to_query_pairs()),
        )
        .await
    }

    /// Ask the server to reconcile a user's assignments.
    pub async fn replace_assignments(
        &self,
        user_id: &str,
        assignments: Vec<AssignmentPair>,
    ) -> Result<ReconcileReport, AppError> {
        self.send(
            self.http
                .put(self.url(&format!("users/{}/assignments", user_id)))
                .json(&ReplaceAssignmentsRequest { assignments }),
        )
        .await
    }
}

#[async_trait]
impl AssignmentStore for RemoteClient {
    async fn list_assignments_for_user(&self, user_id: &str) -> Result<Vec<Assignment>, AppError> {
        self.send(self.http.get(self.url(&format!("users/{}/assignments", user_id))))
            .await
    }

    async fn delete_all_assignments_for_user(
        &self,
        user_id: &str,
    ) -> Result<Vec<Assignment>, AppError> {
        self.send(
            self.http
                .delete(self.url(&format!("users/{}/assignments", user_id))),
        )
        .await
    }

    async fn create_assignment(
        &self,
        request: &CreateAssignmentRequest,
    ) -> Result<Assignment, AppError> {
        self.send(self.http.post(self.url("assignments")).json(request))
            .await
    }
}

/// [`Collection`] for resource `R` over HTTP.
pub struct RemoteCollection<R> {
    client: RemoteClient,
    _resource: PhantomData<fn() -> R>,
}

impl<R> Clone for RemoteCollection<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _resource: PhantomData,
        }
    }
}

#[async_trait]
impl<R: Resource> Collection for RemoteCollection<R> {
    type Row = R::Row;
    type Record = R::Record;
    type Create = R::Create;
    type Update = R::Update;

    fn resource(&self) -> &'static str {
        R::PATH
    }

    async fn query(&self, filters: &FilterState) -> Result<Page<R::Row>, AppError> {
        let client = &self.client;
        client
            .send(
                client
                    .http
                    .get(client.url(R::PATH))
                    .query(&filters.to_query_pairs()),
            )
            .await
    }

    async fn get(&self, id: &str) -> Result<Option<R::Record>, AppError> {
        let client = &self.client;
        match client
            .send(client.http.get(client.url(&format!("{}/{}", R::PATH, id))))
            .await
        {
            Ok(record) => Ok(Some(record)),
            Err(AppError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    async fn create(&self, payload: &R::Create) -> Result<R::Record, AppError> {
        let client = &self.client;
        client
            .send(client.http.post(client.url(R::PATH)).json(payload))
            .await
    }

    async fn update(&self, id: &str, partial: &R::Update) -> Result<R::Record, AppError> {
        let client = &self.client;
        client
            .send(
                client
                    .http
                    .put(client.url(&format!("{}/{}", R::PATH, id)))
                    .json(partial),
            )
            .await
    }

    async fn delete(&self, id: &str) -> Result<(), AppError> {
        let client = &self.client;
        client
            .send(client.http.delete(client.url(&format!("{}/{}", R::PATH, id))))
            .await
    }

    async fn exists_by_unique_field(
        &self,
        value: &str,
        exclude_id: Option<&str>,
    ) -> Result<bool, AppError> {
        let client = &self.client;
        let query = ExistsQuery {
            value: value.to_string(),
            exclude_id: exclude_id.map(str::to_string),
        };
        client
            .send(
                client
                    .http
                    .get(client.url(&format!("{}/exists", R::PATH)))
                    .query(&query),
            )
            .await
    }
}
