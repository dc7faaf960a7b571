//! Storage and database client.
//!
//! Talks to a Supabase-compatible REST API:
//! - objects: `POST {url}/storage/v1/object/{bucket}/{path}`
//! - rows: `POST` / `GET {url}/rest/v1/{table}`

use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::header::{AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};
use serde_json::Value;
use tracing::debug;

use crate::{StorageError, StorageResult};

/// HTTP request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Cache lifetime sent with uploaded objects, in seconds.
const OBJECT_CACHE_SECONDS: u32 = 3600;

/// Remote operations used by the smoke test.
pub trait StorageBackend {
    /// Upload an object. Existing objects are never overwritten.
    fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()>;

    /// Insert a row and return it as stored.
    fn insert_row(&self, table: &str, row: &Value) -> StorageResult<Value>;

    /// All rows of `table` whose `kcode` equals `kcode`.
    fn select_by_kcode(&self, table: &str, kcode: &str) -> StorageResult<Vec<Value>>;

    /// Public URL of an object. Private buckets still require auth.
    fn public_url(&self, bucket: &str, path: &str) -> String;
}

/// Blocking client for a Supabase project.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl SupabaseClient {
    /// Create a client for the project at `url`, authenticating with `api_key`.
    pub fn new(url: &str, api_key: &str) -> StorageResult<Self> {
        let base_url = url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(StorageError::Config("storage URL is empty".into()));
        }
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(StorageError::Config(format!(
                "storage URL must start with http:// or https://: {base_url}"
            )));
        }
        if api_key.trim().is_empty() {
            return Err(StorageError::Config("API key is empty".into()));
        }

        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url,
            api_key: api_key.trim().to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{bucket}/{path}", self.base_url)
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.api_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
    }
}

/// Fail with [`StorageError::Http`] on a non-success status.
fn check_status(operation: &'static str, response: Response) -> StorageResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response
        .text()
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(StorageError::Http {
        operation,
        status: status.as_u16(),
        message,
    })
}

fn rows_from(operation: &'static str, body: Value) -> StorageResult<Vec<Value>> {
    match body {
        Value::Array(rows) => Ok(rows),
        other => Err(StorageError::Response {
            operation,
            message: format!("expected a JSON array, got {other}"),
        }),
    }
}

impl StorageBackend for SupabaseClient {
    fn upload_object(
        &self,
        bucket: &str,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> StorageResult<()> {
        debug!(bucket, path, bytes = bytes.len(), "Uploading object");
        let response = self
            .authorized(self.client.post(self.object_url(bucket, path)))
            .header(CONTENT_TYPE, content_type)
            .header(CACHE_CONTROL, format!("max-age={OBJECT_CACHE_SECONDS}"))
            .header("x-upsert", "false")
            .body(bytes)
            .send()?;
        check_status("upload", response)?;
        Ok(())
    }

    fn insert_row(&self, table: &str, row: &Value) -> StorageResult<Value> {
        debug!(table, "Inserting row");
        let response = self
            .authorized(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(row)
            .send()?;
        let body: Value = check_status("insert", response)?.json()?;
        rows_from("insert", body)?
            .into_iter()
            .next()
            .ok_or(StorageError::Response {
                operation: "insert",
                message: "no row returned".to_string(),
            })
    }

    fn select_by_kcode(&self, table: &str, kcode: &str) -> StorageResult<Vec<Value>> {
        debug!(table, kcode, "Selecting rows");
        let response = self
            .authorized(self.client.get(self.table_url(table)))
            .query(&[("select", "*".to_string()), ("kcode", format!("eq.{kcode}"))])
            .send()?;
        let body: Value = check_status("select", response)?.json()?;
        rows_from("select", body)
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{path}", self.base_url)
    }
}
