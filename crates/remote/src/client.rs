//! HTTP client for the collection backend.
//!
//! Speaks a PostgREST-shaped API: filtered selects, upsert-on-conflict
//! inserts, and keyed updates/deletes over `collection_items`, plus a name
//! lookup over `teas` for identifier resolution.

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;

use caddy_core::collection::{CollectionItem, CollectionItemPatch};
use caddy_core::errors::RemoteStoreError;
use caddy_core::sync::{NewCollectionItem, RemoteCollectionStore};

use crate::error::{RemoteApiError, Result};
use crate::types::{
    ApiErrorResponse, CollectionItemRow, InsertCollectionItemBody, TeaRow,
    UpdateCollectionItemBody,
};

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const MAX_LOG_BODY_CHARS: usize = 512;

/// Connection settings for the collection backend.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL of the backend (e.g. "https://abcdefgh.supabase.co").
    pub base_url: String,
    /// Project API key sent with every request.
    pub api_key: String,
    /// User access token; requests fall back to the API key when absent.
    pub access_token: Option<String>,
}

/// Client for the collection REST backend.
#[derive(Debug, Clone)]
pub struct CollectionApiClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    access_token: Option<String>,
}

impl CollectionApiClient {
    pub fn new(config: RemoteConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            access_token: config.access_token,
        }
    }

    /// Create headers for an API request.
    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let api_key_value = HeaderValue::from_str(&self.api_key)
            .map_err(|_| RemoteApiError::auth("Invalid API key format"))?;
        headers.insert("apikey", api_key_value);

        let bearer = self.access_token.as_deref().unwrap_or(&self.api_key);
        let auth_value = HeaderValue::from_str(&format!("Bearer {}", bearer))
            .map_err(|_| RemoteApiError::auth("Invalid access token format"))?;
        headers.insert(AUTHORIZATION, auth_value);

        Ok(headers)
    }

    fn log_response(status: reqwest::StatusCode, body: &str) {
        if status.is_success() {
            debug!("API response status: {}", status);
            return;
        }

        let mut preview = body.chars().take(MAX_LOG_BODY_CHARS).collect::<String>();
        if body.chars().count() > MAX_LOG_BODY_CHARS {
            preview.push_str("...");
        }
        debug!("API response error ({}): {}", status, preview);
    }

    /// Parse a JSON response body.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();
        let body = response.text().await?;
        Self::log_response(status, &body);

        if !status.is_success() {
            if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(&body) {
                return Err(RemoteApiError::api(
                    status.as_u16(),
                    format!("{}: {}", error.code, error.message),
                ));
            }
            return Err(RemoteApiError::api(
                status.as_u16(),
                format!("Request failed: {}", body),
            ));
        }

        serde_json::from_str(&body).map_err(|e| {
            log::error!("Failed to deserialize response. Body: {}, Error: {}", body, e);
            RemoteApiError::api(status.as_u16(), format!("Failed to parse response: {}", e))
        })
    }

    /// Check status on endpoints whose body we do not need.
    async fn check_response(response: reqwest::Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }

        let body = response.text().await?;
        Self::log_response(status, &body);
        if let Ok(error) = serde_json::from_str::<ApiErrorResponse>(&body) {
            return Err(RemoteApiError::api(
                status.as_u16(),
                format!("{}: {}", error.code, error.message),
            ));
        }
        Err(RemoteApiError::api(
            status.as_u16(),
            format!("Request failed: {}", body),
        ))
    }

    /// All collection items owned by a user, newest first.
    ///
    /// GET /rest/v1/collection_items?user_id=eq.{uid}&select=*&order=added_at.desc
    pub async fn list_items(&self, user_id: &str) -> Result<Vec<CollectionItem>> {
        let url = format!(
            "{}/rest/v1/collection_items?user_id=eq.{}&select=*&order=added_at.desc",
            self.base_url,
            urlencoding::encode(user_id)
        );

        let response = self.client.get(&url).headers(self.headers()?).send().await?;
        let rows: Vec<CollectionItemRow> = Self::parse_response(response).await?;
        Ok(rows.into_iter().map(CollectionItemRow::into_domain).collect())
    }

    /// Upsert on the `(user_id, tea_id)` conflict key.
    ///
    /// POST /rest/v1/collection_items?on_conflict=user_id,tea_id
    pub async fn upsert_item(&self, item: &NewCollectionItem) -> Result<()> {
        let url = format!(
            "{}/rest/v1/collection_items?on_conflict=user_id,tea_id",
            self.base_url
        );

        let mut headers = self.headers()?;
        headers.insert(
            "Prefer",
            HeaderValue::from_static("resolution=merge-duplicates,return=minimal"),
        );
        let body = InsertCollectionItemBody {
            user_id: &item.user_id,
            tea_id: &item.tea_id,
            status: item.status,
        };

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await?;
        Self::check_response(response).await
    }

    /// Partial update of the row keyed by `(user_id, tea_id)`.
    ///
    /// PATCH /rest/v1/collection_items?user_id=eq.{uid}&tea_id=eq.{tid}
    pub async fn update_item(
        &self,
        user_id: &str,
        tea_id: &str,
        patch: &CollectionItemPatch,
    ) -> Result<()> {
        let url = format!(
            "{}/rest/v1/collection_items?user_id=eq.{}&tea_id=eq.{}",
            self.base_url,
            urlencoding::encode(user_id),
            urlencoding::encode(tea_id)
        );

        let body = UpdateCollectionItemBody::from(patch);
        let response = self
            .client
            .patch(&url)
            .headers(self.headers()?)
            .json(&body)
            .send()
            .await?;
        Self::check_response(response).await
    }

    /// Delete the row keyed by `(user_id, tea_id)`.
    ///
    /// DELETE /rest/v1/collection_items?user_id=eq.{uid}&tea_id=eq.{tid}
    pub async fn delete_item(&self, user_id: &str, tea_id: &str) -> Result<()> {
        let url = format!(
            "{}/rest/v1/collection_items?user_id=eq.{}&tea_id=eq.{}",
            self.base_url,
            urlencoding::encode(user_id),
            urlencoding::encode(tea_id)
        );

        let response = self
            .client
            .delete(&url)
            .headers(self.headers()?)
            .send()
            .await?;
        Self::check_response(response).await
    }

    /// Canonical id for an exact display-name match.
    ///
    /// Asks for two rows so "exactly one match" is checkable client-side.
    ///
    /// GET /rest/v1/teas?select=id,name&name=eq.{name}&limit=2
    pub async fn find_tea_id_by_name(&self, name: &str) -> Result<Option<String>> {
        let url = format!(
            "{}/rest/v1/teas?select=id,name&name=eq.{}&limit=2",
            self.base_url,
            urlencoding::encode(name)
        );

        let response = self.client.get(&url).headers(self.headers()?).send().await?;
        let rows: Vec<TeaRow> = Self::parse_response(response).await?;
        match rows.as_slice() {
            [row] => Ok(Some(row.id.clone())),
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl RemoteCollectionStore for CollectionApiClient {
    async fn list_items(
        &self,
        user_id: &str,
    ) -> std::result::Result<Vec<CollectionItem>, RemoteStoreError> {
        CollectionApiClient::list_items(self, user_id)
            .await
            .map_err(RemoteStoreError::from)
    }

    async fn upsert_item(
        &self,
        item: &NewCollectionItem,
    ) -> std::result::Result<(), RemoteStoreError> {
        CollectionApiClient::upsert_item(self, item)
            .await
            .map_err(RemoteStoreError::from)
    }

    async fn update_item(
        &self,
        user_id: &str,
        tea_id: &str,
        patch: &CollectionItemPatch,
    ) -> std::result::Result<(), RemoteStoreError> {
        CollectionApiClient::update_item(self, user_id, tea_id, patch)
            .await
            .map_err(RemoteStoreError::from)
    }

    async fn delete_item(
        &self,
        user_id: &str,
        tea_id: &str,
    ) -> std::result::Result<(), RemoteStoreError> {
        CollectionApiClient::delete_item(self, user_id, tea_id)
            .await
            .map_err(RemoteStoreError::from)
    }

    async fn find_tea_id_by_name(
        &self,
        name: &str,
    ) -> std::result::Result<Option<String>, RemoteStoreError> {
        CollectionApiClient::find_tea_id_by_name(self, name)
            .await
            .map_err(RemoteStoreError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use caddy_core::collection::ItemStatus;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::sync::Mutex as TokioMutex;

    #[derive(Debug, Clone)]
    struct CapturedRequest {
        method: String,
        target: String,
        headers: HashMap<String, String>,
        body: String,
    }

    #[derive(Debug, Clone)]
    struct MockResponse {
        status: u16,
        body: String,
    }

    fn header_end_offset(buffer: &[u8]) -> Option<usize> {
        buffer.windows(4).position(|window| window == b"\r\n\r\n")
    }

    async fn read_http_request(stream: &mut tokio::net::TcpStream) -> Option<CapturedRequest> {
        let mut buffer = Vec::new();
        loop {
            let mut chunk = [0_u8; 2048];
            let read = stream.read(&mut chunk).await.ok()?;
            if read == 0 {
                return None;
            }
            buffer.extend_from_slice(&chunk[..read]);
            if header_end_offset(&buffer).is_some() {
                break;
            }
        }

        let header_end = header_end_offset(&buffer)?;
        let head = String::from_utf8_lossy(&buffer[..header_end]).to_string();
        let mut lines = head.lines();
        let request_line = lines.next()?.to_string();
        let mut parts = request_line.split_whitespace();
        let method = parts.next()?.to_string();
        let target = parts.next()?.to_string();

        let mut headers = HashMap::new();
        for line in lines {
            if let Some((name, value)) = line.split_once(':') {
                headers.insert(name.trim().to_ascii_lowercase(), value.trim().to_string());
            }
        }

        let content_length = headers
            .get("content-length")
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(0);

        let mut body = buffer[header_end + 4..].to_vec();
        while body.len() < content_length {
            let mut chunk = [0_u8; 2048];
            let read = stream.read(&mut chunk).await.ok()?;
            if read == 0 {
                break;
            }
            body.extend_from_slice(&chunk[..read]);
        }

        Some(CapturedRequest {
            method,
            target,
            headers,
            body: String::from_utf8_lossy(&body).to_string(),
        })
    }

    fn status_text(status: u16) -> &'static str {
        match status {
            200 => "OK",
            201 => "Created",
            204 => "No Content",
            400 => "Bad Request",
            401 => "Unauthorized",
            409 => "Conflict",
            500 => "Internal Server Error",
            _ => "Error",
        }
    }

    async fn write_http_response(
        stream: &mut tokio::net::TcpStream,
        status: u16,
        body: &str,
    ) -> std::io::Result<()> {
        let response = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            status_text(status),
            body.len(),
            body
        );
        stream.write_all(response.as_bytes()).await?;
        stream.flush().await
    }

    async fn start_mock_server(
        responses: Vec<MockResponse>,
    ) -> (
        String,
        Arc<TokioMutex<Vec<CapturedRequest>>>,
        tokio::task::JoinHandle<()>,
    ) {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("listener addr");
        let captured = Arc::new(TokioMutex::new(Vec::<CapturedRequest>::new()));
        let scripted = Arc::new(TokioMutex::new(VecDeque::from(responses)));
        let captured_clone = Arc::clone(&captured);
        let scripted_clone = Arc::clone(&scripted);

        let handle = tokio::spawn(async move {
            loop {
                let (mut stream, _) = match listener.accept().await {
                    Ok(value) => value,
                    Err(_) => break,
                };
                let captured_inner = Arc::clone(&captured_clone);
                let scripted_inner = Arc::clone(&scripted_clone);
                tokio::spawn(async move {
                    let Some(request) = read_http_request(&mut stream).await else {
                        return;
                    };
                    captured_inner.lock().await.push(request);

                    let response =
                        scripted_inner
                            .lock()
                            .await
                            .pop_front()
                            .unwrap_or(MockResponse {
                                status: 500,
                                body: r#"{"code":"INTERNAL","message":"unexpected request"}"#
                                    .to_string(),
                            });
                    let _ = write_http_response(&mut stream, response.status, &response.body).await;
                });
            }
        });

        (format!("http://{}", addr), captured, handle)
    }

    fn client(base_url: &str) -> CollectionApiClient {
        CollectionApiClient::new(RemoteConfig {
            base_url: base_url.to_string(),
            api_key: "anon-key".to_string(),
            access_token: Some("user-token".to_string()),
        })
    }

    #[tokio::test]
    async fn list_items_queries_by_user_and_parses_mixed_rows() {
        let body = r#"[
            {"id":"row-1","user_id":"u1","tea_id":"t1","status":"tried","added_at":"2026-07-02T10:00:00Z"},
            {"id":"row-2","userId":"u1","teaId":"t2","addedAt":"2026-07-01T10:00:00Z"}
        ]"#;
        let (base_url, captured, server) = start_mock_server(vec![MockResponse {
            status: 200,
            body: body.to_string(),
        }])
        .await;

        let items = client(&base_url).list_items("u1").await.expect("list");

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].tea_id, "t1");
        assert_eq!(items[0].status, ItemStatus::Tried);
        assert_eq!(items[1].tea_id, "t2");
        assert_eq!(items[1].status, ItemStatus::WantToTry);

        let requests = captured.lock().await.clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "GET");
        assert_eq!(
            requests[0].target,
            "/rest/v1/collection_items?user_id=eq.u1&select=*&order=added_at.desc"
        );
        assert_eq!(
            requests[0].headers.get("authorization").map(String::as_str),
            Some("Bearer user-token")
        );
        assert_eq!(
            requests[0].headers.get("apikey").map(String::as_str),
            Some("anon-key")
        );

        server.abort();
    }

    #[tokio::test]
    async fn upsert_targets_the_conflict_key() {
        let (base_url, captured, server) = start_mock_server(vec![MockResponse {
            status: 201,
            body: String::new(),
        }])
        .await;

        client(&base_url)
            .upsert_item(&NewCollectionItem {
                user_id: "u1".to_string(),
                tea_id: "t1".to_string(),
                status: ItemStatus::WantToTry,
            })
            .await
            .expect("upsert");

        let requests = captured.lock().await.clone();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "POST");
        assert_eq!(
            requests[0].target,
            "/rest/v1/collection_items?on_conflict=user_id,tea_id"
        );
        assert_eq!(
            requests[0].headers.get("prefer").map(String::as_str),
            Some("resolution=merge-duplicates,return=minimal")
        );
        let body: serde_json::Value =
            serde_json::from_str(&requests[0].body).expect("request body");
        assert_eq!(
            body,
            serde_json::json!({"user_id":"u1","tea_id":"t1","status":"want_to_try"})
        );

        server.abort();
    }

    #[tokio::test]
    async fn api_error_bodies_become_api_errors() {
        let (base_url, _captured, server) = start_mock_server(vec![MockResponse {
            status: 401,
            body: r#"{"code":"PGRST301","message":"JWT expired"}"#.to_string(),
        }])
        .await;

        let err = client(&base_url)
            .list_items("u1")
            .await
            .expect_err("unauthorized");

        match err {
            RemoteApiError::Api { status, message } => {
                assert_eq!(status, 401);
                assert!(message.contains("JWT expired"));
            }
            other => panic!("expected Api error, got {:?}", other),
        }

        server.abort();
    }

    #[tokio::test]
    async fn tea_lookup_requires_exactly_one_match() {
        let (base_url, captured, server) = start_mock_server(vec![
            MockResponse {
                status: 200,
                body: r#"[{"id":"tea-uuid-1","name":"Dragon Well"}]"#.to_string(),
            },
            MockResponse {
                status: 200,
                body: r#"[{"id":"a","name":"Dup"},{"id":"b","name":"Dup"}]"#.to_string(),
            },
            MockResponse {
                status: 200,
                body: "[]".to_string(),
            },
        ])
        .await;

        let api = client(&base_url);
        assert_eq!(
            api.find_tea_id_by_name("Dragon Well").await.expect("one match"),
            Some("tea-uuid-1".to_string())
        );
        assert_eq!(api.find_tea_id_by_name("Dup").await.expect("two matches"), None);
        assert_eq!(api.find_tea_id_by_name("Nope").await.expect("no match"), None);

        let requests = captured.lock().await.clone();
        assert_eq!(
            requests[0].target,
            "/rest/v1/teas?select=id,name&name=eq.Dragon%20Well&limit=2"
        );

        server.abort();
    }

    #[tokio::test]
    async fn delete_keys_on_user_and_tea() {
        let (base_url, captured, server) = start_mock_server(vec![MockResponse {
            status: 204,
            body: String::new(),
        }])
        .await;

        client(&base_url).delete_item("u1", "t1").await.expect("delete");

        let requests = captured.lock().await.clone();
        assert_eq!(requests[0].method, "DELETE");
        assert_eq!(
            requests[0].target,
            "/rest/v1/collection_items?user_id=eq.u1&tea_id=eq.t1"
        );

        server.abort();
    }
}
