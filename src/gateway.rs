use std::sync::Arc;

use reqwest::multipart::Form;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::session::SessionManager;

/// The single chokepoint for all network I/O.
///
/// Every request goes out as POST with the session token appended as a
/// query parameter when one exists; responses are classified into the
/// [`ClientError`] taxonomy in one place so every component reports
/// failures the same way.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Arc<SessionManager>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, session: Arc<SessionManager>) -> Self {
        Self {
            http: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST with no body. Used by session creation and ack-only endpoints.
    pub async fn post_empty<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> ClientResult<T> {
        let request = self.http.post(self.url(path)).query(params);
        self.dispatch(path, request).await
    }

    /// POST a JSON body.
    pub async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
        params: &[(&str, String)],
    ) -> ClientResult<T> {
        let request = self.http.post(self.url(path)).query(params).json(body);
        self.dispatch(path, request).await
    }

    /// POST a multipart form. Used by file upload.
    pub async fn post_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
        params: &[(&str, String)],
    ) -> ClientResult<T> {
        let request = self
            .http
            .post(self.url(path))
            .query(params)
            .multipart(form);
        self.dispatch(path, request).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        path: &str,
        mut request: RequestBuilder,
    ) -> ClientResult<T> {
        // Never block on session creation here: requests issued before a
        // session exists go out tokenless and come back as 403.
        if let Some(session) = self.session.current() {
            request = request.query(&[("token", session.token.as_str())]);
        }

        let request_id = Uuid::new_v4();
        debug!(%request_id, path, "request out");

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(%request_id, path, %status, "response in");

        let json = classify_response(status, &body)?;
        serde_json::from_value(json).map_err(|_| ClientError::Network)
    }
}

/// Classify a raw HTTP response into the client error taxonomy.
///
/// Pure so it is testable without a socket: 403 always means the session
/// is gone, any other non-2xx surfaces the server's `detail` field, and a
/// 2xx must carry valid JSON.
pub fn classify_response(status: StatusCode, body: &str) -> ClientResult<serde_json::Value> {
    if status == StatusCode::FORBIDDEN {
        return Err(ClientError::Session);
    }
    let parsed: Result<serde_json::Value, _> = serde_json::from_str(body);
    if status.is_success() {
        return parsed.map_err(|_| ClientError::Network);
    }
    let detail = match parsed {
        Ok(json) => match json.get("detail") {
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => status.to_string(),
        },
        Err(_) => status.to_string(),
    };
    Err(ClientError::Api { detail })
}
