//! Thin blocking HTTP layer over `ureq`.
//!
//! Responses with any status come back as [`HttpResponse`]; only transport
//! failures are errors at this level. Adapters decide which statuses an
//! operation accepts.

use std::io::Read;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::Value;

use rollcall_core::config::{RetryConfig, RunConfig};

use crate::error::DirectoryError;
use crate::retry::RetryPolicy;

// ---------------------------------------------------------------------------
// Request description
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl Method {
    fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Clone)]
pub enum Auth {
    None,
    Bearer(String),
    Basic { username: String, password: String },
}

impl Auth {
    fn header(&self) -> Option<String> {
        match self {
            Auth::None => None,
            Auth::Bearer(token) => Some(format!("Bearer {token}")),
            Auth::Basic { username, password } => {
                Some(format!("Basic {}", STANDARD.encode(format!("{username}:{password}"))))
            }
        }
    }
}

#[derive(Clone)]
pub enum Body {
    Empty,
    Json(String),
    Form(Vec<(String, String)>),
}

/// One outbound call. `operation` labels logs and errors.
#[derive(Clone)]
pub struct HttpRequest {
    pub operation: String,
    pub method: Method,
    pub url: String,
    pub query: Vec<(String, String)>,
    pub auth: Auth,
    pub body: Body,
}

impl HttpRequest {
    pub fn new(operation: impl Into<String>, method: Method, url: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            method,
            url: url.into(),
            query: Vec::new(),
            auth: Auth::None,
            body: Body::Empty,
        }
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn auth(mut self, auth: Auth) -> Self {
        self.auth = auth;
        self
    }

    pub fn json(mut self, body: String) -> Self {
        self.body = Body::Json(body);
        self
    }

    pub fn form(mut self, fields: Vec<(String, String)>) -> Self {
        self.body = Body::Form(fields);
        self
    }
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self, operation: &str) -> Result<Value, DirectoryError> {
        serde_json::from_str(&self.body).map_err(|e| DirectoryError::decode(operation, e.to_string()))
    }

    /// String at a JSON pointer, if the body is JSON and the value is a string.
    pub fn string_at(&self, pointer: &str) -> Option<String> {
        let value: Value = serde_json::from_str(&self.body).ok()?;
        value.pointer(pointer)?.as_str().map(str::to_string)
    }

    /// Record id at a JSON pointer; numeric ids are rendered as strings.
    pub fn id_at(&self, pointer: &str) -> Option<String> {
        let value: Value = serde_json::from_str(&self.body).ok()?;
        match value.pointer(pointer)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// The content-share `errorKey`, if present.
    pub fn error_key(&self) -> Option<String> {
        self.string_at("/errorKey")
    }

    /// `Ok(self)` when `status` is in `accepted`, else a request error.
    pub fn accept(self, operation: &str, accepted: &[u16]) -> Result<Self, DirectoryError> {
        if accepted.contains(&self.status) {
            Ok(self)
        } else {
            Err(self.into_error(operation))
        }
    }

    pub fn into_error(self, operation: &str) -> DirectoryError {
        DirectoryError::Request {
            operation: operation.to_string(),
            status: self.status,
            detail: self.body,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Shared `ureq` agent plus the retry policy for idempotent calls.
#[derive(Clone)]
pub struct HttpClient {
    agent: ureq::Agent,
    retry: RetryPolicy,
}

impl HttpClient {
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent, retry }
    }

    pub fn from_config(run: &RunConfig, retry: &RetryConfig) -> Self {
        Self::new(
            Duration::from_secs(run.request_timeout_secs),
            RetryPolicy::from_config(retry),
        )
    }

    /// Single attempt.
    pub fn send(&self, request: &HttpRequest) -> Result<HttpResponse, DirectoryError> {
        let mut call = self.agent.request(request.method.as_str(), &request.url);
        for (key, value) in &request.query {
            call = call.query(key, value);
        }
        if let Some(header) = request.auth.header() {
            call = call.set("Authorization", &header);
        }
        call = call.set("Accept", "application/json");

        let outcome = match &request.body {
            Body::Empty => call.call(),
            Body::Json(body) => call.set("Content-Type", "application/json").send_string(body),
            Body::Form(fields) => {
                let pairs: Vec<(&str, &str)> =
                    fields.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
                call.send_form(&pairs)
            }
        };

        let response = match outcome {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => {
                return Err(DirectoryError::Transport {
                    operation: request.operation.clone(),
                    message: transport.to_string(),
                })
            }
        };

        // `into_string` caps bodies at 10 MB; roster feeds can be larger.
        let status = response.status();
        let mut body = String::new();
        response
            .into_reader()
            .read_to_string(&mut body)
            .map_err(|e| DirectoryError::Transport {
                operation: request.operation.clone(),
                message: format!("reading response body: {e}"),
            })?;
        tracing::debug!(operation = %request.operation, status, "response");
        Ok(HttpResponse { status, body })
    }

    /// Retried on transport failures, 429 and 5xx.
    pub fn send_idempotent(&self, request: &HttpRequest) -> Result<HttpResponse, DirectoryError> {
        self.retry.execute(&request.operation, || {
            let response = self.send(request)?;
            if response.status == 429 || response.status >= 500 {
                Err(response.into_error(&request.operation))
            } else {
                Ok(response)
            }
        })
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient").field("retry", &self.retry).finish()
    }
}

/// Join a base URL and a path without doubling slashes.
pub fn join(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
