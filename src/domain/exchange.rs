use {
    axum::http::{HeaderMap, Method},
    serde_json::{Map, Value},
};

/// Authenticated actor credentials, inserted as a request extension by
/// whatever auth layer runs in front of the audited routes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Credentials(pub Value);

/// What a capture hook sees of the request.
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: Method,
    pub path: String,
    pub params: Map<String, Value>,
    pub payload: Option<Value>,
    pub headers: HeaderMap,
    pub remote_addr: Option<String>,
    pub credentials: Option<Credentials>,
}

impl CapturedRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Map::new(),
            payload: None,
            headers: HeaderMap::new(),
            remote_addr: None,
            credentials: None,
        }
    }

    /// Path parameter by name.
    pub fn param(&self, name: &str) -> Option<&Value> {
        self.params.get(name).filter(|v| !v.is_null())
    }

    pub fn with_param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name.to_string(), value.into());
        self
    }

    pub fn with_payload(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    pub fn with_remote_addr(mut self, addr: impl Into<String>) -> Self {
        self.remote_addr = Some(addr.into());
        self
    }

    pub fn with_credentials(mut self, credentials: Value) -> Self {
        self.credentials = Some(Credentials(credentials));
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorPayload {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ErrorOutput {
    pub status_code: u16,
    pub payload: ErrorPayload,
}

/// The response as computed by the handler, before transmission.
#[derive(Debug, Clone, PartialEq)]
pub enum CapturedResponse {
    Success {
        status_code: u16,
        body: Option<Value>,
    },
    Failure {
        status_code: Option<u16>,
        output: ErrorOutput,
    },
}

impl CapturedResponse {
    pub fn success(status_code: u16, body: Option<Value>) -> Self {
        Self::Success { status_code, body }
    }

    pub fn failure(status_code: u16, message: impl Into<String>) -> Self {
        Self::Failure {
            status_code: Some(status_code),
            output: ErrorOutput {
                status_code,
                payload: ErrorPayload {
                    message: message.into(),
                },
            },
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// Explicit status first, then the error output's status.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Success { status_code, .. } => *status_code,
            Self::Failure {
                status_code,
                output,
            } => status_code.unwrap_or(output.status_code),
        }
    }

    pub fn body(&self) -> Option<&Value> {
        match self {
            Self::Success { body, .. } => body.as_ref().filter(|b| !b.is_null()),
            Self::Failure { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { output, .. } => Some(&output.payload.message),
        }
    }
}
