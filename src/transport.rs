use std::{future::Future, pin::Pin, time::{Duration, Instant}};

use bytes::Bytes;
use reqwest::Client as ReqwestClient;
use reqwest::header::HeaderValue;
use thiserror::Error;
use tracing::debug;

pub type ProbeBytes = Bytes;
pub type ProbeFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Transport phase in which a delivery failed. Diagnostic only: the console
/// contract collapses every kind into a single `Error:` line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProbeErrorKind {
    Connect,
    Send,
    Receive,
    Timeout,
    Encode,
    Internal,
}

#[derive(Clone, Debug, Error)]
#[error("{kind:?} transport failure status={status:?}: {message}")]
pub struct ProbeError {
    pub kind: ProbeErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl ProbeError {
    pub fn new(kind: ProbeErrorKind, status: Option<u16>, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
        }
    }

    pub fn encode(err: sonic_rs::Error) -> Self {
        Self::new(ProbeErrorKind::Encode, None, err.to_string())
    }

    fn from_reqwest(phase: ProbeErrorKind, err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ProbeErrorKind::Timeout
        } else if err.is_connect() {
            ProbeErrorKind::Connect
        } else {
            phase
        };
        let status = err.status().map(|s| s.as_u16());
        Self::new(kind, status, err.to_string())
    }

    pub fn kind(&self) -> ProbeErrorKind {
        self.kind
    }
}

/// One outbound POST. The probe never retries and never overrides the HTTP
/// client's own timeouts, so neither concern appears here.
#[derive(Clone, Debug)]
pub struct ProbeRequest {
    pub url: String,
    pub headers: Vec<(String, ProbeBytes)>,
    pub body: Option<ProbeBytes>,
}

impl ProbeRequest {
    pub fn post(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<ProbeBytes>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<ProbeBytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn header(&self, key: &str) -> Option<&ProbeBytes> {
        self.headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
            .map(|(_, value)| value)
    }
}

/// Any received response is a successful transport outcome, whatever its
/// status code.
#[derive(Clone, Debug)]
pub struct ProbeResponse {
    pub status: u16,
    pub body: ProbeBytes,
    pub elapsed: Duration,
}

impl ProbeResponse {
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

pub trait ProbeTransport: Send + Sync {
    fn execute(&self, request: ProbeRequest) -> ProbeFuture<ProbeResult<ProbeResponse>>;
}

#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self {
            client: ReqwestClient::new(),
        }
    }
}

impl Default for ReqwestTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeTransport for ReqwestTransport {
    fn execute(&self, request: ProbeRequest) -> ProbeFuture<ProbeResult<ProbeResponse>> {
        let client = self.client.clone();
        Box::pin(async move {
            let start = Instant::now();
            debug!(url = %request.url, "dispatching POST");

            let mut req = client.post(&request.url);
            for (key, value) in request.headers {
                let value = HeaderValue::from_bytes(value.as_ref())
                    .map_err(|err| ProbeError::new(ProbeErrorKind::Internal, None, err.to_string()))?;
                req = req.header(key, value);
            }
            if let Some(body) = request.body {
                req = req.body(body);
            }

            let resp = req
                .send()
                .await
                .map_err(|err| ProbeError::from_reqwest(ProbeErrorKind::Send, err))?;

            let status = resp.status().as_u16();
            let body = resp
                .bytes()
                .await
                .map_err(|err| ProbeError::from_reqwest(ProbeErrorKind::Receive, err))?;
            let elapsed = start.elapsed();
            debug!(status, elapsed_ms = elapsed.as_millis() as u64, "response received");

            Ok(ProbeResponse {
                status,
                body,
                elapsed,
            })
        })
    }
}
