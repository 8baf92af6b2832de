use std::sync::Arc;

use tracing::{debug, info};

use crate::event::EventEnvelope;
use crate::transport::{ProbeError, ProbeRequest, ProbeTransport, ReqwestTransport};

/// Value of the one header every probe request carries.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Result of one delivery attempt, already collapsed to the console
/// contract: any received response (4xx and 5xx included) is `Response`,
/// only transport-level failures are `Failed`.
#[derive(Clone, Debug)]
pub enum ProbeOutcome {
    Response(String),
    Failed(ProbeError),
}

impl ProbeOutcome {
    /// The single line this run prints: `Response: <body>` or
    /// `Error: <description>`.
    pub fn console_line(&self) -> String {
        match self {
            Self::Response(body) => format!("Response: {body}"),
            Self::Failed(err) => format!("Error: {err}"),
        }
    }

    /// Prints the line: responses to stdout, errors to stderr.
    pub fn emit(&self) {
        match self {
            Self::Response(_) => println!("{}", self.console_line()),
            Self::Failed(_) => eprintln!("{}", self.console_line()),
        }
    }
}

#[derive(Clone)]
pub struct WebhookSender {
    transport: Arc<dyn ProbeTransport>,
}

impl WebhookSender {
    pub fn new() -> Self {
        Self::with_transport(ReqwestTransport::new())
    }

    pub fn with_transport<T>(transport: T) -> Self
    where
        T: ProbeTransport + 'static,
    {
        Self {
            transport: Arc::new(transport),
        }
    }

    /// Delivers `envelope` to `url` with exactly one POST. Never retries,
    /// never inspects the status code, never panics: every failure path
    /// folds into the returned outcome.
    pub async fn deliver(&self, url: impl Into<String>, envelope: &EventEnvelope) -> ProbeOutcome {
        let url = url.into();
        let body = match sonic_rs::to_vec(envelope) {
            Ok(body) => body,
            Err(err) => return ProbeOutcome::Failed(ProbeError::encode(err)),
        };

        info!(%url, bytes = body.len(), "sending synthetic webhook event");
        let request = ProbeRequest::post(url)
            .with_header("content-type", JSON_CONTENT_TYPE)
            .with_body(body);

        match self.transport.execute(request).await {
            Ok(response) => {
                debug!(
                    status = response.status(),
                    elapsed_ms = response.elapsed.as_millis() as u64,
                    "webhook endpoint answered"
                );
                ProbeOutcome::Response(response.text())
            }
            Err(err) => {
                debug!(%err, "webhook delivery failed");
                ProbeOutcome::Failed(err)
            }
        }
    }
}

impl Default for WebhookSender {
    fn default() -> Self {
        Self::new()
    }
}
