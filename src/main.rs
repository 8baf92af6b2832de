//! One-shot webhook connectivity check: POSTs a synthetic text-message
//! event to the endpoint below and prints whatever comes back.
//!
//! Edit the two constants before running. The process exits 0 either way;
//! the printed `Response:` / `Error:` line is the result.

use tracing_subscriber::EnvFilter;

use webhook_probe::{EventEnvelope, WebhookSender};

/// Replace with the webhook endpoint under test.
const WEBHOOK_URL: &str = "YOUR_WEBHOOK_URL";

/// Replace with the user id the receiver expects in `source.userId`.
const TARGET_USER_ID: &str = "YOUR_TARGET_USER_ID";

#[tokio::main]
async fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let envelope = EventEnvelope::synthetic_text_message(TARGET_USER_ID);
    let outcome = WebhookSender::new().deliver(WEBHOOK_URL, &envelope).await;
    outcome.emit();
}
