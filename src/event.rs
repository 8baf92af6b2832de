//! The synthetic inbound-message payload the probe delivers.
//!
//! The wire shape matches what a messaging-webhook receiver expects:
//! a top-level envelope holding one `message` event with a text body and
//! the sending user's id.

use serde::{Deserialize, Serialize};

/// Text body carried by every synthetic event.
pub const TEST_MESSAGE_TEXT: &str = "測試訊息";
/// Message id carried by every synthetic event.
pub const TEST_MESSAGE_ID: &str = "test123";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub events: Vec<WebhookEvent>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WebhookEvent {
    Message {
        message: MessagePayload,
        source: EventSource,
    },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum MessagePayload {
    Text { text: String, id: String },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSource {
    #[serde(rename = "userId")]
    pub user_id: String,
}

impl EventEnvelope {
    /// Builds the fixed test payload: exactly one text-message event
    /// addressed from `user_id`.
    pub fn synthetic_text_message(user_id: impl Into<String>) -> Self {
        Self {
            events: vec![WebhookEvent::Message {
                message: MessagePayload::Text {
                    text: TEST_MESSAGE_TEXT.to_string(),
                    id: TEST_MESSAGE_ID.to_string(),
                },
                source: EventSource {
                    user_id: user_id.into(),
                },
            }],
        }
    }
}
