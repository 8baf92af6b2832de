//! Manual connectivity probe for messaging-webhook endpoints: builds one
//! synthetic inbound-message payload, POSTs it, and reports the response
//! body or the transport error. An in-memory mock transport keeps the
//! delivery path fully testable without a network.

pub mod event;
pub mod mock;
pub mod sender;
pub mod transport;

pub use event::{
    EventEnvelope, EventSource, MessagePayload, WebhookEvent, TEST_MESSAGE_ID, TEST_MESSAGE_TEXT,
};
pub use mock::{MockBehavior, MockResponse, MockSnapshot, MockTransport, MockTransportState};
pub use sender::{ProbeOutcome, WebhookSender, JSON_CONTENT_TYPE};
pub use transport::{
    ProbeBytes, ProbeError, ProbeErrorKind, ProbeFuture, ProbeRequest, ProbeResponse, ProbeResult,
    ProbeTransport, ReqwestTransport,
};
