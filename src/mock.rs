//! In-memory transport with scripted behaviors and queued responses, so the
//! delivery path is testable without a network.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};

use bytes::Bytes;
use serde::Serialize;
use sonic_rs::to_vec;

use crate::transport::{
    ProbeBytes, ProbeError, ProbeErrorKind, ProbeFuture, ProbeRequest, ProbeResponse, ProbeResult,
    ProbeTransport,
};

/// Where the transport sits in its Idle -> Sending -> (Idle | Failed) cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MockTransportState {
    #[default]
    Idle,
    Sending,
    Failed,
}

/// What the mock does with the next request it sees. The default is `Pass`.
#[derive(Clone, Debug, Default)]
pub enum MockBehavior {
    #[default]
    Pass,
    ConnectError {
        reason: String,
    },
    SendError {
        reason: String,
    },
    ReceiveError {
        reason: String,
    },
    TimeoutError {
        reason: String,
    },
}

impl MockBehavior {
    pub fn connect_error(reason: impl Into<String>) -> Self {
        Self::ConnectError {
            reason: reason.into(),
        }
    }

    pub fn send_error(reason: impl Into<String>) -> Self {
        Self::SendError {
            reason: reason.into(),
        }
    }

    pub fn receive_error(reason: impl Into<String>) -> Self {
        Self::ReceiveError {
            reason: reason.into(),
        }
    }

    pub fn timeout_error(reason: impl Into<String>) -> Self {
        Self::TimeoutError {
            reason: reason.into(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MockResponse {
    pub status: u16,
    pub body: ProbeBytes,
}

impl MockResponse {
    pub fn new(status: u16, body: impl Into<ProbeBytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn text(status: u16, body: impl Into<String>) -> Self {
        Self::new(status, body.into())
    }

    pub fn json<T: Serialize>(status: u16, payload: &T) -> ProbeResult<Self> {
        let body = to_vec(payload).map_err(ProbeError::encode)?;
        Ok(Self::new(status, body))
    }
}

#[derive(Clone, Debug)]
pub struct MockSnapshot {
    pub state: MockTransportState,
    pub request_count: usize,
    pub last_url: Option<String>,
    pub last_status: Option<u16>,
    pub last_error: Option<String>,
    pub behavior_remaining: usize,
    pub response_queue_len: usize,
}

#[derive(Debug, Default)]
struct MockTransportInner {
    state: MockTransportState,
    request_count: usize,
    last_url: Option<String>,
    last_status: Option<u16>,
    last_error: Option<String>,
    behaviors: VecDeque<MockBehavior>,
    default_responses: VecDeque<MockResponse>,
    url_responses: HashMap<String, VecDeque<MockResponse>>,
    outbound_log: Vec<ProbeRequest>,
}

impl MockTransportInner {
    fn snapshot(&self) -> MockSnapshot {
        MockSnapshot {
            state: self.state,
            request_count: self.request_count,
            last_url: self.last_url.clone(),
            last_status: self.last_status,
            last_error: self.last_error.clone(),
            behavior_remaining: self.behaviors.len(),
            response_queue_len: self.default_responses.len()
                + self.url_responses.values().map(VecDeque::len).sum::<usize>(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockTransportInner::default())),
        }
    }

    pub fn with_behaviors(behaviors: impl IntoIterator<Item = MockBehavior>) -> Self {
        let transport = Self::new();
        transport
            .lock("loading behavior plan")
            .behaviors
            .extend(behaviors);
        transport
    }

    pub fn queue_response(&self, response: MockResponse) {
        self.lock("queueing response")
            .default_responses
            .push_back(response);
    }

    pub fn queue_response_for(&self, url: impl Into<String>, response: MockResponse) {
        self.lock("queueing response by url")
            .url_responses
            .entry(url.into())
            .or_default()
            .push_back(response);
    }

    pub fn snapshot(&self) -> MockSnapshot {
        self.lock("taking snapshot").snapshot()
    }

    pub fn outbound_requests(&self) -> Vec<ProbeRequest> {
        self.lock("reading outbound log").outbound_log.clone()
    }

    fn lock(&self, while_doing: &str) -> std::sync::MutexGuard<'_, MockTransportInner> {
        self.inner
            .lock()
            .unwrap_or_else(|_| panic!("mock transport mutex poisoned while {while_doing}"))
    }

    fn fail(&self, kind: ProbeErrorKind, reason: String) -> ProbeError {
        let mut inner = self.lock("recording failure");
        inner.state = MockTransportState::Failed;
        inner.last_error = Some(reason.clone());
        inner.last_status = None;
        ProbeError::new(kind, None, reason)
    }

    fn next_response(&self, url: &str) -> Option<MockResponse> {
        let mut inner = self.lock("selecting response");
        if let Some(queue) = inner.url_responses.get_mut(url) {
            if let Some(response) = queue.pop_front() {
                return Some(response);
            }
        }
        inner.default_responses.pop_front()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl ProbeTransport for MockTransport {
    fn execute(&self, request: ProbeRequest) -> ProbeFuture<ProbeResult<ProbeResponse>> {
        let transport = self.clone();
        Box::pin(async move {
            let start = Instant::now();
            let behavior = {
                let mut inner = transport.lock("starting request");
                inner.request_count += 1;
                inner.last_url = Some(request.url.clone());
                inner.last_error = None;
                inner.state = MockTransportState::Sending;
                inner.outbound_log.push(request.clone());
                inner.behaviors.pop_front().unwrap_or_default()
            };

            match behavior {
                MockBehavior::Pass => {}
                MockBehavior::ConnectError { reason } => {
                    return Err(transport.fail(ProbeErrorKind::Connect, reason));
                }
                MockBehavior::SendError { reason } => {
                    return Err(transport.fail(ProbeErrorKind::Send, reason));
                }
                MockBehavior::ReceiveError { reason } => {
                    return Err(transport.fail(ProbeErrorKind::Receive, reason));
                }
                MockBehavior::TimeoutError { reason } => {
                    return Err(transport.fail(ProbeErrorKind::Timeout, reason));
                }
            }

            // Empty queue falls back to an empty 200.
            let scripted = transport.next_response(&request.url);
            let (status, body) = match scripted {
                Some(response) => (response.status, response.body),
                None => (200, Bytes::new()),
            };

            let response = ProbeResponse {
                status,
                body,
                elapsed: start.elapsed().max(Duration::from_micros(1)),
            };
            {
                let mut inner = transport.lock("recording response");
                inner.last_status = Some(response.status);
                inner.state = MockTransportState::Idle;
            }
            Ok(response)
        })
    }
}
