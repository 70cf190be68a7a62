use async_trait::async_trait;
use benchjudge_core::{BenchError, ChatClient, ChatRequest, ChatResponse, Result};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

/// Scripted outcome of one mock judge call.
#[derive(Debug, Clone)]
pub enum MockReply {
    Text(String),
    Error(String),
    /// Resolves after the given delay (virtual time under a paused runtime).
    Delayed(Duration, String),
    /// Never resolves.
    Hang,
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

/// Judge client that replays scripted replies and records every request.
///
/// Replies registered for a trace id win; otherwise the queue is popped in
/// call order, and once it is empty the default reply is used.
pub struct MockChatClient {
    name: String,
    queue: Mutex<VecDeque<MockReply>>,
    by_trace: Mutex<HashMap<String, MockReply>>,
    default_reply: MockReply,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockChatClient {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            queue: Mutex::new(VecDeque::new()),
            by_trace: Mutex::new(HashMap::new()),
            default_reply: MockReply::text("[[5]]"),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_reply(self, reply: MockReply) -> Self {
        lock(&self.queue).push_back(reply);
        self
    }

    pub fn with_replies<I: IntoIterator<Item = MockReply>>(self, replies: I) -> Self {
        lock(&self.queue).extend(replies);
        self
    }

    pub fn with_reply_for(self, trace_id: impl Into<String>, reply: MockReply) -> Self {
        lock(&self.by_trace).insert(trace_id.into(), reply);
        self
    }

    pub fn with_default_reply(mut self, reply: MockReply) -> Self {
        self.default_reply = reply;
        self
    }

    /// Requests received so far, in call order.
    pub fn requests(&self) -> Vec<ChatRequest> {
        lock(&self.requests).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    fn next_reply(&self, trace_id: &str) -> MockReply {
        if let Some(reply) = lock(&self.by_trace).remove(trace_id) {
            return reply;
        }
        lock(&self.queue).pop_front().unwrap_or_else(|| self.default_reply.clone())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[async_trait]
impl ChatClient for MockChatClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse> {
        let reply = self.next_reply(&req.metadata.trace_id);
        lock(&self.requests).push(req);

        match reply {
            MockReply::Text(text) => Ok(ChatResponse::new(text)),
            MockReply::Error(message) => Err(BenchError::Model(message)),
            MockReply::Delayed(delay, text) => {
                tokio::time::sleep(delay).await;
                Ok(ChatResponse::new(text))
            }
            MockReply::Hang => {
                std::future::pending::<()>().await;
                Err(BenchError::Model("mock call never resolves".to_string()))
            }
        }
    }
}
