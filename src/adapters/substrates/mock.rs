//! Mock substrate for testing and dry runs.

use std::collections::VecDeque;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{InvokeRequest, LlmSubstrate};

/// Scripted substrate that records every invocation.
///
/// Replies are consumed in FIFO order; once the script runs out, a default
/// reply is returned so tests can ignore invocations they do not care
/// about.
#[derive(Debug, Default)]
pub struct MockSubstrate {
    replies: RwLock<VecDeque<Result<String, String>>>,
    calls: RwLock<Vec<InvokeRequest>>,
}

impl MockSubstrate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(reply: impl Into<String>) -> Self {
        Self {
            replies: RwLock::new(VecDeque::from([Ok(reply.into())])),
            calls: RwLock::new(Vec::new()),
        }
    }

    pub async fn push_reply(&self, reply: impl Into<String>) {
        self.replies.write().await.push_back(Ok(reply.into()));
    }

    pub async fn push_failure(&self, message: impl Into<String>) {
        self.replies.write().await.push_back(Err(message.into()));
    }

    /// Invocations seen so far, in order.
    pub async fn calls(&self) -> Vec<InvokeRequest> {
        self.calls.read().await.clone()
    }
}

#[async_trait]
impl LlmSubstrate for MockSubstrate {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn invoke(&self, request: InvokeRequest) -> DomainResult<String> {
        self.calls.write().await.push(request);
        match self.replies.write().await.pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(DomainError::SubstrateFailed(message)),
            None => Ok("Mock invocation completed successfully.".to_string()),
        }
    }
}
