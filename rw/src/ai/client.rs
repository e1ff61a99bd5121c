//! AiClient trait definition

use async_trait::async_trait;

use super::{AiError, GenerateRequest, GenerateResponse};

/// Stateless AI client - each call is independent
///
/// One call is one HTTP round trip. Retrying is the caller's concern
/// (see [`crate::ai::with_retry`]), so implementations must report
/// rate limiting and unavailability as distinct error variants.
#[async_trait]
pub trait AiClient: Send + Sync {
    /// Send a single generation request
    async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, AiError>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing::debug;

    use crate::ai::CallKind;

    /// Mock AI client for unit tests
    ///
    /// Replays scripted outcomes in order and records the kind of every
    /// request it receives.
    pub struct MockAiClient {
        outcomes: Mutex<VecDeque<Result<GenerateResponse, AiError>>>,
        kinds: Mutex<Vec<CallKind>>,
        call_count: AtomicUsize,
    }

    impl MockAiClient {
        pub fn new(outcomes: Vec<Result<GenerateResponse, AiError>>) -> Self {
            debug!(outcome_count = %outcomes.len(), "MockAiClient::new: called");
            Self {
                outcomes: Mutex::new(outcomes.into()),
                kinds: Mutex::new(Vec::new()),
                call_count: AtomicUsize::new(0),
            }
        }

        pub fn call_count(&self) -> usize {
            self.call_count.load(Ordering::SeqCst)
        }

        pub fn kinds(&self) -> Vec<CallKind> {
            self.kinds.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AiClient for MockAiClient {
        async fn generate(&self, request: GenerateRequest) -> Result<GenerateResponse, AiError> {
            debug!(kind = %request.kind, "MockAiClient::generate: called");
            self.call_count.fetch_add(1, Ordering::SeqCst);
            self.kinds.lock().unwrap().push(request.kind);
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AiError::EmptyResponse("No more mock responses".to_string())))
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_client_replays_in_order() {
            let client = MockAiClient::new(vec![
                Ok(GenerateResponse::from_text("one")),
                Err(AiError::from_status(503, "busy")),
            ]);

            let req = GenerateRequest::new(CallKind::Plan, "m");
            let first = client.generate(req.clone()).await.unwrap();
            assert_eq!(first.text.as_deref(), Some("one"));

            let second = client.generate(req.clone()).await;
            assert!(matches!(second, Err(AiError::Unavailable { .. })));

            // Exhausted
            assert!(client.generate(req).await.is_err());
            assert_eq!(client.call_count(), 3);
            assert_eq!(client.kinds(), vec![CallKind::Plan; 3]);
        }
    }
}
