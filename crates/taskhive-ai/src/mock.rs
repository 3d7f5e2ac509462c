//! Mock generation backend for deterministic testing.
//!
//! Outcomes are scripted up front and consumed in order; every call is
//! logged with a `tokio::time::Instant` so timing assertions work under a
//! paused runtime.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::time::Instant;

use taskhive_core::{Error, GenerationBackend, Result};

/// Scripted result for one `generate_json` call.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Return this text.
    Ok(String),
    /// Fail with `Error::RateLimited`.
    Throttled,
    /// Fail with `Error::ExternalService`.
    Failure(String),
}

/// One recorded call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub prompt: String,
    pub at: Instant,
}

/// Mock [`GenerationBackend`] with a scripted outcome queue and a call log.
#[derive(Clone)]
pub struct MockGenerationBackend {
    outcomes: Arc<Mutex<VecDeque<MockOutcome>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockGenerationBackend {
    pub fn new() -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(VecDeque::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Queue an outcome for the next unscripted call.
    pub fn push(&self, outcome: MockOutcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    /// Queue a successful response.
    pub fn push_ok(&self, text: impl Into<String>) {
        self.push(MockOutcome::Ok(text.into()));
    }

    /// Queue the same successful response `n` times.
    pub fn push_ok_n(&self, text: impl Into<String>, n: usize) {
        let text = text.into();
        for _ in 0..n {
            self.push(MockOutcome::Ok(text.clone()));
        }
    }

    pub fn push_throttled(&self) {
        self.push(MockOutcome::Throttled);
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Default for MockGenerationBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationBackend for MockGenerationBackend {
    async fn generate_json(&self, prompt: &str) -> Result<String> {
        self.calls.lock().unwrap().push(MockCall {
            prompt: prompt.to_string(),
            at: Instant::now(),
        });

        let outcome = self.outcomes.lock().unwrap().pop_front();
        match outcome {
            Some(MockOutcome::Ok(text)) => Ok(text),
            Some(MockOutcome::Throttled) => {
                Err(Error::RateLimited("mock throttle".to_string()))
            }
            Some(MockOutcome::Failure(msg)) => Err(Error::ExternalService(msg)),
            None => Err(Error::ExternalService(
                "mock backend exhausted its scripted outcomes".to_string(),
            )),
        }
    }
}
