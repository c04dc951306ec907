//! Recovery policy that replays canned decisions.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use crate::encoder::JobFailure;
use crate::pool::{Decision, RecoveryPolicy};

/// Replays a queue of decisions and records every failure it was shown.
///
/// Clones share state, so a test can keep one handle and give the other to
/// the pool. Running out of decisions behaves like a closed terminal.
///
/// # Example
///
/// ```rust,ignore
/// let policy = ScriptedPolicy::new([Decision::Retry, Decision::Skip]);
/// let pool = JobPool::new(config, Box::new(policy.clone()));
/// // ...
/// assert_eq!(policy.failures().len(), 2);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedPolicy {
    decisions: Arc<Mutex<VecDeque<Decision>>>,
    failures: Arc<Mutex<Vec<JobFailure>>>,
}

impl ScriptedPolicy {
    pub fn new(decisions: impl IntoIterator<Item = Decision>) -> Self {
        Self {
            decisions: Arc::new(Mutex::new(decisions.into_iter().collect())),
            failures: Arc::default(),
        }
    }

    /// Failures seen so far, in order.
    pub fn failures(&self) -> Vec<JobFailure> {
        self.failures
            .lock()
            .map(|f| f.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl RecoveryPolicy for ScriptedPolicy {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn decide(&mut self, failure: &JobFailure) -> io::Result<Decision> {
        if let Ok(mut failures) = self.failures.lock() {
            failures.push(failure.clone());
        }
        let next = self
            .decisions
            .lock()
            .ok()
            .and_then(|mut decisions| decisions.pop_front());
        next.ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no scripted decision left"))
    }
}
