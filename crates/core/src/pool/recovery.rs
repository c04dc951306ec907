//! Recovery policies: what to do when an encoder fails.

use async_trait::async_trait;
use std::io;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stderr, Stdin};

use crate::encoder::JobFailure;

use super::config::FailureAction;

/// Outcome of a recovery decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Run the same file again as a new job.
    Retry,
    /// Leave the file as it is and continue.
    Skip,
    /// Operator abort: drain and stop.
    Abort,
    /// Give up without an operator: drain and stop with a failure status.
    Fail,
}

impl Decision {
    /// Parses an operator answer. Only `r`, `s` and `a` are accepted.
    pub fn from_choice(input: &str) -> Option<Self> {
        match input.trim() {
            "r" | "R" => Some(Self::Retry),
            "s" | "S" => Some(Self::Skip),
            "a" | "A" => Some(Self::Abort),
            _ => None,
        }
    }
}

/// Decides how a failed job is resolved.
#[async_trait]
pub trait RecoveryPolicy: Send {
    /// Returns the name of this policy.
    fn name(&self) -> &str;

    /// Decides what to do about `failure`. May block indefinitely.
    async fn decide(&mut self, failure: &JobFailure) -> io::Result<Decision>;
}

/// Always returns the same decision. Used for headless runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedPolicy(pub Decision);

#[async_trait]
impl RecoveryPolicy for FixedPolicy {
    fn name(&self) -> &str {
        "fixed"
    }

    async fn decide(&mut self, _failure: &JobFailure) -> io::Result<Decision> {
        Ok(self.0)
    }
}

/// Asks the operator, re-prompting until one of `r`/`s`/`a` is given.
pub struct PromptPolicy<R, W> {
    input: R,
    output: W,
}

impl PromptPolicy<BufReader<Stdin>, Stderr> {
    /// Prompts on stderr and reads answers from stdin.
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stderr())
    }
}

impl<R, W> PromptPolicy<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Gives back the writer, mostly so tests can inspect what was printed.
    pub fn into_output(self) -> W {
        self.output
    }
}

#[async_trait]
impl<R, W> RecoveryPolicy for PromptPolicy<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    fn name(&self) -> &str {
        "prompt"
    }

    async fn decide(&mut self, failure: &JobFailure) -> io::Result<Decision> {
        self.output
            .write_all(format!("\nRe-encoding {}\n", failure).as_bytes())
            .await?;

        loop {
            self.output
                .write_all(b"[r]etry, [s]kip or [a]bort? ")
                .await?;
            self.output.flush().await?;

            let mut line = String::new();
            if self.input.read_line(&mut line).await? == 0 {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "input closed while waiting for a recovery choice",
                ));
            }

            match Decision::from_choice(&line) {
                Some(decision) => return Ok(decision),
                None => {
                    self.output
                        .write_all(format!("Invalid choice '{}'.\n", line.trim()).as_bytes())
                        .await?;
                }
            }
        }
    }
}

/// Builds the policy matching a configured failure action.
pub fn policy_for(action: FailureAction) -> Box<dyn RecoveryPolicy> {
    match action {
        FailureAction::Prompt => Box::new(PromptPolicy::stdio()),
        FailureAction::Skip => Box::new(FixedPolicy(Decision::Skip)),
        FailureAction::Fail => Box::new(FixedPolicy(Decision::Fail)),
    }
}
