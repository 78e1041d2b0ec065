//! Actor-based concurrency for the ledger
//!
//! Operations read a balance, compute, and write it back. Two of them touching
//! the same account must not interleave, so concurrent callers go through a
//! single writer:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │            Transports (CLI, RPC, tests)               │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               LedgerHandle (Clone)                    │
//! │         Sends invocations to actor mailbox            │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              LedgerActor (Single Task)                │
//! │   dispatch() → Transaction → atomic commit            │
//! └───────────────────────────────────────────────────────┘
//! ```

use crate::dispatch::{dispatch, Response};
use crate::store::KvStore;
use crate::{Error, Ledger, Result};
use tokio::sync::{mpsc, oneshot};

/// Message sent to the ledger actor
#[derive(Debug)]
pub enum LedgerMessage {
    /// Run one invocation
    Invoke {
        /// Function name
        function: String,
        /// Positional arguments
        args: Vec<String>,
        /// Reply channel
        response: oneshot::Sender<Response>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that processes ledger messages one at a time
#[derive(Debug)]
pub struct LedgerActor<S: KvStore> {
    /// Ledger the actor owns
    ledger: Ledger<S>,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<LedgerMessage>,
}

impl<S: KvStore> LedgerActor<S> {
    /// Create new actor
    pub fn new(ledger: Ledger<S>, mailbox: mpsc::Receiver<LedgerMessage>) -> Self {
        Self { ledger, mailbox }
    }

    /// Run the actor event loop
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            match msg {
                LedgerMessage::Invoke {
                    function,
                    args,
                    response,
                } => {
                    let result = dispatch(&self.ledger, &function, &args);
                    if response.send(result).is_err() {
                        tracing::debug!(function = %function, "Caller dropped before reply");
                    }
                }
                LedgerMessage::Shutdown => break,
            }
        }

        tracing::info!("Ledger actor stopped");
    }
}

/// Handle for sending messages to the actor
#[derive(Clone, Debug)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerMessage>) -> Self {
        Self { sender }
    }

    /// Invoke a ledger function
    pub async fn invoke<A>(&self, function: &str, args: &[A]) -> Result<Response>
    where
        A: AsRef<str>,
    {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(LedgerMessage::Invoke {
                function: function.to_string(),
                args: args.iter().map(|a| a.as_ref().to_string()).collect(),
                response: tx,
            })
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(LedgerMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the ledger actor
pub fn spawn_ledger_actor<S>(ledger: Ledger<S>, mailbox_capacity: usize) -> LedgerHandle
where
    S: KvStore + 'static,
{
    let (tx, rx) = mpsc::channel(mailbox_capacity.max(1)); // Bounded channel for backpressure
    let actor = LedgerActor::new(ledger, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    LedgerHandle::new(tx)
}
