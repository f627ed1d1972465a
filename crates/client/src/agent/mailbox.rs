//! Agent mailbox and per-query reply channels.
//!
//! Pages post JSON payloads through an [`AgentHandle`]. Each post creates a
//! fresh oneshot reply port, so a query is answered at most once, and the
//! agent handles envelopes strictly one at a time.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

use favicache_core::Error;
use favicache_core::protocol::{AgentMessage, FaviconCachedResponse};

use super::Agent;

/// A reply as delivered to the page.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub token: Uuid,
    pub payload: Value,
}

/// The agent's end of a single query channel. Consumed by sending.
#[derive(Debug)]
pub struct ReplyPort(oneshot::Sender<Reply>);

impl ReplyPort {
    /// Send the one reply. Returns `false` when the page stopped listening.
    pub fn send(self, reply: Reply) -> bool {
        self.0.send(reply).is_ok()
    }
}

/// One message in flight to the agent.
#[derive(Debug)]
pub struct Envelope {
    pub token: Uuid,
    pub payload: Value,
    pub reply: ReplyPort,
}

/// The page's end of a single query channel.
#[derive(Debug)]
pub struct PendingReply {
    pub token: Uuid,
    pub receiver: oneshot::Receiver<Reply>,
}

/// Cloneable sender side of the agent's mailbox.
#[derive(Debug, Clone)]
pub struct AgentHandle {
    tx: mpsc::Sender<Envelope>,
}

impl AgentHandle {
    /// Post a payload with a fresh reply channel.
    ///
    /// # Errors
    ///
    /// `Protocol` when the agent's mailbox has shut down.
    pub async fn post(&self, payload: Value) -> Result<PendingReply, Error> {
        let token = Uuid::new_v4();
        let (reply_tx, receiver) = oneshot::channel();
        let envelope = Envelope { token, payload, reply: ReplyPort(reply_tx) };

        self.tx
            .send(envelope)
            .await
            .map_err(|_| Error::Protocol("agent mailbox closed".into()))?;

        Ok(PendingReply { token, receiver })
    }
}

/// Receiver side of the agent's mailbox.
#[derive(Debug)]
pub struct Mailbox {
    rx: mpsc::Receiver<Envelope>,
}

impl Mailbox {
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.rx.recv().await
    }
}

/// Create a mailbox holding at most `capacity` unhandled envelopes.
pub fn channel(capacity: usize) -> (AgentHandle, Mailbox) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (AgentHandle { tx }, Mailbox { rx })
}

/// What the agent did with one envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    Replied { is_cached: bool },
    /// The answer was computed but the page had stopped listening.
    ReceiverGone,
    /// Unknown message kind, dropped without reply.
    Ignored { kind: String },
    /// Undecodable payload, dropped without reply.
    Rejected { reason: String },
}

impl Agent {
    /// Handle one envelope.
    pub async fn handle_message(&self, envelope: Envelope) -> MessageOutcome {
        let Envelope { token, payload, reply } = envelope;

        let message = match AgentMessage::decode(&payload) {
            Ok(message) => message,
            Err(e) => {
                tracing::error!(%token, error = %e, "malformed agent message");
                return MessageOutcome::Rejected { reason: e.to_string() };
            }
        };

        match message {
            AgentMessage::IsFaviconCached { url } => {
                let is_cached = match self.is_cached(&url).await {
                    Ok(found) => found,
                    Err(e) => {
                        tracing::error!(%url, error = %e, "cache query failed, answering not cached");
                        false
                    }
                };
                tracing::debug!(%token, %url, is_cached, "answering cache query");

                let payload = FaviconCachedResponse::new(is_cached).to_value();
                if reply.send(Reply { token, payload }) {
                    MessageOutcome::Replied { is_cached }
                } else {
                    tracing::debug!(%token, "query receiver dropped");
                    MessageOutcome::ReceiverGone
                }
            }
            AgentMessage::Unknown { kind } => {
                tracing::error!(%token, %kind, "unhandled message kind");
                MessageOutcome::Ignored { kind }
            }
        }
    }

    /// Drain the mailbox until every [`AgentHandle`] is dropped.
    pub fn serve(self: Arc<Self>, mut mailbox: Mailbox) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(envelope) = mailbox.recv().await {
                self.handle_message(envelope).await;
            }
            tracing::debug!("agent mailbox closed");
        })
    }
}
