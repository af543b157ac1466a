//! Direct-message gating
//!
//! Reciprocal-consent rule, deliberately asymmetric: a sender may message a
//! receiver only if the **receiver follows the sender**. Following someone
//! is read as consent to hear from them. This is not a mutual-follow check;
//! A following B grants B nothing.
//!
//! Violating sends fail with `NotAuthorized` and are never silently
//! dropped. Delivery of accepted messages is the notification layer's job.

use agora_core::errors::{AgoraError, AgoraResult};
use agora_core::events::DomainEvent;
use agora_core::identifiers::{MessageId, UserId};
use agora_core::time::PhysicalTime;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::state::SocialStore;

/// An accepted direct message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier
    pub id: MessageId,
    /// Sending principal
    pub sender: UserId,
    /// Receiving principal
    pub receiver: UserId,
    /// Message body
    pub content: String,
    /// Acceptance time
    pub sent_at: PhysicalTime,
}

/// Messaging authorization and acceptance.
#[derive(Debug, Clone)]
pub struct MessagingGate {
    store: SocialStore,
}

impl MessagingGate {
    pub(crate) fn new(store: SocialStore) -> Self {
        Self { store }
    }

    /// Whether `sender` may message `receiver`: true iff the receiver
    /// follows the sender.
    pub fn can_message(&self, sender: UserId, receiver: UserId) -> bool {
        self.store.state.read().follows(receiver, sender)
    }

    /// Gate and record a direct message.
    ///
    /// The consent check and the insert share one critical section, so a
    /// concurrent unfollow cannot slip between them.
    pub fn send_message(
        &self,
        sender: UserId,
        receiver: UserId,
        content: impl Into<String>,
        at: PhysicalTime,
    ) -> AgoraResult<Message> {
        let message = {
            let mut state = self.store.state.write();
            if !state.follows(receiver, sender) {
                return Err(AgoraError::not_authorized(format!(
                    "{receiver} does not follow {sender}; message refused"
                )));
            }
            let message = Message {
                id: MessageId::generate(),
                sender,
                receiver,
                content: content.into(),
                sent_at: at,
            };
            state.messages.push(message.clone());
            debug!(message = %message.id, %sender, %receiver, "message accepted");
            message
        };
        self.store.emit(DomainEvent::MessageSent {
            message: message.id,
            sender,
            receiver,
        });
        Ok(message)
    }

    /// Accepted messages addressed to `user`, in acceptance order.
    pub fn inbox(&self, user: UserId) -> Vec<Message> {
        self.store
            .state
            .read()
            .messages
            .iter()
            .filter(|m| m.receiver == user)
            .cloned()
            .collect()
    }
}
