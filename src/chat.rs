//! Chat service: drives a `Conversation` through the advice resolver.
//!
//! The conversation lock is held only around state transitions, never
//! across the resolver call, so readers see the loading state while an
//! exchange is pending.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use crate::advice::{AdviceResolver, ResolverError};
use crate::conversation::{Conversation, ExchangeState, PendingExchange, Rejection};
use crate::models::{ChatFlow, Message, Patient};

// ═══════════════════════════════════════════
// Frontend-facing types
// ═══════════════════════════════════════════

/// Starter topic shown while a conversation is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptTip {
    pub icon: &'static str,
    pub label: &'static str,
}

/// Everything the chat screen renders.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatSnapshot {
    pub flow: ChatFlow,
    pub state: ExchangeState,
    pub is_loading: bool,
    /// Unsent composer text.
    pub input: String,
    pub messages: Vec<Message>,
    pub selected_patient_id: Option<String>,
    pub tips: Vec<PromptTip>,
}

/// Tips for the empty-conversation screen.
pub fn prompt_tips() -> Vec<PromptTip> {
    vec![
        PromptTip { icon: "💊", label: "Medication questions" },
        PromptTip { icon: "🤒", label: "Symptom checker" },
        PromptTip { icon: "🏥", label: "Treatment options" },
        PromptTip { icon: "📋", label: "Health information" },
    ]
}

/// Message time as shown next to the sender, e.g. `14:05`.
pub fn format_time(timestamp: &DateTime<Utc>) -> String {
    timestamp.with_timezone(&Local).format("%H:%M").to_string()
}

// ═══════════════════════════════════════════
// ChatService
// ═══════════════════════════════════════════

pub struct ChatService {
    conversation: Arc<Mutex<Conversation>>,
    resolver: Arc<dyn AdviceResolver>,
}

fn lock_conversation(conversation: &Mutex<Conversation>) -> MutexGuard<'_, Conversation> {
    conversation.lock().unwrap_or_else(PoisonError::into_inner)
}

impl ChatService {
    pub fn new(flow: ChatFlow, resolver: Arc<dyn AdviceResolver>) -> Self {
        Self {
            conversation: Arc::new(Mutex::new(Conversation::new(flow))),
            resolver,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Conversation> {
        lock_conversation(&self.conversation)
    }

    pub fn flow(&self) -> ChatFlow {
        self.lock().flow()
    }

    pub fn state(&self) -> ExchangeState {
        self.lock().state()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.lock().messages().to_vec()
    }

    pub fn snapshot(&self) -> ChatSnapshot {
        let conv = self.lock();
        let tips = if conv.is_empty() { prompt_tips() } else { Vec::new() };
        ChatSnapshot {
            flow: conv.flow(),
            state: conv.state(),
            is_loading: conv.is_loading(),
            input: conv.input().to_string(),
            messages: conv.messages().to_vec(),
            selected_patient_id: conv.selected_patient().map(|p| p.id.clone()),
            tips,
        }
    }

    pub fn select_patient(&self, patient: Option<Patient>) {
        self.lock().select_patient(patient);
    }

    /// Replace the draft kept for the composer.
    pub fn set_input(&self, text: impl Into<String>) {
        self.lock().set_input(text);
    }

    /// Send one message and wait for the assistant's reply.
    ///
    /// Resolver failures do not surface here: they become an error-flagged
    /// assistant message, which is returned like any other reply.
    pub async fn send(&self, text: &str, sender: Option<&str>) -> Result<Message, Rejection> {
        let pending = self.lock().submit(text, sender)?;
        self.finish(pending).await
    }

    /// Send the stored draft.
    pub async fn send_input(&self, sender: Option<&str>) -> Result<Message, Rejection> {
        let pending = self.lock().submit_input(sender)?;
        self.finish(pending).await
    }

    /// Resolve and close an open exchange.
    ///
    /// The work runs on its own task, so the exchange still closes when the
    /// caller stops waiting (for example a dropped HTTP request).
    async fn finish(&self, pending: PendingExchange) -> Result<Message, Rejection> {
        let conversation = self.conversation.clone();
        let resolver = self.resolver.clone();
        let ticket = pending.clone();

        let exchange = tokio::spawn(async move {
            let outcome = resolver.resolve(ticket.query()).await;
            let reply = lock_conversation(&conversation).complete(ticket, outcome).cloned();
            reply
        });

        let reply = match exchange.await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(flow = %self.flow(), error = %e, "Advice task failed");
                self.lock()
                    .complete(pending, Err(ResolverError::Internal(e.to_string())))
                    .cloned()
            }
        };
        // None is unreachable while reset is refused during an open exchange.
        reply.ok_or(Rejection::Pending)
    }

    pub fn reset(&self) -> Result<(), Rejection> {
        self.lock().reset()
    }
}
