//! Conversation state machine shared by the patient and clinician chats.
//!
//! One exchange is in flight at most: `Idle → AwaitingResponse → Idle`.
//! `submit` hands back a `PendingExchange` carrying the query to resolve;
//! the caller resolves it outside any lock and feeds the outcome to
//! `complete`. The log is append-only until `reset`.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::advice::ResolverError;
use crate::models::{AdviceRecord, ChatFlow, Message, MessageRole, Patient};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeState {
    Idle,
    AwaitingResponse,
}

/// Why a submission or reset was refused. The conversation is untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Message cannot be empty")]
    Blank,
    #[error("A response is still pending")]
    Pending,
    #[error("Select a patient before asking a question")]
    NoPatientSelected,
}

/// Ticket for the exchange opened by a successful `submit`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingExchange {
    seq: u64,
    query: String,
}

impl PendingExchange {
    /// Text to hand to the resolver.
    pub fn query(&self) -> &str {
        &self.query
    }
}

impl ChatFlow {
    pub fn assistant_sender(&self) -> &'static str {
        match self {
            ChatFlow::Patient => "HealthEcho AI",
            ChatFlow::Clinician => "Medical AI Assistant",
        }
    }

    pub fn default_user_sender(&self) -> &'static str {
        match self {
            ChatFlow::Patient => "You",
            ChatFlow::Clinician => "Doctor",
        }
    }

    pub fn apology(&self) -> &'static str {
        match self {
            ChatFlow::Patient => {
                "I apologize, but I'm having trouble processing your request. Please try again or consult with a healthcare professional for immediate concerns."
            }
            ChatFlow::Clinician => {
                "I apologize, but I'm having trouble processing your medical query. Please try again or consult with a specialist."
            }
        }
    }

    /// Clinician questions are always about a selected patient.
    pub fn requires_patient(&self) -> bool {
        matches!(self, ChatFlow::Clinician)
    }

    fn keeps_recommendations(&self) -> bool {
        matches!(self, ChatFlow::Patient)
    }
}

/// Wrap a clinician question with the selected patient's record.
pub fn clinician_query(patient: &Patient, question: &str) -> String {
    let medications = if patient.medications.is_empty() {
        "None".to_string()
    } else {
        patient.medications.join(", ")
    };
    format!(
        "Based on patient data:\n\
         Patient: {}\n\
         Age: {}\n\
         Condition: {}\n\
         Medical History: {}\n\
         Current Medications: {}\n\
         Last Visit: {}\n\n\
         Question: {}",
        patient.name,
        patient.age,
        patient.condition,
        patient.history.as_deref().unwrap_or("Not available"),
        medications,
        patient.last_visit.as_deref().unwrap_or("Unknown"),
        question,
    )
}

#[derive(Debug, Clone)]
pub struct Conversation {
    flow: ChatFlow,
    log: Vec<Message>,
    state: ExchangeState,
    input: String,
    selected_patient: Option<Patient>,
    next_seq: u64,
    pending_seq: Option<u64>,
}

impl Conversation {
    pub fn new(flow: ChatFlow) -> Self {
        Self {
            flow,
            log: Vec::new(),
            state: ExchangeState::Idle,
            input: String::new(),
            selected_patient: None,
            next_seq: 0,
            pending_seq: None,
        }
    }

    pub fn flow(&self) -> ChatFlow {
        self.flow
    }

    pub fn messages(&self) -> &[Message] {
        &self.log
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    pub fn state(&self) -> ExchangeState {
        self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == ExchangeState::AwaitingResponse
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn selected_patient(&self) -> Option<&Patient> {
        self.selected_patient.as_ref()
    }

    pub fn select_patient(&mut self, patient: Option<Patient>) {
        self.selected_patient = patient;
    }

    /// Submit whatever is in the input buffer.
    pub fn submit_input(&mut self, sender: Option<&str>) -> Result<PendingExchange, Rejection> {
        let text = self.input.clone();
        self.submit(&text, sender)
    }

    /// Append the user's message and open an exchange.
    ///
    /// Refused without side effects when the text is blank, an exchange is
    /// already open, or a clinician chat has no patient selected.
    pub fn submit(&mut self, text: &str, sender: Option<&str>) -> Result<PendingExchange, Rejection> {
        if text.trim().is_empty() {
            return Err(Rejection::Blank);
        }
        if self.state == ExchangeState::AwaitingResponse {
            return Err(Rejection::Pending);
        }
        let query = match (&self.selected_patient, self.flow.requires_patient()) {
            (Some(patient), true) => clinician_query(patient, text),
            (None, true) => return Err(Rejection::NoPatientSelected),
            (_, false) => text.to_string(),
        };

        let sender = sender
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(self.flow.default_user_sender());
        let message = Message {
            id: Uuid::new_v4(),
            role: MessageRole::User,
            content: text.to_string(),
            timestamp: self.next_timestamp(),
            sender: sender.to_string(),
            recommendations: None,
            is_error: false,
        };
        self.log.push(message);
        self.input.clear();

        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending_seq = Some(seq);
        self.state = ExchangeState::AwaitingResponse;
        tracing::debug!(flow = %self.flow, seq, "Exchange opened");

        Ok(PendingExchange { seq, query })
    }

    /// Close the open exchange with the resolver outcome.
    ///
    /// Returns the appended assistant message, or `None` if the ticket does
    /// not match the open exchange.
    pub fn complete(
        &mut self,
        pending: PendingExchange,
        outcome: Result<AdviceRecord, ResolverError>,
    ) -> Option<&Message> {
        if self.pending_seq != Some(pending.seq) {
            tracing::warn!(seq = pending.seq, "Ignoring stale exchange result");
            return None;
        }

        let (content, recommendations, is_error) = match outcome {
            Ok(record) => {
                let recommendations = Some(record.recommendations)
                    .filter(|r| self.flow.keeps_recommendations() && !r.is_empty());
                (record.result, recommendations, false)
            }
            Err(e) => {
                tracing::error!(flow = %self.flow, error = %e, "Failed to get medical advice");
                (self.flow.apology().to_string(), None, true)
            }
        };

        let message = Message {
            id: Uuid::new_v4(),
            role: MessageRole::Assistant,
            content,
            timestamp: self.next_timestamp(),
            sender: self.flow.assistant_sender().to_string(),
            recommendations,
            is_error,
        };
        self.log.push(message);
        self.pending_seq = None;
        self.state = ExchangeState::Idle;
        tracing::debug!(flow = %self.flow, seq = pending.seq, is_error, "Exchange closed");

        self.log.last()
    }

    /// Clear the log. Only allowed while idle.
    pub fn reset(&mut self) -> Result<(), Rejection> {
        if self.state == ExchangeState::AwaitingResponse {
            return Err(Rejection::Pending);
        }
        self.log.clear();
        tracing::info!(flow = %self.flow, "Conversation cleared");
        Ok(())
    }

    /// Wall clock, clamped so the log never goes backwards in time.
    fn next_timestamp(&self) -> DateTime<Utc> {
        let now = Utc::now();
        match self.log.last() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        }
    }
}
