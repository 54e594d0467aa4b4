//! Application state shared by every HTTP handler.
//!
//! `CoreState` wires the collaborators together: one `ChatService` per
//! chat flow, the `IdentityManager`, and the clinical data source. It is
//! wrapped in `Arc` at startup; all interior state is behind its own lock.

use std::sync::Arc;

use chrono::{Local, NaiveDate};

use crate::advice::{self, AdviceResolver, ResolverError};
use crate::chat::ChatService;
use crate::clinical_data::{ClinicalData, DataError, MockClinicalData};
use crate::config::AppConfig;
use crate::conversation::Rejection;
use crate::dashboard::{self, DashboardView};
use crate::identity::{
    IdentityManager, IdentityProvider, IdentityState, StaticIdentityProvider, SubscriptionToken,
};
use crate::models::{ChatFlow, Message};
use crate::session_cache::{FileStore, SessionCache};

/// Local calendar date used for "today" counters.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Resolver setup failed: {0}")]
    Resolver(#[from] ResolverError),
    #[error(transparent)]
    Data(#[from] DataError),
    #[error("Patient not found: {0}")]
    PatientNotFound(String),
}

pub struct CoreState {
    pub config: AppConfig,
    identity: Arc<IdentityManager>,
    patient_chat: Arc<ChatService>,
    clinician_chat: Arc<ChatService>,
    data: Arc<dyn ClinicalData>,
    sign_out_hook: SubscriptionToken,
}

impl CoreState {
    pub fn new(
        config: AppConfig,
        resolver: Arc<dyn AdviceResolver>,
        provider: Arc<dyn IdentityProvider>,
        cache: SessionCache,
        data: Arc<dyn ClinicalData>,
    ) -> Self {
        let identity = Arc::new(IdentityManager::new(provider, cache));
        let patient_chat = Arc::new(ChatService::new(ChatFlow::Patient, resolver.clone()));
        let clinician_chat = Arc::new(ChatService::new(ChatFlow::Clinician, resolver));

        // Signing out drops both conversations.
        let sign_out_hook = {
            let chats = [patient_chat.clone(), clinician_chat.clone()];
            identity.subscribe(move |state| {
                if *state != IdentityState::SignedOut {
                    return;
                }
                for chat in &chats {
                    chat.select_patient(None);
                    if let Err(e) = chat.reset() {
                        tracing::debug!(flow = %chat.flow(), reason = %e, "Chat kept on sign-out");
                    }
                }
            })
        };

        Self {
            config,
            identity,
            patient_chat,
            clinician_chat,
            data,
            sign_out_hook,
        }
    }

    /// Production wiring: configured resolver, file-backed session cache,
    /// demo clinical data, cached user restored.
    pub fn from_config(config: AppConfig) -> Result<Self, CoreError> {
        let resolver = advice::from_config(&config)?;
        let cache = SessionCache::new(Arc::new(FileStore::new(&config.session_path)));
        let core = Self::new(
            config,
            resolver,
            Arc::new(StaticIdentityProvider::unavailable()),
            cache,
            Arc::new(MockClinicalData::new(today())),
        );
        core.identity.restore();
        Ok(core)
    }

    pub fn identity(&self) -> &IdentityManager {
        &self.identity
    }

    pub fn chat(&self, flow: ChatFlow) -> &ChatService {
        match flow {
            ChatFlow::Patient => &self.patient_chat,
            ChatFlow::Clinician => &self.clinician_chat,
        }
    }

    /// Send as the signed-in user; the flow's default sender otherwise.
    pub async fn send_message(&self, flow: ChatFlow, text: &str) -> Result<Message, Rejection> {
        let sender = self.identity.current_user().map(|u| u.name);
        self.chat(flow).send(text, sender.as_deref()).await
    }

    /// Send the flow's stored draft as the signed-in user.
    pub async fn send_input(&self, flow: ChatFlow) -> Result<Message, Rejection> {
        let sender = self.identity.current_user().map(|u| u.name);
        self.chat(flow).send_input(sender.as_deref()).await
    }

    /// Point the clinician chat at a patient, or clear the selection.
    pub fn select_patient(&self, patient_id: Option<&str>) -> Result<(), CoreError> {
        let patient = match patient_id {
            Some(id) => Some(
                self.data
                    .find_patient(id)?
                    .ok_or_else(|| CoreError::PatientNotFound(id.to_string()))?,
            ),
            None => None,
        };
        self.clinician_chat.select_patient(patient);
        Ok(())
    }

    pub fn dashboard(&self) -> Result<DashboardView, CoreError> {
        self.dashboard_on(today())
    }

    pub fn dashboard_on(&self, day: NaiveDate) -> Result<DashboardView, CoreError> {
        let patients = self.data.patients()?;
        let appointments = self.data.appointments()?;
        Ok(dashboard::build_view(patients, appointments, day))
    }
}

impl Drop for CoreState {
    fn drop(&mut self) {
        self.identity.unsubscribe(self.sign_out_hook);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::advice::RuleTableResolver;
    use crate::conversation::ExchangeState;
    use crate::models::UserIdentity;

    pub(crate) fn test_core() -> CoreState {
        CoreState::new(
            AppConfig::default(),
            Arc::new(RuleTableResolver),
            Arc::new(StaticIdentityProvider::signed_in(UserIdentity {
                uid: "g-7".into(),
                name: "Dr. Grey".into(),
                email: "grey@example.com".into(),
                photo_url: None,
            })),
            SessionCache::in_memory(),
            Arc::new(MockClinicalData::new(today())),
        )
    }

    #[tokio::test]
    async fn messages_are_stamped_with_signed_in_name() {
        let core = test_core();
        core.send_message(ChatFlow::Patient, "cold").await.unwrap();
        assert_eq!(core.chat(ChatFlow::Patient).messages()[0].sender, "You");

        core.identity().sign_in_with_google().unwrap();
        core.send_message(ChatFlow::Patient, "cold").await.unwrap();
        assert_eq!(core.chat(ChatFlow::Patient).messages()[2].sender, "Dr. Grey");
    }

    #[tokio::test]
    async fn sign_out_clears_conversations() {
        let core = test_core();
        core.identity().sign_in_with_google().unwrap();
        core.select_patient(Some("p-002")).unwrap();
        core.send_message(ChatFlow::Clinician, "fever").await.unwrap();
        core.send_message(ChatFlow::Patient, "fever").await.unwrap();

        core.identity().logout().unwrap();

        for flow in [ChatFlow::Patient, ChatFlow::Clinician] {
            let snap = core.chat(flow).snapshot();
            assert!(snap.messages.is_empty());
            assert!(snap.selected_patient_id.is_none());
            assert_eq!(snap.state, ExchangeState::Idle);
        }
    }

    #[test]
    fn selecting_unknown_patient_fails() {
        let core = test_core();
        assert!(matches!(
            core.select_patient(Some("nobody")),
            Err(CoreError::PatientNotFound(id)) if id == "nobody"
        ));
        assert!(core.select_patient(None).is_ok());
    }

    #[test]
    fn dashboard_counts_mock_data() {
        let core = test_core();
        let view = core.dashboard().unwrap();
        assert_eq!(view.stats.total_patients, 5);
        assert_eq!(view.stats.today_appointments, 3);
        assert_eq!(view.stats.critical_cases, 2);
        assert_eq!(view.recent_patients.len(), 4);
    }

    #[test]
    fn dropping_core_releases_subscription() {
        let core = test_core();
        let identity = core.identity.clone();
        let token = core.sign_out_hook;
        drop(core);
        assert!(!identity.unsubscribe(token));
    }
}
