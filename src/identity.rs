//! Who is signed in.
//!
//! `IdentityManager` owns the current `IdentityState`, persists it through
//! the `SessionCache`, and fans changes out to subscribers. The sign-in
//! mechanics live behind `IdentityProvider`; in production the browser's
//! auth SDK performs the popup and pushes the result with `apply`.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::UserIdentity;
use crate::session_cache::SessionCache;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Form input problem, shown inline next to the form.
    #[error("{0}")]
    Validation(String),
    /// The sign-in provider refused or failed.
    #[error("{0}")]
    Provider(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "user", rename_all = "snake_case")]
pub enum IdentityState {
    SignedIn(UserIdentity),
    SignedOut,
}

impl IdentityState {
    pub fn user(&self) -> Option<&UserIdentity> {
        match self {
            IdentityState::SignedIn(user) => Some(user),
            IdentityState::SignedOut => None,
        }
    }
}

/// External sign-in mechanism.
pub trait IdentityProvider: Send + Sync {
    fn sign_in_with_google(&self) -> Result<UserIdentity, IdentityError>;
    fn logout(&self) -> Result<(), IdentityError>;
}

/// Provider with a fixed outcome.
///
/// `unavailable()` is the server default: the Google popup only exists in
/// the browser, which reports its result through `IdentityManager::apply`.
pub struct StaticIdentityProvider {
    user: Option<UserIdentity>,
}

impl StaticIdentityProvider {
    pub fn signed_in(user: UserIdentity) -> Self {
        Self { user: Some(user) }
    }

    pub fn unavailable() -> Self {
        Self { user: None }
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn sign_in_with_google(&self) -> Result<UserIdentity, IdentityError> {
        self.user.clone().ok_or_else(|| {
            IdentityError::Provider("Google sign-in is handled by the browser client".into())
        })
    }

    fn logout(&self) -> Result<(), IdentityError> {
        Ok(())
    }
}

// ═══════════════════════════════════════════
// Email sign-in form
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    #[default]
    Login,
    Signup,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmailSignIn {
    #[serde(default)]
    pub mode: AuthMode,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

impl EmailSignIn {
    /// Check required fields and derive the local identity.
    ///
    /// The display name is the entered name, or the email's local part.
    pub fn into_identity(self) -> Result<UserIdentity, IdentityError> {
        let email = self.email.trim();
        if email.is_empty() || self.password.is_empty() {
            return Err(IdentityError::Validation("Please fill in all fields".into()));
        }
        let name = self.name.trim();
        if self.mode == AuthMode::Signup && name.is_empty() {
            return Err(IdentityError::Validation("Please enter your name".into()));
        }

        let name = if name.is_empty() {
            email.split('@').next().unwrap_or(email).to_string()
        } else {
            name.to_string()
        };
        Ok(UserIdentity {
            uid: Uuid::new_v4().to_string(),
            name,
            email: email.to_string(),
            photo_url: None,
        })
    }
}

// ═══════════════════════════════════════════
// Subscriptions
// ═══════════════════════════════════════════

/// Handle returned by `subscribe`; pass it to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SubscriptionToken(u64);

type Listener = Box<dyn Fn(&IdentityState) + Send + Sync>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: BTreeMap<u64, Listener>,
}

// ═══════════════════════════════════════════
// IdentityManager
// ═══════════════════════════════════════════

pub struct IdentityManager {
    provider: Arc<dyn IdentityProvider>,
    cache: SessionCache,
    state: RwLock<IdentityState>,
    /// Held for the whole of `apply`, so updates and deliveries never
    /// interleave. Listeners must not call back into `subscribe`,
    /// `unsubscribe` or `apply`.
    listeners: Mutex<Listeners>,
}

impl IdentityManager {
    pub fn new(provider: Arc<dyn IdentityProvider>, cache: SessionCache) -> Self {
        Self {
            provider,
            cache,
            state: RwLock::new(IdentityState::SignedOut),
            listeners: Mutex::new(Listeners::default()),
        }
    }

    /// Adopt the cached user from the last run, without notifying.
    pub fn restore(&self) -> Option<UserIdentity> {
        let user = match self.cache.load_user() {
            Ok(user) => user?,
            Err(e) => {
                tracing::warn!(error = %e, "Session cache unreadable, starting signed out");
                return None;
            }
        };
        tracing::info!(uid = %user.uid, "Restored cached session");
        *self.state.write().unwrap_or_else(PoisonError::into_inner) =
            IdentityState::SignedIn(user.clone());
        Some(user)
    }

    pub fn current(&self) -> IdentityState {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn current_user(&self) -> Option<UserIdentity> {
        self.current().user().cloned()
    }

    pub fn sign_in_with_google(&self) -> Result<UserIdentity, IdentityError> {
        let user = self.provider.sign_in_with_google().inspect_err(|e| {
            tracing::warn!(error = %e, "Google sign-in failed");
        })?;
        self.apply(IdentityState::SignedIn(user.clone()));
        Ok(user)
    }

    pub fn sign_in_with_email(&self, form: EmailSignIn) -> Result<UserIdentity, IdentityError> {
        let user = form.into_identity()?;
        self.apply(IdentityState::SignedIn(user.clone()));
        Ok(user)
    }

    /// Sign out through the provider. State changes only if it succeeds.
    pub fn logout(&self) -> Result<(), IdentityError> {
        self.provider.logout().inspect_err(|e| {
            tracing::warn!(error = %e, "Logout failed");
        })?;
        self.apply(IdentityState::SignedOut);
        Ok(())
    }

    /// Record an auth-state change: update, persist, then notify.
    pub fn apply(&self, next: IdentityState) {
        // Serializes concurrent applies.
        let listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        match &next {
            IdentityState::SignedIn(user) => {
                tracing::info!(uid = %user.uid, "Signed in");
                if let Err(e) = self.cache.remember_user(user) {
                    tracing::warn!(error = %e, "Failed to cache session");
                }
            }
            IdentityState::SignedOut => {
                tracing::info!("Signed out");
                if let Err(e) = self.cache.forget_user() {
                    tracing::warn!(error = %e, "Failed to clear cached session");
                }
            }
        }
        *self.state.write().unwrap_or_else(PoisonError::into_inner) = next.clone();

        for listener in listeners.entries.values() {
            listener(&next);
        }
    }

    pub fn subscribe(
        &self,
        listener: impl Fn(&IdentityState) + Send + Sync + 'static,
    ) -> SubscriptionToken {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.insert(id, Box::new(listener));
        SubscriptionToken(id)
    }

    /// Returns false if the token was already removed.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners.entries.remove(&token.0).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn alice() -> UserIdentity {
        UserIdentity {
            uid: "g-1".into(),
            name: "Alice".into(),
            email: "alice@example.com".into(),
            photo_url: Some("https://example.com/a.png".into()),
        }
    }

    fn manager_with(provider: StaticIdentityProvider) -> (IdentityManager, SessionCache) {
        let cache = SessionCache::in_memory();
        (IdentityManager::new(Arc::new(provider), cache.clone()), cache)
    }

    struct FailingLogout;

    impl IdentityProvider for FailingLogout {
        fn sign_in_with_google(&self) -> Result<UserIdentity, IdentityError> {
            Ok(alice())
        }

        fn logout(&self) -> Result<(), IdentityError> {
            Err(IdentityError::Provider("network down".into()))
        }
    }

    #[test]
    fn starts_signed_out() {
        let (manager, _) = manager_with(StaticIdentityProvider::unavailable());
        assert_eq!(manager.current(), IdentityState::SignedOut);
        assert!(manager.current_user().is_none());
    }

    #[test]
    fn google_sign_in_updates_state_and_cache() {
        let (manager, cache) = manager_with(StaticIdentityProvider::signed_in(alice()));
        let user = manager.sign_in_with_google().unwrap();

        assert_eq!(user, alice());
        assert_eq!(manager.current_user(), Some(alice()));
        assert_eq!(cache.load_user().unwrap(), Some(alice()));
    }

    #[test]
    fn provider_error_leaves_state_signed_out() {
        let (manager, cache) = manager_with(StaticIdentityProvider::unavailable());
        let err = manager.sign_in_with_google().unwrap_err();

        assert!(matches!(err, IdentityError::Provider(_)));
        assert_eq!(manager.current(), IdentityState::SignedOut);
        assert!(cache.load_user().unwrap().is_none());
    }

    #[test]
    fn logout_clears_state_and_cache() {
        let (manager, cache) = manager_with(StaticIdentityProvider::signed_in(alice()));
        manager.sign_in_with_google().unwrap();
        manager.logout().unwrap();

        assert_eq!(manager.current(), IdentityState::SignedOut);
        assert!(cache.load_user().unwrap().is_none());
    }

    #[test]
    fn failed_logout_keeps_user() {
        let manager = IdentityManager::new(Arc::new(FailingLogout), SessionCache::in_memory());
        manager.sign_in_with_google().unwrap();

        assert_eq!(
            manager.logout(),
            Err(IdentityError::Provider("network down".into()))
        );
        assert_eq!(manager.current_user(), Some(alice()));
    }

    #[test]
    fn restore_reads_cached_user() {
        let cache = SessionCache::in_memory();
        cache.remember_user(&alice()).unwrap();
        let manager = IdentityManager::new(
            Arc::new(StaticIdentityProvider::unavailable()),
            cache,
        );

        assert_eq!(manager.restore(), Some(alice()));
        assert_eq!(manager.current_user(), Some(alice()));
    }

    #[test]
    fn subscribers_see_changes_until_unsubscribed() {
        let (manager, _) = manager_with(StaticIdentityProvider::signed_in(alice()));
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let token = manager.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        manager.sign_in_with_google().unwrap();
        manager.logout().unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 2);

        assert!(manager.unsubscribe(token));
        assert!(!manager.unsubscribe(token));
        manager.apply(IdentityState::SignedOut);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn subscribers_receive_new_state() {
        let (manager, _) = manager_with(StaticIdentityProvider::unavailable());
        let last = Arc::new(Mutex::new(None));
        let sink = last.clone();
        manager.subscribe(move |state| {
            *sink.lock().unwrap() = Some(state.clone());
        });

        manager.apply(IdentityState::SignedIn(alice()));
        assert_eq!(
            *last.lock().unwrap(),
            Some(IdentityState::SignedIn(alice()))
        );
    }

    #[test]
    fn concurrent_applies_leave_cache_state_and_listeners_agreeing() {
        let cache = SessionCache::in_memory();
        let manager = Arc::new(IdentityManager::new(
            Arc::new(StaticIdentityProvider::unavailable()),
            cache.clone(),
        ));
        let last = Arc::new(Mutex::new(None));
        let sink = last.clone();
        manager.subscribe(move |state| {
            *sink.lock().unwrap() = Some(state.clone());
        });

        let workers: Vec<_> = (0..8)
            .map(|i| {
                let manager = manager.clone();
                std::thread::spawn(move || {
                    for round in 0..50 {
                        let next = if (i + round) % 2 == 0 {
                            IdentityState::SignedIn(UserIdentity {
                                uid: format!("u-{i}"),
                                name: format!("User {i}"),
                                email: format!("u{i}@example.com"),
                                photo_url: None,
                            })
                        } else {
                            IdentityState::SignedOut
                        };
                        manager.apply(next);
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let current = manager.current();
        assert_eq!(cache.load_user().unwrap(), current.user().cloned());
        assert_eq!(*last.lock().unwrap(), Some(current));
    }

    #[test]
    fn email_login_requires_email_and_password() {
        let form = EmailSignIn {
            email: "bob@example.com".into(),
            ..Default::default()
        };
        assert_eq!(
            form.into_identity(),
            Err(IdentityError::Validation("Please fill in all fields".into()))
        );
    }

    #[test]
    fn email_signup_requires_name() {
        let form = EmailSignIn {
            mode: AuthMode::Signup,
            email: "bob@example.com".into(),
            password: "hunter2".into(),
            name: "  ".into(),
        };
        assert_eq!(
            form.into_identity(),
            Err(IdentityError::Validation("Please enter your name".into()))
        );
    }

    #[test]
    fn email_login_derives_name_from_address() {
        let (manager, _) = manager_with(StaticIdentityProvider::unavailable());
        let user = manager
            .sign_in_with_email(EmailSignIn {
                email: "bob.smith@example.com".into(),
                password: "hunter2".into(),
                ..Default::default()
            })
            .unwrap();

        assert_eq!(user.name, "bob.smith");
        assert!(user.photo_url.is_none());
        assert_eq!(manager.current_user(), Some(user));
    }

    #[test]
    fn identity_state_serializes_tagged() {
        let json = serde_json::to_value(IdentityState::SignedOut).unwrap();
        assert_eq!(json["status"], "signed_out");
        let json = serde_json::to_value(IdentityState::SignedIn(alice())).unwrap();
        assert_eq!(json["status"], "signed_in");
        assert_eq!(json["user"]["photoURL"], "https://example.com/a.png");
    }
}
