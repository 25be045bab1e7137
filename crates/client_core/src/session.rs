use std::{
    sync::{Arc, Weak},
    time::Duration,
};

use chrono::{DateTime, Utc};
use shared::{
    domain::AccountId,
    protocol::{self, AccountRecord, LoginForm, NewAccount, PasswordChangeRequest},
};
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    api::AccountApi,
    error::{ApiFailure, AuthError},
};

/// The signed-in user as the client keeps it. Holds no credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub id: Option<AccountId>,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub signed_in_at: DateTime<Utc>,
}

impl Profile {
    pub fn from_record(record: AccountRecord, signed_in_at: DateTime<Utc>) -> Self {
        Self {
            id: record.id,
            username: record.username,
            first_name: record.first_name,
            last_name: record.last_name,
            email: record.email,
            signed_in_at,
        }
    }

    pub fn greeting_name(&self) -> &str {
        protocol::greeting_name(&self.first_name, &self.username)
    }

    pub fn display_name(&self) -> String {
        protocol::display_name(&self.first_name, &self.last_name, &self.username)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    Anonymous,
    Authenticated(Profile),
}

impl Session {
    pub fn profile(&self) -> Option<&Profile> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(profile) => Some(profile),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignOutReason {
    UserRequested,
    PasswordChanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn { username: String },
    PasswordChanged { logout_in: Duration },
    SignedOut { reason: SignOutReason },
}

pub fn welcome_message(profile: &Profile) -> String {
    format!("Welcome, {}!", profile.greeting_name())
}

pub fn account_created_message(record: &AccountRecord) -> String {
    format!(
        "Welcome {}! Your account has been created successfully.",
        record.greeting_name()
    )
}

struct PendingLogout {
    task: JoinHandle<()>,
}

#[derive(Default)]
struct SessionState {
    session: Session,
    /// Bumped on every sign-in and sign-out. A deferred logout only acts on
    /// the epoch it was scheduled in.
    epoch: u64,
    pending_logout: Option<PendingLogout>,
}

impl SessionState {
    fn cancel_pending_logout(&mut self) {
        if let Some(pending) = self.pending_logout.take() {
            pending.task.abort();
            debug!("cancelled deferred logout");
        }
    }
}

/// Owns the session and drives `Anonymous -> Authenticated -> Anonymous`.
///
/// The session is only written after a confirmed success response.
pub struct SessionController {
    api: Arc<dyn AccountApi>,
    logout_delay: Duration,
    state: Arc<Mutex<SessionState>>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionController {
    pub fn new(api: Arc<dyn AccountApi>, logout_delay: Duration) -> Self {
        let (events, _) = broadcast::channel(32);
        Self {
            api,
            logout_delay,
            state: Arc::new(Mutex::new(SessionState::default())),
            events,
        }
    }

    pub fn api(&self) -> &Arc<dyn AccountApi> {
        &self.api
    }

    pub fn logout_delay(&self) -> Duration {
        self.logout_delay
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub async fn session(&self) -> Session {
        self.state.lock().await.session.clone()
    }

    pub async fn has_pending_logout(&self) -> bool {
        self.state.lock().await.pending_logout.is_some()
    }

    /// Server-side credential check followed by a profile fetch.
    ///
    /// Wrong password and unknown user are reported the same way.
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<Profile, AuthError> {
        let form = LoginForm {
            username: username.to_string(),
            password: password.to_string(),
        };
        self.api.login(&form).await.map_err(|failure| {
            match failure.status() {
                Some(401) => debug!(username, "sign-in rejected: wrong password"),
                Some(404) => debug!(username, "sign-in rejected: unknown user"),
                _ => warn!(username, error = %failure, "sign-in failed"),
            }
            AuthError::rejected_as(failure, AuthError::InvalidCredentials)
        })?;

        let record = self
            .api
            .fetch_account(username)
            .await
            .map_err(|failure| match failure {
                ApiFailure::Status { status: 404, .. } => AuthError::InvalidCredentials,
                other => other.into(),
            })?;

        let profile = Profile::from_record(record, Utc::now());
        {
            let mut state = self.state.lock().await;
            state.cancel_pending_logout();
            state.epoch += 1;
            state.session = Session::Authenticated(profile.clone());
        }
        info!(username = %profile.username, "signed in");
        let _ = self.events.send(SessionEvent::SignedIn {
            username: profile.username.clone(),
        });
        Ok(profile)
    }

    /// Creates the account. Never signs the new account in.
    pub async fn sign_up(&self, account: &NewAccount) -> Result<AccountRecord, AuthError> {
        let mut record = self.api.create_account(account).await.map_err(|failure| {
            warn!(username = %account.username, error = %failure, "sign-up failed");
            AuthError::rejected_as(failure, AuthError::AccountConflict)
        })?;
        if record.first_name.trim().is_empty() {
            record.first_name = account.first_name.clone();
        }
        info!(username = %record.username, "account created");
        Ok(record)
    }

    pub async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
        confirm_password: &str,
    ) -> Result<(), AuthError> {
        if new_password != confirm_password {
            return Err(AuthError::Validation(
                "New password and confirmation do not match.".to_string(),
            ));
        }

        let (username, epoch) = {
            let state = self.state.lock().await;
            match &state.session {
                Session::Authenticated(profile) => (profile.username.clone(), state.epoch),
                Session::Anonymous => return Err(AuthError::NotAuthenticated),
            }
        };

        let request = PasswordChangeRequest {
            old_password: old_password.to_string(),
            new_password: new_password.to_string(),
        };
        self.api
            .change_password(&username, &request)
            .await
            .map_err(|failure| {
                warn!(username = %username, error = %failure, "password change failed");
                AuthError::rejected_as(failure, AuthError::InvalidOldPassword)
            })?;

        let mut state = self.state.lock().await;
        if state.epoch != epoch {
            // Signed out (or in as someone else) while the request was out.
            return Ok(());
        }
        state.cancel_pending_logout();
        let task = self.spawn_deferred_logout(epoch);
        state.pending_logout = Some(PendingLogout { task });
        drop(state);

        info!(username = %username, delay_ms = self.logout_delay.as_millis() as u64, "password changed");
        let _ = self.events.send(SessionEvent::PasswordChanged {
            logout_in: self.logout_delay,
        });
        Ok(())
    }

    fn spawn_deferred_logout(&self, epoch: u64) -> JoinHandle<()> {
        let state: Weak<Mutex<SessionState>> = Arc::downgrade(&self.state);
        let events = self.events.clone();
        let delay = self.logout_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(state) = state.upgrade() else {
                return;
            };
            let mut state = state.lock().await;
            if state.epoch != epoch {
                return;
            }
            // Dropping our own handle detaches it; the task finishes normally.
            state.pending_logout = None;
            state.session = Session::Anonymous;
            state.epoch += 1;
            drop(state);
            info!("signed out after password change");
            let _ = events.send(SessionEvent::SignedOut {
                reason: SignOutReason::PasswordChanged,
            });
        })
    }

    /// Clears the session and any pending deferred logout. Idempotent.
    pub async fn logout(&self) {
        let mut state = self.state.lock().await;
        state.cancel_pending_logout();
        let was_authenticated = state.session.is_authenticated();
        state.session = Session::Anonymous;
        state.epoch += 1;
        drop(state);

        if was_authenticated {
            info!("signed out");
            let _ = self.events.send(SessionEvent::SignedOut {
                reason: SignOutReason::UserRequested,
            });
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.try_lock() {
            state.cancel_pending_logout();
        }
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
