use std::{sync::Arc, time::Duration};

use shared::{
    domain::AccountId,
    protocol::{AccountRecord, CourseRecord, NewAccount, NewCourse},
};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, warn};

use crate::{
    api::{AccountApi, HttpAccountApi},
    config::{ClientSettings, ConfigError},
    error::AuthError,
    forms::{FormKind, FormState, PasswordChangeForm, SignInForm, SignUpForm},
    session::{
        account_created_message, welcome_message, Profile, Session, SessionController,
        SessionEvent, SignOutReason,
    },
    view::{resolve_view, ActiveModal, ProfileFetch, Route, UiState, View},
};

/// Top-level controller behind every screen.
///
/// Owns the session, the three forms and the UI flags. Every handler
/// performs at most one outstanding request and writes status text on
/// failure instead of retrying.
pub struct AppController {
    session: SessionController,
    events: broadcast::Receiver<SessionEvent>,
    ui: UiState,
    sign_in: SignInForm,
    sign_up: SignUpForm,
    password_change: PasswordChangeForm,
    route: Route,
}

impl AppController {
    pub fn new(api: Arc<dyn AccountApi>, logout_delay: Duration) -> Self {
        let session = SessionController::new(api, logout_delay);
        let events = session.subscribe_events();
        Self {
            session,
            events,
            ui: UiState::default(),
            sign_in: SignInForm::default(),
            sign_up: SignUpForm::default(),
            password_change: PasswordChangeForm::default(),
            route: Route::Home,
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, ConfigError> {
        let api = HttpAccountApi::new(settings)?;
        Ok(Self::new(Arc::new(api), settings.logout_delay))
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn session_controller(&self) -> &SessionController {
        &self.session
    }

    pub fn sign_in_form(&self) -> &SignInForm {
        &self.sign_in
    }

    pub fn sign_up_form(&self) -> &SignUpForm {
        &self.sign_up
    }

    pub fn password_change_form(&self) -> &PasswordChangeForm {
        &self.password_change
    }

    fn account_noun(&self) -> &'static str {
        self.session.api().layout().account_noun()
    }

    fn fail<T>(&mut self, err: AuthError) -> Result<T, AuthError> {
        self.ui.set_status(err.status_message());
        Err(err)
    }

    /// Applies session changes made outside a handler (the deferred logout).
    pub fn sync_session_events(&mut self) -> Vec<SessionEvent> {
        let mut seen = Vec::new();
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    if matches!(
                        event,
                        SessionEvent::SignedOut {
                            reason: SignOutReason::PasswordChanged
                        }
                    ) {
                        self.clear_screen_state();
                        self.ui
                            .set_status("Your password was changed. Please sign in again.");
                    }
                    seen.push(event);
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "session events lagged");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        seen
    }

    pub async fn session(&mut self) -> Session {
        self.sync_session_events();
        self.session.session().await
    }

    pub async fn view(&mut self) -> View {
        let session = self.session().await;
        resolve_view(&session, &self.route)
    }

    pub async fn open_modal(&mut self, modal: ActiveModal) -> Result<(), AuthError> {
        let authenticated = self.session().await.is_authenticated();
        match (modal, authenticated) {
            (ActiveModal::Settings, false) => self.fail(AuthError::NotAuthenticated),
            (ActiveModal::SignIn | ActiveModal::SignUp, true) => {
                self.fail(AuthError::Validation("You are already signed in.".to_string()))
            }
            _ => {
                self.ui.open_modal(modal);
                Ok(())
            }
        }
    }

    /// Closes the open modal and resets its form.
    pub fn cancel_modal(&mut self) {
        match self.ui.active_modal {
            ActiveModal::SignIn => self.sign_in.reset(),
            ActiveModal::SignUp => self.sign_up.reset(),
            ActiveModal::Settings => self.password_change.reset(),
            ActiveModal::None => {}
        }
        self.ui.close_modal();
    }

    pub async fn toggle_profile_menu(&mut self) -> Result<(), AuthError> {
        if !self.session().await.is_authenticated() {
            return self.fail(AuthError::NotAuthenticated);
        }
        self.ui.toggle_profile_menu();
        Ok(())
    }

    pub fn update_field(
        &mut self,
        form: FormKind,
        name: &str,
        value: impl Into<String>,
    ) -> Result<(), AuthError> {
        let result = match form {
            FormKind::SignIn => self.sign_in.set_field(name, value),
            FormKind::SignUp => self.sign_up.set_field(name, value),
            FormKind::PasswordChange => self.password_change.set_field(name, value),
        };
        match result {
            Ok(()) => Ok(()),
            Err(err) => self.fail(err),
        }
    }

    pub async fn submit_sign_in(&mut self) -> Result<Profile, AuthError> {
        if let Err(err) = self.sign_in.validate() {
            return self.fail(err);
        }
        let username = self.sign_in.username.trim().to_string();
        match self.session.sign_in(&username, &self.sign_in.password).await {
            Ok(profile) => {
                self.sign_in.reset();
                self.ui.close_modal();
                self.ui.set_status(welcome_message(&profile));
                self.route = Route::Home;
                Ok(profile)
            }
            Err(err) => {
                self.sign_in.clear_secrets();
                self.fail(err)
            }
        }
    }

    pub async fn submit_sign_up(&mut self) -> Result<AccountRecord, AuthError> {
        if let Err(err) = self.sign_up.validate() {
            return self.fail(err);
        }
        match self.session.sign_up(&self.sign_up.to_new_account()).await {
            Ok(record) => {
                self.sign_up.reset();
                self.ui.close_modal();
                self.ui.set_status(account_created_message(&record));
                Ok(record)
            }
            Err(err) => {
                self.sign_up.clear_secrets();
                self.fail(err)
            }
        }
    }

    /// On success the session ends after the configured delay.
    pub async fn submit_password_change(&mut self) -> Result<(), AuthError> {
        if let Err(err) = self.password_change.validate() {
            return self.fail(err);
        }
        let form = self.password_change.clone();
        match self
            .session
            .change_password(&form.old_password, &form.new_password, &form.confirm_password)
            .await
        {
            Ok(()) => {
                self.password_change.reset();
                self.ui.close_modal();
                self.ui.success_toast = true;
                self.ui.set_status(format!(
                    "Password changed successfully. You will be signed out in {} seconds.",
                    self.session.logout_delay().as_secs_f32()
                ));
                Ok(())
            }
            Err(err) => {
                self.password_change.clear_secrets();
                self.fail(err)
            }
        }
    }

    fn clear_screen_state(&mut self) {
        self.ui.reset();
        self.sign_in.reset();
        self.sign_up.reset();
        self.password_change.reset();
        self.route = Route::Home;
    }

    /// Ends the session and closes every modal and menu. Idempotent.
    pub async fn logout(&mut self) {
        self.session.logout().await;
        self.sync_session_events();
        self.clear_screen_state();
    }

    /// Switches to the route for `path`. A profile route starts out loading;
    /// call [`AppController::load_route`] to fetch it.
    pub fn navigate(&mut self, path: &str) -> Result<(), AuthError> {
        match Route::parse(path) {
            Some(route) => {
                debug!(path, "navigate");
                self.route = route;
                Ok(())
            }
            None => self.fail(AuthError::NotFound(format!("Page '{path}'"))),
        }
    }

    pub async fn load_route(&mut self) {
        let Route::Profile {
            username,
            fetch: ProfileFetch::Loading,
        } = &self.route
        else {
            return;
        };
        let username = username.clone();
        let fetch = match self.session.api().fetch_account(&username).await {
            Ok(record) => ProfileFetch::Loaded(record),
            Err(failure) => {
                warn!(username = %username, error = %failure, "profile fetch failed");
                let message = format!("Failed to load {} data", self.account_noun());
                self.ui.set_status(message.clone());
                ProfileFetch::Failed(message)
            }
        };
        self.route = Route::Profile { username, fetch };
    }

    pub async fn list_accounts(&mut self) -> Result<Vec<AccountRecord>, AuthError> {
        match self.session.api().list_accounts().await {
            Ok(accounts) => Ok(accounts),
            Err(failure) => self.fail(failure.into()),
        }
    }

    /// Directory-style creation. Unlike sign-up, duplicate names surface the
    /// backend's own message.
    pub async fn create_account(
        &mut self,
        account: NewAccount,
    ) -> Result<AccountRecord, AuthError> {
        match self.session.api().create_account(&account).await {
            Ok(record) => {
                let noun = capitalize(self.account_noun());
                self.ui.set_status(format!("{noun} created"));
                Ok(record)
            }
            Err(failure) => self.fail(failure.into()),
        }
    }

    pub async fn delete_account(&mut self, username: &str) -> Result<(), AuthError> {
        match self.session.api().delete_account(username).await {
            Ok(()) => {
                let noun = capitalize(self.account_noun());
                self.ui.set_status(format!("{noun} deleted"));
                Ok(())
            }
            Err(failure) => {
                let noun = capitalize(self.account_noun());
                let err = match AuthError::from(failure) {
                    AuthError::NotFound(_) => AuthError::NotFound(format!("{noun} '{username}'")),
                    other => other,
                };
                self.fail(err)
            }
        }
    }

    pub async fn list_courses(&mut self) -> Result<Vec<CourseRecord>, AuthError> {
        match self.session.api().list_courses().await {
            Ok(courses) => Ok(courses),
            Err(failure) => self.fail(failure.into()),
        }
    }

    pub async fn create_course(&mut self, course: NewCourse) -> Result<CourseRecord, AuthError> {
        match self.session.api().create_course(&course).await {
            Ok(record) => {
                self.ui.set_status(format!("Course {} created", record.code));
                Ok(record)
            }
            Err(failure) => self.fail(failure.into()),
        }
    }

    pub async fn courses_for_professor(
        &mut self,
        professor_id: AccountId,
    ) -> Result<Vec<CourseRecord>, AuthError> {
        match self.session.api().courses_for_professor(professor_id).await {
            Ok(courses) => Ok(courses),
            Err(failure) => self.fail(failure.into()),
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
#[path = "tests/app_tests.rs"]
mod tests;
