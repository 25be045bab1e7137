//! Client for the plagiarism-checker account service.
//!
//! [`AppController`] is the entry point: it owns the [`SessionController`],
//! the sign-in, sign-up and password-change forms, and the UI flags that
//! decide which [`View`] is rendered. Requests go through the [`AccountApi`]
//! trait; [`HttpAccountApi`] is the reqwest implementation.

pub mod api;
pub mod app;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod forms;
pub mod session;
pub mod view;

pub use api::{AccountApi, HttpAccountApi};
pub use app::AppController;
pub use config::{load_settings, ClientSettings, ConfigError, SettingsOverrides};
pub use error::{ApiFailure, AuthError};
pub use forms::{FormKind, FormState, PasswordChangeForm, SignInForm, SignUpForm};
pub use session::{Profile, Session, SessionController, SessionEvent, SignOutReason};
pub use view::{ActiveModal, ProfileFetch, Route, UiState, View};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
