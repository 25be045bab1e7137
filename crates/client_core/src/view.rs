//! Screen-level state: which modal is open and which view is rendered.

use shared::protocol::AccountRecord;

use crate::session::{Profile, Session};

/// At most one modal can be open; the type enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveModal {
    #[default]
    None,
    SignIn,
    SignUp,
    Settings,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    pub active_modal: ActiveModal,
    pub profile_menu_open: bool,
    pub status: Option<String>,
    pub success_toast: bool,
}

impl UiState {
    pub fn open_modal(&mut self, modal: ActiveModal) {
        self.active_modal = modal;
        self.profile_menu_open = false;
        self.status = None;
        self.success_toast = false;
    }

    pub fn close_modal(&mut self) {
        self.active_modal = ActiveModal::None;
    }

    pub fn toggle_profile_menu(&mut self) {
        self.profile_menu_open = !self.profile_menu_open;
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    /// Closes everything and forgets transient messages.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileFetch {
    Loading,
    Loaded(AccountRecord),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Route {
    #[default]
    Home,
    Profile {
        username: String,
        fetch: ProfileFetch,
    },
}

impl Route {
    /// `/` and `/professor/{username}` (or `/instructor/{username}`).
    pub fn parse(path: &str) -> Option<Self> {
        let segments: Vec<&str> = path
            .trim()
            .trim_matches('/')
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();
        match segments.as_slice() {
            [] => Some(Self::Home),
            ["professor" | "instructor", username] => Some(Self::Profile {
                username: (*username).to_string(),
                fetch: ProfileFetch::Loading,
            }),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Landing,
    Dashboard(Profile),
    Loading,
    ProfileDetail(AccountRecord),
}

/// Landing iff anonymous and dashboard iff signed in, unless a profile route
/// is outstanding or loaded.
pub fn resolve_view(session: &Session, route: &Route) -> View {
    match route {
        Route::Profile {
            fetch: ProfileFetch::Loading,
            ..
        } => View::Loading,
        Route::Profile {
            fetch: ProfileFetch::Loaded(record),
            ..
        } => View::ProfileDetail(record.clone()),
        Route::Home
        | Route::Profile {
            fetch: ProfileFetch::Failed(_),
            ..
        } => match session {
            Session::Anonymous => View::Landing,
            Session::Authenticated(profile) => View::Dashboard(profile.clone()),
        },
    }
}
