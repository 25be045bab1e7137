use shared::domain::{AccountId, ApiLayout};
use url::Url;

use crate::{config::ConfigError, error::ApiFailure};

/// Builds request urls for one backend layout.
///
/// Path parameters are pushed as url segments, so usernames are always
/// percent-encoded. Empty, `.` and `..` usernames are refused because they
/// would address the collection instead of one record.
#[derive(Debug, Clone)]
pub struct Endpoints {
    base: Url,
    layout: ApiLayout,
}

impl Endpoints {
    pub fn new(base_url: &str, layout: ApiLayout) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };
        let base = Url::parse(base_url.trim()).map_err(|err| invalid(err.to_string()))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(invalid("expected an http(s) url".to_string()));
        }
        Ok(Self { base, layout })
    }

    pub fn layout(&self) -> ApiLayout {
        self.layout
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        url.set_fragment(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    pub fn accounts(&self) -> Url {
        match self.layout {
            ApiLayout::Professors => self.url(&["professors", ""]),
            ApiLayout::Instructors => self.url(&["instructors"]),
        }
    }

    /// Target of `DELETE`; only the professors layout can delete accounts.
    pub fn account(&self, username: &str) -> Result<Url, ApiFailure> {
        match self.layout {
            ApiLayout::Professors => Ok(self.url(&["professors", username_segment(username)?])),
            ApiLayout::Instructors => Err(ApiFailure::Unsupported("account deletion")),
        }
    }

    pub fn account_by_username(&self, username: &str) -> Result<Url, ApiFailure> {
        let username = username_segment(username)?;
        Ok(match self.layout {
            ApiLayout::Professors => self.url(&["professors", username]),
            ApiLayout::Instructors => self.url(&["instructors", "username", username]),
        })
    }

    /// Both layouts share the form-encoded `POST /login`.
    pub fn login(&self) -> Url {
        self.url(&["login"])
    }

    pub fn password(&self, username: &str) -> Result<Url, ApiFailure> {
        match self.layout {
            ApiLayout::Professors => Err(ApiFailure::Unsupported("password changes")),
            ApiLayout::Instructors => Ok(self.url(&[
                "instructors",
                "password",
                username_segment(username)?,
            ])),
        }
    }

    pub fn courses(&self) -> Result<Url, ApiFailure> {
        match self.layout {
            ApiLayout::Professors => Ok(self.url(&["courses", ""])),
            ApiLayout::Instructors => Err(ApiFailure::Unsupported("course management")),
        }
    }

    pub fn professor_courses(&self, professor_id: AccountId) -> Result<Url, ApiFailure> {
        match self.layout {
            ApiLayout::Professors => {
                Ok(self.url(&["professors", &professor_id.to_string(), "courses"]))
            }
            ApiLayout::Instructors => Err(ApiFailure::Unsupported("course management")),
        }
    }
}

fn username_segment(username: &str) -> Result<&str, ApiFailure> {
    match username {
        "" | "." | ".." => Err(ApiFailure::InvalidUsername(username.to_string())),
        _ => Ok(username),
    }
}
