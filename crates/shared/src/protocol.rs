use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::{AccountId, ApiLayout, CourseId};

/// An account as the backend returns it.
///
/// The backend includes the stored password in this record. There is no
/// field for it here, so it is dropped while decoding and never held by the
/// client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<AccountId>,
    pub username: String,
    #[serde(rename = "firstName", alias = "first_name", alias = "name", default)]
    pub first_name: String,
    #[serde(rename = "lastName", alias = "last_name", default)]
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// "First Last", or the username when both names are blank.
pub fn display_name(first_name: &str, last_name: &str, username: &str) -> String {
    let full = format!("{} {}", first_name.trim(), last_name.trim());
    match full.trim() {
        "" => username.to_string(),
        name => name.to_string(),
    }
}

/// First word of the first name, used in greetings.
pub fn greeting_name<'a>(first_name: &'a str, username: &'a str) -> &'a str {
    first_name.split_whitespace().next().unwrap_or(username)
}

impl AccountRecord {
    pub fn display_name(&self) -> String {
        display_name(&self.first_name, &self.last_name, &self.username)
    }

    pub fn greeting_name(&self) -> &str {
        greeting_name(&self.first_name, &self.username)
    }
}

#[derive(Clone, PartialEq, Eq, Default)]
pub struct NewAccount {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
}

impl std::fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAccount")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .finish()
    }
}

impl NewAccount {
    /// Request body for the create-account call in the given layout.
    pub fn payload(&self, layout: ApiLayout) -> Value {
        let email = self.email.clone().unwrap_or_default();
        match layout {
            ApiLayout::Professors => {
                let name = format!("{} {}", self.first_name.trim(), self.last_name.trim());
                json!({
                    "username": self.username,
                    "password": self.password,
                    "name": name.trim(),
                    "email": email,
                })
            }
            ApiLayout::Instructors => json!({
                "username": self.username,
                "password": self.password,
                "firstName": self.first_name,
                "lastName": self.last_name,
                "email": email,
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<CourseId>,
    pub code: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub professor_id: Option<AccountId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCourse {
    pub code: String,
    pub name: String,
    pub professor_id: AccountId,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChangeRequest {
    pub old_password: String,
    pub new_password: String,
}

impl std::fmt::Debug for PasswordChangeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordChangeRequest { .. }")
    }
}

/// Form-encoded body of the login call.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
