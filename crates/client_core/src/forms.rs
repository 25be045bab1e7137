use shared::protocol::NewAccount;

use crate::error::AuthError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormKind {
    SignIn,
    SignUp,
    PasswordChange,
}

/// Field-level editing shared by every form.
///
/// Field names are accepted in camelCase (as the web forms named them) and
/// in snake_case.
pub trait FormState: Default {
    const FIELDS: &'static [&'static str];

    fn field_mut(&mut self, name: &str) -> Option<&mut String>;

    fn validate(&self) -> Result<(), AuthError>;

    /// Drops every field that holds a password.
    fn clear_secrets(&mut self);

    /// Replaces one field and leaves the others untouched.
    fn set_field(&mut self, name: &str, value: impl Into<String>) -> Result<(), AuthError> {
        match self.field_mut(name) {
            Some(field) => {
                *field = value.into();
                Ok(())
            }
            None => Err(AuthError::Validation(format!("Unknown field '{name}'."))),
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

fn require(fields: &[(&str, &str)]) -> Result<(), AuthError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(label, _)| *label)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AuthError::Validation(format!(
            "Please fill in: {}.",
            missing.join(", ")
        )))
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct SignInForm {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for SignInForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInForm")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl FormState for SignInForm {
    const FIELDS: &'static [&'static str] = &["username", "password"];

    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "username" => Some(&mut self.username),
            "password" => Some(&mut self.password),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), AuthError> {
        require(&[
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
        ])
    }

    fn clear_secrets(&mut self) {
        self.password.clear();
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct SignUpForm {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl std::fmt::Debug for SignUpForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignUpForm")
            .field("username", &self.username)
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl SignUpForm {
    pub fn to_new_account(&self) -> NewAccount {
        let email = self.email.trim();
        NewAccount {
            username: self.username.trim().to_string(),
            password: self.password.clone(),
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: (!email.is_empty()).then(|| email.to_string()),
        }
    }
}

impl FormState for SignUpForm {
    const FIELDS: &'static [&'static str] =
        &["username", "password", "firstName", "lastName", "email"];

    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "username" => Some(&mut self.username),
            "password" => Some(&mut self.password),
            "firstName" | "first_name" => Some(&mut self.first_name),
            "lastName" | "last_name" => Some(&mut self.last_name),
            "email" => Some(&mut self.email),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), AuthError> {
        require(&[
            ("username", self.username.as_str()),
            ("password", self.password.as_str()),
            ("first name", self.first_name.as_str()),
            ("last name", self.last_name.as_str()),
        ])?;
        let email = self.email.trim();
        if !email.is_empty() && !email.contains('@') {
            return Err(AuthError::Validation(
                "Please enter a valid email address.".to_string(),
            ));
        }
        Ok(())
    }

    fn clear_secrets(&mut self) {
        self.password.clear();
    }
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct PasswordChangeForm {
    pub old_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl std::fmt::Debug for PasswordChangeForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordChangeForm { .. }")
    }
}

impl FormState for PasswordChangeForm {
    const FIELDS: &'static [&'static str] = &["oldPassword", "newPassword", "confirmPassword"];

    fn field_mut(&mut self, name: &str) -> Option<&mut String> {
        match name {
            "oldPassword" | "old_password" => Some(&mut self.old_password),
            "newPassword" | "new_password" => Some(&mut self.new_password),
            "confirmPassword" | "confirm_password" => Some(&mut self.confirm_password),
            _ => None,
        }
    }

    fn validate(&self) -> Result<(), AuthError> {
        require(&[
            ("current password", self.old_password.as_str()),
            ("new password", self.new_password.as_str()),
            ("confirmation", self.confirm_password.as_str()),
        ])?;
        if self.new_password != self.confirm_password {
            return Err(AuthError::Validation(
                "New password and confirmation do not match.".to_string(),
            ));
        }
        Ok(())
    }

    fn clear_secrets(&mut self) {
        self.reset();
    }
}
