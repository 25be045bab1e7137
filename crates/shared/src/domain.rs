use serde::{Deserialize, Serialize};

use crate::error::UnknownLayout;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(AccountId);
id_newtype!(CourseId);

/// Which revision of the backend the client talks to.
///
/// The two revisions expose the same account concepts under different
/// resource names and field spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiLayout {
    #[default]
    Professors,
    Instructors,
}

impl ApiLayout {
    pub fn default_base_url(self) -> &'static str {
        match self {
            Self::Professors => "http://127.0.0.1:8000",
            Self::Instructors => "http://localhost:8080",
        }
    }

    pub fn account_noun(self) -> &'static str {
        match self {
            Self::Professors => "professor",
            Self::Instructors => "instructor",
        }
    }
}

impl std::str::FromStr for ApiLayout {
    type Err = UnknownLayout;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "professors" | "professor" => Ok(Self::Professors),
            "instructors" | "instructor" => Ok(Self::Instructors),
            other => Err(UnknownLayout(other.to_string())),
        }
    }
}
