use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_newtype!(MovieId);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: MovieId,
    pub title: String,
    pub poster_path: String,
    pub backdrop_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetail {
    pub id: MovieId,
    pub title: String,
    pub release_date: String,
    pub description: String,
    pub rating: f64,
    pub poster_path: String,
    pub backdrop_path: String,
}

/// Locally persisted account record. `login_status` is the only thing that
/// decides whether the authenticated screens are reachable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionProfile {
    pub username: String,
    pub password: String,
    pub email: String,
    pub fullname: String,
    pub address: String,
    pub login_status: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferenceKey {
    Username,
    Password,
    Email,
    Fullname,
    Address,
    LoginStatus,
    Image,
}

impl PreferenceKey {
    pub const ALL: [PreferenceKey; 7] = [
        PreferenceKey::Username,
        PreferenceKey::Password,
        PreferenceKey::Email,
        PreferenceKey::Fullname,
        PreferenceKey::Address,
        PreferenceKey::LoginStatus,
        PreferenceKey::Image,
    ];

    /// Name of the key as it is persisted.
    pub fn as_str(&self) -> &'static str {
        match self {
            PreferenceKey::Username => "username",
            PreferenceKey::Password => "password",
            PreferenceKey::Email => "email",
            PreferenceKey::Fullname => "fullname",
            PreferenceKey::Address => "address",
            PreferenceKey::LoginStatus => "login_status",
            PreferenceKey::Image => "image",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }
}

impl fmt::Display for PreferenceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
