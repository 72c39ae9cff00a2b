use serde::{Deserialize, Serialize};

/// Request body for `POST /register`. Missing fields deserialize as empty
/// strings so they are reported by validation rather than by the extractor.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for `POST /login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub password: String,
}

/// Request body for `PUT /user`.
#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub phone_number: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Profile {
    pub full_name: String,
    pub phone_number: String,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub data: Profile,
}
