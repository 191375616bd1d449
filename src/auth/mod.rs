pub mod extractors;
pub mod middleware;
pub mod password;
pub mod token;

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

pub use extractors::AuthenticatedUserId;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use token::{generate_token, verify_token, Claims};

lazy_static! {
    // Usernames: alphanumeric, underscores, hyphens.
    static ref USERNAME_REGEX: regex::Regex = regex::Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

// Passwords rejected outright regardless of length.
const COMMON_PASSWORDS: [&str; 4] = ["password", "12345678", "qwerty123", "abc12345"];

fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if COMMON_PASSWORDS.contains(&password.to_lowercase().as_str()) {
        let mut error = ValidationError::new("common_password");
        error.message =
            Some("Password is too common. Please choose a stronger password".into());
        return Err(error);
    }
    Ok(())
}

/// Represents the payload for a user login request.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    /// Desired username: 3 to 32 characters, alphanumeric plus underscores
    /// and hyphens.
    #[validate(
        length(min = 3, max = 32),
        regex(
            path = "USERNAME_REGEX",
            message = "Username must be alphanumeric, underscores, or hyphens"
        )
    )]
    pub username: String,

    #[validate(email)]
    pub email: String,

    /// At least 8 characters and not on the common-password blocklist.
    #[validate(length(min = 8), custom = "validate_password_strength")]
    pub password: String,

    #[validate(must_match(other = "password", message = "Passwords do not match"))]
    pub confirm_password: String,

    #[serde(default)]
    pub first_name: String,

    #[serde(default)]
    pub last_name: String,
}

/// Response structure after successful authentication (login or registration).
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    /// The JWT for subsequent authenticated requests.
    pub token: String,
    /// The unique identifier of the authenticated user.
    pub user_id: i32,
}
