//! User identity domain models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Account role.
///
/// Roles are flat: `Admin` does not imply `Regular`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    Regular,
}

impl Role {
    pub const ALL: [Role; 2] = [Role::Admin, Role::Regular];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Regular => "regular",
        }
    }

    /// "admin, regular"
    pub fn valid_values() -> String {
        Self::ALL
            .iter()
            .map(Role::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid role. Valid roles are: {}", Role::valid_values())]
pub struct UnknownRole;

impl FromStr for Role {
    type Err = UnknownRole;

    /// Exact, case-sensitive match on the serialized form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "regular" => Ok(Role::Regular),
            _ => Err(UnknownRole),
        }
    }
}

/// Stored identity record. Carries the password hash, so it is never
/// serialized; use [`UserResponse`] at the API boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// Insert payload handed to the credential repository.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

/// Password-free projection of an identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

impl From<Identity> for UserResponse {
    fn from(identity: Identity) -> Self {
        Self {
            id: identity.id,
            username: identity.username,
            role: identity.role,
        }
    }
}

/// Registration request
///
/// Fields are optional so a missing field surfaces as a validation error
/// (400) rather than a deserialization rejection.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[schema(example = "luke")]
    #[validate(
        required(message = "username is required"),
        length(min = 1, max = 64, message = "username must be 1-64 characters"),
        custom(function = "validate_username")
    )]
    pub username: Option<String>,

    #[schema(example = "use-the-force")]
    #[validate(
        required(message = "password is required"),
        length(min = 1, max = 128, message = "password must be 1-128 characters")
    )]
    pub password: Option<String>,
}

fn validate_username(value: &str) -> Result<(), ValidationError> {
    if value.trim() != value {
        return Err(ValidationError::new("username_whitespace")
            .with_message("username must not start or end with whitespace".into()));
    }
    Ok(())
}

/// Role update request (admin only)
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    #[schema(example = "admin")]
    pub role: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_through_str() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
    }

    #[test]
    fn test_role_parse_is_exact() {
        assert!("Admin".parse::<Role>().is_err());
        assert!("superuser".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn test_unknown_role_message_lists_valid_roles() {
        let err = "owner".parse::<Role>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid role. Valid roles are: admin, regular");
    }

    #[test]
    fn test_role_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Role::Admin).unwrap(), "\"admin\"");
        assert_eq!(Role::default(), Role::Regular);
    }

    #[test]
    fn test_user_response_drops_password_hash() {
        let identity = Identity {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: Role::Regular,
        };

        let json = serde_json::to_value(UserResponse::from(identity)).unwrap();
        assert_eq!(json["username"], "alice");
        assert_eq!(json["role"], "regular");
        assert!(json.get("password_hash").is_none());
        assert!(!json.to_string().contains("argon2"));
    }

    #[test]
    fn test_register_request_validation() {
        let ok = RegisterRequest {
            username: Some("alice".to_string()),
            password: Some("pw1".to_string()),
        };
        assert!(ok.validate().is_ok());

        let missing = RegisterRequest {
            username: Some("alice".to_string()),
            password: None,
        };
        assert!(missing.validate().is_err());

        let padded = RegisterRequest {
            username: Some(" alice".to_string()),
            password: Some("pw1".to_string()),
        };
        assert!(padded.validate().is_err());

        let empty = RegisterRequest {
            username: Some(String::new()),
            password: Some("pw1".to_string()),
        };
        assert!(empty.validate().is_err());
    }
}
