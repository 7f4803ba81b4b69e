//! User data model
//!
//! The directory's sole entity plus the request/response payloads that
//! cross the API boundary. Logins and passwords are restricted to latin
//! letters and digits; display names also allow cyrillic letters.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;
use validator::Validate;

static LOGIN_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9]+$").unwrap());
static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Zа-яА-Я]+$").unwrap());

/// Gender of a user, stored and transmitted as its numeric code:
/// 0 = female, 1 = male, 2 = unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gender {
    Female,
    Male,
    Unspecified,
}

impl Gender {
    pub fn code(self) -> u8 {
        match self {
            Gender::Female => 0,
            Gender::Male => 1,
            Gender::Unspecified => 2,
        }
    }
}

impl TryFrom<u8> for Gender {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Gender::Female),
            1 => Ok(Gender::Male),
            2 => Ok(Gender::Unspecified),
            other => Err(format!(
                "Gender must be 0 (female), 1 (male) or 2 (unspecified), got {}",
                other
            )),
        }
    }
}

impl Serialize for Gender {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.code())
    }
}

impl<'de> Deserialize<'de> for Gender {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let code = u8::deserialize(deserializer)?;
        Gender::try_from(code).map_err(serde::de::Error::custom)
    }
}

/// User record
///
/// `revoked_on`/`revoked_by` are either both `None` (active account) or
/// both set (soft-deleted). The audit pair `created_on`/`created_by` is
/// written once; `modified_on`/`modified_by` re-stamp on every mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub login: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub gender: Gender,
    pub birthday: Option<NaiveDate>,
    pub admin: bool,
    pub created_on: DateTime<Utc>,
    pub created_by: String,
    pub modified_on: DateTime<Utc>,
    pub modified_by: String,
    pub revoked_on: Option<DateTime<Utc>>,
    pub revoked_by: Option<String>,
}

impl User {
    /// Whether the account has not been soft-deleted
    pub fn is_active(&self) -> bool {
        self.revoked_on.is_none()
    }
}

/// User response (without the stored digest)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: Uuid,
    pub login: String,
    pub name: String,
    pub gender: Gender,
    pub birthday: Option<NaiveDate>,
    pub admin: bool,
    pub created_on: DateTime<Utc>,
    pub created_by: String,
    pub modified_on: DateTime<Utc>,
    pub modified_by: String,
    pub revoked_on: Option<DateTime<Utc>>,
    pub revoked_by: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        UserResponse {
            id: user.id,
            login: user.login,
            name: user.name,
            gender: user.gender,
            birthday: user.birthday,
            admin: user.admin,
            created_on: user.created_on,
            created_by: user.created_by,
            modified_on: user.modified_on,
            modified_by: user.modified_by,
            revoked_on: user.revoked_on,
            revoked_by: user.revoked_by,
        }
    }
}

/// Payload for creating a new user
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    #[validate(regex(path = *LOGIN_PATTERN, message = "Login may contain only latin letters and digits"))]
    pub login: String,
    #[validate(regex(path = *LOGIN_PATTERN, message = "Password may contain only latin letters and digits"))]
    pub password: String,
    #[validate(regex(path = *NAME_PATTERN, message = "Name may contain only latin and cyrillic letters"))]
    pub name: String,
    pub gender: Gender,
    pub birthday: Option<NaiveDate>,
    #[serde(default)]
    pub admin: bool,
}

/// Partial profile update; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    #[validate(regex(path = *NAME_PATTERN, message = "Name may contain only latin and cyrillic letters"))]
    pub name: Option<String>,
    pub gender: Option<Gender>,
    pub birthday: Option<NaiveDate>,
}

/// Payload for replacing a stored password
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PasswordUpdateRequest {
    #[validate(regex(path = *LOGIN_PATTERN, message = "Password may contain only latin letters and digits"))]
    pub new_password: String,
}

/// Payload for renaming a login
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginUpdateRequest {
    #[validate(regex(path = *LOGIN_PATTERN, message = "Login may contain only latin letters and digits"))]
    pub new_login: String,
}
