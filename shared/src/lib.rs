use serde::{Deserialize, Serialize};

pub mod date;
pub mod protocol;
pub mod serde_helper;

pub use date::Timestamp;

// =========================================================
// Constants
// =========================================================

/// Storage key holding the bearer token. The only durable client state.
pub const TOKEN_STORAGE_KEY: &str = "auth-token";
/// Marker for tokens minted locally instead of issued by the backend.
pub const PLACEHOLDER_TOKEN_PREFIX: &str = "temp-token-";

pub const HEADER_AUTHORIZATION: &str = "Authorization";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_ACCEPT: &str = "Accept";
pub const HEADER_APP_VERSION: &str = "X-App-Version";
pub const HEADER_APP_PLATFORM: &str = "X-App-Platform";
pub const HEADER_REQUEST_TIME: &str = "X-Request-Time";

const PLACEHOLDER_USER_ID: &str = "1";
const PLACEHOLDER_ROLE: &str = "admin";
const PLACEHOLDER_NAME: &str = "admin";

/// Returns true for tokens minted by [`placeholder_token`].
pub fn is_placeholder_token(token: &str) -> bool {
    token.starts_with(PLACEHOLDER_TOKEN_PREFIX)
}

/// Mints a placeholder token stamped with the current time.
pub fn placeholder_token() -> String {
    format!(
        "{}{}",
        PLACEHOLDER_TOKEN_PREFIX,
        Timestamp::now().as_millis()
    )
}

// =========================================================
// Domain Models
// =========================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub email: String,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Account registration payload, same shape as the login form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, deserialize_with = "serde_helper::string_or_number")]
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl UserProfile {
    /// Synthesizes a user from the identifier typed into the login form.
    pub fn from_credential(identifier: &str) -> Self {
        Self {
            id: PLACEHOLDER_USER_ID.to_string(),
            email: identifier.to_string(),
            name: Some(identifier.to_string()),
            role: PLACEHOLDER_ROLE.to_string(),
            phone: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Stand-in user for a session restored from a placeholder token.
    pub fn placeholder() -> Self {
        Self::from_credential(PLACEHOLDER_NAME)
    }

    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => &self.email,
        }
    }

    /// Overwrites every field present in `patch`.
    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(id) = patch.id {
            self.id = id;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if patch.name.is_some() {
            self.name = patch.name;
        }
        if let Some(role) = patch.role {
            self.role = role;
        }
        if patch.phone.is_some() {
            self.phone = patch.phone;
        }
        if patch.created_at.is_some() {
            self.created_at = patch.created_at;
        }
        if patch.updated_at.is_some() {
            self.updated_at = patch.updated_at;
        }
    }
}

impl From<UserPatch> for UserProfile {
    fn from(patch: UserPatch) -> Self {
        Self {
            id: patch.id.unwrap_or_default(),
            email: patch.email.unwrap_or_default(),
            name: patch.name,
            role: patch.role.unwrap_or_default(),
            phone: patch.phone,
            created_at: patch.created_at,
            updated_at: patch.updated_at,
        }
    }
}

/// Partial user update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Normalized login result. Either half may be missing from the backend reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuthGrant {
    pub token: Option<String>,
    pub user: Option<UserProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloodData {
    #[serde(default, deserialize_with = "serde_helper::string_or_number")]
    pub id: String,
    #[serde(default)]
    pub location: String,
    #[serde(default, deserialize_with = "serde_helper::string_or_number")]
    pub coordinates: String,
    #[serde(default)]
    pub water_level: f64,
    #[serde(default)]
    pub rainfall: f64,
    #[serde(default)]
    pub risk_level: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertSettings {
    #[serde(default, deserialize_with = "serde_helper::string_or_number")]
    pub id: String,
    #[serde(default, deserialize_with = "serde_helper::string_or_number")]
    pub user_id: String,
    #[serde(default)]
    pub email_notifications: bool,
    #[serde(default)]
    pub sms_notifications: bool,
    #[serde(default)]
    pub push_notifications: bool,
    #[serde(default)]
    pub risk_threshold: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertSettingsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_notifications: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sms_notifications: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub push_notifications: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_threshold: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvacuationCenter {
    #[serde(default, deserialize_with = "serde_helper::string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "serde_helper::string_or_number")]
    pub latitude: String,
    #[serde(default, deserialize_with = "serde_helper::string_or_number")]
    pub longitude: String,
    #[serde(rename = "descriptionImage", default)]
    pub description_image: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvacuationCenter {
    pub title: String,
    pub latitude: String,
    pub longitude: String,
    #[serde(rename = "descriptionImage")]
    pub description_image: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedRoad {
    #[serde(default, deserialize_with = "serde_helper::string_or_number")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, deserialize_with = "serde_helper::string_or_number")]
    pub latitude: String,
    #[serde(default, deserialize_with = "serde_helper::string_or_number")]
    pub longitude: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewClosedRoad {
    pub title: String,
    pub latitude: String,
    pub longitude: String,
    pub description: String,
}

/// Reply of the object-upload endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedObject {
    #[serde(rename = "objectName", default)]
    pub object_name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

// =========================================================
// Test Data Models
// =========================================================

/// Flood risk classification used by the test-data endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
            RiskLevel::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Flood reading as submitted to the test database. The backend assigns
/// `id` and `timestamp` when they are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestFloodData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub location: String,
    pub water_level: f64,
    pub risk_level: RiskLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

/// Free-form sample row for the connectivity check endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSample {
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoneLoginRequest {
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(rename = "phoneNumber")]
    pub phone_number: String,
    pub otp: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTestUser {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTestAlertSettings {
    pub user_id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_notifications: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sms_notifications: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_notifications: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_threshold: Option<String>,
}
