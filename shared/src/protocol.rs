use crate::{
    AlertSettings, AlertSettingsPatch, AuthGrant, ClosedRoad, EvacuationCenter, FloodData,
    LoginCredentials, NewClosedRoad, NewEvacuationCenter, NewTestAlertSettings, NewTestUser,
    PhoneLoginRequest, RegisterRequest, TestFloodData, TestSample, UserPatch, UserProfile,
    VerifyOtpRequest,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// HTTP Methods for API Requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
        }
    }

    /// GET and DELETE carry their parameters in the query string.
    pub fn uses_query(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Delete)
    }
}

/// Percent-encodes everything outside the RFC 3986 unreserved set. Used for
/// query values and for ids placed in a path segment.
pub fn encode_component(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// A trait that defines the request-response relationship and metadata for an API endpoint.
pub trait ApiRequest: Serialize {
    /// The response type returned by this request.
    type Response;
    /// The URL path.
    const PATH: &'static str;
    /// The HTTP method.
    const METHOD: HttpMethod;

    /// Concrete path for this request. Override for paths with parameters.
    fn path(&self) -> String {
        Self::PATH.to_string()
    }
}

// =========================================================
// Authentication
// =========================================================

impl ApiRequest for LoginCredentials {
    type Response = AuthGrant;
    const PATH: &'static str = "/web/login";
    const METHOD: HttpMethod = HttpMethod::Post;
}

impl ApiRequest for RegisterRequest {
    type Response = AuthGrant;
    const PATH: &'static str = "/web/addlogin";
    const METHOD: HttpMethod = HttpMethod::Post;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutRequest;

impl ApiRequest for LogoutRequest {
    type Response = ();
    const PATH: &'static str = "/auth/logout";
    const METHOD: HttpMethod = HttpMethod::Post;
}

// =========================================================
// Profile & users
// =========================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct GetProfileRequest;

impl ApiRequest for GetProfileRequest {
    type Response = UserProfile;
    const PATH: &'static str = "/user/profile";
    const METHOD: HttpMethod = HttpMethod::Get;
}

impl ApiRequest for UserPatch {
    type Response = UserProfile;
    const PATH: &'static str = "/user/profile";
    const METHOD: HttpMethod = HttpMethod::Post;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListUsersRequest;

impl ApiRequest for ListUsersRequest {
    type Response = Vec<UserProfile>;
    const PATH: &'static str = "/api/test/users";
    const METHOD: HttpMethod = HttpMethod::Get;
}

// =========================================================
// Flood data & alerts
// =========================================================

/// Flood readings, optionally filtered.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ListFloodDataRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<String>,
}

impl ApiRequest for ListFloodDataRequest {
    type Response = Vec<FloodData>;
    const PATH: &'static str = "/flood-data";
    const METHOD: HttpMethod = HttpMethod::Get;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetFloodDataRequest {
    #[serde(skip)]
    pub id: String,
}

impl ApiRequest for GetFloodDataRequest {
    type Response = FloodData;
    const PATH: &'static str = "/flood-data";
    const METHOD: HttpMethod = HttpMethod::Get;

    fn path(&self) -> String {
        format!("{}/{}", Self::PATH, encode_component(&self.id))
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetAlertSettingsRequest;

impl ApiRequest for GetAlertSettingsRequest {
    type Response = AlertSettings;
    const PATH: &'static str = "/alerts/settings";
    const METHOD: HttpMethod = HttpMethod::Get;
}

impl ApiRequest for AlertSettingsPatch {
    type Response = AlertSettings;
    const PATH: &'static str = "/alerts/settings";
    const METHOD: HttpMethod = HttpMethod::Post;
}

// =========================================================
// Evacuation centers & closed roads
// =========================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ListEvacuationCentersRequest;

impl ApiRequest for ListEvacuationCentersRequest {
    type Response = Vec<EvacuationCenter>;
    const PATH: &'static str = "/web/getevacuationcenters";
    const METHOD: HttpMethod = HttpMethod::Get;
}

/// The add endpoints reply with a status envelope we do not rely on;
/// callers refetch the list afterwards.
impl ApiRequest for NewEvacuationCenter {
    type Response = ();
    const PATH: &'static str = "/web/addevacuationcenters";
    const METHOD: HttpMethod = HttpMethod::Post;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListClosedRoadsRequest;

impl ApiRequest for ListClosedRoadsRequest {
    type Response = Vec<ClosedRoad>;
    const PATH: &'static str = "/web/getclosedroads";
    const METHOD: HttpMethod = HttpMethod::Get;
}

impl ApiRequest for NewClosedRoad {
    type Response = ();
    const PATH: &'static str = "/web/addclosedroads";
    const METHOD: HttpMethod = HttpMethod::Post;
}

// =========================================================
// Object storage
// =========================================================

/// Multipart upload target. The body is built by the client, not serialized.
pub const UPLOAD_PATH: &str = "/web/uploadToGcs";

// =========================================================
// Test database
// =========================================================

/// Connectivity check; the reply is echoed back to the operator as is.
impl ApiRequest for TestSample {
    type Response = Value;
    const PATH: &'static str = "/sample/addtest";
    const METHOD: HttpMethod = HttpMethod::Post;
}

impl ApiRequest for PhoneLoginRequest {
    type Response = Value;
    const PATH: &'static str = "/api/test/phone-login";
    const METHOD: HttpMethod = HttpMethod::Post;
}

impl ApiRequest for VerifyOtpRequest {
    type Response = Value;
    const PATH: &'static str = "/api/test/verify-otp";
    const METHOD: HttpMethod = HttpMethod::Post;
}

impl ApiRequest for TestFloodData {
    type Response = ();
    const PATH: &'static str = "/api/test/add-flood-data";
    const METHOD: HttpMethod = HttpMethod::Post;
}

impl ApiRequest for NewTestUser {
    type Response = ();
    const PATH: &'static str = "/api/test/add-user";
    const METHOD: HttpMethod = HttpMethod::Post;
}

impl ApiRequest for NewTestAlertSettings {
    type Response = ();
    const PATH: &'static str = "/api/test/add-alert-settings";
    const METHOD: HttpMethod = HttpMethod::Post;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListTestFloodDataRequest;

impl ApiRequest for ListTestFloodDataRequest {
    type Response = Vec<FloodData>;
    const PATH: &'static str = "/api/test/flood-data";
    const METHOD: HttpMethod = HttpMethod::Get;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListTestAlertSettingsRequest;

impl ApiRequest for ListTestAlertSettingsRequest {
    type Response = Vec<AlertSettings>;
    const PATH: &'static str = "/api/test/alert-settings";
    const METHOD: HttpMethod = HttpMethod::Get;
}

/// Replaces a test reading. The id goes in the path, the record in the body.
#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateTestFloodDataRequest {
    #[serde(skip)]
    pub id: String,
    #[serde(flatten)]
    pub data: TestFloodData,
}

impl ApiRequest for UpdateTestFloodDataRequest {
    type Response = ();
    const PATH: &'static str = "/api/test/update-flood-data";
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        format!("{}/{}", Self::PATH, encode_component(&self.id))
    }
}

/// Serializes to `{}`; the backend expects an empty object body.
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteTestFloodDataRequest {
    #[serde(skip)]
    pub id: String,
}

impl ApiRequest for DeleteTestFloodDataRequest {
    type Response = ();
    const PATH: &'static str = "/api/test/delete-flood-data";
    const METHOD: HttpMethod = HttpMethod::Post;

    fn path(&self) -> String {
        format!("{}/{}", Self::PATH, encode_component(&self.id))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct ResetTestDataRequest {}

impl ApiRequest for ResetTestDataRequest {
    type Response = ();
    const PATH: &'static str = "/api/test/reset";
    const METHOD: HttpMethod = HttpMethod::Post;
}

/// Prefix of the generic test routes.
pub const TEST_API_PREFIX: &str = "/api/test";
