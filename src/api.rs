use std::rc::Rc;

use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::request::HttpClient;
use floodwatch_shared::protocol::{
    GetAlertSettingsRequest, GetFloodDataRequest, GetProfileRequest, ListClosedRoadsRequest,
    ListEvacuationCentersRequest, ListFloodDataRequest, ListUsersRequest, LogoutRequest,
};
use floodwatch_shared::{
    AlertSettings, AlertSettingsPatch, AuthGrant, ClosedRoad, EvacuationCenter, FloodData,
    LoginCredentials, NewClosedRoad, NewEvacuationCenter, RegisterRequest, UserPatch, UserProfile,
};

/// Typed facade over the backend endpoints used by the dashboard.
pub struct FloodWatchApi<C: HttpClient> {
    client: Rc<ApiClient<C>>,
}

impl<C: HttpClient> Clone for FloodWatchApi<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
        }
    }
}

impl<C: HttpClient> FloodWatchApi<C> {
    pub fn new(client: Rc<ApiClient<C>>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Rc<ApiClient<C>> {
        &self.client
    }

    // --- Authentication ---

    pub async fn login(&self, credentials: &LoginCredentials) -> ApiResult<AuthGrant> {
        self.client
            .execute(credentials)
            .await
            .map_err(|e| e.in_op("api.login"))
    }

    pub async fn register(&self, request: &RegisterRequest) -> ApiResult<AuthGrant> {
        self.client
            .execute(request)
            .await
            .map_err(|e| e.in_op("api.register"))
    }

    pub async fn logout(&self) -> ApiResult<()> {
        self.client
            .execute(&LogoutRequest)
            .await
            .map_err(|e| e.in_op("api.logout"))
    }

    // --- Profile & users ---

    pub async fn get_profile(&self) -> ApiResult<UserProfile> {
        self.client
            .execute(&GetProfileRequest)
            .await
            .map_err(|e| e.in_op("api.get_profile"))
    }

    pub async fn update_profile(&self, patch: &UserPatch) -> ApiResult<UserProfile> {
        self.client
            .execute(patch)
            .await
            .map_err(|e| e.in_op("api.update_profile"))
    }

    pub async fn list_users(&self) -> ApiResult<Vec<UserProfile>> {
        self.client
            .execute(&ListUsersRequest)
            .await
            .map_err(|e| e.in_op("api.list_users"))
    }

    // --- Flood data & alerts ---

    pub async fn list_flood_data(&self, filter: &ListFloodDataRequest) -> ApiResult<Vec<FloodData>> {
        self.client
            .execute(filter)
            .await
            .map_err(|e| e.in_op("api.list_flood_data"))
    }

    pub async fn get_flood_data(&self, id: &str) -> ApiResult<FloodData> {
        let request = GetFloodDataRequest { id: id.to_string() };
        self.client
            .execute(&request)
            .await
            .map_err(|e| e.in_op_with("api.get_flood_data", id))
    }

    pub async fn get_alert_settings(&self) -> ApiResult<AlertSettings> {
        self.client
            .execute(&GetAlertSettingsRequest)
            .await
            .map_err(|e| e.in_op("api.get_alert_settings"))
    }

    pub async fn update_alert_settings(&self, patch: &AlertSettingsPatch) -> ApiResult<AlertSettings> {
        self.client
            .execute(patch)
            .await
            .map_err(|e| e.in_op("api.update_alert_settings"))
    }

    // --- Evacuation centers & closed roads ---

    pub async fn list_evacuation_centers(&self) -> ApiResult<Vec<EvacuationCenter>> {
        self.client
            .execute(&ListEvacuationCentersRequest)
            .await
            .map_err(|e| e.in_op("api.list_evacuation_centers"))
    }

    pub async fn add_evacuation_center(&self, center: &NewEvacuationCenter) -> ApiResult<()> {
        self.client
            .execute(center)
            .await
            .map_err(|e| e.in_op_with("api.add_evacuation_center", center.title.clone()))
    }

    pub async fn list_closed_roads(&self) -> ApiResult<Vec<ClosedRoad>> {
        self.client
            .execute(&ListClosedRoadsRequest)
            .await
            .map_err(|e| e.in_op("api.list_closed_roads"))
    }

    pub async fn add_closed_road(&self, road: &NewClosedRoad) -> ApiResult<()> {
        self.client
            .execute(road)
            .await
            .map_err(|e| e.in_op_with("api.add_closed_road", road.title.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::error::ApiErrorKind;
    use crate::request::{MockHttpClient, RequestBody};
    use crate::storage::MemoryTokenStore;
    use serde_json::json;

    const BASE: &str = "http://backend.test";

    fn api() -> FloodWatchApi<MockHttpClient> {
        let config = ClientConfig::default().with_base_url(BASE);
        let client = ApiClient::new(config, MockHttpClient::new(), Rc::new(MemoryTokenStore::new()));
        FloodWatchApi::new(Rc::new(client))
    }

    fn mock(api: &FloodWatchApi<MockHttpClient>) -> &MockHttpClient {
        api.client().transport()
    }

    #[tokio::test]
    async fn test_list_evacuation_centers_wrapped() {
        let api = api();
        mock(&api).mock_response(
            &format!("{}/web/getevacuationcenters", BASE),
            200,
            json!({
                "success": true,
                "data": [{
                    "id": 1,
                    "title": "Barangay Hall",
                    "latitude": "14.60",
                    "longitude": "120.98",
                    "descriptionImage": "",
                    "description": "Second floor"
                }]
            }),
        );

        let centers = api.list_evacuation_centers().await.unwrap();
        assert_eq!(centers.len(), 1);
        assert_eq!(centers[0].title, "Barangay Hall");
    }

    #[tokio::test]
    async fn test_list_closed_roads_bad_shape_is_decode_error() {
        let api = api();
        mock(&api).mock_response(
            &format!("{}/web/getclosedroads", BASE),
            200,
            json!({ "message": "maintenance" }),
        );

        let err = api.list_closed_roads().await.unwrap_err();
        assert_eq!(err.kind(), ApiErrorKind::Decode);
        assert_eq!(err.spans().last().unwrap().operation, "api.list_closed_roads");
    }

    #[tokio::test]
    async fn test_add_closed_road_posts_json() {
        let api = api();
        let url = format!("{}/web/addclosedroads", BASE);
        mock(&api).mock_response(&url, 201, json!({ "success": true, "message": "Added" }));

        let road = NewClosedRoad {
            title: "Rizal Ave".into(),
            latitude: "14.61".into(),
            longitude: "120.99".into(),
            description: "Knee-deep".into(),
        };
        api.add_closed_road(&road).await.unwrap();

        let sent = mock(&api).last_request().unwrap();
        assert_eq!(sent.url, url);
        match sent.body {
            RequestBody::Json(text) => {
                let body: serde_json::Value = serde_json::from_str(&text).unwrap();
                assert_eq!(body["title"], "Rizal Ave");
                assert!(body.get("id").is_none());
            }
            other => panic!("unexpected body {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_add_evacuation_center_validation_error() {
        let api = api();
        mock(&api).mock_response(
            &format!("{}/web/addevacuationcenters", BASE),
            422,
            json!({ "message": "Title is required" }),
        );

        let center = NewEvacuationCenter {
            title: String::new(),
            latitude: "0".into(),
            longitude: "0".into(),
            description_image: String::new(),
            description: String::new(),
        };
        let err = api.add_evacuation_center(&center).await.unwrap_err();
        assert_eq!(err.kind(), ApiErrorKind::Http);
        assert_eq!(err.display_message(), "Title is required");
    }

    #[tokio::test]
    async fn test_flood_data_filters_in_query() {
        let api = api();
        let url = format!("{}/flood-data?location=East%20River&risk_level=high", BASE);
        mock(&api).mock_response(
            &url,
            200,
            json!([{
                "id": 5,
                "location": "East River",
                "coordinates": "14.6,121.0",
                "water_level": 2.4,
                "rainfall": 31.0,
                "risk_level": "high",
                "timestamp": "2024-06-01T08:30:00Z"
            }]),
        );

        let filter = ListFloodDataRequest {
            location: Some("East River".into()),
            risk_level: Some("high".into()),
        };
        let readings = api.list_flood_data(&filter).await.unwrap();
        assert_eq!(readings[0].water_level, 2.4);
        assert_eq!(mock(&api).request_count(&url), 1);
    }

    #[tokio::test]
    async fn test_get_flood_data_by_id() {
        let api = api();
        mock(&api).mock_response(
            &format!("{}/flood-data/5", BASE),
            200,
            json!({ "data": { "id": 5, "location": "South Bridge", "risk_level": "low" } }),
        );

        let reading = api.get_flood_data("5").await.unwrap();
        assert_eq!(reading.location, "South Bridge");
        assert_eq!(reading.rainfall, 0.0);
    }

    #[tokio::test]
    async fn test_get_flood_data_id_cannot_inject_query() {
        let api = api();
        let url = format!("{}/flood-data/7%3Frisk_level%3Dhigh", BASE);
        mock(&api).mock_response(&url, 200, json!({ "id": 7, "location": "West Valley" }));

        let reading = api.get_flood_data("7?risk_level=high").await.unwrap();
        assert_eq!(reading.id, "7");
        assert_eq!(mock(&api).last_request().unwrap().url, url);
    }

    #[tokio::test]
    async fn test_list_users_and_profile() {
        let api = api();
        mock(&api).mock_response(
            &format!("{}/api/test/users", BASE),
            200,
            json!({ "data": [
                { "id": 1, "email": "a@x", "role": "admin" },
                { "id": 2, "email": "b@x", "role": "resident", "phone": "0917" }
            ] }),
        );
        mock(&api).mock_response(
            &format!("{}/user/profile", BASE),
            200,
            json!({ "id": 1, "email": "a@x", "name": "Ana", "role": "admin" }),
        );

        let users = api.list_users().await.unwrap();
        assert_eq!(users[1].phone.as_deref(), Some("0917"));
        let me = api.get_profile().await.unwrap();
        assert_eq!(me.display_name(), "Ana");
    }

    #[tokio::test]
    async fn test_alert_settings_round() {
        let api = api();
        let url = format!("{}/alerts/settings", BASE);
        mock(&api).mock_response(
            &url,
            200,
            json!({ "data": {
                "id": 3, "user_id": 1,
                "email_notifications": true, "sms_notifications": false,
                "push_notifications": true, "risk_threshold": "medium"
            } }),
        );

        let settings = api.get_alert_settings().await.unwrap();
        assert!(settings.email_notifications);

        let patch = AlertSettingsPatch {
            sms_notifications: Some(true),
            ..Default::default()
        };
        api.update_alert_settings(&patch).await.unwrap();
        let sent = mock(&api).last_request().unwrap();
        assert_eq!(
            sent.body,
            RequestBody::Json(r#"{"sms_notifications":true}"#.to_string())
        );
    }

    #[tokio::test]
    async fn test_logout_sends_no_body() {
        let api = api();
        mock(&api).mock_response(&format!("{}/auth/logout", BASE), 200, json!({ "success": true }));

        api.logout().await.unwrap();
        let sent = mock(&api).last_request().unwrap();
        assert_eq!(sent.body, RequestBody::Empty);
    }

    #[tokio::test]
    async fn test_register_returns_grant() {
        let api = api();
        mock(&api).mock_response(
            &format!("{}/web/addlogin", BASE),
            200,
            json!({ "status": "success", "message": "Registered", "token": "fresh" }),
        );

        let grant = api
            .register(&RegisterRequest {
                email: "new@x".into(),
                password: "pw".into(),
            })
            .await
            .unwrap();
        assert_eq!(grant.token.as_deref(), Some("fresh"));
    }
}
