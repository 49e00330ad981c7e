//! Test database tooling.
//!
//! Wraps the `/api/test` routes the operators use to seed and inspect a
//! scratch database, plus a generator for plausible flood readings around
//! Metro Manila. Nothing here touches production records.

use std::rc::Rc;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;
use serde_json::Value;

use crate::batch::{BatchOutcome, process_batch, tally};
use crate::client::ApiClient;
use crate::error::ApiResult;
use crate::request::HttpClient;
use floodwatch_shared::protocol::{
    DeleteTestFloodDataRequest, ListTestAlertSettingsRequest, ListTestFloodDataRequest,
    ListUsersRequest, ResetTestDataRequest, TEST_API_PREFIX, UpdateTestFloodDataRequest,
};
use floodwatch_shared::{
    AlertSettings, Coordinates, FloodData, NewTestAlertSettings, NewTestUser, PhoneLoginRequest,
    RiskLevel, TestFloodData, TestSample, UserProfile, VerifyOtpRequest,
};

// =========================================================
// Random readings
// =========================================================

pub const SAMPLE_LOCATIONS: [&str; 5] = [
    "North Junction",
    "East River",
    "South Bridge",
    "West Valley",
    "Central District",
];

/// Readings are scattered around this point.
pub const SAMPLE_CENTER: Coordinates = Coordinates {
    lat: 14.5995,
    lng: 120.9842,
};
/// Width of the square (in degrees) the coordinates are drawn from.
const COORDINATE_SPREAD: f64 = 0.1;
const MIN_WATER_LEVEL: f64 = 0.3;
const MAX_WATER_LEVEL: f64 = 4.3;

/// Fixed values for generated readings. Unset fields are randomized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FloodDataOverrides {
    pub location: Option<String>,
    pub water_level: Option<f64>,
    pub risk_level: Option<RiskLevel>,
    pub timestamp: Option<String>,
    pub coordinates: Option<Coordinates>,
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// Builds one random reading.
///
/// # Arguments
/// * `rng` - randomness source; pass a seeded rng for reproducible data
/// * `overrides` - fields to pin instead of randomizing
///
/// # Returns
/// A reading with a water level in metres (two decimals) and coordinates
/// within [`SAMPLE_CENTER`] ± 0.05° (six decimals).
pub fn random_flood_data<R: Rng + ?Sized>(rng: &mut R, overrides: &FloodDataOverrides) -> TestFloodData {
    let location = overrides.location.clone().unwrap_or_else(|| {
        SAMPLE_LOCATIONS
            .choose(rng)
            .copied()
            .unwrap_or(SAMPLE_LOCATIONS[0])
            .to_string()
    });
    let water_level = overrides
        .water_level
        .unwrap_or_else(|| round_to(rng.gen_range(MIN_WATER_LEVEL..MAX_WATER_LEVEL), 2));
    let risk_level = overrides
        .risk_level
        .unwrap_or_else(|| *RiskLevel::ALL.choose(rng).unwrap_or(&RiskLevel::Low));
    let coordinates = overrides.coordinates.unwrap_or_else(|| {
        let half = COORDINATE_SPREAD / 2.0;
        Coordinates {
            lat: round_to(SAMPLE_CENTER.lat + rng.gen_range(-half..half), 6),
            lng: round_to(SAMPLE_CENTER.lng + rng.gen_range(-half..half), 6),
        }
    });

    TestFloodData {
        id: None,
        location,
        water_level,
        risk_level,
        timestamp: overrides.timestamp.clone(),
        coordinates: Some(coordinates),
    }
}

/// `count` independent readings sharing the same overrides.
pub fn random_flood_batch<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    overrides: &FloodDataOverrides,
) -> Vec<TestFloodData> {
    (0..count).map(|_| random_flood_data(rng, overrides)).collect()
}

// =========================================================
// Facade
// =========================================================

/// Typed facade over the test database routes.
pub struct TestDataApi<C: HttpClient> {
    client: Rc<ApiClient<C>>,
}

impl<C: HttpClient> Clone for TestDataApi<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
        }
    }
}

impl<C: HttpClient> TestDataApi<C> {
    pub fn new(client: Rc<ApiClient<C>>) -> Self {
        Self { client }
    }

    /// Writes a sample row to check the backend is reachable and writable.
    ///
    /// # Returns
    /// The backend reply, unmodified.
    pub async fn add_sample(&self, value: impl Into<String>) -> ApiResult<Value> {
        let sample = TestSample {
            value: value.into(),
        };
        self.client
            .execute(&sample)
            .await
            .map_err(|e| e.in_op("test.add_sample"))
    }

    /// Starts a phone login; the backend sends an OTP to `phone_number`.
    pub async fn phone_login(&self, phone_number: &str) -> ApiResult<Value> {
        let request = PhoneLoginRequest {
            phone_number: phone_number.to_string(),
        };
        self.client
            .execute(&request)
            .await
            .map_err(|e| e.in_op_with("test.phone_login", phone_number))
    }

    pub async fn verify_otp(&self, phone_number: &str, otp: &str) -> ApiResult<Value> {
        let request = VerifyOtpRequest {
            phone_number: phone_number.to_string(),
            otp: otp.to_string(),
        };
        self.client
            .execute(&request)
            .await
            .map_err(|e| e.in_op_with("test.verify_otp", phone_number))
    }

    pub async fn add_flood_data(&self, data: &TestFloodData) -> ApiResult<()> {
        self.client
            .execute(data)
            .await
            .map_err(|e| e.in_op_with("test.add_flood_data", data.location.clone()))
    }

    pub async fn update_flood_data(&self, id: &str, data: &TestFloodData) -> ApiResult<()> {
        let request = UpdateTestFloodDataRequest {
            id: id.to_string(),
            data: data.clone(),
        };
        self.client
            .execute(&request)
            .await
            .map_err(|e| e.in_op_with("test.update_flood_data", id))
    }

    pub async fn delete_flood_data(&self, id: &str) -> ApiResult<()> {
        let request = DeleteTestFloodDataRequest { id: id.to_string() };
        self.client
            .execute(&request)
            .await
            .map_err(|e| e.in_op_with("test.delete_flood_data", id))
    }

    pub async fn list_flood_data(&self) -> ApiResult<Vec<FloodData>> {
        self.client
            .execute(&ListTestFloodDataRequest)
            .await
            .map_err(|e| e.in_op("test.list_flood_data"))
    }

    pub async fn add_user(&self, user: &NewTestUser) -> ApiResult<()> {
        self.client
            .execute(user)
            .await
            .map_err(|e| e.in_op_with("test.add_user", user.email.clone()))
    }

    pub async fn list_users(&self) -> ApiResult<Vec<UserProfile>> {
        self.client
            .execute(&ListUsersRequest)
            .await
            .map_err(|e| e.in_op("test.list_users"))
    }

    pub async fn add_alert_settings(&self, settings: &NewTestAlertSettings) -> ApiResult<()> {
        self.client
            .execute(settings)
            .await
            .map_err(|e| e.in_op_with("test.add_alert_settings", settings.user_id.to_string()))
    }

    pub async fn list_alert_settings(&self) -> ApiResult<Vec<AlertSettings>> {
        self.client
            .execute(&ListTestAlertSettingsRequest)
            .await
            .map_err(|e| e.in_op("test.list_alert_settings"))
    }

    /// Wipes every table of the test database.
    pub async fn reset(&self) -> ApiResult<()> {
        self.client
            .execute(&ResetTestDataRequest::default())
            .await
            .map_err(|e| e.in_op("test.reset"))?;
        log_info!("Test database reset");
        Ok(())
    }

    /// POST to any route under `/api/test`.
    ///
    /// # Arguments
    /// * `endpoint` - route suffix starting with `/`, e.g. `/add-flood-data`
    /// * `body` - JSON body
    pub async fn post<B: Serialize + ?Sized>(&self, endpoint: &str, body: &B) -> ApiResult<Value> {
        let path = format!("{}{}", TEST_API_PREFIX, endpoint);
        self.client
            .post_value(&path, body)
            .await
            .map_err(|e| e.in_op_with("test.post", path))
    }

    /// GET from any route under `/api/test`, with `params` as the query.
    pub async fn get(&self, endpoint: &str, params: &Value) -> ApiResult<Value> {
        let path = format!("{}{}", TEST_API_PREFIX, endpoint);
        self.client
            .get_value(&path, params)
            .await
            .map_err(|e| e.in_op_with("test.get", path))
    }

    /// Adds each record in turn. A failed record does not stop the rest.
    ///
    /// # Returns
    /// One outcome per record, in input order.
    pub async fn add_flood_data_batch(
        &self,
        records: Vec<TestFloodData>,
    ) -> Vec<BatchOutcome<TestFloodData>> {
        let outcomes = process_batch(records, move |record| async move {
            self.add_flood_data(&record).await
        })
        .await;

        let (added, failed) = tally(&outcomes);
        log_info!("Test flood data batch: {} added, {} failed", added, failed);
        outcomes
    }

    /// Generates `count` random readings and adds them as a batch.
    pub async fn seed_random_flood_data(
        &self,
        count: usize,
        overrides: &FloodDataOverrides,
    ) -> Vec<BatchOutcome<TestFloodData>> {
        let records = random_flood_batch(&mut rand::thread_rng(), count, overrides);
        self.add_flood_data_batch(records).await
    }
}
