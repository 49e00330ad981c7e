use crate::auth::{Backend, logout, use_auth};
use floodwatch_client::ApiResult;
use floodwatch_shared::protocol::ListFloodDataRequest;
use gloo_timers::callback::Interval;
use leptos::prelude::*;
use leptos::task::spawn_local;

/// Auto-refresh period of the stat cards.
const REFRESH_INTERVAL_MS: u32 = 60_000;

/// Card values. `None` until the first successful load of that card.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DashboardStats {
    pub users: Option<usize>,
    pub flood_sensors: Option<usize>,
    pub high_risk_sensors: Option<usize>,
    pub evacuation_centers: Option<usize>,
    pub closed_roads: Option<usize>,
}

impl DashboardStats {
    /// Takes every value `fresh` has and keeps the previous one elsewhere,
    /// so one failing endpoint does not blank the other cards.
    fn merge(&mut self, fresh: DashboardStats) {
        self.users = fresh.users.or(self.users);
        self.flood_sensors = fresh.flood_sensors.or(self.flood_sensors);
        self.high_risk_sensors = fresh.high_risk_sensors.or(self.high_risk_sensors);
        self.evacuation_centers = fresh.evacuation_centers.or(self.evacuation_centers);
        self.closed_roads = fresh.closed_roads.or(self.closed_roads);
    }
}

/// Outcome of one refresh.
struct StatsLoad {
    stats: DashboardStats,
    /// One `"<card>: <message>"` line per failed endpoint.
    failures: Vec<String>,
}

impl StatsLoad {
    /// Keeps the value on success and records the failure otherwise.
    ///
    /// # Returns
    /// `false` once the session was rejected, so the caller stops issuing
    /// requests the backend will refuse anyway.
    fn record<T>(
        &mut self,
        card: &str,
        result: ApiResult<T>,
        apply: impl FnOnce(&mut DashboardStats, T),
    ) -> bool {
        match result {
            Ok(value) => {
                apply(&mut self.stats, value);
                true
            }
            Err(e) => {
                self.failures.push(format!("{}: {}", card, e.display_message()));
                !e.kind().is_auth_rejection()
            }
        }
    }
}

/// Loads the cards one request at a time.
async fn fetch_stats(backend: &Backend) -> StatsLoad {
    let api = &backend.api;
    let mut load = StatsLoad {
        stats: DashboardStats::default(),
        failures: Vec::new(),
    };

    if !load.record("Users", api.list_users().await, |s, users| {
        s.users = Some(users.len())
    }) {
        return load;
    }

    let readings = api.list_flood_data(&ListFloodDataRequest::default()).await;
    if !load.record("Flood sensors", readings, |s, readings| {
        s.flood_sensors = Some(readings.len());
        s.high_risk_sensors = Some(
            readings
                .iter()
                .filter(|r| matches!(r.risk_level.as_str(), "high" | "critical"))
                .count(),
        );
    }) {
        return load;
    }

    if !load.record("Evacuation centers", api.list_evacuation_centers().await, |s, centers| {
        s.evacuation_centers = Some(centers.len())
    }) {
        return load;
    }

    load.record("Closed roads", api.list_closed_roads().await, |s, roads| {
        s.closed_roads = Some(roads.len())
    });
    load
}

#[component]
fn StatCard(title: &'static str, value: Signal<Option<usize>>, tone: &'static str) -> impl IntoView {
    view! {
        <div class="stat">
            <div class="stat-title">{title}</div>
            <div class=format!("stat-value {}", tone)>
                {move || match value.get() {
                    Some(n) => n.to_string(),
                    None => "--".to_string(),
                }}
            </div>
        </div>
    }
}

#[component]
pub fn DashboardPage() -> impl IntoView {
    let auth = use_auth();

    let (stats, set_stats) = signal(DashboardStats::default());
    let (loading, set_loading) = signal(false);
    let (error_msg, set_error_msg) = signal(Option::<String>::None);

    let load_stats = move || {
        if loading.get_untracked() || !auth.session.with_untracked(|s| s.is_authenticated()) {
            return;
        }
        let backend = auth.backend();
        set_loading.set(true);
        spawn_local(async move {
            let load = fetch_stats(&backend).await;
            set_stats.update(|current| current.merge(load.stats));
            set_error_msg.set((!load.failures.is_empty()).then(|| load.failures.join("; ")));
            set_loading.set(false);
        });
    };

    load_stats();

    let interval = StoredValue::new_local(Some(Interval::new(REFRESH_INTERVAL_MS, load_stats)));
    on_cleanup(move || {
        interval.update_value(|timer| {
            timer.take();
        });
    });

    let stat = move |pick: fn(&DashboardStats) -> Option<usize>| -> Signal<Option<usize>> {
        Signal::derive(move || pick(&stats.get()))
    };

    let user_name = move || {
        auth.session
            .with(|s| s.user.as_ref().map(|u| u.display_name().to_string()))
            .unwrap_or_default()
    };

    view! {
        <div class="min-h-screen bg-base-200 p-4 md:p-8 font-sans">
            <div class="max-w-7xl mx-auto space-y-8">
                <div class="navbar bg-base-100 rounded-box shadow-xl">
                    <div class="flex-1 gap-2">
                        <a class="btn btn-ghost text-xl">"FloodWatch Dashboard"</a>
                        <span class="badge badge-neutral hidden md:inline-flex">{user_name}</span>
                    </div>
                    <div class="flex-none gap-2">
                        <button
                            on:click=move |_| load_stats()
                            disabled=move || loading.get()
                            class="btn btn-ghost"
                        >
                            {move || if loading.get() { "Refreshing..." } else { "Refresh" }}
                        </button>
                        <button on:click=move |_| logout(&auth) class="btn btn-outline btn-error">
                            "Sign out"
                        </button>
                    </div>
                </div>

                <Show when=move || error_msg.get().is_some()>
                    <div role="alert" class="alert alert-error">
                        <span>{move || error_msg.get().unwrap_or_default()}</span>
                        <button class="btn btn-sm" on:click=move |_| load_stats()>"Retry"</button>
                    </div>
                </Show>

                <div class="stats shadow w-full stats-vertical md:stats-horizontal bg-base-100">
                    <StatCard title="Total Users" value=stat(|s| s.users) tone="text-primary" />
                    <StatCard title="Active FloodWatch" value=stat(|s| s.flood_sensors) tone="text-success" />
                    <StatCard title="High Risk Sensors" value=stat(|s| s.high_risk_sensors) tone="text-error" />
                    <StatCard title="Evacuation Centers" value=stat(|s| s.evacuation_centers) tone="text-info" />
                    <StatCard title="Closed Roads" value=stat(|s| s.closed_roads) tone="text-warning" />
                </div>
            </div>
        </div>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use floodwatch_client::ApiError;

    #[test]
    fn test_merge_keeps_cards_that_failed_this_round() {
        let mut shown = DashboardStats {
            users: Some(3),
            closed_roads: Some(2),
            ..Default::default()
        };
        shown.merge(DashboardStats {
            users: Some(4),
            evacuation_centers: Some(1),
            ..Default::default()
        });

        assert_eq!(shown.users, Some(4));
        assert_eq!(shown.closed_roads, Some(2));
        assert_eq!(shown.evacuation_centers, Some(1));
        assert_eq!(shown.flood_sensors, None);
    }

    #[test]
    fn test_record_labels_failures_and_stops_on_rejection() {
        let mut load = StatsLoad {
            stats: DashboardStats::default(),
            failures: Vec::new(),
        };

        let rejected: ApiResult<Vec<u8>> = Err(ApiError::http(500, "Database offline"));
        assert!(load.record("Users", rejected, |s, v| s.users = Some(v.len())));
        assert!(load.record("Closed roads", Ok(vec![1, 2]), |s, v: Vec<u8>| {
            s.closed_roads = Some(v.len())
        }));

        assert_eq!(load.failures, vec!["Users: Database offline".to_string()]);
        assert_eq!(load.stats.users, None);
        assert_eq!(load.stats.closed_roads, Some(2));

        let expired: ApiResult<Vec<u8>> = Err(ApiError::unauthorized("Session expired"));
        assert!(!load.record("Flood sensors", expired, |s, v| s.flood_sensors = Some(v.len())));
        assert_eq!(load.failures.len(), 2);
    }
}
