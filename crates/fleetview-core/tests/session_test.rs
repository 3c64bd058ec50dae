#![allow(clippy::unwrap_used)]
// Session lifecycle against a mock tracking server.

use std::sync::Arc;

use chrono::{DateTime, FixedOffset, TimeZone, Utc};
use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use fleetview_core::{
    AddressSource, Auth, ConnectionState, CoreError, DeviceId, DisplayStatus, FixedClock,
    FleetSummary, InMemorySurface, OverlayState, Session, SessionConfig,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn config(server: &MockServer) -> SessionConfig {
    let mut config = SessionConfig::new(
        Url::parse(&server.uri()).unwrap(),
        Auth::Token(SecretString::from("secret-token".to_string())),
    );
    config.socket_enabled = false;
    config.refresh_interval_secs = 0;
    config.geocoder.url = Some(Url::parse(&format!("{}/nominatim/", server.uri())).unwrap());
    config
}

async fn mount_fleet(server: &MockServer, geocoder_enabled: bool) {
    Mock::given(method("GET"))
        .and(path("/api/server"))
        .and(header("authorization", "Bearer secret-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1, "version": "6.2", "geocoderEnabled": geocoder_enabled, "registration": false
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/devices"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 1, "name": "Truck 1", "uniqueId": "T1", "status": "online", "positionId": 101 },
            { "id": 2, "name": "Van 2", "uniqueId": "V2", "status": "online", "positionId": 102 },
            { "id": 3, "name": "Spare", "uniqueId": "S3", "status": "offline", "positionId": 0 }
        ])))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/positions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 101, "deviceId": 1, "fixTime": "2024-06-03T11:59:30Z",
              "latitude": 52.37, "longitude": 4.89, "speed": 25.0,
              "address": "Dam 1, Amsterdam",
              "attributes": { "motion": true, "ignition": false } },
            { "id": 102, "deviceId": 2, "fixTime": "2024-06-03T11:00:00Z",
              "latitude": 51.92, "longitude": 4.47, "speed": 30.0,
              "attributes": { "motion": true } }
        ])))
        .mount(server)
        .await;
}

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap()
}

// ── Lifecycle ───────────────────────────────────────────────────────

#[tokio::test]
async fn connect_loads_devices_and_positions() {
    let server = MockServer::start().await;
    mount_fleet(&server, true).await;

    let session = Session::new(config(&server));
    session.connect().await.unwrap();

    assert_eq!(*session.connection_state().borrow(), ConnectionState::Connected);
    assert_eq!(session.store().device_count(), 3);
    assert_eq!(session.store().position_count(), 2);
    assert!(session.store().last_sync().is_some());
    assert!(session.geocoding_enabled().await);

    session.disconnect().await;
    assert_eq!(*session.connection_state().borrow(), ConnectionState::Disconnected);
    assert!(matches!(session.client().await, Err(CoreError::Disconnected)));
}

#[tokio::test]
async fn failed_login_reports_authentication_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/session"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad credentials"))
        .mount(&server)
        .await;

    let mut cfg = config(&server);
    cfg.auth = Auth::Session {
        email: "ops@example.com".into(),
        password: SecretString::from("wrong".to_string()),
    };
    let session = Session::new(cfg);

    let err = session.connect().await.unwrap_err();
    assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    assert_eq!(*session.connection_state().borrow(), ConnectionState::Failed);
}

// ── Queries ─────────────────────────────────────────────────────────

#[tokio::test]
async fn status_and_summary_use_the_store() {
    let server = MockServer::start().await;
    mount_fleet(&server, true).await;

    let (truck, van, spare, summary) = Session::oneshot(config(&server), |session| async move {
        let truck = session.status_for(DeviceId::new(1), noon())?;
        let van = session.status_for(session.resolve_device("van 2")?.id, noon())?;
        let spare = session.status_for(session.resolve_device("3")?.id, noon())?;
        Ok((truck, van, spare, session.summary(noon())))
    })
    .await
    .unwrap();

    assert_eq!(truck.status, DisplayStatus::Moving);
    assert!((truck.effective_speed - 25.0).abs() < f64::EPSILON);

    // A one-hour-old fix is stale: stopped, no speed.
    assert_eq!(van.status, DisplayStatus::Stopped);
    assert!(van.is_stale);
    assert!(!van.effective_motion);
    assert!(van.effective_speed.abs() < f64::EPSILON);

    assert_eq!(spare.status, DisplayStatus::Offline);

    assert_eq!(
        summary,
        FleetSummary { total: 3, moving: 1, engine_on: 0, stopped: 1, offline: 1, stale: 1 }
    );
}

#[tokio::test]
async fn unknown_device_is_not_found() {
    let server = MockServer::start().await;
    mount_fleet(&server, true).await;

    let err = Session::oneshot(config(&server), |session| async move {
        session.resolve_device("ghost").map(|_| ())
    })
    .await
    .unwrap_err();

    assert!(matches!(err, CoreError::DeviceNotFound { identifier } if identifier == "ghost"));
}

#[tokio::test]
async fn dashboard_counters() {
    let server = MockServer::start().await;
    mount_fleet(&server, true).await;
    Mock::given(method("GET"))
        .and(path("/api/dashboard"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "users": 4, "managers": 1, "vehicles": 3, "running": 1, "stopped": 1, "overspeed": 0
        })))
        .mount(&server)
        .await;

    let stats = Session::oneshot(config(&server), |s| async move { s.dashboard().await })
        .await
        .unwrap();

    assert_eq!(stats.vehicles, 3);
    assert_eq!(stats.running, 1);
}

// ── Address resolution ──────────────────────────────────────────────

#[tokio::test]
async fn original_address_needs_no_request() {
    let server = MockServer::start().await;
    mount_fleet(&server, true).await;
    Mock::given(method("GET"))
        .and(path("/nominatim/reverse"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/server/geocode"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let resolved = Session::oneshot(config(&server), |s| async move {
        let resolver = s.address_resolver().await?;
        Ok(resolver.resolve(52.37, 4.89, Some("123 Main St")).await)
    })
    .await
    .unwrap();

    assert_eq!(resolved.text, "123 Main St");
    assert_eq!(resolved.source, AddressSource::Original);
}

#[tokio::test]
async fn disabled_geocoding_returns_placeholder_without_requests() {
    let server = MockServer::start().await;
    mount_fleet(&server, false).await;
    Mock::given(method("GET"))
        .and(path("/nominatim/reverse"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/server/geocode"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let resolved = Session::oneshot(config(&server), |s| async move {
        let resolver = s.address_resolver().await?;
        Ok(resolver.resolve(52.37, 4.89, None).await)
    })
    .await
    .unwrap();

    assert_eq!(resolved.text, "Geocoding Disabled");
    assert_eq!(resolved.source, AddressSource::Disabled);
}

#[tokio::test]
async fn external_failure_falls_back_to_server_geocoder() {
    let server = MockServer::start().await;
    mount_fleet(&server, true).await;
    Mock::given(method("GET"))
        .and(path("/nominatim/reverse"))
        .and(query_param("format", "json"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/server/geocode"))
        .and(query_param("latitude", "51.92"))
        .respond_with(ResponseTemplate::new(200).set_body_string("Coolsingel 40, Rotterdam"))
        .expect(1)
        .mount(&server)
        .await;

    let resolved = Session::oneshot(config(&server), |s| async move {
        let resolver = s.address_resolver().await?;
        Ok(resolver.resolve(51.92, 4.47, None).await)
    })
    .await
    .unwrap();

    assert_eq!(resolved.text, "Coolsingel 40, Rotterdam");
    assert_eq!(resolved.source, AddressSource::Server);
}

// ── Today route ─────────────────────────────────────────────────────

#[tokio::test]
async fn today_route_through_the_server() {
    let server = MockServer::start().await;
    // Mounted before the fleet so the ranged query wins over the bare one.
    Mock::given(method("GET"))
        .and(path("/api/positions"))
        .and(query_param("deviceId", "1"))
        .and(query_param("from", "2024-06-02T22:00:00.000Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "id": 90, "deviceId": 1, "fixTime": "2024-06-03T06:00:00Z", "latitude": 52.30, "longitude": 4.80 },
            { "id": 101, "deviceId": 1, "fixTime": "2024-06-03T11:59:30Z", "latitude": 52.37, "longitude": 4.89 }
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/reports/stops"))
        .and(header("accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "deviceId": 1, "latitude": 52.33, "longitude": 4.85,
              "startTime": "2024-06-03T08:00:00Z", "endTime": "2024-06-03T08:30:00Z", "duration": 1800000 }
        ])))
        .mount(&server)
        .await;
    mount_fleet(&server, true).await;

    let surface = Arc::new(InMemorySurface::new());
    let tz = FixedOffset::east_opt(2 * 3600).unwrap();
    let clock = Arc::new(FixedClock::new(tz.with_ymd_and_hms(2024, 6, 3, 14, 0, 0).unwrap()));

    let map = Arc::clone(&surface);
    let state = Session::oneshot(config(&server), |s| async move {
        let overlay = s.today_route(map, clock).await?;
        overlay.select(Some(DeviceId::new(1))).await;
        overlay.activate().await;
        Ok(overlay.state())
    })
    .await
    .unwrap();

    assert_eq!(state, OverlayState::Active { device: DeviceId::new(1), positions: 2, stops: 1 });
    let geojson = surface.to_geojson();
    assert_eq!(geojson["today-endpoints"]["features"].as_array().unwrap().len(), 2);
    assert_eq!(geojson["today-stops"]["features"][0]["properties"]["title"], "Stop");
    assert_eq!(geojson["today-path"]["features"][0]["geometry"]["type"], "LineString");
}
