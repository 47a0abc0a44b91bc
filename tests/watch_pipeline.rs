//! End-to-end watch passes against a mocked registry.

use std::sync::Mutex;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use compwatch::error::{AppError, Result};
use compwatch::models::Notification;
use compwatch::notify::NotificationSink;
use compwatch::pipeline::{NotificationPolicy, WatchContext, run_watch};
use compwatch::services::{CompetitionApi, ResilientFetcher, StaticDirectory};
use compwatch::storage::LocalStorage;
use compwatch::utils::geo::Coordinates;
use serde_json::{Value, json};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Default)]
struct RecordingSink {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    fn take(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.sent.lock().unwrap())
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, notification: &Notification) -> Result<()> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

struct Harness {
    server: MockServer,
    dir: TempDir,
    sink: RecordingSink,
}

impl Harness {
    async fn start() -> Self {
        Self {
            server: MockServer::start().await,
            dir: TempDir::new().unwrap(),
            sink: RecordingSink::default(),
        }
    }

    async fn listing(&self, ids: &[&str]) {
        let entries: Vec<Value> = ids.iter().map(|id| json!({ "id": id })).collect();
        Mock::given(method("GET"))
            .and(path("/competition_index"))
            .and(query_param("page", "1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(entries))
            .mount(&self.server)
            .await;
        Mock::given(method("GET"))
            .and(path("/competition_index"))
            .and(query_param("page", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&self.server)
            .await;
    }

    async fn detail(&self, id: &str, longitude_micro: i64, persons: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/competitions/{id}/wcif/public")))
            .respond_with(ResponseTemplate::new(200).set_body_json(wcif(
                id,
                longitude_micro,
                persons,
            )))
            .mount(&self.server)
            .await;
    }

    async fn run(&self, members: &[&str], now: DateTime<Utc>) -> Result<compwatch::pipeline::RunSummary> {
        let fetcher = ResilientFetcher::new(reqwest::Client::new(), 2, StdDuration::ZERO);
        let api = CompetitionApi::new(fetcher, self.server.uri());
        let store = LocalStorage::new(self.dir.path().join("api"));
        let directory = StaticDirectory::new(members.iter().copied());
        let policy = NotificationPolicy::new(
            Coordinates::new(38.5427, -121.75797),
            300.0,
            "https://www.worldcubeassociation.org",
        );
        let ctx = WatchContext {
            api: &api,
            store: &store,
            directory: &directory,
            sink: &self.sink,
            policy: &policy,
            closing_window: Duration::hours(6),
        };
        run_watch(&ctx, now).await
    }

    fn read(&self, name: &str) -> Option<String> {
        std::fs::read_to_string(self.dir.path().join("api").join(name)).ok()
    }
}

fn wcif(id: &str, longitude_micro: i64, persons: Value) -> Value {
    json!({
        "formatVersion": "1.0",
        "id": id,
        "name": format!("{id} Name"),
        "shortName": id,
        "schedule": {
            "startDate": "2026-11-14",
            "numberOfDays": 1,
            "venues": [{
                "id": 1,
                "name": "Hall",
                "latitudeMicrodegrees": 38_542_700,
                "longitudeMicrodegrees": longitude_micro,
                "countryIso2": "US",
                "timezone": "America/Los_Angeles",
                "rooms": []
            }]
        },
        "events": [{"id": "333", "rounds": []}, {"id": "pyram", "rounds": []}],
        "persons": persons,
        "registrationInfo": {
            "openTime": "2026-10-01T17:00:00Z",
            "closeTime": "2026-11-07T17:00:00Z",
            "baseEntryFee": 2000,
            "currencyCode": "USD"
        }
    })
}

// ~50 km and ~500 km east of Davis
const NEAR: i64 = -121_180_000;
const FAR: i64 = -116_000_000;

fn run_at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, day, 12, 0, 0).unwrap()
}

#[tokio::test]
async fn second_run_over_unchanged_registry_is_silent() {
    let h = Harness::start().await;
    h.listing(&["Near2026"]).await;
    h.detail("Near2026", NEAR, json!([{"name": "Stranger", "wcaId": "2015XXXX01"}]))
        .await;

    let first = h.run(&["2019CHEN01"], run_at(19)).await.unwrap();
    let kinds: Vec<&str> = h.sink.take().iter().map(Notification::kind).collect();
    assert_eq!(kinds, vec!["new_competition", "registration_opened"]);
    assert_eq!(first.notifications_sent, 2);
    assert_eq!(first.new_competitions, 1);

    let comps = h.read("comps.json").unwrap();
    let states = h.read("regState.json").unwrap();
    let new_comps: Value = serde_json::from_str(&h.read("newComps.json").unwrap()).unwrap();
    assert_eq!(new_comps, json!(["Near2026"]));

    let second = h.run(&["2019CHEN01"], run_at(20)).await.unwrap();
    assert!(h.sink.take().is_empty());
    assert_eq!(second.notifications_sent, 0);
    assert_eq!(second.new_competitions, 0);
    assert_eq!(second.state_changes, 0);

    assert_eq!(h.read("comps.json").unwrap(), comps);
    assert_eq!(h.read("regState.json").unwrap(), states);
    let new_comps: Value = serde_json::from_str(&h.read("newComps.json").unwrap()).unwrap();
    assert_eq!(new_comps, json!([]));
    assert!(h.read("comps/Near2026.json").is_some());
}

#[tokio::test]
async fn far_competition_speaks_only_for_club_members() {
    let h = Harness::start().await;
    h.listing(&["Far2026"]).await;
    h.detail(
        "Far2026",
        FAR,
        json!([
            {"name": "Alice Chen", "wcaId": "2019CHEN01"},
            {"name": "Newcomer"}
        ]),
    )
    .await;

    let summary = h.run(&["2019CHEN01"], run_at(19)).await.unwrap();
    let sent = h.sink.take();
    assert_eq!(summary.notifications_sent, 1);
    match &sent[..] {
        [Notification::NewRegistrants { competition, names }] => {
            assert_eq!(competition.id, "Far2026");
            assert_eq!(names, &vec!["Alice Chen".to_string()]);
        }
        other => panic!("unexpected notifications {other:?}"),
    }

    let regs: Value = serde_json::from_str(&h.read("newRegs.json").unwrap()).unwrap();
    assert_eq!(regs, json!({"Far2026": ["2019CHEN01"]}));
}

#[tokio::test]
async fn closing_window_is_announced_once() {
    let h = Harness::start().await;
    h.listing(&["Near2026"]).await;
    h.detail("Near2026", NEAR, json!([])).await;

    h.run(&[], run_at(19)).await.unwrap();
    h.sink.take();

    let closing = Utc.with_ymd_and_hms(2026, 11, 7, 12, 0, 0).unwrap();
    let summary = h.run(&[], closing).await.unwrap();
    let kinds: Vec<&str> = h.sink.take().iter().map(Notification::kind).collect();
    assert_eq!(kinds, vec!["registration_closing"]);
    assert_eq!(summary.state_changes, 1);

    h.run(&[], closing + Duration::hours(1)).await.unwrap();
    assert!(h.sink.take().is_empty());
}

#[tokio::test]
async fn listing_failure_aborts_without_touching_snapshot() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/competition_index"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&h.server)
        .await;

    let err = h.run(&[], run_at(19)).await.unwrap_err();
    assert!(matches!(err, AppError::ListingUnavailable { page: 1, .. }));
    assert!(h.read("comps.json").is_none());
    assert!(h.read("timestamp.json").is_none());
    assert!(h.sink.take().is_empty());
}
