//! Refresh job tests against a wiremock TikAPI and an in-memory store.

use std::sync::Arc;
use std::time::Duration;

use boostline_metadata::MetadataClient;
use boostline_notify::{RecordingNotifier, Severity};
use boostline_pipeline::{RefreshError, RefreshJob, RefreshSummary};
use boostline_store::schema::tracked;
use boostline_store::{MemoryStore, Operation};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Harness {
    server: MockServer,
    store: Arc<MemoryStore>,
    notifier: Arc<RecordingNotifier>,
    job: RefreshJob,
}

async fn harness() -> Harness {
    let server = MockServer::start().await;
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let metadata = Arc::new(
        MetadataClient::with_base_url(
            "tik-key",
            5,
            Duration::from_secs(3600),
            notifier.clone(),
            &server.uri(),
        )
        .expect("metadata client"),
    );
    let job = RefreshJob::new(metadata, store.clone(), notifier.clone(), Duration::ZERO);
    Harness {
        server,
        store,
        notifier,
        job,
    }
}

fn seed_tracked(store: &MemoryStore, video: &str) -> String {
    store.insert_json(
        tracked::TABLE,
        &json!({
            "Video": video,
            "Creator": "ana",
            "Views Count": 10,
            "Likes Count": 1,
            "Comments Count": 0,
            "Bookmarks Count": 0,
        }),
    )
}

fn stats(views: i64) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "itemInfo": {
            "itemStruct": {
                "author": { "uniqueId": "ana" },
                "stats": {
                    "playCount": views,
                    "diggCount": 50,
                    "commentCount": 6,
                    "collectCount": 3
                }
            }
        }
    }))
}

async fn mount_video(server: &MockServer, id: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/public/video"))
        .and(query_param("id", id))
        .respond_with(response)
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn every_record_is_attempted_despite_a_failure() {
    let h = harness().await;
    let first = seed_tracked(&h.store, "111");
    let middle = seed_tracked(&h.store, "222");
    let last = seed_tracked(&h.store, "333");
    mount_video(&h.server, "111", stats(1000)).await;
    mount_video(&h.server, "222", ResponseTemplate::new(500).set_body_string("boom")).await;
    mount_video(&h.server, "333", stats(3000)).await;

    let summary = h.job.run_once().await.expect("run should complete");

    assert_eq!(
        summary,
        RefreshSummary {
            succeeded: 2,
            failed: 1,
            total: 3
        }
    );
    assert_eq!(summary.succeeded + summary.failed, summary.total);
    let views = |id: &str| h.store.row(tracked::TABLE, id).and_then(|r| r.count(tracked::VIEWS));
    assert_eq!(views(&first), Some(1000));
    assert_eq!(views(&middle), Some(10));
    assert_eq!(views(&last), Some(3000));
    assert_eq!(h.notifier.count(Severity::Success), 1);
    assert_eq!(h.notifier.count(Severity::Error), 1);
    assert_eq!(h.notifier.count_containing("Successfully updated: 2"), 1);
}

#[tokio::test]
async fn negative_counter_leaves_record_untouched() {
    let h = harness().await;
    let id = seed_tracked(&h.store, "111");
    let before = h.store.row(tracked::TABLE, &id).expect("seeded row");
    mount_video(&h.server, "111", stats(-5)).await;

    let summary = h.job.run_once().await.expect("run should complete");

    assert_eq!(summary.failed, 1);
    assert_eq!(h.store.row(tracked::TABLE, &id), Some(before));
    assert_eq!(h.notifier.count_containing("Invalid stats received from TikTok API"), 1);
}

#[tokio::test]
async fn record_without_video_is_skipped_with_warning() {
    let h = harness().await;
    h.store.insert_json(tracked::TABLE, &json!({ "Creator Social Name": "ben" }));

    let summary = h.job.run_once().await.expect("run should complete");

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.total, 1);
    assert_eq!(h.notifier.count(Severity::Warning), 1);
    assert_eq!(h.notifier.count_containing("Missing video URL for creator ben"), 1);
}

#[tokio::test]
async fn gone_video_counts_as_failure_with_warning() {
    let h = harness().await;
    seed_tracked(&h.store, "111");
    mount_video(&h.server, "111", ResponseTemplate::new(403)).await;

    let summary = h.job.run_once().await.expect("run should complete");

    assert_eq!(summary.failed, 1);
    assert_eq!(h.notifier.count(Severity::Warning), 1);
    assert_eq!(h.notifier.count(Severity::Error), 0);
}

#[tokio::test]
async fn failed_metric_write_is_reported_and_counted() {
    let h = harness().await;
    seed_tracked(&h.store, "111");
    mount_video(&h.server, "111", stats(1000)).await;
    h.store.fail_next(tracked::TABLE, Operation::Update, 1);

    let summary = h.job.run_once().await.expect("run should complete");

    assert_eq!(summary.failed, 1);
    assert_eq!(h.notifier.count_containing("Failed to update video stats for 111 by ana"), 1);
}

#[tokio::test]
async fn listing_failure_is_fatal() {
    let h = harness().await;
    h.store.fail_next(tracked::TABLE, Operation::Select, 1);

    let err = h.job.run_once().await.unwrap_err();

    assert!(matches!(err, RefreshError::List(_)), "got: {err:?}");
    assert_eq!(h.notifier.count_containing("fatal error"), 1);
    assert_eq!(h.notifier.count(Severity::Success), 0);
}

#[tokio::test]
async fn empty_window_still_reports_summary() {
    let h = harness().await;

    let summary = h.job.run_once().await.expect("run should complete");

    assert_eq!(summary, RefreshSummary::default());
    assert_eq!(h.notifier.count(Severity::Success), 1);
}

fn paced_job(store: &Arc<MemoryStore>, notifier: &Arc<RecordingNotifier>, delay: Duration) -> RefreshJob {
    // No request is made: every seeded row lacks a video.
    let metadata = Arc::new(
        MetadataClient::with_base_url(
            "tik-key",
            5,
            Duration::from_secs(3600),
            notifier.clone(),
            "http://127.0.0.1:9",
        )
        .expect("metadata client"),
    );
    RefreshJob::new(metadata, store.clone(), notifier.clone(), delay)
}

#[tokio::test(start_paused = true)]
async fn items_are_paced_with_no_pause_after_the_last() {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    for creator in ["ana", "ben", "cy"] {
        store.insert_json(tracked::TABLE, &json!({ "Creator": creator }));
    }
    let delay = Duration::from_secs(2);
    let job = paced_job(&store, &notifier, delay);

    let started = tokio::time::Instant::now();
    let summary = job.run_once().await.expect("run");
    let elapsed = started.elapsed();

    assert_eq!(summary.total, 3);
    assert!(elapsed >= delay * 2, "elapsed {elapsed:?}");
    assert!(elapsed < delay * 2 + Duration::from_millis(100), "elapsed {elapsed:?}");
}

#[tokio::test(start_paused = true)]
async fn single_item_run_does_not_pause() {
    let store = Arc::new(MemoryStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    store.insert_json(tracked::TABLE, &json!({ "Creator": "ana" }));
    let delay = Duration::from_secs(2);
    let job = paced_job(&store, &notifier, delay);

    let started = tokio::time::Instant::now();
    let summary = job.run_once().await.expect("run");

    assert_eq!(summary.total, 1);
    assert!(started.elapsed() < delay, "elapsed {:?}", started.elapsed());
}
