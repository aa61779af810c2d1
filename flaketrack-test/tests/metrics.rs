use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use flaketrack_core::config::FlaketrackConfig;
use flaketrack_core::forge::MemoryForge;
use flaketrack_core::metrics::{ExecutionsReport, RatiosReport, executions, ratios};
use flaketrack_core::progress::{IndicatifReporter, NoopReporter};
use flaketrack_core::types::{StatusEvent, StatusState};
use flaketrack_test::{OTHER_BOT, RETRYER_BOT, add_pull, closed, merged, pull_request};

const INTEGRATION: &str = "pull-knative-serving-integration-tests";
const UNIT: &str = "pull-knative-serving-unit-tests";

fn at(month: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2019, month, day, hour, 0, 0).unwrap()
}

fn status(state: StatusState, context: &str) -> StatusEvent {
    StatusEvent::new(state, context)
}

/// A week of `knative/serving` history around the retryer rollout.
fn serving_history() -> MemoryForge {
    let mut forge = MemoryForge::new();

    // Retried and merged
    add_pull(
        &mut forge,
        merged(pull_request(101, at(8, 1, 9)), at(8, 2, 15)),
        &[
            (RETRYER_BOT, "The following jobs failed due to test flakiness:\n\nTest name | Retries\n--- | ---\npull-knative-serving-integration-tests | 1/3\n\nAutomatically retrying...\n/test pull-knative-serving-integration-tests"),
            (1001, "/lgtm"),
        ],
        vec![
            status(StatusState::Success, "tide"),
            status(StatusState::Success, INTEGRATION),
            status(StatusState::Failure, INTEGRATION),
            status(StatusState::Success, UNIT),
        ],
    );

    // Blocked, still open and failing
    add_pull(
        &mut forge,
        pull_request(102, at(8, 2, 10)),
        &[(
            RETRYER_BOT,
            "Failed non-flaky tests preventing automatic retry of pull-knative-serving-integration-tests:\n\nTestServiceCreate",
        )],
        vec![
            status(StatusState::Error, INTEGRATION),
            status(StatusState::Pending, UNIT),
            status(StatusState::Failure, "cla/google"),
        ],
    );

    // Out of retries, then closed
    add_pull(
        &mut forge,
        closed(pull_request(103, at(7, 20, 8)), at(8, 3, 12)),
        &[(
            RETRYER_BOT,
            "Job pull-knative-serving-integration-tests expended all 3/3 retries without success.",
        )],
        vec![status(StatusState::Failure, INTEGRATION)],
    );

    // Manual retries only, merged after the cutover
    add_pull(
        &mut forge,
        merged(pull_request(104, at(8, 2, 11)), at(8, 3, 18)),
        &[
            (1001, "/test pull-knative-serving-unit-tests"),
            (1002, "/test pull-knative-serving-integration-tests"),
            (OTHER_BOT, "/test pull-knative-serving-build-tests"),
        ],
        vec![status(StatusState::Success, INTEGRATION)],
    );

    // Created and closed long before any window in these tests
    add_pull(
        &mut forge,
        merged(pull_request(50, at(6, 1, 0)), at(6, 2, 0)),
        &[(RETRYER_BOT, "/test all 1/3"), (1001, "/test pull-knative-serving-unit-tests")],
        vec![status(StatusState::Success, INTEGRATION)],
    );

    forge
}

#[tokio::test]
async fn executions_csv_for_rollout_week() {
    let forge = serving_history();
    let config = FlaketrackConfig::default();
    let progress = IndicatifReporter::hidden();

    let records = ExecutionsReport::new(&forge, &config)
        .collect(at(8, 1, 0), &progress)
        .await
        .unwrap();

    // Every PR active in the window was visited, three had retryer activity
    assert_eq!(progress.completed(), 4);
    assert_eq!(
        executions::render_csv(&records),
        "retries,retryer status,job status,overall status,pr state,url\n\
         1,retried,success,success,merged,https://github.com/knative/serving/pull/101\n\
         0,blocked,failure,failure,open,https://github.com/knative/serving/pull/102\n\
         3,expended,failure,failure,closed,https://github.com/knative/serving/pull/103\n"
    );
}

#[tokio::test]
async fn executions_window_excludes_old_prs() {
    let forge = serving_history();
    let config = FlaketrackConfig::default();

    let records = ExecutionsReport::new(&forge, &config)
        .collect(at(8, 3, 0), &NoopReporter)
        .await
        .unwrap();
    // Only 103 was closed after the start; 104 has no retryer comment
    let urls: Vec<&str> = records.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, ["https://github.com/knative/serving/pull/103"]);
}

#[tokio::test]
async fn ratios_csv_for_rollout_week() {
    let forge = serving_history();
    let config = FlaketrackConfig::default();
    let cutover = config.ratios.cutover().unwrap();
    assert_eq!(cutover, NaiveDate::from_ymd_opt(2019, 8, 2).unwrap());

    let buckets = RatiosReport::new(&forge, &config)
        .collect(at(8, 1, 0), at(8, 4, 9), &NoopReporter)
        .await
        .unwrap();

    assert_eq!(
        ratios::render_csv(&buckets, cutover),
        "date,retries,prs,ratio,ratio\n\
         2019-08-01,0,0,\n\
         2019-08-02,0,1,0.000,0.000\n\
         2019-08-03,2,1,,2.000\n\
         2019-08-04,0,0,,\n"
    );
}

#[tokio::test]
async fn ratios_skip_prs_with_unreadable_comments() {
    let mut forge = serving_history();
    forge.fail_comments(104);
    let config = FlaketrackConfig::default();

    let buckets = RatiosReport::new(&forge, &config)
        .collect(at(8, 3, 0), at(8, 3, 23), &NoopReporter)
        .await
        .unwrap();
    assert_eq!(buckets.len(), 1);
    assert_eq!((buckets[0].merged_prs, buckets[0].retries), (0, 0));
    assert_eq!(buckets[0].ratio(), None);
}

#[tokio::test]
async fn custom_bot_ids_change_what_counts() {
    let forge = serving_history();
    let mut config = FlaketrackConfig::default();
    config.github.bot_ids = vec![RETRYER_BOT];

    let buckets = RatiosReport::new(&forge, &config)
        .collect(at(8, 3, 0), at(8, 3, 23), &NoopReporter)
        .await
        .unwrap();
    assert_eq!(buckets[0].retries, 3);
}
