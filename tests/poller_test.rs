mod common;

use std::sync::Arc;
use std::time::Duration;

use binwatch::model::{BinCategory, DashboardSnapshot};
use binwatch::poller::Poller;
use common::{server_error, wet_at, ScriptedSource};
use tokio::time::sleep;

const PERIOD: Duration = Duration::from_secs(10);

#[tokio::test(start_paused = true)]
async fn fetches_immediately_then_once_per_period_until_stopped() {
    let source = ScriptedSource::default();
    let handle = Poller::new(Arc::new(source.clone()), PERIOD).start();

    sleep(Duration::from_millis(1)).await;
    assert_eq!(source.calls(), 1, "initial fetch");

    sleep(PERIOD).await;
    assert_eq!(source.calls(), 2);
    sleep(PERIOD).await;
    assert_eq!(source.calls(), 3);

    handle.stop();
    handle.stop();
    assert!(handle.is_stopped());
    sleep(PERIOD * 5).await;
    assert_eq!(source.calls(), 3, "no fetch after stop");
}

#[tokio::test(start_paused = true)]
async fn dropping_the_handle_stops_the_schedule() {
    let source = ScriptedSource::default();
    {
        let _handle = Poller::new(Arc::new(source.clone()), PERIOD).start();
        sleep(Duration::from_millis(1)).await;
    }
    sleep(PERIOD * 3).await;
    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn unreachable_backend_on_first_fetch_shows_fallback() {
    let source = ScriptedSource::with_responses(vec![Err(server_error("backend down"))]);
    let handle = Poller::new(Arc::new(source), PERIOD).start();

    sleep(Duration::from_millis(1)).await;
    let state = handle.state();
    assert!(!state.loading);
    assert_eq!(state.snapshot.as_deref(), Some(&DashboardSnapshot::fallback()));
    assert_eq!(state.error.as_deref(), Some("backend down"));

    // next tick succeeds and clears the error
    sleep(PERIOD).await;
    let state = handle.state();
    assert!(state.error.is_none());
    assert_eq!(
        state.snapshot.unwrap().bin(BinCategory::Wet).fill_level_percent(),
        10.0
    );
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn transient_failure_keeps_last_good_snapshot() {
    let s1 = wet_at(42.0);
    let source =
        ScriptedSource::with_responses(vec![Ok(s1.clone()), Err(server_error("timeout"))]);
    let handle = Poller::new(Arc::new(source), PERIOD).start();

    sleep(Duration::from_millis(1)).await;
    assert_eq!(handle.state().snapshot.as_deref(), Some(&s1));
    assert!(handle.state().error.is_none());

    sleep(PERIOD).await;
    let state = handle.state();
    assert_eq!(state.snapshot.as_deref(), Some(&s1));
    assert_eq!(state.error.as_deref(), Some("timeout"));
    handle.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn slow_fetches_overlap_and_finish_after_stop() {
    let source = ScriptedSource::default().delayed(Duration::from_secs(25));
    let handle = Poller::new(Arc::new(source.clone()), PERIOD).start();
    let mut feed = handle.subscribe();

    sleep(Duration::from_secs(21)).await;
    assert_eq!(source.calls(), 3, "ticks at 0s, 10s, 20s fire regardless");
    let state = handle.state();
    assert!(state.loading);
    assert!(state.snapshot.is_none());

    handle.stop();
    drop(handle);

    // every in-flight fetch still reports; then the feed closes
    while feed.changed().await.is_ok() {}
    let state = feed.borrow().clone();
    assert!(!state.loading);
    assert!(state.snapshot.is_some());
    assert_eq!(source.calls(), 3);
}
