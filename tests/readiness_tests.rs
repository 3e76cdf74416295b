use readiness::startup::{
    ReadinessError, ReadinessHandle, ReadinessTracker, RunMode, Step, StepId, StepRunner, StepTask,
};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

fn session(ids: &[&str]) -> ReadinessTracker {
    let steps = ids.iter().map(|id| Step::new(*id, format!("Step {}", id))).collect();
    ReadinessTracker::new(steps).unwrap()
}

fn visible_ids(tracker: &ReadinessTracker) -> Vec<String> {
    tracker
        .observe_visible_steps()
        .into_iter()
        .map(|step| step.id().to_string())
        .collect()
}

#[test]
fn test_empty_sequence() {
    let tracker = session(&[]);
    assert!(tracker.observe_all_ready());
    assert!(tracker.observe_visible_steps().is_empty());
}

#[test]
fn test_all_done_at_creation() {
    let tracker = ReadinessTracker::new(vec![
        Step::completed("a", "A"),
        Step::completed("b", "B"),
        Step::completed("c", "C"),
    ])
    .unwrap();

    assert!(tracker.observe_all_ready());
    assert_eq!(visible_ids(&tracker), vec!["a", "b", "c"]);
}

#[test]
fn test_prefix_up_to_first_pending() {
    let tracker = ReadinessTracker::new(vec![
        Step::completed("a", "A"),
        Step::completed("b", "B"),
        Step::new("c", "C"),
        Step::completed("d", "D"),
    ])
    .unwrap();

    assert!(!tracker.observe_all_ready());
    assert_eq!(visible_ids(&tracker), vec!["a", "b", "c"]);
}

#[test]
fn test_out_of_order_scenario() {
    let mut tracker = session(&["A", "B", "C"]);
    assert_eq!(visible_ids(&tracker), vec!["A"]);

    assert_ok!(tracker.mark_step_done("A"));
    assert_eq!(visible_ids(&tracker), vec!["A", "B"]);

    assert_ok!(tracker.mark_step_done("C"));
    assert_eq!(visible_ids(&tracker), vec!["A", "B"]);
    assert!(!tracker.observe_all_ready());

    assert_ok!(tracker.mark_step_done("B"));
    assert_eq!(visible_ids(&tracker), vec!["A", "B", "C"]);
    assert!(tracker.observe_all_ready());
}

#[test]
fn test_repeated_mark_matches_single_mark() {
    let mut once = session(&["a", "b"]);
    let mut twice = session(&["a", "b"]);

    assert_ok!(once.mark_step_done("a"));
    assert_ok!(twice.mark_step_done("a"));
    assert_ok!(twice.mark_step_done("a"));

    assert_eq!(once.observe_all_ready(), twice.observe_all_ready());
    assert_eq!(visible_ids(&once), visible_ids(&twice));
    assert_eq!(once.state().completed, twice.state().completed);
}

#[test]
fn test_unknown_id_is_reported_and_harmless() {
    let mut tracker = session(&["A", "B"]);
    let before = tracker.state().clone();

    let err = assert_err!(tracker.mark_step_done("nonexistent"));
    assert_eq!(err, ReadinessError::UnknownStep(StepId::new("nonexistent")));
    assert_eq!(tracker.state(), &before);
}

#[test]
fn test_ready_is_monotonic() {
    let mut tracker = session(&["a", "b"]);
    assert_ok!(tracker.mark_step_done("a"));
    assert_ok!(tracker.mark_step_done("b"));
    assert!(tracker.observe_all_ready());

    assert_ok!(tracker.mark_step_done("a"));
    assert_err!(tracker.mark_step_done("zzz"));
    assert!(tracker.observe_all_ready());
}

#[test]
fn test_observers_are_idempotent() {
    let mut tracker = session(&["a", "b"]);
    assert_ok!(tracker.mark_step_done("a"));

    assert_eq!(tracker.observe_visible_steps(), tracker.observe_visible_steps());
    assert_eq!(tracker.observe_all_ready(), tracker.observe_all_ready());
}

#[tokio::test]
async fn test_subscriber_follows_async_initializers() {
    let tracker = session(&["db", "cache", "index"]);
    let mut rx = tracker.subscribe();
    let handle = ReadinessHandle::new(tracker);

    let mut runner = StepRunner::new(handle.clone());
    runner.spawn_simulated(
        vec![
            StepTask::new("db", Duration::from_millis(2)),
            StepTask::new("cache", Duration::from_millis(2)),
            StepTask::new("index", Duration::from_millis(2)),
        ],
        RunMode::Sequential,
    );

    let mut seen = vec![rx.borrow_and_update().visible_steps.len()];
    while !rx.borrow().all_ready {
        rx.changed().await.unwrap();
        seen.push(rx.borrow_and_update().visible_steps.len());
    }

    // the visible list only ever grows
    assert!(seen.windows(2).all(|pair| pair[0] <= pair[1]));
    assert_eq!(seen.last(), Some(&3));
    assert_ok!(runner.wait().await);
}

#[tokio::test]
async fn test_handle_reports_unknown_step_to_task() {
    let handle = ReadinessHandle::new(session(&["a"]));
    let task_handle = handle.clone();

    let result = tokio::spawn(async move { task_handle.mark_step_done("b") })
        .await
        .unwrap();

    assert_eq!(result, Err(ReadinessError::UnknownStep(StepId::new("b"))));
    assert!(!handle.observe_all_ready());
}
