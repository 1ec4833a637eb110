//! Integration tests for primary-thread dispatch on a real executor.

use std::collections::HashSet;
use std::error::Error;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use questline_core::condition::{Condition, StaticCondition};
use questline_core::context::{PrimaryThreadContext, TaskOwner};
use questline_core::error::QuestError;
use questline_core::event::{Event, StaticEvent, event_fn};
use questline_core::primary_thread::{PrimaryThreadComposedCondition, PrimaryThreadComposedEvent};
use questline_runtime::config::RuntimeConfig;
use questline_runtime::executor::PrimaryThreadExecutor;
use questline_test_support::{RecordingCondition, RecordingEvent, test_profile};

const THREAD_NAME: &str = "questline-test-primary";

fn start_executor(sync_timeout: Option<Duration>) -> PrimaryThreadExecutor {
    PrimaryThreadExecutor::start(&RuntimeConfig {
        thread_name: THREAD_NAME.to_owned(),
        queue_capacity: 256,
        sync_timeout,
    })
    .unwrap()
}

fn quests_context(executor: &PrimaryThreadExecutor) -> PrimaryThreadContext {
    executor.context(TaskOwner::new("quests"))
}

/// Occupies the primary thread until the returned sender is used or dropped.
fn block_primary_thread(executor: &PrimaryThreadExecutor) -> mpsc::Sender<()> {
    let blocker = PrimaryThreadComposedEvent::new(
        Arc::new(RecordingEvent::succeeding()),
        executor.context(TaskOwner::new("blocker")),
    );
    let (gate_tx, gate_rx) = mpsc::channel::<()>();
    let (started_tx, started_rx) = mpsc::channel();

    thread::spawn(move || {
        blocker
            .dispatcher()
            .call(move |_| {
                started_tx.send(()).unwrap();
                let _ = gate_rx.recv();
                Ok(())
            })
            .unwrap();
    });
    started_rx.recv().unwrap();
    gate_tx
}

fn wait_for_queue_depth(executor: &PrimaryThreadExecutor, depth: usize) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while executor.stats().queue_depth < depth {
        assert!(Instant::now() < deadline, "work was never queued");
        thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn test_call_from_worker_thread_runs_on_primary_thread() {
    let executor = start_executor(None);
    let synced = Arc::new(RecordingCondition::returning(true));
    let context = quests_context(&executor);
    let wrapped = PrimaryThreadComposedCondition::new(Arc::clone(&synced), context);

    let result = wrapped.check(&test_profile("Aldric")).unwrap();

    assert!(result);
    let calls = synced.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].thread_name.as_deref(), Some(THREAD_NAME));
    assert_ne!(calls[0].thread_id, thread::current().id());
}

#[test]
fn test_error_and_cause_cross_the_thread_boundary() {
    let executor = start_executor(None);
    let wrapped = PrimaryThreadComposedEvent::new(
        Arc::new(RecordingEvent::failing("item not found", Some("unknown item 'quest.key'"))),
        quests_context(&executor),
    );

    let err = wrapped.execute(&test_profile("Mira")).unwrap_err();

    assert!(matches!(err, QuestError::Runtime { .. }));
    assert_eq!(err.to_string(), "item not found");
    assert_eq!(
        err.source().map(ToString::to_string).as_deref(),
        Some("unknown item 'quest.key'")
    );
}

#[test]
fn test_concurrent_callers_each_observe_their_own_profile() {
    const CALLERS: usize = 16;
    let executor = start_executor(None);
    let synced =
        Arc::new(RecordingCondition::returning(true).with_delay(Duration::from_millis(2)));
    let context = quests_context(&executor);
    let wrapped = PrimaryThreadComposedCondition::new(Arc::clone(&synced), context);

    let handles: Vec<_> = (0..CALLERS)
        .map(|i| {
            let wrapped = wrapped.clone();
            let profile = test_profile(&format!("player-{i}"));
            thread::spawn(move || {
                let sent = profile.clone();
                let echoed = wrapped
                    .dispatcher()
                    .call(move |condition| {
                        condition.check(&sent)?;
                        Ok(condition.last_profile())
                    })
                    .unwrap();
                (profile, echoed)
            })
        })
        .collect();

    for handle in handles {
        let (sent, echoed) = handle.join().unwrap();
        assert_eq!(echoed, Some(sent));
    }
    let calls = synced.calls();
    assert_eq!(calls.len(), CALLERS);
    assert_eq!(synced.max_concurrent_calls(), 1);
    assert!(calls.iter().all(|call| call.thread_name.as_deref() == Some(THREAD_NAME)));
    let distinct: HashSet<_> = calls.iter().filter_map(|call| call.profile.clone()).collect();
    assert_eq!(distinct.len(), CALLERS);
}

#[test]
fn test_events_from_many_threads_never_overlap() {
    let executor = start_executor(None);
    let synced = Arc::new(RecordingEvent::succeeding().with_delay(Duration::from_millis(1)));
    let wrapped = PrimaryThreadComposedEvent::new(Arc::clone(&synced), quests_context(&executor));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let wrapped = wrapped.clone();
            thread::spawn(move || {
                for _ in 0..4 {
                    wrapped.execute_static().unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(synced.call_count(), 32);
    assert_eq!(synced.max_concurrent_calls(), 1);
}

#[test]
fn test_nested_call_on_primary_thread_runs_in_place() {
    let executor = start_executor(None);
    let inner_synced = Arc::new(RecordingCondition::returning(true));
    let inner =
        PrimaryThreadComposedCondition::new(Arc::clone(&inner_synced), quests_context(&executor));
    let outer_synced = Arc::new(RecordingEvent::succeeding());
    let outer = PrimaryThreadComposedEvent::new(outer_synced, quests_context(&executor));

    let nested = outer.dispatcher().call(move |_| inner.check_static()).unwrap();

    assert!(nested);
    assert_eq!(inner_synced.call_count(), 1);
    assert_eq!(inner_synced.calls()[0].thread_name.as_deref(), Some(THREAD_NAME));
    executor.shutdown();
    assert_eq!(executor.stats().tasks_completed, 1);
}

#[test]
fn test_owner_deactivated_while_queued_discards_work() {
    let executor = start_executor(None);
    let owner = TaskOwner::new("quests");
    let synced = Arc::new(RecordingEvent::succeeding());
    let wrapped =
        PrimaryThreadComposedEvent::new(Arc::clone(&synced), executor.context(owner.clone()));
    let gate = block_primary_thread(&executor);

    let caller = thread::spawn(move || wrapped.execute_static());
    wait_for_queue_depth(&executor, 1);
    owner.deactivate();
    drop(gate);

    let err = caller.join().unwrap().unwrap_err();
    assert!(matches!(err, QuestError::PrimaryThreadUnavailable(_)));
    assert_eq!(synced.call_count(), 0);
    executor.shutdown();
    assert_eq!(executor.stats().tasks_discarded, 1);
}

#[test]
fn test_inactive_owner_never_reaches_executor() {
    let executor = start_executor(None);
    let owner = TaskOwner::new("quests");
    owner.deactivate();
    let synced = Arc::new(RecordingCondition::returning(true));
    let wrapped = PrimaryThreadComposedCondition::new(Arc::clone(&synced), executor.context(owner));

    let err = wrapped.check_static().unwrap_err();

    assert!(matches!(err, QuestError::PrimaryThreadUnavailable(_)));
    assert_eq!(synced.call_count(), 0);
    assert_eq!(executor.stats().tasks_completed, 0);
}

#[test]
fn test_bounded_wait_times_out_while_primary_thread_is_busy() {
    let executor = start_executor(Some(Duration::from_millis(50)));
    let wrapped = PrimaryThreadComposedCondition::new(
        Arc::new(RecordingCondition::returning(true)),
        quests_context(&executor),
    );
    let gate = block_primary_thread(&executor);

    let err = wrapped.check_static().unwrap_err();

    match err {
        QuestError::PrimaryThreadTimeout(waited) => {
            assert_eq!(waited, Duration::from_millis(50));
        }
        other => panic!("expected PrimaryThreadTimeout, got {other:?}"),
    }
    drop(gate);
}

#[test]
fn test_calls_after_shutdown_report_unavailable() {
    let executor = start_executor(None);
    let synced = Arc::new(RecordingEvent::succeeding());
    let wrapped = PrimaryThreadComposedEvent::new(Arc::clone(&synced), quests_context(&executor));

    executor.shutdown();
    let err = wrapped.execute_static().unwrap_err();

    match err {
        QuestError::PrimaryThreadUnavailable(reason) => {
            assert_eq!(reason, "scheduler has shut down");
        }
        other => panic!("expected PrimaryThreadUnavailable, got {other:?}"),
    }
    assert_eq!(synced.call_count(), 0);
}

#[test]
fn test_panicking_action_is_resumed_on_caller_not_reported_unavailable() {
    let executor = start_executor(None);
    let runs = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&runs);
    let wrapped = PrimaryThreadComposedEvent::new(
        Arc::new(event_fn(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            panic!("quest script exploded");
        })),
        quests_context(&executor),
    );

    let payload = panic::catch_unwind(AssertUnwindSafe(|| wrapped.execute_static())).unwrap_err();

    assert_eq!(payload.downcast_ref::<&str>(), Some(&"quest script exploded"));
    assert_eq!(runs.load(Ordering::SeqCst), 1);
    let follow_up = PrimaryThreadComposedCondition::new(
        Arc::new(RecordingCondition::returning(true)),
        quests_context(&executor),
    );
    assert!(follow_up.check_static().unwrap());
    executor.shutdown();
    assert_eq!(executor.stats().tasks_discarded, 0);
}

#[test]
fn test_unbounded_timeout_value_waits_for_result() {
    let executor = start_executor(None);
    let synced = Arc::new(RecordingCondition::returning(true));
    let context = quests_context(&executor).with_timeout(Duration::MAX);
    let wrapped = PrimaryThreadComposedCondition::new(Arc::clone(&synced), context);

    assert!(wrapped.check_static().unwrap());
    assert_eq!(synced.call_count(), 1);
}
