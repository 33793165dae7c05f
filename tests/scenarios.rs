//! End-to-end scenarios for hierarchical dispatch, hooks and timers.

use chrono::Duration as ChronoDuration;
use hfsm::timer::{Clock, ManualClock};
use hfsm::{
    BuildError, ConfigError, EventKind, HookError, Machine, MachineBuilder, MachineConfig,
    MachineError, StateRef,
};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

type Log = Arc<Mutex<Vec<String>>>;
type Builder = MachineBuilder<&'static str, &'static str>;

/// Attach enter/exit hooks that append `enter:X` / `exit:X` to `log`.
fn traced(mut builder: Builder, states: &[&'static str], log: &Log) -> Builder {
    for &state in states {
        let on_enter = log.clone();
        let on_exit = log.clone();
        builder = builder
            .on_enter(state, move |_, _| {
                on_enter.lock().push(format!("enter:{state}"));
                Ok(())
            })
            .and_then(|b| {
                b.on_exit(state, move |_, _| {
                    on_exit.lock().push(format!("exit:{state}"));
                    Ok(())
                })
            })
            .unwrap();
    }
    builder
}

fn take(log: &Log) -> Vec<String> {
    std::mem::take(&mut *log.lock())
}

/// Root -> {A, B -> {B1 (default), B2}}
fn a_b_tree() -> Result<Builder, BuildError> {
    Ok(Machine::builder()
        .state("A")?
        .state("B")?
        .substate("B", "B1")?
        .substate("B", "B2")?
        .initial("A")
        .default_transition("B", "B1")?
        .transition("A", "go", "B")?
        .transition("B1", "go2", "B2")?)
}

/// Root -> {P -> {P1 (default), P2}, Q -> {Q1 (default)}}
fn cousin_tree() -> Result<Builder, BuildError> {
    Ok(Machine::builder()
        .state("P")?
        .substate("P", "P1")?
        .substate("P", "P2")?
        .state("Q")?
        .substate("Q", "Q1")?
        .initial("P")
        .default_transition("P", "P1")?
        .default_transition("Q", "Q1")?
        .transition("P1", "sibling", "P2")?
        .transition("P2", "cousin", "Q1")?)
}

#[test]
fn composite_target_cascades_to_default_leaf() {
    let mut machine = a_b_tree().unwrap().build();
    machine.start().unwrap();
    assert_eq!(machine.current_state(), Some(&"A"));

    machine.post_event("go").unwrap();
    assert_eq!(machine.current_state(), Some(&"B1"));
    assert!(machine.in_state(&"B"));

    machine.post_event("go2").unwrap();
    assert_eq!(machine.current_state(), Some(&"B2"));
}

#[test]
fn unknown_events_change_nothing() {
    let mut machine = a_b_tree().unwrap().build();
    machine.start().unwrap();

    machine.post_event("nonsense").unwrap();
    assert_eq!(machine.current_state(), Some(&"A"));

    machine.post_event("go2").unwrap();
    assert_eq!(machine.current_state(), Some(&"A"));
    assert_eq!(machine.pending_events(), 0);
}

#[test]
fn in_state_covers_leaf_and_ancestors_only() {
    let mut machine = a_b_tree().unwrap().build();
    machine.start().unwrap();
    machine.post_event("go").unwrap();

    assert!(machine.in_state(&"B1"));
    assert!(machine.in_state(&"B"));
    assert!(!machine.in_state(&"B2"));
    assert!(!machine.in_state(&"A"));
    assert!(!machine.in_state(&"Unknown"));
    assert_eq!(machine.active_chain(), vec![&"B1", &"B"]);
}

#[test]
fn innermost_transition_shadows_ancestor() {
    let mut machine = a_b_tree()
        .and_then(|b| b.state("Outer"))
        .and_then(|b| b.transition("B", "go2", "Outer"))
        .unwrap()
        .build();
    machine.start().unwrap();
    machine.post_event("go").unwrap();

    machine.post_event("go2").unwrap();
    assert_eq!(machine.current_state(), Some(&"B2"));

    // B2 declares nothing for go2, so B's transition applies.
    machine.post_event("go2").unwrap();
    assert_eq!(machine.current_state(), Some(&"Outer"));
}

#[test]
fn root_transitions_apply_everywhere() {
    let mut machine = a_b_tree()
        .and_then(|b| b.transition(StateRef::Root, "reset", "A"))
        .unwrap()
        .build();
    machine.start().unwrap();
    machine.post_event("go").unwrap();
    machine.post_event("go2").unwrap();

    machine.post_event("reset").unwrap();
    assert_eq!(machine.current_state(), Some(&"A"));
}

#[test]
fn start_without_default_is_fatal() {
    let mut machine = Machine::<&str, &str>::builder().state("A").unwrap().build();

    let err = machine.start().unwrap_err();
    assert!(matches!(err, MachineError::Config(ConfigError::NoInitialState)));
    assert!(err.is_configuration());
}

#[test]
fn composite_without_default_fails_on_entry() {
    let mut machine = Machine::<&str, &str>::builder()
        .state("A")
        .and_then(|b| b.state("B"))
        .and_then(|b| b.substate("B", "B1"))
        .and_then(|b| b.transition("A", "go", "B"))
        .map(|b| b.initial("A"))
        .unwrap()
        .build();
    machine.start().unwrap();

    let err = machine.post_event("go").unwrap_err();
    assert!(matches!(
        err,
        MachineError::Config(ConfigError::MissingDefault { ref state }) if state == "B"
    ));
    assert_eq!(err.error_code(), "MISSING_DEFAULT");
}

#[test]
fn unknown_target_is_reported_at_first_traversal() {
    let mut machine = Machine::<&str, &str>::builder()
        .state("A")
        .and_then(|b| b.transition("A", "go", "Nowhere"))
        .map(|b| b.initial("A"))
        .unwrap()
        .build();
    machine.start().unwrap();

    let err = machine.post_event("go").unwrap_err();
    assert!(matches!(
        err,
        MachineError::Config(ConfigError::TargetNotFound { ref target, .. }) if target == "Nowhere"
    ));
    assert_eq!(machine.current_state(), Some(&"A"));
}

#[test]
fn posting_before_start_is_rejected() {
    let mut machine = a_b_tree().unwrap().build();
    assert!(matches!(
        machine.post_event("go"),
        Err(MachineError::NotStarted)
    ));

    machine.start().unwrap();
    assert!(matches!(machine.start(), Err(MachineError::AlreadyStarted)));
}

#[test]
fn sibling_transition_fires_only_sibling_hooks() {
    let log = Log::default();
    let mut machine = traced(cousin_tree().unwrap(), &["P", "P1", "P2", "Q", "Q1"], &log).build();
    machine.start().unwrap();
    assert_eq!(take(&log), vec!["enter:P", "enter:P1"]);

    machine.post_event("sibling").unwrap();
    assert_eq!(take(&log), vec!["exit:P1", "enter:P2"]);
}

#[test]
fn cousin_transition_also_fires_parent_hooks() {
    let log = Log::default();
    let mut machine = traced(cousin_tree().unwrap(), &["P", "P1", "P2", "Q", "Q1"], &log).build();
    machine.start().unwrap();
    machine.post_event("sibling").unwrap();
    take(&log);

    machine.post_event("cousin").unwrap();
    assert_eq!(take(&log), vec!["exit:P2", "exit:P", "enter:Q", "enter:Q1"]);
}

#[test]
fn self_transition_exits_and_reenters() {
    let log = Log::default();
    let builder = a_b_tree()
        .and_then(|b| b.transition("B", "restart", "B"))
        .unwrap();
    let mut machine = traced(builder, &["B", "B1", "B2"], &log).build();
    machine.start().unwrap();
    machine.post_event("go").unwrap();
    machine.post_event("go2").unwrap();
    take(&log);

    machine.post_event("restart").unwrap();
    assert_eq!(take(&log), vec!["exit:B2", "exit:B", "enter:B", "enter:B1"]);
    assert_eq!(machine.current_state(), Some(&"B1"));
}

#[test]
fn ancestor_handler_targeting_its_child_keeps_ancestor_active() {
    let log = Log::default();
    let builder = a_b_tree()
        .and_then(|b| b.transition("B", "other", "B2"))
        .unwrap();
    let mut machine = traced(builder, &["B", "B1", "B2"], &log).build();
    machine.start().unwrap();
    machine.post_event("go").unwrap();
    take(&log);

    machine.post_event("other").unwrap();
    assert_eq!(take(&log), vec!["exit:B1", "enter:B2"]);
}

#[test]
fn timeout_fires_once_after_deadline() {
    let clock = Arc::new(ManualClock::starting_now());
    let fired = Arc::new(AtomicUsize::new(0));
    let counter = fired.clone();
    let mut machine = Machine::<&str, &str>::builder()
        .state("X")
        .and_then(|b| b.state("Y"))
        .and_then(|b| b.timeout("X", Duration::from_millis(100), "Y"))
        .and_then(|b| {
            b.on_enter("Y", move |event, _| {
                assert_eq!(event.kind(), &EventKind::Timeout);
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
        })
        .map(|b| b.initial("X").clock(clock.clone()))
        .unwrap()
        .build();
    machine.start().unwrap();

    clock.advance(Duration::from_millis(50));
    machine.pulse().unwrap();
    assert_eq!(machine.current_state(), Some(&"X"));

    clock.advance(Duration::from_millis(100));
    machine.pulse().unwrap();
    machine.pulse().unwrap();
    assert_eq!(machine.current_state(), Some(&"Y"));
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert!(machine.timers().is_empty());
}

#[test]
fn leaving_before_expiry_cancels_timeout() {
    let clock = Arc::new(ManualClock::starting_now());
    let mut machine = Machine::<&str, &str>::builder()
        .state("X")
        .and_then(|b| b.state("Y"))
        .and_then(|b| b.state("Z"))
        .and_then(|b| b.timeout("X", Duration::from_millis(100), "Y"))
        .and_then(|b| b.transition("X", "skip", "Z"))
        .map(|b| b.initial("X").clock(clock.clone()))
        .unwrap()
        .build();
    machine.start().unwrap();
    assert_eq!(machine.timers().len(), 1);

    machine.post_event("skip").unwrap();
    assert!(machine.timers().is_empty());

    clock.advance(Duration::from_millis(200));
    machine.pulse().unwrap();
    assert_eq!(machine.current_state(), Some(&"Z"));
}

#[test]
fn registered_timer_delivers_targeted_timeout() {
    let clock = Arc::new(ManualClock::starting_now());
    let mut machine = Machine::<&str, &str>::builder()
        .state("X")
        .and_then(|b| b.state("Y"))
        .and_then(|b| b.on("X", EventKind::Timeout, "Y", None))
        .map(|b| b.initial("X").clock(clock.clone()))
        .unwrap()
        .build();
    machine.start().unwrap();

    let deadline = clock.now() + ChronoDuration::milliseconds(10);
    machine.register_timer(&"X", deadline).unwrap();
    clock.advance(Duration::from_millis(10));
    machine.pulse().unwrap();
    assert_eq!(machine.current_state(), Some(&"X"));

    clock.advance(Duration::from_millis(1));
    machine.pulse().unwrap();
    assert_eq!(machine.current_state(), Some(&"Y"));
}

#[test]
fn cancelled_timer_never_fires() {
    let clock = Arc::new(ManualClock::starting_now());
    let mut machine = Machine::<&str, &str>::builder()
        .state("X")
        .and_then(|b| b.state("Y"))
        .and_then(|b| b.on("X", EventKind::Timeout, "Y", None))
        .map(|b| b.initial("X").clock(clock.clone()))
        .unwrap()
        .build();
    machine.start().unwrap();

    machine
        .register_timeout(&"X", Duration::from_millis(10))
        .unwrap();
    machine.cancel_timer(&"X").unwrap();
    machine.cancel_timer(&"X").unwrap();
    machine.cancel_timer(&"Y").unwrap();

    clock.advance(Duration::from_millis(50));
    machine.pulse().unwrap();
    assert_eq!(machine.current_state(), Some(&"X"));
    assert!(matches!(
        machine.cancel_timer(&"Ghost"),
        Err(MachineError::UnknownState { .. })
    ));
}

#[test]
fn timeout_for_inactive_state_is_discarded() {
    let clock = Arc::new(ManualClock::starting_now());
    let mut machine = Machine::<&str, &str>::builder()
        .state("X")
        .and_then(|b| b.state("Y"))
        .and_then(|b| b.state("Z"))
        .and_then(|b| b.on("Y", EventKind::Timeout, "Z", None))
        .map(|b| b.initial("X").clock(clock.clone()))
        .unwrap()
        .build();
    machine.start().unwrap();

    machine
        .register_timeout(&"Y", Duration::from_millis(1))
        .unwrap();
    clock.advance(Duration::from_millis(5));
    machine.pulse().unwrap();

    assert_eq!(machine.current_state(), Some(&"X"));
    assert!(machine.timers().is_empty());
}

#[test]
fn timeout_is_processed_before_the_posted_event() {
    let clock = Arc::new(ManualClock::starting_now());
    let mut machine = Machine::<&str, &str>::builder()
        .state("X")
        .and_then(|b| b.state("Y"))
        .and_then(|b| b.state("Z"))
        .and_then(|b| b.timeout("X", Duration::from_millis(10), "Y"))
        .and_then(|b| b.transition("Y", "next", "Z"))
        .map(|b| b.initial("X").clock(clock.clone()))
        .unwrap()
        .build();
    machine.start().unwrap();

    clock.advance(Duration::from_millis(11));
    machine.post_event("next").unwrap();
    assert_eq!(machine.current_state(), Some(&"Z"));
}

#[test]
fn due_timeouts_are_delivered_one_per_post() {
    let clock = Arc::new(ManualClock::starting_now());
    let mut machine = Machine::<&str, &str>::builder()
        .state("P")
        .and_then(|b| b.substate("P", "P1"))
        .and_then(|b| b.substate("P", "P2"))
        .and_then(|b| b.state("Q"))
        .and_then(|b| b.default_transition("P", "P1"))
        .and_then(|b| b.timeout("P", Duration::from_millis(20), "Q"))
        .and_then(|b| b.timeout("P1", Duration::from_millis(10), "P2"))
        .map(|b| b.initial("P").clock(clock.clone()))
        .unwrap()
        .build();
    machine.start().unwrap();
    assert_eq!(machine.timers().len(), 2);

    clock.advance(Duration::from_millis(50));
    machine.pulse().unwrap();
    assert_eq!(machine.current_state(), Some(&"P2"));
    assert_eq!(machine.timers().len(), 1);

    machine.pulse().unwrap();
    assert_eq!(machine.current_state(), Some(&"Q"));
    assert!(machine.timers().is_empty());

    machine.pulse().unwrap();
    assert_eq!(machine.current_state(), Some(&"Q"));
    assert_eq!(machine.history().get_path(), vec![&"P1", &"P2", &"Q"]);
}

#[test]
fn raised_events_run_after_current_transition() {
    let log = Log::default();
    let builder = a_b_tree()
        .and_then(|b| {
            b.on_enter("B1", |_, ctx| {
                ctx.raise("go2");
                Ok(())
            })
        })
        .unwrap();
    let mut machine = traced(builder, &["B", "B1", "B2"], &log).build();
    machine.start().unwrap();

    machine.post_event("go").unwrap();
    assert_eq!(machine.current_state(), Some(&"B2"));
    assert_eq!(
        take(&log),
        vec!["enter:B", "enter:B1", "exit:B1", "enter:B2"]
    );
}

#[test]
fn payload_reaches_hooks() {
    let seen = Arc::new(Mutex::new(None));
    let sink = seen.clone();
    let mut machine = a_b_tree()
        .and_then(|b| {
            b.on_enter("B", move |event, _| {
                *sink.lock() = event.payload::<u32>().copied();
                Ok(())
            })
        })
        .unwrap()
        .build();
    machine.start().unwrap();

    machine.post_event_with("go", 42u32).unwrap();
    assert_eq!(*seen.lock(), Some(42));
}

#[test]
fn guards_select_between_transitions() {
    let open = Arc::new(AtomicBool::new(false));
    let gate = open.clone();
    let mut machine = Machine::<&str, &str>::builder()
        .state("Locked")
        .and_then(|b| b.state("Open"))
        .and_then(|b| b.state("Alarm"))
        .and_then(|b| {
            b.transition_when("Locked", "push", "Open", move || gate.load(Ordering::SeqCst))
        })
        .and_then(|b| b.transition("Locked", "push", "Alarm"))
        .map(|b| b.initial("Locked"))
        .unwrap()
        .build();
    machine.start().unwrap();

    open.store(true, Ordering::SeqCst);
    machine.post_event("push").unwrap();
    assert_eq!(machine.current_state(), Some(&"Open"));
}

#[test]
fn guarded_default_entries_pick_first_passing() {
    let mut machine = Machine::<&str, &str>::builder()
        .state("M")
        .and_then(|b| b.substate("M", "Fast"))
        .and_then(|b| b.substate("M", "Slow"))
        .and_then(|b| b.default_transition_when("M", "Fast", || false))
        .and_then(|b| b.default_transition("M", "Slow"))
        .map(|b| b.initial("M"))
        .unwrap()
        .build();

    machine.start().unwrap();
    assert_eq!(machine.current_state(), Some(&"Slow"));
}

#[test]
fn hook_failure_aborts_and_keeps_queue() {
    let mut machine = a_b_tree()
        .and_then(|b| {
            b.on_enter("B", |_, ctx| {
                ctx.raise("later");
                Err(HookError::new("sensor offline"))
            })
        })
        .unwrap()
        .build();
    machine.start().unwrap();

    let err = machine.post_event("go").unwrap_err();
    assert!(matches!(err, MachineError::Hook { ref state, .. } if state == "B"));
    assert_eq!(err.error_code(), "HOOK_FAILED");
    assert_eq!(machine.current_state(), None);
    assert!(!machine.in_state(&"A"));
    assert_eq!(machine.pending_events(), 1);
}

#[test]
fn history_records_resting_states() {
    let mut machine = a_b_tree().unwrap().build();
    machine.start().unwrap();
    machine.post_event("go").unwrap();
    machine.post_event("go2").unwrap();
    machine.post_event("nothing").unwrap();

    let history = machine.history();
    assert_eq!(history.get_path(), vec![&"A", &"B1", &"B2"]);
    let triggers: Vec<_> = history
        .transitions()
        .iter()
        .map(|t| t.trigger.as_str())
        .collect();
    assert_eq!(triggers, vec!["DefaultEntry", "\"go\"", "\"go2\""]);
}

#[test]
fn history_can_be_disabled() {
    let mut machine = a_b_tree()
        .unwrap()
        .config(MachineConfig::default().with_history_capacity(0))
        .build();
    machine.start().unwrap();
    machine.post_event("go").unwrap();
    assert!(machine.history().transitions().is_empty());
}

#[test]
fn validation_reports_every_problem() {
    let builder = Machine::<&str, &str>::builder()
        .state("A")
        .and_then(|b| b.state("B"))
        .and_then(|b| b.substate("B", "B1"))
        .and_then(|b| b.state("C"))
        .and_then(|b| b.substate("C", "C1"))
        .and_then(|b| b.transition("A", "go", "Missing"))
        .map(|b| b.initial("A"))
        .unwrap();

    match builder.build_validated() {
        Err(BuildError::Invalid { errors }) => {
            assert_eq!(errors.len(), 3);
            assert!(errors.contains(&ConfigError::MissingDefault { state: "B".into() }));
            assert!(errors.contains(&ConfigError::MissingDefault { state: "C".into() }));
        }
        _ => panic!("Expected BuildError::Invalid"),
    }
}
