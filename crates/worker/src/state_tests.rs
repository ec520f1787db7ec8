use super::*;
use WorkerEvent::*;
use WorkerState::*;

#[test]
fn full_lifecycle_round_trips_through_idle() {
    let mut state = Idle;
    state = transition(state, ConnectionAssigned).unwrap();
    assert_eq!(state, Init);
    state = transition(state, ReportRunning).unwrap();
    assert_eq!(state, Running);
    state = transition(state, ReportIdle).unwrap();
    assert_eq!(state, Idle);
}

#[test]
fn child_exit_forces_fini_from_any_state() {
    for state in [Idle, Init, Running, Fini] {
        assert_eq!(transition(state, ChildExit), Some(Fini));
    }
}

#[test]
fn idle_timeout_only_applies_while_idle() {
    assert_eq!(transition(Idle, IdleTimeout), Some(Fini));
    assert_eq!(transition(Running, IdleTimeout), None);
    assert_eq!(transition(Init, IdleTimeout), None);
}

#[test]
fn connection_assigned_requires_idle() {
    assert_eq!(transition(Running, ConnectionAssigned), None);
    assert_eq!(transition(Init, ConnectionAssigned), None);
}
