//! Property-based tests for the session state machine
//!
//! Random sequences of mutations and engine replies must never break the
//! session invariants.

use super::interpret::{interpret, restore};
use super::*;
use crate::engine::{Flow, InputKind, Report, TurnResponse};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_input_kind() -> impl Strategy<Value = InputKind> {
    prop_oneof![
        Just(InputKind::Text),
        Just(InputKind::Number),
        Just(InputKind::Options),
        Just(InputKind::MultiSelect),
        Just(InputKind::SymptomSearch),
    ]
}

fn arb_flow() -> impl Strategy<Value = Flow> {
    prop_oneof![Just(Flow::Main), Just(Flow::SymptomSpecific)]
}

fn arb_turn_response() -> impl Strategy<Value = TurnResponse> {
    (
        proptest::option::of("[a-zA-Z ?]{1,30}"),
        proptest::option::of(proptest::collection::vec("[A-Za-z]{1,10}", 0..4)),
        proptest::option::of(arb_input_kind()),
        proptest::option::of(0.0f64..120.0),
        proptest::option::of(arb_flow()),
        proptest::option::of("[a-z]{3,8}"),
        prop::bool::weighted(0.15),
        prop::bool::weighted(0.1),
    )
        .prop_map(
            |(message, options, input_kind, progress, flow, symptom, has_report, has_error)| {
                TurnResponse {
                    message,
                    options,
                    input_kind,
                    progress,
                    flow,
                    active_symptom: symptom,
                    report: has_report.then(Report::default),
                    error: has_error.then(|| "engine refused".to_string()),
                    ..Default::default()
                }
            },
        )
}

#[derive(Debug, Clone)]
enum Op {
    Answer(TurnResponse),
    ChooseOption(TurnResponse),
    Back,
    Reset,
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        arb_turn_response().prop_map(Op::Answer),
        arb_turn_response().prop_map(Op::ChooseOption),
        Just(Op::Back),
        Just(Op::Reset),
    ]
}

fn apply(session: &mut Session, op: Op) {
    match op {
        Op::Answer(response) => {
            interpret(session, &response);
        }
        Op::ChooseOption(response) => {
            session.checkpoint_current();
            interpret(session, &response);
        }
        Op::Back => {
            if let Some(checkpoint) = session.pop_checkpoint() {
                restore(session, checkpoint);
            }
        }
        Op::Reset => session.reset(),
    }
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Active symptom only ever exists inside the symptom-specific flow
    #[test]
    fn active_symptom_implies_symptom_flow(
        allow in any::<bool>(),
        ops in proptest::collection::vec(arb_op(), 0..30),
    ) {
        let mut session = Session::new(allow);
        for op in ops {
            apply(&mut session, op);
            if session.active_symptom().is_some() {
                prop_assert_eq!(session.flow(), Flow::SymptomSpecific);
            }
        }
    }

    /// With backtracking disabled the history never grows
    #[test]
    fn no_history_without_backtracking(ops in proptest::collection::vec(arb_op(), 0..30)) {
        let mut session = Session::new(false);
        for op in ops {
            apply(&mut session, op);
            prop_assert!(session.history().is_empty());
        }
    }

    /// Checkpointing adds exactly one entry when backtracking is allowed
    #[test]
    fn checkpoint_grows_history_by_one(
        ops in proptest::collection::vec(arb_op(), 0..20),
    ) {
        let mut session = Session::new(true);
        for op in ops {
            apply(&mut session, op);
        }
        let before = session.history().len();
        session.checkpoint_current();
        prop_assert_eq!(session.history().len(), before + 1);
    }

    /// A report always completes the session and empties the history
    #[test]
    fn report_is_terminal_for_history(
        ops in proptest::collection::vec(arb_op(), 0..20),
        mut response in arb_turn_response(),
    ) {
        let mut session = Session::new(true);
        for op in ops {
            apply(&mut session, op);
        }
        response.error = None;
        response.report = Some(Report::default());
        interpret(&mut session, &response);

        prop_assert!(session.is_completed());
        prop_assert!(session.history().is_empty());
        prop_assert_eq!(session.flow(), Flow::Main);
    }

    /// Popping an empty history leaves flow untouched
    #[test]
    fn empty_pop_does_not_touch_flow(
        enter in any::<bool>(),
        symptom in proptest::option::of("[a-z]{3,8}"),
    ) {
        let mut session = Session::new(true);
        if enter {
            session.enter_symptom_flow(symptom);
        }
        let before = session.clone();
        prop_assert!(session.pop_checkpoint().is_none());
        prop_assert_eq!(session, before);
    }

    /// Interpretation never touches the guard or the identity
    #[test]
    fn interpret_preserves_guard_and_identity(response in arb_turn_response()) {
        let mut session = Session::new(true);
        session.establish("s1");
        prop_assert!(session.try_begin_turn());
        interpret(&mut session, &response);
        prop_assert!(session.is_busy());
        prop_assert_eq!(session.session_id(), Some("s1"));
    }

    /// The guard admits one turn at a time whatever the interleaving
    #[test]
    fn guard_admits_one_turn(attempts in proptest::collection::vec(any::<bool>(), 1..40)) {
        let mut session = Session::default();
        let mut in_flight = 0u32;
        for finish in attempts {
            if finish && in_flight == 1 {
                session.end_turn();
                in_flight = 0;
            } else if session.try_begin_turn() {
                in_flight += 1;
            }
            prop_assert!(in_flight <= 1);
            prop_assert_eq!(session.is_busy(), in_flight == 1);
        }
    }
}
