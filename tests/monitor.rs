//! End-to-end tests: compiling formulas and driving monitors with event streams.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use ltl_rs::effect::{Effect, EffectKind, RecordingSink, SinkCall, TimerId};
use ltl_rs::event::{Event, ShapeKey};
use ltl_rs::{compile, Automaton, Formula, FormulaError, Proposition};

use test_log::test;

fn p(name: &str) -> Formula {
    Formula::prop(Proposition::new(name))
}

fn counter(name: &str, step: u32) -> (Formula, Rc<Cell<u32>>) {
    let value = Rc::new(Cell::new(0));
    let v = value.clone();
    let prop = Proposition::new(name).with_callback(move |_| v.set(v.get() + step));
    (Formula::prop(prop), value)
}

// ─── Compilation ───────────────────────────────────────────────────────────────

#[test]
fn eventually_has_four_states() {
    let automaton = compile(&Formula::until(Formula::truth(), p("p"))).unwrap();
    assert_eq!(automaton.states().len(), 4);

    let finals: Vec<&str> = automaton
        .states()
        .iter()
        .filter(|s| s.is_final())
        .map(|s| s.name())
        .collect();
    assert_eq!(finals, vec!["Node_6", "Node_7"]);
}

#[test]
fn contradiction_compiles_to_initial_state_only() {
    let mut automaton = compile(&Formula::and(p("p"), Formula::falsity())).unwrap();
    assert_eq!(automaton.states().len(), 1);
    assert!(automaton.state(automaton.initial_state()).out().is_empty());

    // Every event is rejected.
    automaton.accept(Event::new("p"));
    automaton.accept(Event::new("q"));
    assert!(automaton.is_at_initial());
    assert_eq!(automaton.stats().rejected, 2);
}

#[test]
fn misplaced_triggers_are_rejected() {
    let (a, _) = counter("a", 1);
    let (b, _) = counter("b", 1);

    for f in [
        Formula::and(a.clone(), b.clone()),
        Formula::until(a.clone(), b.clone()),
        Formula::release(a.clone(), Formula::next(b.clone())),
        Formula::not(a.clone()),
        Formula::and(Formula::next(a.clone()), Formula::next(b.clone())),
        Formula::and(Formula::until(p("c"), a.clone()), Formula::until(p("d"), b.clone())),
    ] {
        assert!(
            matches!(compile(&f), Err(FormulaError::TriggerPlacementViolation { .. })),
            "{} should be rejected",
            f
        );
    }

    for f in [
        Formula::or(a.clone(), b.clone()),
        Formula::and(a.clone(), p("b")),
        Formula::until(p("a"), b.clone()),
        Formula::and(a.clone(), Formula::next(b.clone())),
    ] {
        assert!(compile(&f).is_ok(), "{} should compile", f);
    }
}

#[test]
fn error_names_the_formula() {
    let (a, _) = counter("a", 1);
    let err = compile(&Formula::not(a)).err().unwrap();
    assert_eq!(err.to_string(), "misplaced trigger in formula Not(a:Trigger)");
}

// ─── Running ───────────────────────────────────────────────────────────────────

#[test]
fn next_fires_triggers_in_order() {
    let (p1, value1) = counter("p1", 1);
    let (p2, value2) = counter("p2", 2);
    let f = Formula::and(p1, Formula::next(p2));
    assert_eq!(f.to_string(), "(p1:Trigger And Next(p2:Trigger))");
    let mut automaton = compile(&f).unwrap();

    automaton.accept(Event::new("p1"));
    assert_eq!(value1.get(), 1);
    assert_eq!(value2.get(), 0);

    automaton.accept(Event::new("p2"));
    assert_eq!(value1.get(), 1);
    assert_eq!(value2.get(), 2);
    assert!(automaton.is_at_initial());

    // Replaying after the reset gives the same counts again.
    automaton.accept(Event::new("p1"));
    automaton.accept(Event::new("p2"));
    assert_eq!((value1.get(), value2.get()), (2, 4));
    assert_eq!(automaton.stats().accepted, 2);
}

#[test]
fn long_next_chain_runs_to_the_end() {
    let n = 200;
    let mut f = p("tick");
    for _ in 1..n {
        f = Formula::and(p("tick"), Formula::next(f));
    }
    let mut automaton = compile(&f).unwrap();

    for _ in 1..n {
        automaton.accept(Event::new("tick"));
    }
    assert!(!automaton.is_at_initial());
    automaton.accept(Event::new("tick"));
    assert!(automaton.is_at_initial());
    assert_eq!(automaton.stats().accepted, 1);
}

#[test]
fn nested_until_cycles_without_accepting() {
    // ((True U (p1 ∧ X p2)) U False)
    let (p1, value1) = counter("p1", 1);
    let (p2, value2) = counter("p2", 2);
    let f = Formula::until(
        Formula::until(Formula::truth(), Formula::and(p1, Formula::next(p2))),
        Formula::falsity(),
    );
    let mut automaton = compile(&f).unwrap();
    assert!(automaton.states().iter().all(|s| !s.is_final()));

    for i in 0..10 {
        value1.set(0);
        value2.set(0);
        for j in 0..=i {
            automaton.accept(Event::new("p1"));
            assert_eq!(value1.get(), j + 1);
            automaton.accept(Event::new("p2"));
            assert_eq!(value2.get(), 2 * (j + 1));
        }
    }
    assert_eq!(automaton.stats().accepted, 0);
    assert_eq!(automaton.stats().rejected, 0);
}

#[test]
fn nested_until_rejects_and_recovers() {
    let (p1, value1) = counter("p1", 1);
    let (p2, value2) = counter("p2", 1);
    let f = Formula::until(
        Formula::until(Formula::truth(), Formula::and(p1, Formula::next(p2))),
        Formula::falsity(),
    );
    let mut automaton = compile(&f).unwrap();

    automaton.accept(Event::new("p1"));
    automaton.accept(Event::new("p2"));
    assert_eq!((value1.get(), value2.get()), (1, 1));

    // p1 twice: the second one is not the expected p2.
    automaton.accept(Event::new("p1"));
    automaton.accept(Event::new("p1"));
    assert!(automaton.is_at_initial());
    assert_eq!(automaton.stats().rejected, 1);
    assert_eq!((value1.get(), value2.get()), (2, 1));

    automaton.accept(Event::new("p1"));
    automaton.accept(Event::new("p2"));
    assert_eq!((value1.get(), value2.get()), (3, 2));
}

#[test]
fn current_states_never_empty() {
    let formulas = [
        Formula::until(Formula::truth(), p("a")),
        Formula::always(Formula::implies(p("req"), Formula::next(Formula::eventually(p("ack"))))),
        Formula::release(p("a"), Formula::or(p("b"), Formula::next(p("c")))),
        Formula::and(p("a"), Formula::falsity()),
        Formula::not(Formula::until(p("a"), p("b"))),
    ];
    let stream = ["a", "b", "req", "c", "ack", "a", "a", "req", "x", "b", "ack", "c"];

    for f in formulas {
        let mut automaton = compile(&f).unwrap();
        for name in stream {
            automaton.accept(Event::new(name));
            assert!(!automaton.current_states().is_empty(), "{} lost its states on {}", f, name);
        }
        let stats = automaton.stats();
        assert_eq!(stats.events, stream.len() as u64);
    }
}

#[test]
fn selectors_and_guards_narrow_matches() {
    let left_click = Proposition::new("click")
        .on("#button")
        .with_guard(|event| event.field("button") == Some(0.0));
    let mut automaton = compile(&Formula::eventually(Formula::prop(left_click))).unwrap();

    automaton.accept(Event::on("click", "#other").with_field("button", 0.0));
    automaton.accept(Event::on("click", "#button").with_field("button", 2.0));
    automaton.accept(Event::new("click").with_field("button", 0.0));
    assert_eq!(automaton.stats().accepted, 0);

    automaton.accept(Event::on("click", "#button").with_field("button", 0.0));
    assert_eq!(automaton.stats().accepted, 1);
}

// ─── Effects ───────────────────────────────────────────────────────────────────

fn hover_intent() -> Formula {
    let enter = Proposition::new("mouseenter").on("#target");
    let exit = Proposition::new("mouseexit").on("#target");
    let timer = Effect::start_timer(Duration::from_millis(300));
    let toggle = Effect::toggle_class("#target", "hover");
    let timeout_toggle = Formula::prop(Proposition::timeout().with_trigger(toggle));

    // enter! ∧ X(¬exit U (timeout! ∧ X(True U (exit! ∧ X(¬enter U timeout!)))))
    Formula::and(
        Formula::prop(enter.clone().with_trigger(timer.clone())),
        Formula::next(Formula::until(
            Formula::not(Formula::prop(exit.clone())),
            Formula::and(
                timeout_toggle.clone(),
                Formula::next(Formula::eventually(Formula::and(
                    Formula::prop(exit.with_trigger(timer)),
                    Formula::next(Formula::until(Formula::not(Formula::prop(enter)), timeout_toggle)),
                ))),
            ),
        )),
    )
}

fn enter() -> Event {
    Event::on("mouseenter", "#target")
}

fn exit() -> Event {
    Event::on("mouseexit", "#target")
}

fn mousemove() -> Event {
    Event::on("mousemove", "#target")
}

fn fire_timeout(automaton: &mut Automaton<RecordingSink>) {
    let event = automaton.sink_mut().expire_pending().expect("a timer should be pending");
    automaton.accept(event);
}

#[test]
fn subscribes_to_each_shape_once() {
    let automaton = Automaton::compile(&hover_intent(), RecordingSink::new()).unwrap();
    let shapes: Vec<&ShapeKey> = automaton.sink().subscriptions().collect();
    // No timeout: the sink raises it itself.
    assert_eq!(
        shapes,
        vec![
            &ShapeKey::new("mouseenter", Some("#target")),
            &ShapeKey::new("mouseexit", Some("#target")),
        ]
    );
}

#[test]
fn hover_intent_toggles_twice() {
    let mut automaton = Automaton::compile(&hover_intent(), RecordingSink::new()).unwrap();
    automaton.sink_mut().drain();
    let toggle = SinkCall::Apply {
        selector: "#target".to_string(),
        kind: EffectKind::ToggleClass("hover".to_string()),
        delta: None,
    };
    let delay = Duration::from_millis(300);

    automaton.accept(enter());
    assert_eq!(automaton.pending_timer(), Some(TimerId::new(1)));
    automaton.accept(mousemove());
    fire_timeout(&mut automaton);
    assert_eq!(automaton.pending_timer(), None);
    automaton.accept(mousemove());
    automaton.accept(exit());
    automaton.accept(mousemove());
    fire_timeout(&mut automaton);

    assert_eq!(
        automaton.sink().calls(),
        &[
            SinkCall::Schedule(TimerId::new(1), delay),
            toggle.clone(),
            SinkCall::Schedule(TimerId::new(2), delay),
            toggle,
            SinkCall::Cancel(None),
        ]
    );
    assert!(automaton.is_at_initial());
    assert_eq!(automaton.pending_timer(), None);

    let stats = automaton.stats();
    assert_eq!(stats.events, 7);
    assert_eq!(stats.accepted, 1);
    assert_eq!(stats.rejected, 0);
    assert_eq!(stats.triggers_fired, 4);
}

#[test]
fn early_exit_cancels_timer() {
    let mut automaton = Automaton::compile(&hover_intent(), RecordingSink::new()).unwrap();
    automaton.sink_mut().drain();

    automaton.accept(enter());
    automaton.accept(exit());

    assert_eq!(
        automaton.sink().calls(),
        &[
            SinkCall::Schedule(TimerId::new(1), Duration::from_millis(300)),
            SinkCall::Cancel(Some(TimerId::new(1))),
        ]
    );
    assert!(automaton.is_at_initial());
    assert!(automaton.sink().pending_timeout().is_none());
    assert_eq!(automaton.stats().rejected, 1);
}

/// `go! ∧ X(timeout ∧ X idle)`, where `go!` starts a timer.
fn wait_then_idle(on_timeout: Option<Effect>) -> Formula {
    let timeout = match on_timeout {
        Some(effect) => Proposition::timeout().with_trigger(effect),
        None => Proposition::timeout(),
    };
    Formula::and(
        Formula::prop(Proposition::new("go").with_trigger(Effect::start_timer(Duration::from_millis(50)))),
        Formula::next(Formula::and(Formula::prop(timeout), Formula::next(p("idle")))),
    )
}

#[test]
fn delivered_timeout_clears_pending_timer() {
    let mut automaton = Automaton::compile(&wait_then_idle(None), RecordingSink::new()).unwrap();

    automaton.accept(Event::new("go"));
    assert_eq!(automaton.pending_timer(), Some(TimerId::new(1)));

    fire_timeout(&mut automaton);
    assert!(!automaton.is_at_initial());
    assert_eq!(automaton.pending_timer(), None);
    assert!(!automaton.dump_state().contains("Pending:"));

    automaton.accept(Event::new("idle"));
    assert!(automaton.is_at_initial());
    assert_eq!(automaton.stats().accepted, 1);
}

#[test]
fn timeout_trigger_can_restart_timer() {
    let restart = Some(Effect::start_timer(Duration::from_millis(50)));
    let mut automaton = Automaton::compile(&wait_then_idle(restart), RecordingSink::new()).unwrap();

    automaton.accept(Event::new("go"));
    fire_timeout(&mut automaton);
    assert_eq!(automaton.pending_timer(), Some(TimerId::new(2)));
    assert_eq!(automaton.sink().pending_timeout(), Some((TimerId::new(2), Duration::from_millis(50))));
}

#[test]
fn movement_tracking_reads_deltas() {
    let drag = Proposition::new("mousemove")
        .on("#handle")
        .with_trigger(Effect::track_movement("#handle", "#canvas"));
    let mut automaton = Automaton::compile(&Formula::always(Formula::prop(drag)), RecordingSink::new()).unwrap();
    automaton.sink_mut().drain();

    let moved = |x: f64, y: f64| Event::on("mousemove", "#handle").with_field("x", x).with_field("y", y);
    automaton.accept(moved(10.0, 10.0));
    automaton.accept(moved(15.0, 13.0));

    let kind = EffectKind::TrackMovement {
        container: "#canvas".to_string(),
    };
    assert_eq!(
        automaton.sink().calls(),
        &[
            SinkCall::Apply {
                selector: "#handle".to_string(),
                kind: kind.clone(),
                delta: Some((0.0, 0.0)),
            },
            SinkCall::Apply {
                selector: "#handle".to_string(),
                kind,
                delta: Some((5.0, 3.0)),
            },
        ]
    );

    // Anything else breaks the drag.
    automaton.accept(Event::on("mouseup", "#handle"));
    assert!(automaton.is_at_initial());
    assert_eq!(automaton.stats().rejected, 1);
}
