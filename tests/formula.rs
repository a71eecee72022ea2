mod common;

use common::{counter, counter_sequence, first, random_walk, rng};
use robtl::{
    BooleanSemantics, DataStateUpdate, DistanceExpression, Error, EvolutionSequence, Perturbation,
    RelationOperator, RobustnessFormula, ThreeValuedSemantics, TruthValue,
};

/// Holds at step `s` of the counter iff `s < 4`: the perturbation bumps the
/// value two steps later, but only once it exceeds 5.
fn late_bump() -> RobustnessFormula {
    let bump = Perturbation::after(
        2,
        Perturbation::atomic(1, |_, state| {
            if state.get(0) > 5.0 {
                state.apply(&[DataStateUpdate::new(0, state.get(0) + 0.5)])
            } else {
                state.clone()
            }
        }),
    );
    let distance = DistanceExpression::max_interval(DistanceExpression::leq(first), 0, 2).unwrap();
    RobustnessFormula::atomic(bump, distance, RelationOperator::Leq, 0.25)
}

#[test]
fn atomic_formula_depends_on_step() {
    let seq = counter_sequence(4);
    let semantics = BooleanSemantics::new(2).unwrap();
    let phi = late_bump();
    let verdicts: Vec<bool> = (0..7)
        .map(|step| semantics.eval(&phi, step, &seq).unwrap())
        .collect();
    assert_eq!(verdicts, [true, true, true, true, false, false, false]);
}

#[test]
fn temporal_operators() {
    let seq = counter_sequence(4);
    let semantics = BooleanSemantics::new(1).unwrap();
    let phi = late_bump();

    let always = RobustnessFormula::always(phi.clone(), 0, 3).unwrap();
    assert!(semantics.eval(&always, 0, &seq).unwrap());
    assert!(!semantics.eval(&always, 1, &seq).unwrap());

    let broken = RobustnessFormula::negation(phi.clone());
    let soon = RobustnessFormula::eventually(broken.clone(), 0, 1).unwrap();
    let later = RobustnessFormula::eventually(broken, 2, 4).unwrap();
    assert!(!semantics.eval(&soon, 0, &seq).unwrap());
    assert!(semantics.eval(&soon, 3, &seq).unwrap());
    assert!(semantics.eval(&later, 0, &seq).unwrap());

    let until = RobustnessFormula::until(phi.clone(), 0, 6, RobustnessFormula::negation(phi)).unwrap();
    assert!(semantics.eval(&until, 0, &seq).unwrap());
}

#[test]
fn always_is_not_until_not() {
    let seq = counter_sequence(4);
    let semantics = BooleanSemantics::new(2).unwrap();
    let phi = late_bump();

    for (from, to) in [(0, 0), (0, 2), (1, 3), (2, 5)] {
        let always = RobustnessFormula::always(phi.clone(), from, to).unwrap();
        let dual = RobustnessFormula::negation(
            RobustnessFormula::until(
                RobustnessFormula::True,
                from,
                to,
                RobustnessFormula::negation(phi.clone()),
            )
            .unwrap(),
        );
        for step in 0..6 {
            assert_eq!(
                semantics.eval(&always, step, &seq).unwrap(),
                semantics.eval(&dual, step, &seq).unwrap(),
                "window [{from}, {to}] at step {step}"
            );
        }
    }
}

#[test]
fn boolean_connectives() {
    let seq = counter_sequence(2);
    let semantics = BooleanSemantics::new(1).unwrap();
    let t = RobustnessFormula::True;
    let f = RobustnessFormula::False;

    let check = |formula: RobustnessFormula| semantics.eval(&formula, 0, &seq).unwrap();
    assert!(!check(RobustnessFormula::conjunction(t.clone(), f.clone())));
    assert!(check(RobustnessFormula::disjunction(t.clone(), f.clone())));
    assert!(check(RobustnessFormula::implication(f.clone(), f.clone())));
    assert!(!check(RobustnessFormula::implication(t.clone(), f.clone())));
    assert!(!check(RobustnessFormula::until(t, 0, 3, f).unwrap()));
}

#[test]
fn deterministic_systems_get_definite_verdicts() {
    let seq = counter_sequence(4);
    let exact = BooleanSemantics::new(2).unwrap();
    let statistical = ThreeValuedSemantics::new(2, 20, 1.96).unwrap();
    let mut rng = rng(21);
    let phi = RobustnessFormula::eventually(late_bump(), 0, 2).unwrap();

    for step in 0..6 {
        let expected = TruthValue::from(exact.eval(&phi, step, &seq).unwrap());
        assert_eq!(statistical.eval(&mut rng, &phi, step, &seq).unwrap(), expected);
    }
}

#[test]
fn statistical_verdict_never_contradicts_exact_truth() {
    let seq = EvolutionSequence::new(rng(17), &random_walk(0.5, 0.1), 60);
    let phi = RobustnessFormula::atomic(
        Perturbation::offset(1, 0, 0.01),
        DistanceExpression::leq(first),
        RelationOperator::Leq,
        0.05,
    );
    let exact = BooleanSemantics::new(1).unwrap();
    let statistical = ThreeValuedSemantics::new(1, 500, 1.96).unwrap();
    let mut rng = rng(18);

    for step in 0..4 {
        assert!(exact.eval(&phi, step, &seq).unwrap());
        assert_ne!(
            statistical.eval(&mut rng, &phi, step, &seq).unwrap(),
            TruthValue::False
        );
    }
}

#[test]
fn unknown_is_absorbed_only_by_short_circuits() {
    let seq = EvolutionSequence::new(rng(30), &random_walk(0.5, 0.2), 40);
    let leq = DistanceExpression::leq(first);

    // Same samples as the perturbed sequence built by the evaluator.
    let perturbed = seq.apply(Perturbation::None, 1, 1).unwrap();
    let ci = leq.compute_ci(&mut rng(31), 1, &seq, &perturbed, 50, 1.96).unwrap();
    assert!(ci.width() > 0.0);

    let atom = RobustnessFormula::atomic(
        Perturbation::None,
        leq,
        RelationOperator::Leq,
        (ci.low + ci.high) / 2.0,
    );
    let t = RobustnessFormula::True;
    let f = RobustnessFormula::False;
    let statistical = ThreeValuedSemantics::new(1, 50, 1.96).unwrap();
    let check = |formula: RobustnessFormula| statistical.eval(&mut rng(31), &formula, 1, &seq).unwrap();

    assert_eq!(check(atom.clone()), TruthValue::Unknown);
    assert_eq!(check(RobustnessFormula::negation(atom.clone())), TruthValue::Unknown);
    assert_eq!(check(RobustnessFormula::conjunction(atom.clone(), t.clone())), TruthValue::Unknown);
    assert_eq!(check(RobustnessFormula::conjunction(atom.clone(), f.clone())), TruthValue::False);
    assert_eq!(check(RobustnessFormula::disjunction(atom.clone(), t)), TruthValue::True);
    assert_eq!(check(RobustnessFormula::disjunction(atom.clone(), f.clone())), TruthValue::Unknown);
    assert_eq!(check(RobustnessFormula::implication(f, atom)), TruthValue::True);
}

#[test]
fn malformed_window_is_a_construction_error() {
    assert!(RobustnessFormula::always(RobustnessFormula::True, 2, 1).is_err());
    assert!(RobustnessFormula::eventually(RobustnessFormula::True, 5, 0).is_err());
    assert!(
        RobustnessFormula::until(RobustnessFormula::True, 3, 2, RobustnessFormula::False).is_err()
    );
}

#[test]
fn empty_populations_are_false_exactly_and_unknown_statistically() {
    let seq = EvolutionSequence::new(rng(9), &counter(0.0, 1.0), 0);
    let window = DistanceExpression::max_interval(DistanceExpression::leq(first), 0, 1).unwrap();
    let phi = RobustnessFormula::atomic(Perturbation::None, window, RelationOperator::Leq, 0.5);

    let exact = BooleanSemantics::new(1).unwrap();
    let statistical = ThreeValuedSemantics::new(1, 10, 1.96).unwrap();
    assert!(!exact.eval(&phi, 0, &seq).unwrap());
    assert_eq!(
        statistical.eval(&mut rng(10), &phi, 0, &seq).unwrap(),
        TruthValue::Unknown
    );

    let always = RobustnessFormula::always(phi, 0, 2).unwrap();
    assert!(!exact.eval(&always, 0, &seq).unwrap());
    assert_eq!(
        statistical.eval(&mut rng(10), &always, 0, &seq).unwrap(),
        TruthValue::Unknown
    );
}

#[test]
fn reversed_windows_built_by_hand_are_evaluation_errors() {
    let seq = counter_sequence(2);
    let exact = BooleanSemantics::new(1).unwrap();
    let statistical = ThreeValuedSemantics::new(1, 10, 1.96).unwrap();
    let reversed = [
        RobustnessFormula::Always {
            arg: Box::new(RobustnessFormula::False),
            from: 3,
            to: 1,
        },
        RobustnessFormula::Eventually {
            arg: Box::new(RobustnessFormula::True),
            from: 3,
            to: 1,
        },
        RobustnessFormula::Until {
            left: Box::new(RobustnessFormula::True),
            from: 2,
            to: 0,
            right: Box::new(RobustnessFormula::True),
        },
    ];

    for formula in &reversed {
        assert!(matches!(
            exact.eval(formula, 0, &seq),
            Err(Error::MalformedWindow { .. })
        ));
        assert!(matches!(
            statistical.eval(&mut rng(11), formula, 0, &seq),
            Err(Error::MalformedWindow { .. })
        ));
    }
}
