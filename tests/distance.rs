mod common;

use common::{counter, counter_sequence, first, random_walk, rng};
use robtl::{
    ConfidenceInterval, DistanceExpression, Error, EvolutionSequence, Perturbation,
    RelationOperator,
};

/// Nominal counter and its copy where 0.5 is added from step 3 on.
fn bumped() -> (
    EvolutionSequence<common::Sys>,
    EvolutionSequence<common::Sys>,
) {
    let seq = counter_sequence(4);
    let perturbed = seq
        .apply(Perturbation::after(1, Perturbation::offset(1, 0, 0.5)), 2, 2)
        .unwrap();
    (seq, perturbed)
}

#[test]
fn self_distance_is_zero() {
    let seq = EvolutionSequence::new(rng(2), &random_walk(0.5, 0.2), 50);
    let distance = DistanceExpression::absolute(first);
    for step in 0..5 {
        assert_eq!(distance.compute(step, &seq, &seq), Ok(0.0));
    }
}

#[test]
fn atomic_distances() {
    let (seq, perturbed) = bumped();
    let leq = DistanceExpression::leq(first);
    let geq = DistanceExpression::geq(first);
    let abs = DistanceExpression::absolute(first);

    assert_eq!(leq.compute(2, &seq, &perturbed), Ok(0.0));
    assert_eq!(leq.compute(3, &seq, &perturbed), Ok(0.5));
    assert_eq!(geq.compute(3, &seq, &perturbed), Ok(0.0));
    assert_eq!(geq.compute(3, &perturbed, &perturbed), Ok(0.0));
    assert_eq!(abs.compute(4, &seq, &perturbed), Ok(0.5));
}

#[test]
fn max_and_min() {
    let (seq, perturbed) = bumped();
    let leq = DistanceExpression::leq(first);
    let geq = DistanceExpression::geq(first);

    let max = DistanceExpression::max(leq.clone(), geq.clone());
    let min = DistanceExpression::min(leq, geq);
    assert_eq!(max.compute(3, &seq, &perturbed), Ok(0.5));
    assert_eq!(min.compute(3, &seq, &perturbed), Ok(0.0));
}

#[test]
fn interval_distances() {
    let (seq, perturbed) = bumped();
    let leq = DistanceExpression::leq(first);

    let max = DistanceExpression::max_interval(leq.clone(), 0, 2).unwrap();
    let min = DistanceExpression::min_interval(leq.clone(), 0, 2).unwrap();
    assert_eq!(max.compute(2, &seq, &perturbed), Ok(0.5));
    assert_eq!(min.compute(2, &seq, &perturbed), Ok(0.0));
    assert_eq!(min.compute(3, &seq, &perturbed), Ok(0.5));
    assert_eq!(max.horizon(), 2);
}

#[test]
fn until_folds_over_the_window() {
    let (seq, perturbed) = bumped();
    let left = DistanceExpression::absolute(first);
    let right = DistanceExpression::max_interval(DistanceExpression::leq(first), 0, 1).unwrap();

    let until = DistanceExpression::until(left.clone(), 0, 2, right.clone()).unwrap();
    assert_eq!(until.compute(2, &seq, &perturbed), Ok(0.5));

    let until = DistanceExpression::until(left, 0, 0, right).unwrap();
    assert_eq!(until.compute(2, &seq, &perturbed), Ok(0.0));
}

#[test]
fn threshold_reports_excess() {
    let (seq, perturbed) = bumped();
    let leq = DistanceExpression::leq(first);

    let above = DistanceExpression::threshold(leq.clone(), RelationOperator::Leq, 0.25);
    assert_eq!(above.compute(3, &seq, &perturbed), Ok(0.25));
    assert_eq!(above.compute(2, &seq, &perturbed), Ok(0.0));

    let below = DistanceExpression::threshold(leq, RelationOperator::Geq, 0.75);
    assert_eq!(below.compute(3, &seq, &perturbed), Ok(0.25));
}

#[test]
fn convex_combination() {
    let (seq, perturbed) = bumped();
    let combination = DistanceExpression::convex_combination(
        vec![0.5, 0.5],
        vec![DistanceExpression::leq(first), DistanceExpression::geq(first)],
    )
    .unwrap();
    assert_eq!(combination.compute(3, &seq, &perturbed), Ok(0.25));

    assert!(
        DistanceExpression::convex_combination(vec![1.0], vec![]).is_err()
    );
}

#[test]
fn malformed_windows_are_rejected() {
    let leq = DistanceExpression::leq(first);
    assert!(matches!(
        DistanceExpression::max_interval(leq.clone(), 3, 1),
        Err(Error::MalformedWindow { from: 3, to: 1 })
    ));
    assert!(DistanceExpression::until(leq.clone(), 2, 0, leq).is_err());
}

#[test]
fn incompatible_sequences_are_rejected() {
    let seq = counter_sequence(4);
    let other = EvolutionSequence::new(rng(0), &counter(0.0, 1.0), 6);
    assert_eq!(
        DistanceExpression::leq(first).compute(1, &seq, &other),
        Err(Error::SizeMismatch { this: 4, other: 6 })
    );
}

#[test]
fn confidence_intervals_of_deterministic_sequences_are_points() {
    let (seq, perturbed) = bumped();
    let mut rng = rng(12);
    let leq = DistanceExpression::leq(first);
    let window = DistanceExpression::max_interval(leq.clone(), 0, 2).unwrap();

    assert_eq!(
        leq.compute_ci(&mut rng, 3, &seq, &perturbed, 20, 1.96),
        Ok(ConfidenceInterval::point(0.5))
    );
    assert_eq!(
        window.compute_ci(&mut rng, 2, &seq, &perturbed, 20, 1.96),
        Ok(ConfidenceInterval::point(0.5))
    );
}

#[test]
fn confidence_interval_contains_exact_distance() {
    let seq = EvolutionSequence::new(rng(6), &random_walk(0.5, 0.1), 100);
    let perturbed = seq
        .apply(Perturbation::offset(1, 0, 0.2), 1, 1)
        .unwrap();
    let leq = DistanceExpression::leq(first);

    let exact = leq.compute(1, &seq, &perturbed).unwrap();
    let ci = leq
        .compute_ci(&mut rng(13), 1, &seq, &perturbed, 200, 3.0)
        .unwrap();
    assert!(ci.contains(exact), "{exact} not in {ci:?}");
}

#[test]
fn empty_populations_give_nan_everywhere() {
    let seq = EvolutionSequence::new(rng(3), &counter(0.0, 1.0), 0);
    let perturbed = seq.apply(Perturbation::None, 0, 1).unwrap();
    let leq = DistanceExpression::leq(first);
    let window = DistanceExpression::max_interval(leq.clone(), 0, 1).unwrap();
    let expressions = [
        DistanceExpression::max(leq.clone(), DistanceExpression::geq(first)),
        DistanceExpression::min_interval(leq.clone(), 0, 2).unwrap(),
        window.clone(),
        DistanceExpression::until(leq.clone(), 0, 1, window.clone()).unwrap(),
        DistanceExpression::threshold(window, RelationOperator::Leq, 0.5),
        DistanceExpression::threshold(leq, RelationOperator::Lt, 0.5),
    ];

    let mut rng = rng(4);
    for expression in &expressions {
        let exact = expression.compute(0, &seq, &perturbed).unwrap();
        assert!(exact.is_nan(), "{expression:?} gave {exact}");
        let ci = expression
            .compute_ci(&mut rng, 0, &seq, &perturbed, 10, 1.96)
            .unwrap();
        assert!(ci.low.is_nan() && ci.high.is_nan(), "{expression:?} gave {ci:?}");
    }
}

#[test]
fn reversed_windows_built_by_hand_are_rejected() {
    let (seq, perturbed) = bumped();
    let leq = DistanceExpression::leq(first);
    let reversed = [
        DistanceExpression::MaxInterval {
            arg: Box::new(leq.clone()),
            from: 3,
            to: 1,
        },
        DistanceExpression::MinInterval {
            arg: Box::new(leq.clone()),
            from: 3,
            to: 1,
        },
        DistanceExpression::Until {
            left: Box::new(leq.clone()),
            from: 2,
            to: 0,
            right: Box::new(leq),
        },
    ];

    let mut rng = rng(8);
    for expression in &reversed {
        assert!(matches!(
            expression.compute(2, &seq, &perturbed),
            Err(Error::MalformedWindow { .. })
        ));
        assert!(matches!(
            expression.compute_ci(&mut rng, 2, &seq, &perturbed, 10, 1.96),
            Err(Error::MalformedWindow { .. })
        ));
    }
}
