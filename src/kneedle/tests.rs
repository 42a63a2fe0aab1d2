use super::*;

const SCENARIO_C: [f64; 10] = [1.0, 1.0, 1.0, 1.0, 2.0, 3.0, 50.0, 51.0, 52.0, 53.0];

fn params() -> KneeParams {
    KneeParams::default()
}

#[test]
fn concave_increasing_knee_sits_at_top_of_jump() {
    let knee = find_knee(&SCENARIO_C, Curve::Concave, Direction::Increasing, &params())
        .expect("knee should exist");

    assert_eq!(knee.index, 6);
    assert_eq!(knee.value, 50.0);
}

#[test]
fn convex_increasing_knee_sits_at_bottom_of_jump() {
    let knee = find_knee(&SCENARIO_C, Curve::Convex, Direction::Increasing, &params())
        .expect("knee should exist");

    assert_eq!(knee.index, 5);
    assert_eq!(knee.value, 3.0);
}

#[test]
fn decreasing_polarities_find_nothing_on_sorted_input() {
    for curve in [Curve::Concave, Curve::Convex] {
        assert!(find_knee(&SCENARIO_C, curve, Direction::Decreasing, &params()).is_none());
    }
}

#[test]
fn threshold_prefers_concave_increasing() {
    assert_eq!(
        find_threshold(&SCENARIO_C, &params()),
        ThresholdOutcome::Found {
            value: 50.0,
            index: 6,
            curve: Curve::Concave,
            direction: Direction::Increasing,
        }
    );
}

#[test]
fn threshold_falls_back_to_convex_for_accelerating_curve() {
    let squares = (0..10).map(|i| (i * i) as f64).collect::<Vec<f64>>();

    assert!(find_knee(&squares, Curve::Concave, Direction::Increasing, &params()).is_none());
    assert_eq!(
        find_threshold(&squares, &params()),
        ThresholdOutcome::Found {
            value: 16.0,
            index: 4,
            curve: Curve::Convex,
            direction: Direction::Increasing,
        }
    );
}

#[test]
fn input_order_does_not_matter() {
    let shuffled = [52.0, 1.0, 3.0, 50.0, 1.0, 53.0, 2.0, 1.0, 51.0, 1.0];
    assert_eq!(
        find_threshold(&shuffled, &params()),
        find_threshold(&SCENARIO_C, &params())
    );
}

#[test]
fn saturating_curve_has_knee_at_bend() {
    let values = [10.0, 40.0, 60.0, 70.0, 75.0, 78.0, 80.0, 81.0, 82.0];
    let knee = find_knee(&values, Curve::Concave, Direction::Increasing, &params())
        .expect("knee should exist");

    assert_eq!(knee.index, 3);
    assert_eq!(knee.value, 70.0);
}

#[test]
fn straight_line_has_no_knee() {
    assert_eq!(
        find_threshold(&[1.0, 2.0, 3.0, 4.0, 5.0], &params()),
        ThresholdOutcome::NotFound
    );
}

#[test]
fn constant_sequence_has_no_knee() {
    assert_eq!(
        find_threshold(&[5.0, 5.0, 5.0, 5.0], &params()),
        ThresholdOutcome::NotFound
    );
}

#[test]
fn short_sequences_have_no_knee() {
    assert_eq!(find_threshold(&[], &params()), ThresholdOutcome::NotFound);
    assert_eq!(find_threshold(&[1.0, 9.0], &params()), ThresholdOutcome::NotFound);
    assert_eq!(find_threshold(&[1.0, 2.0, 3.0], &params()), ThresholdOutcome::NotFound);
    assert_eq!(find_threshold(&[1.0, 5.0, 6.0], &params()), ThresholdOutcome::NotFound);
}

#[test]
fn non_finite_values_are_ignored() {
    let mut values = SCENARIO_C.to_vec();
    values.push(f64::NAN);
    values.push(f64::INFINITY);

    assert_eq!(
        find_threshold(&values, &params()),
        find_threshold(&SCENARIO_C, &params())
    );
}

#[test]
fn polynomial_smoothing_reports_original_values() {
    let smoothed = KneeParams {
        smoothing: Smoothing::Polynomial {
            degree: DEFAULT_POLYNOMIAL_DEGREE,
        },
        ..KneeParams::default()
    };

    let knee = find_knee(&SCENARIO_C, Curve::Concave, Direction::Increasing, &smoothed)
        .expect("knee should exist");
    assert_eq!(knee.index, 7);
    assert_eq!(knee.value, SCENARIO_C[7]);
}

#[test]
fn polynomial_fit_reproduces_exact_polynomial() {
    let squares = (0..10).map(|i| (i * i) as f64).collect::<Vec<f64>>();
    let fitted = polynomial_fit(&squares, 2).expect("fit should succeed");

    for (expected, actual) in squares.iter().zip(&fitted) {
        assert!((expected - actual).abs() < 1e-9, "{expected} vs {actual}");
    }
}

#[test]
fn polynomial_degree_is_capped_by_point_count() {
    let values = [3.0, 9.0, 4.0];
    let fitted = polynomial_fit(&values, 12).expect("fit should succeed");

    for (expected, actual) in values.iter().zip(&fitted) {
        assert!((expected - actual).abs() < 1e-9);
    }
}

#[test]
fn outcome_serializes_with_status_tag() {
    let found = serde_json::to_value(find_threshold(&SCENARIO_C, &params())).expect("serialize");
    assert_eq!(found["status"], "found");
    assert_eq!(found["curve"], "concave");
    assert_eq!(found["direction"], "increasing");
    assert_eq!(found["value"], 50.0);

    let missing = serde_json::to_value(ThresholdOutcome::NotFound).expect("serialize");
    assert_eq!(missing, serde_json::json!({ "status": "not_found" }));
}
