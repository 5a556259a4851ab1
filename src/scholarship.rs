// Monthly amounts in BYN for each grade-average bracket.
pub const TIER_5_0_5_9: f64 = 157.18;
pub const TIER_6_0_7_9: f64 = 188.61;
pub const TIER_8_0_8_9: f64 = 220.05;
pub const TIER_9_0_10_0: f64 = 251.48;

/// Flat supplement added on top of the merit amount for social-aid students.
pub const SOCIAL_SUPPLEMENT: f64 = 100.0;

/// Missing this many class hours in a semester suspends the merit stipend.
pub const MISSED_HOURS_LIMIT: u32 = 12;

pub fn amount_for_grade(average: f64) -> f64 {
    if (9.0..=10.0).contains(&average) {
        TIER_9_0_10_0
    } else if (8.0..9.0).contains(&average) {
        TIER_8_0_8_9
    } else if (6.0..8.0).contains(&average) {
        TIER_6_0_7_9
    } else if (5.0..6.0).contains(&average) {
        TIER_5_0_5_9
    } else {
        0.0
    }
}

pub fn bracket_label(average: f64) -> &'static str {
    if (9.0..=10.0).contains(&average) {
        "9.0 - 10.0"
    } else if (8.0..9.0).contains(&average) {
        "8.0 - 8.9"
    } else if (6.0..8.0).contains(&average) {
        "6.0 - 7.9"
    } else if (5.0..6.0).contains(&average) {
        "5.0 - 5.9"
    } else {
        "No scholarship"
    }
}

#[test]
fn test_bracket_boundaries() {
    assert_eq!(amount_for_grade(10.0), TIER_9_0_10_0);
    assert_eq!(amount_for_grade(9.0), TIER_9_0_10_0);
    assert_eq!(amount_for_grade(8.99), TIER_8_0_8_9);
    assert_eq!(amount_for_grade(8.0), TIER_8_0_8_9);
    assert_eq!(amount_for_grade(7.99), TIER_6_0_7_9);
    assert_eq!(amount_for_grade(6.0), TIER_6_0_7_9);
    assert_eq!(amount_for_grade(5.99), TIER_5_0_5_9);
    assert_eq!(amount_for_grade(5.0), TIER_5_0_5_9);
    assert_eq!(amount_for_grade(4.99), 0.0);
    assert_eq!(amount_for_grade(0.0), 0.0);
    // Out-of-range grades fall outside every bracket.
    assert_eq!(amount_for_grade(10.5), 0.0);
    assert_eq!(amount_for_grade(-1.0), 0.0);
}

#[test]
fn test_amounts_non_decreasing() {
    let mut previous = 0.0;
    for step in 0..=100 {
        let amount = amount_for_grade(f64::from(step) / 10.0);
        assert!(amount >= previous, "amount decreased at grade {}", step);
        previous = amount;
    }
}

#[test]
fn test_bracket_labels() {
    assert_eq!(bracket_label(9.5), "9.0 - 10.0");
    assert_eq!(bracket_label(8.2), "8.0 - 8.9");
    assert_eq!(bracket_label(7.0), "6.0 - 7.9");
    assert_eq!(bracket_label(5.5), "5.0 - 5.9");
    assert_eq!(bracket_label(3.0), "No scholarship");
}
