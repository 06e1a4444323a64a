use proptest::prelude::*;
use report_lib::numeric::{
    LIST_SEPARATOR, NumericError, Rounded, format_run_lengths, round_half_even, round_half_even_str,
};

fn decimal(text: &str) -> Rounded {
    Rounded::Decimal(text.to_string())
}

#[test]
fn test_round_half_to_even_at_integer_precision() {
    assert_eq!(round_half_even(2.5, 0).unwrap(), Rounded::Integer(2));
    assert_eq!(round_half_even(3.5, 0).unwrap(), Rounded::Integer(4));
    assert_eq!(round_half_even(0.5, 0).unwrap(), Rounded::Integer(0));
    assert_eq!(round_half_even(2.6, 0).unwrap(), Rounded::Integer(3));
}

#[test]
fn test_round_half_to_even_at_two_decimals() {
    // Even digit before the five truncates, odd digit rounds up
    assert_eq!(round_half_even(2.445, 2).unwrap(), decimal("2.44"));
    assert_eq!(round_half_even(2.455, 2).unwrap(), decimal("2.46"));
    assert_eq!(round_half_even(2.449, 2).unwrap(), decimal("2.45"));
}

#[test]
fn test_five_followed_by_digits_rounds_up() {
    assert_eq!(round_half_even(2.4451, 2).unwrap(), decimal("2.45"));
    assert_eq!(round_half_even(1.0501, 1).unwrap(), decimal("1.1"));
}

#[test]
fn test_round_pads_missing_decimals() {
    assert_eq!(round_half_even(3.0, 2).unwrap(), decimal("3.00"));
    assert_eq!(round_half_even(0.1, 3).unwrap(), decimal("0.100"));
    assert_eq!(round_half_even(3.0, 2).unwrap().to_string(), "3.00");
}

#[test]
fn test_round_from_cell_text() {
    assert_eq!(round_half_even_str(" 12.345 ", 2).unwrap(), decimal("12.34"));
    assert_eq!(
        round_half_even_str("n/a", 2),
        Err(NumericError::NotANumber("n/a".to_string()))
    );
}

#[test]
fn test_run_lengths_of_mixed_runs() {
    let numbers = ["1", "3", "4", "5", "6", "13", "14", "19", "29", "30", "31", "32", "34", "40"];
    assert_eq!(
        format_run_lengths(&numbers),
        "1、3~6、13、14、19、29~32、34、40"
    );
}

#[test]
fn test_run_of_two_is_not_collapsed() {
    assert_eq!(format_run_lengths(&["7", "8"]), "7、8");
    assert_eq!(format_run_lengths(&["7", "8", "9"]), "7~9");
}

#[test]
fn test_run_lengths_ignore_reference_marker() {
    assert_eq!(format_run_lengths(&["*3", "*4", "*5", "9"]), "3~5、9");
}

#[test]
fn test_run_lengths_of_empty_and_single() {
    let empty: [&str; 0] = [];
    assert_eq!(format_run_lengths(&empty), "");
    assert_eq!(format_run_lengths(&["12"]), "12");
}

// Property-based tests using proptest
proptest! {
    #[test]
    fn test_round_integer_matches_std_for_non_ties(value in -1.0e6f64..1.0e6f64) {
        prop_assume!((value.fract().abs() - 0.5).abs() > 1e-6);
        let rounded = round_half_even(value, 0).unwrap();
        prop_assert_eq!(rounded, Rounded::Integer(value.round() as i64));
    }

    #[test]
    fn test_rounded_text_has_requested_decimals(value in -1.0e4f64..1.0e4f64, precision in 1u32..5) {
        let rounded = round_half_even(value, precision).unwrap().to_string();
        let decimals = rounded.split_once('.').map(|(_, d)| d.len());
        prop_assert_eq!(decimals, Some(precision as usize));
    }

    #[test]
    fn test_run_lengths_cover_every_number(numbers in prop::collection::btree_set(1u32..200, 1..40)) {
        let numbers: Vec<String> = numbers.iter().map(|n| n.to_string()).collect();
        let formatted = format_run_lengths(&numbers);

        let mut expanded = Vec::new();
        for entry in formatted.split(LIST_SEPARATOR) {
            match entry.split_once('~') {
                Some((start, end)) => {
                    let (start, end): (u32, u32) = (start.parse().unwrap(), end.parse().unwrap());
                    prop_assert!(end >= start + 2);
                    expanded.extend((start..=end).map(|n| n.to_string()));
                }
                None => expanded.push(entry.to_string()),
            }
        }
        prop_assert_eq!(expanded, numbers);
    }
}
