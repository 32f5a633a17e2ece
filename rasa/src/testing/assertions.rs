//! Test assertions for pipeline states.

use crate::state::State;

/// Asserts that every key of `before` not listed in `touched` is unchanged
/// in `after`.
pub fn assert_preserves_untouched(before: &State, after: &State, touched: &[&str]) {
    for key in before.keys() {
        if touched.contains(&key.as_str()) {
            continue;
        }
        assert_eq!(
            before.get(key),
            after.get(key),
            "Expected key '{key}' to be preserved"
        );
    }
}

/// Asserts that exactly the keys in `expected` changed between the two
/// states, in any order.
pub fn assert_changed_keys(before: &State, after: &State, expected: &[&str]) {
    let mut changed = before.changed_keys(after);
    changed.sort();
    let mut expected: Vec<String> = expected.iter().map(|key| (*key).to_string()).collect();
    expected.sort();
    assert_eq!(changed, expected, "Unexpected set of changed keys");
}

/// Asserts that `output` equals `expected`.
pub fn assert_output(state: &State, expected: &str) {
    assert_eq!(
        state.output(),
        Some(expected),
        "Expected output {expected:?}, got {:?}",
        state.output()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_preservation_passes() {
        let before = State::new()
            .with_field("itinerary", json!(1))
            .with_field("output", json!("a"));
        let after = before.clone().with_field("output", json!("b"));

        assert_preserves_untouched(&before, &after, &["output"]);
        assert_changed_keys(&before, &after, &["output"]);
        assert_output(&after, "b");
    }

    #[test]
    #[should_panic(expected = "Expected key 'itinerary' to be preserved")]
    fn test_preservation_fails_on_change() {
        let before = State::new().with_field("itinerary", json!(1));
        let after = State::new().with_field("itinerary", json!(2));

        assert_preserves_untouched(&before, &after, &[]);
    }
}
