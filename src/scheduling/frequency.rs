//! Frequency classifier: free-text prescription frequency → calls per day.
//!
//! First matching rule wins; matching is case-insensitive substring search,
//! so "24 hours" hits the "2" rule before the "4" rule is consulted.

/// Ordered rule table: (needles, calls per day).
const FREQUENCY_RULES: &[(&[&str], u32)] = &[
    (&["twice", "2"], 2),
    (&["thrice", "three", "3"], 3),
    (&["four", "4"], 4),
];

/// Anything unmatched ("once", "daily", "", gibberish) is one call a day.
pub const DEFAULT_CALLS_PER_DAY: u32 = 1;

/// Classify a frequency description. Total: every input yields 1..=4.
pub fn classify_frequency(frequency: &str) -> u32 {
    let lower = frequency.to_lowercase();
    FREQUENCY_RULES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lower.contains(n)))
        .map(|(_, calls)| *calls)
        .unwrap_or(DEFAULT_CALLS_PER_DAY)
}
