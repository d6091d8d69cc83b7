//! Tokenizer for the single input line of whitespace-separated integers.

/// Parse every integer on the line, silently skipping tokens that are not
/// valid integers.
pub fn parse_line(line: &str) -> Vec<i64> {
    line.split_whitespace()
        .filter_map(|token| token.parse::<i64>().ok())
        .collect()
}
