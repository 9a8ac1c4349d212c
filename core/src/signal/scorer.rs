use std::collections::HashMap;

/// Pure function: log lines + weight table -> numeric score via substring
/// matching. Deterministic for a given (lines, weight table) pair.
pub fn score(lines: &[String], weights: &HashMap<String, f64>) -> f64 {
    let joined = lines.join("\n").to_lowercase();
    let mut total = 0.0;

    for (name, weight) in weights {
        let needle = name.to_lowercase();
        if joined.contains(&needle) {
            total += weight;
        }
    }

    let has = |needle: &str| joined.contains(needle);

    if has("buyexactin") {
        total += if has("mintto") || has("initializemint") { 0.6 } else { 0.2 };
    }

    if has("mintto") {
        total += if has("initializevirtualpoolwithsplttoken") || has("initializemint2") {
            0.7
        } else {
            0.4
        };
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weights() -> HashMap<String, f64> {
        HashMap::from([("create".to_string(), 1.0), ("initialize".to_string(), 0.5)])
    }

    #[test]
    fn sums_matching_weights() {
        let lines = vec!["Program log: Instruction: Create".to_string()];
        assert_eq!(score(&lines, &weights()), 1.0);
    }

    #[test]
    fn is_deterministic() {
        let lines = vec!["Program log: Instruction: Initialize".to_string()];
        let w = weights();
        assert_eq!(score(&lines, &w), score(&lines, &w));
    }

    #[test]
    fn case_insensitive_match() {
        let lines = vec!["CREATE something".to_string()];
        assert_eq!(score(&lines, &weights()), 1.0);
    }

    #[test]
    fn buy_exact_in_bonus_low_without_mint_context() {
        let lines = vec!["Program log: Instruction: buyExactIn".to_string()];
        assert_eq!(score(&lines, &HashMap::new()), 0.2);
    }

    #[test]
    fn buy_exact_in_bonus_high_with_mint_context() {
        let lines = vec!["Program log: Instruction: buyExactIn mintTo".to_string()];
        assert_eq!(score(&lines, &HashMap::new()), 0.6 + 0.4);
    }
}
