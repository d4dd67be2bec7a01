//! Token Formatter - renders a table into CSS custom property lines.
//!
//! Line order must be stable run to run, otherwise regeneration would not be
//! idempotent.

use std::cmp::Ordering;

use crate::manifest::{FlatTable, ScaledTable, TokenTable};

/// Numeric keys first, ascending by value; everything else byte-wise.
pub fn compare_keys(a: &str, b: &str) -> Ordering {
    match (numeric(a), numeric(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

fn numeric(key: &str) -> Option<f64> {
    key.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// `<prefix><key>: <value>;`
pub fn format_flat(table: &FlatTable, prefix: &str) -> Vec<String> {
    let mut keys: Vec<&String> = table.keys().collect();
    keys.sort_by(|a, b| compare_keys(a, b));

    keys.into_iter()
        .map(|key| format!("{}{}: {};", prefix, key, table[key]))
        .collect()
}

/// `<prefix><scale>-<step>: <value>;`
pub fn format_scaled(table: &ScaledTable, prefix: &str) -> Vec<String> {
    let mut scales: Vec<&String> = table.keys().collect();
    scales.sort();

    let mut lines = vec![];
    for scale in scales {
        let steps = &table[scale];
        let mut keys: Vec<&String> = steps.keys().collect();
        keys.sort_by(|a, b| compare_keys(a, b));
        for step in keys {
            lines.push(format!("{}{}-{}: {};", prefix, scale, step, steps[step]));
        }
    }
    lines
}

pub fn format_table(table: &TokenTable, prefix: &str) -> Vec<String> {
    match table {
        TokenTable::Flat(t) => format_flat(t, prefix),
        TokenTable::Scaled(t) => format_scaled(t, prefix),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn flat(pairs: &[(&str, &str)]) -> FlatTable {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_numeric_keys_sort_by_value() {
        let table = flat(&[("10", "2.5rem"), ("2", "0.5rem"), ("0", "0"), ("1", "0.25rem")]);
        assert_eq!(
            format_flat(&table, "--nx-space-"),
            vec![
                "--nx-space-0: 0;",
                "--nx-space-1: 0.25rem;",
                "--nx-space-2: 0.5rem;",
                "--nx-space-10: 2.5rem;",
            ]
        );
    }

    #[test]
    fn test_named_keys_sort_lexicographically() {
        let table = flat(&[("md", "1rem"), ("control", "var(--nx-radius-sm)"), ("lg", "1.25rem")]);
        assert_eq!(
            format_flat(&table, "--nx-radius-"),
            vec![
                "--nx-radius-control: var(--nx-radius-sm);",
                "--nx-radius-lg: 1.25rem;",
                "--nx-radius-md: 1rem;",
            ]
        );
    }

    #[test]
    fn test_mixed_keys_numeric_first() {
        let table = flat(&[("xl", "a"), ("2xl", "b"), ("3", "c"), ("1.5", "d")]);
        let keys: Vec<String> = format_flat(&table, "")
            .into_iter()
            .map(|l| l.split(':').next().unwrap().to_string())
            .collect();
        assert_eq!(keys, vec!["1.5", "3", "2xl", "xl"]);
    }

    #[test]
    fn test_scaled_layout() {
        let mut table: ScaledTable = IndexMap::new();
        table.insert("titanium".into(), flat(&[("900", "t9"), ("50", "t0")]));
        table.insert("cyan".into(), flat(&[("500", "c5")]));
        assert_eq!(
            format_scaled(&table, "--nx-"),
            vec!["--nx-cyan-500: c5;", "--nx-titanium-50: t0;", "--nx-titanium-900: t9;"]
        );
    }

    #[test]
    fn test_format_is_stable() {
        let table = TokenTable::Flat(flat(&[("b", "1"), ("a", "2"), ("4", "3")]));
        assert_eq!(format_table(&table, "--x-"), format_table(&table, "--x-"));
    }
}
