//! Property tests for indentation normalization

use proptest::prelude::*;
use xnlogo_parser::{normalize_indentation, parse_module};

fn indented_lines() -> impl Strategy<Value = Vec<(usize, String)>> {
    prop::collection::vec((0usize..12, "[a-z][a-z0-9_ ]{0,10}"), 1..6)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_normalization_is_idempotent(lines in indented_lines(), first_column in 0usize..12) {
        let text = lines
            .iter()
            .map(|(indent, body)| format!("{}{}", " ".repeat(*indent), body))
            .collect::<Vec<_>>()
            .join("\n");

        let once = normalize_indentation(&text, first_column);
        let twice = normalize_indentation(&once.text, 0);
        prop_assert_eq!(&twice.text, &once.text);
    }

    #[test]
    fn prop_normalization_preserves_relative_nesting(depth in 1usize..4, base in 0usize..9) {
        // A chain of nested `if` blocks written at an arbitrary base column
        let mut lines = Vec::new();
        for level in 0..depth {
            let indent = if level == 0 { String::new() } else { " ".repeat(base + level * 4) };
            lines.push(format!("{}if x{}:", indent, level));
        }
        lines.push(format!("{}y = 1", " ".repeat(base + depth * 4)));
        let text = lines.join("\n");

        let normalized = normalize_indentation(&text, base);
        for (level, line) in normalized.text.lines().enumerate() {
            let leading = line.len() - line.trim_start().len();
            prop_assert_eq!(leading, level * 4);
        }
        prop_assert!(parse_module(&normalized.text).is_ok());
    }
}
