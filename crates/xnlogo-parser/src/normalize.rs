//! Indentation normalization for extracted statement text
//!
//! A statement cut out of a method body keeps the column offsets it had in
//! the file. Before it can be parsed on its own, its continuation lines are
//! shifted left so the statement starts at column zero while nested blocks
//! keep their relative depth.

use xnlogo_core::SourceLocation;

/// Normalized fragment and how much was removed from each line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Normalized {
    pub text: String,
    /// Whitespace characters removed from each line, first line included
    pub stripped: Vec<usize>,
}

/// Dedent `text`, whose first character sat at 0-based `first_column`.
///
/// Every line after the first loses `min(first_column, m)` leading
/// whitespace characters, where `m` is the smallest indentation among the
/// non-blank lines after the first. A line never loses more than its own
/// leading whitespace. The first line loses its own leading whitespace.
pub fn normalize_indentation(text: &str, first_column: usize) -> Normalized {
    let lines: Vec<&str> = text.split('\n').collect();

    let rest_min = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| leading_whitespace(line))
        .min();
    let amount = rest_min.map_or(first_column, |m| m.min(first_column));

    let mut out = Vec::with_capacity(lines.len());
    let mut stripped = Vec::with_capacity(lines.len());
    for (index, line) in lines.iter().enumerate() {
        let own = leading_whitespace(line);
        let remove = if index == 0 { own } else { own.min(amount) };
        out.push(skip_chars(line, remove));
        stripped.push(remove);
    }

    Normalized {
        text: out.join("\n"),
        stripped,
    }
}

/// Maps positions inside a normalized fragment back to file positions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMap {
    origin: SourceLocation,
    stripped: Vec<usize>,
}

impl LineMap {
    /// Positions are already file positions
    pub fn identity() -> Self {
        Self {
            origin: SourceLocation::new(1, 1),
            stripped: Vec::new(),
        }
    }

    /// `origin` is the file position of the fragment's first character
    /// before normalization
    pub fn new(origin: SourceLocation, stripped: Vec<usize>) -> Self {
        Self { origin, stripped }
    }

    pub fn map(&self, location: SourceLocation) -> SourceLocation {
        let removed = self
            .stripped
            .get(location.line.saturating_sub(1))
            .copied()
            .unwrap_or(0);
        if location.line == 1 {
            let start = SourceLocation::new(self.origin.line, self.origin.column + removed);
            location.rebase(start, 0)
        } else {
            location.rebase(self.origin, removed)
        }
    }
}

fn leading_whitespace(line: &str) -> usize {
    line.chars().take_while(|c| *c == ' ' || *c == '\t').count()
}

fn skip_chars(line: &str, count: usize) -> &str {
    match line.char_indices().nth(count) {
        Some((offset, _)) => &line[offset..],
        None => "",
    }
}
