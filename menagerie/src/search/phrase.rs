//! Phrase-prefix matching with slop
//!
//! A phrase-prefix query requires every query token to appear in the field,
//! close together, with the last query token allowed to be a prefix of the
//! field token it lands on. Closeness is bounded by the slop: all matched
//! tokens must fit in a window of `tokens + slop - 1` consecutive positions,
//! in any order inside that window.

use std::collections::HashMap;

/// Split text into lowercase alphanumeric tokens
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// A tokenized phrase-prefix query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhrasePrefix {
    terms: Vec<String>,
    slop: usize,
}

impl PhrasePrefix {
    pub fn new(term: &str, slop: usize) -> Self {
        PhrasePrefix {
            terms: tokenize(term),
            slop,
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn slop(&self) -> usize {
        self.slop
    }

    /// A query with no tokens matches everything
    pub fn is_match_all(&self) -> bool {
        self.terms.is_empty()
    }

    /// FTS5 expression selecting candidate rows: all tokens present, last as prefix
    ///
    /// Returns `None` for a match-all query. Candidates still need
    /// [`PhrasePrefix::matches`] to check positions.
    pub fn fts_expression(&self) -> Option<String> {
        let (last, head) = self.terms.split_last()?;
        let mut parts: Vec<String> = head.iter().map(|t| format!("\"{}\"", t)).collect();
        parts.push(format!("\"{}\"*", last));
        Some(parts.join(" AND "))
    }

    /// Whether `text` satisfies the query
    pub fn matches(&self, text: &str) -> bool {
        let Some((last, head)) = self.terms.split_last() else {
            return true;
        };

        let tokens = tokenize(text);
        let n = self.terms.len();
        if tokens.len() < n {
            return false;
        }

        let mut needed: HashMap<&str, usize> = HashMap::new();
        for term in head {
            *needed.entry(term.as_str()).or_default() += 1;
        }

        let window = n + self.slop.saturating_sub(1);
        (0..=tokens.len() - n).any(|start| {
            let end = (start + window).min(tokens.len());
            window_matches(&tokens[start..end], &needed, last)
        })
    }
}

/// Every exact term fits in `window` with a token to spare for the prefix
///
/// Exact terms only ever land on equal tokens, so counting is enough: the
/// prefix term needs one token it starts, left over once the exact terms
/// have taken their share.
fn window_matches(window: &[String], needed: &HashMap<&str, usize>, last: &str) -> bool {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for token in window {
        *counts.entry(token.as_str()).or_default() += 1;
    }

    let covered = needed
        .iter()
        .all(|(term, need)| counts.get(term).copied().unwrap_or(0) >= *need);

    covered
        && counts.iter().any(|(token, count)| {
            token.starts_with(last) && *count > needed.get(token).copied().unwrap_or(0)
        })
}
