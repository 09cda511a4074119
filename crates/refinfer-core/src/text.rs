//! Text utilities for comparing rendered code fragments.
//!
//! The mapping engine compares fragments through their rendered strings.
//! This module provides the string-level primitives it needs:
//!
//! - **Common affixes**: longest common prefix/suffix of two strings
//! - **Token-bounded search**: substring containment that respects
//!   identifier boundaries
//! - **Reserved tokens**: the punctuation skeleton of a fragment
//! - **Tokenization**: whitespace splitting with the trailing-empty-token
//!   rule of the front end
//!
//! ## Offsets
//!
//! All functions operate on `&str` and return owned strings or byte
//! indices that are guaranteed to fall on `char` boundaries.

/// Characters that survive [`keep_reserved_tokens`].
pub const RESERVED_CHARACTERS: &[char] = &[
    ';', ',', '(', ')', '=', '+', '-', '>', '<', '.', ']', '[', '!', '?', ':', '&', '|', '*', '/',
    '%', '^', '~', '{', '}', '"', '\'', ' ',
];

// ============================================================================
// Common Affixes
// ============================================================================

/// Longest common prefix of `a` and `b`, compared by `char`.
pub fn longest_common_prefix(a: &str, b: &str) -> String {
    a.chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x)
        .collect()
}

/// Longest common suffix of `a` and `b`, compared by `char`.
pub fn longest_common_suffix(a: &str, b: &str) -> String {
    let mut reversed: Vec<char> = a
        .chars()
        .rev()
        .zip(b.chars().rev())
        .take_while(|(x, y)| x == y)
        .map(|(x, _)| x)
        .collect();
    reversed.reverse();
    reversed.into_iter().collect()
}

// ============================================================================
// Token-bounded Search
// ============================================================================

/// Whether `c` can be part of an identifier.
pub fn is_identifier_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Whether `sub` occurs in `complete` as a whole token.
///
/// An occurrence counts only when the characters immediately before and
/// after it (if any) are not identifier characters, so `"a"` is contained
/// in `"a.b()"` but not in `"ab.c()"`.
pub fn contains_token(complete: &str, sub: &str) -> bool {
    if sub.is_empty() {
        return false;
    }
    let mut from = 0;
    while let Some(rel) = complete[from..].find(sub) {
        let idx = from + rel;
        let end = idx + sub.len();
        let before_ok = complete[..idx]
            .chars()
            .next_back()
            .map_or(true, |c| !is_identifier_char(c));
        let after_ok = complete[end..]
            .chars()
            .next()
            .map_or(true, |c| !is_identifier_char(c));
        if before_ok && after_ok {
            return true;
        }
        // advance by one char past the match start
        let step = complete[idx..].chars().next().map_or(1, char::len_utf8);
        from = idx + step;
    }
    false
}

// ============================================================================
// Reserved Tokens
// ============================================================================

/// Keep only the reserved punctuation characters (and spaces) of `input`.
///
/// Two fragments with the same skeleton have the same shape of calls,
/// operators and literals even when every identifier differs.
pub fn keep_reserved_tokens(input: &str) -> String {
    input
        .chars()
        .filter(|c| RESERVED_CHARACTERS.contains(c))
        .collect()
}

// ============================================================================
// Tokenization
// ============================================================================

/// Split on single whitespace characters, dropping trailing empty tokens.
///
/// Leading and interior empty tokens are kept, so `"int  x"` yields
/// `["int", "", "x"]` and `"x "` yields `["x"]`. Input made only of
/// whitespace yields an empty vector; the empty string yields `[""]`.
pub fn split_whitespace_tokens(input: &str) -> Vec<&str> {
    if input.is_empty() {
        return vec![""];
    }
    let mut tokens: Vec<&str> = input.split(char::is_whitespace).collect();
    while tokens.last().is_some_and(|t| t.is_empty()) {
        tokens.pop();
    }
    tokens
}

/// Strip one pair of enclosing parentheses, if present.
pub fn strip_enclosing_parentheses(input: &str) -> &str {
    if input.len() >= 2 && input.starts_with('(') && input.ends_with(')') {
        &input[1..input.len() - 1]
    } else {
        input
    }
}

/// Whether `input` is a double-quoted string literal.
pub fn is_string_literal(input: &str) -> bool {
    input.len() >= 2 && input.starts_with('"') && input.ends_with('"')
}

/// Whether `input` reads like a static constant (no lowercase letters).
pub fn is_upper_case(input: &str) -> bool {
    input.to_uppercase() == input
}

// ============================================================================
// Edit Distance
// ============================================================================

/// Levenshtein distance between `a` and `b`, counted in `char`s.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr = vec![0; b_chars.len() + 1];
    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(curr[j] + 1);
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b_chars.len()]
}

// ============================================================================
// Tests
// ============================================================================
