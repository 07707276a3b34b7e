// SPDX-FileCopyrightText: 2026 Todobridge Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Heuristic extraction of who a discussion assigns the task to.

/// Phrases that introduce an assignee, checked in this order.
const ASSIGNEE_PHRASES: &[&str] = &[
    "назначить",
    "ответственный",
    "исполнитель",
    "поручить",
    "assign to",
    "responsible",
    "assignee",
];

/// Returns the first `@handle`, or else the word that follows the first
/// assignee phrase found (matched case-insensitively, returned as written).
pub fn extract_assignee(text: &str) -> Option<String> {
    if let Some(handle) = text
        .split_whitespace()
        .find(|word| word.starts_with('@') && word.len() > 1)
    {
        return Some(handle.to_string());
    }

    let folded = CaseFolded::new(text);
    ASSIGNEE_PHRASES.iter().find_map(|phrase| {
        let end = folded.find_end(phrase)?;
        text[end..].split_whitespace().next().map(str::to_string)
    })
}

/// Lowercased copy of a string that remembers where each byte came from,
/// so matches can be mapped back onto the original text.
struct CaseFolded {
    lower: String,
    /// For every byte of `lower`, the end offset of its source char.
    source_end: Vec<usize>,
}

impl CaseFolded {
    fn new(text: &str) -> Self {
        let mut lower = String::with_capacity(text.len());
        let mut source_end = Vec::with_capacity(text.len());
        for (start, c) in text.char_indices() {
            let end = start + c.len_utf8();
            for lc in c.to_lowercase() {
                lower.push(lc);
                source_end.extend(std::iter::repeat_n(end, lc.len_utf8()));
            }
        }
        Self { lower, source_end }
    }

    /// Byte offset in the original text just past the first match of
    /// `needle` (which must already be lowercase).
    fn find_end(&self, needle: &str) -> Option<usize> {
        let start = self.lower.find(needle)?;
        let last = start + needle.len() - 1;
        self.source_end.get(last).copied()
    }
}
