//! Line-based three-way text merge.
//!
//! The default [`TextMerger`] runs the `merge3` crate over the three texts
//! and renders unresolved regions with git-style conflict markers.

use merge3::{Merge3, MergeGroup};
use serde::{Deserialize, Serialize};

/// Default length of conflict marker runs (`<<<<<<<`).
pub const DEFAULT_MARKER_SIZE: usize = 7;

/// How conflict regions are rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConflictStyle {
    /// Ours and theirs only.
    #[default]
    Merge,
    /// Ours, base and theirs.
    Diff3,
}

impl ConflictStyle {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "merge" => Some(ConflictStyle::Merge),
            "diff3" => Some(ConflictStyle::Diff3),
            _ => None,
        }
    }
}

/// Input to a [`TextMerger`].
#[derive(Debug, Clone)]
pub struct TextMergeInput<'a> {
    pub ours: &'a str,
    pub base: &'a str,
    pub theirs: &'a str,
    pub our_name: &'a str,
    pub base_name: &'a str,
    pub their_name: &'a str,
    pub format: ConflictStyle,
    pub marker_size: usize,
}

/// Output of a [`TextMerger`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextMergeOutput {
    /// Merged text, containing conflict markers unless `clean_merge`.
    pub merged_text: String,
    pub clean_merge: bool,
}

/// Merges three versions of a text.
pub trait TextMerger: Send + Sync {
    fn merge(&self, input: &TextMergeInput<'_>) -> TextMergeOutput;
}

// =============================================================================
// Merge3TextMerger
// =============================================================================

/// [`TextMerger`] backed by the `merge3` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct Merge3TextMerger;

impl TextMerger for Merge3TextMerger {
    fn merge(&self, input: &TextMergeInput<'_>) -> TextMergeOutput {
        let base_lines = split_lines(input.base);
        let our_lines = split_lines(input.ours);
        let their_lines = split_lines(input.theirs);

        let m3 = Merge3::new(&base_lines, &our_lines, &their_lines);
        let groups = m3.merge_groups();

        let mut merged = String::new();
        let mut clean_merge = true;

        for group in &groups {
            match group {
                MergeGroup::Unchanged(lines)
                | MergeGroup::Same(lines)
                | MergeGroup::A(lines)
                | MergeGroup::B(lines) => {
                    for line in lines.iter() {
                        merged.push_str(line);
                    }
                }
                MergeGroup::Conflict(base_lines, a_lines, b_lines) => {
                    clean_merge = false;
                    format_conflict(&mut merged, input, base_lines, a_lines, b_lines);
                }
            }
        }

        TextMergeOutput {
            merged_text: merged,
            clean_merge,
        }
    }
}

// =============================================================================
// Line Splitting and Formatting
// =============================================================================

/// Split text into lines, preserving line endings.
///
/// Each element includes its trailing newline (if present), which merge3
/// needs to reproduce the input exactly.
fn split_lines(text: &str) -> Vec<&str> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::new();
    let mut start = 0;

    for (i, c) in text.char_indices() {
        if c == '\n' {
            lines.push(&text[start..=i]);
            start = i + 1;
        }
    }

    if start < text.len() {
        lines.push(&text[start..]);
    }

    lines
}

fn push_lines(out: &mut String, lines: &[&str]) {
    for line in lines {
        out.push_str(line);
        if !line.ends_with('\n') {
            out.push('\n');
        }
    }
}

fn push_marker(out: &mut String, c: char, size: usize, label: Option<&str>) {
    out.extend(std::iter::repeat_n(c, size));
    if let Some(label) = label {
        out.push(' ');
        out.push_str(label);
    }
    out.push('\n');
}

/// Append one conflict region with markers labelled by the side names.
fn format_conflict(
    out: &mut String,
    input: &TextMergeInput<'_>,
    base_lines: &Option<&[&str]>,
    a_lines: &[&str],
    b_lines: &[&str],
) {
    let size = input.marker_size;

    push_marker(out, '<', size, Some(input.our_name));
    push_lines(out, a_lines);

    if input.format == ConflictStyle::Diff3 {
        push_marker(out, '|', size, Some(input.base_name));
        if let Some(base) = base_lines {
            push_lines(out, base);
        }
    }

    push_marker(out, '=', size, None);
    push_lines(out, b_lines);
    push_marker(out, '>', size, Some(input.their_name));
}
