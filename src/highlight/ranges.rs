//! Line-range emphasis annotations for fenced code blocks.
//!
//! A fence info string may carry a highlight annotation after the language
//! tag, e.g. ` ```rust {1,3-5} `. The braced list names 1-based lines to
//! emphasize: single numbers or inclusive `start-end` ranges, separated by
//! commas.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

/// Matches the first braced group in an annotation. Nested braces are not
/// supported; the group ends at the first `}`.
fn brace_group() -> &'static Regex {
    static BRACE_GROUP: OnceLock<Regex> = OnceLock::new();
    BRACE_GROUP.get_or_init(|| Regex::new(r"\{([^}]*)\}").expect("brace group pattern"))
}

/// Parse a highlight annotation into the set of line numbers to emphasize.
///
/// `total_lines` is authoritative: every returned value lies in
/// `[1, total_lines]` even when the annotation names larger numbers.
/// Malformed tokens are skipped rather than reported; a broken annotation
/// must never keep the rest of a document from rendering.
///
/// Ranges and single values are clipped differently: a range running past
/// the end keeps its in-bounds prefix (`{1-100}` over 5 lines gives 1..=5),
/// while an out-of-range single value is dropped whole (`{50}` over 5 lines
/// gives nothing). A reversed range (`{5-2}`) names no lines.
pub fn parse_highlight_ranges(meta: Option<&str>, total_lines: usize) -> HashSet<usize> {
    let mut highlighted = HashSet::new();

    let Some(meta) = meta.filter(|m| !m.is_empty()) else {
        return highlighted;
    };
    let Some(group) = brace_group().captures(meta) else {
        return highlighted;
    };

    for token in group[1].split(',') {
        let token = token.trim();
        if let Some((start, end)) = token.split_once('-') {
            let (Ok(start), Ok(end)) = (start.trim().parse::<usize>(), end.trim().parse::<usize>())
            else {
                continue;
            };
            for line in start..=end.min(total_lines) {
                if line >= 1 {
                    highlighted.insert(line);
                }
            }
        } else if let Ok(line) = token.parse::<usize>() {
            if (1..=total_lines).contains(&line) {
                highlighted.insert(line);
            }
        }
    }

    highlighted
}
