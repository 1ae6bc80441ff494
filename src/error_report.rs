//! Source-excerpt rendering for [`SyntaxError`] (§4.7 "Syntax Error
//! Reporter").
//!
//! `SyntaxError::offset`/`end_offset` (§4.1, `errors.rs`) are absolute
//! code-point positions in the full document — original-string code units,
//! matching how `original_source` indexes a Python `str` rather than a
//! byte offset — useful for programmatic consumers that want to re-slice
//! the source themselves. This module derives the
//! *display* excerpt §4.7 additionally asks for: the one line of context
//! containing the error, tab-expanded, fitted to a terminal-width budget
//! with `...` elision, plus a column pair scoped to that (possibly
//! truncated) excerpt — the pair `JSONSyntaxError.offset`/`end_offset`
//! report in `original_source/src/jsonyx/test/test_syntax_error.py`. The
//! exact truncation widths and ellipsis placement below are reverse
//! engineered from that test's `test_err_context` table, since the
//! `_decoder` extension that implements it ships compiled, not as source,
//! in this retrieval pack (see `DESIGN.md`).

use crate::errors::SyntaxError;

/// A rendered excerpt: one source line (tab-expanded, possibly truncated
/// with `...`) plus a column pair scoped to that excerpt, 1-based, with
/// `end_offset` one past the selection (§4.7 steps 1-5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Excerpt {
    pub text: String,
    pub offset: usize,
    pub end_offset: usize,
}

/// Read the rendering budget from `COLUMNS`, falling back to 80 the way
/// `shutil.get_terminal_size` does off a real tty (§4.7 step 4).
fn terminal_columns() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|&n: &usize| n > 0)
        .unwrap_or(80)
}

/// Compute the excerpt for `err`, budgeting to `COLUMNS - 4` columns
/// (§4.7 step 4's "leading indent of four spaces").
#[must_use]
pub fn excerpt(err: &SyntaxError) -> Excerpt {
    excerpt_with_budget(err, terminal_columns().saturating_sub(4).max(1))
}

/// Splits `chars` on `'\n'` into code-point slices, the way `str::split`
/// does for bytes — used so every downstream index stays a code-point
/// count, matching [`SyntaxError::offset`].
fn split_lines(chars: &[char]) -> Vec<&[char]> {
    let mut lines = Vec::new();
    let mut start = 0usize;
    for (i, &c) in chars.iter().enumerate() {
        if c == '\n' {
            lines.push(&chars[start..i]);
            start = i + 1;
        }
    }
    lines.push(&chars[start..]);
    lines
}

fn excerpt_with_budget(err: &SyntaxError, budget: usize) -> Excerpt {
    let chars: Vec<char> = err.text.chars().collect();
    let lines = split_lines(&chars);
    let mut line_start = 0usize;
    let mut line_index = 0usize;
    for (i, line) in lines.iter().enumerate() {
        let line_end = line_start + line.len();
        if err.offset <= line_end {
            line_index = i;
            break;
        }
        line_start = line_end + 1; // +1 for the consumed '\n'
        line_index = i + 1;
    }
    let line_index = line_index.min(lines.len().saturating_sub(1));
    // Recompute line_start for the chosen index (handles offset == text.len()).
    let line_start: usize = lines[..line_index].iter().map(|l| l.len() + 1).sum();
    let line: &[char] = lines[line_index];

    // Expand tabs 1-for-1 so column alignment survives (§4.7 step 3).
    let expanded: Vec<char> = line.iter().map(|&c| if c == '\t' { ' ' } else { c }).collect();
    let line_len = expanded.len();

    let end_line_index = line_index_of(&lines, err.end_offset.max(err.offset));
    let raw_start = err.offset - line_start;
    let raw_end = if end_line_index != line_index {
        // The selection spans past this line's newline: render only this
        // line, with the local end clamped to one past its last visible
        // column. When the selection itself starts at or past that point
        // (e.g. a pointer sitting on the newline), the end must still sit
        // past the start, so it wins over the line-length clamp.
        line_len.max(raw_start + 1)
    } else {
        err.end_offset.saturating_sub(line_start)
    };

    if line_len <= budget {
        return Excerpt {
            text: expanded.into_iter().collect(),
            offset: raw_start + 1,
            end_offset: raw_end + 1,
        };
    }

    build_truncated_excerpt(&expanded, line_len, raw_start, raw_end, budget)
}

fn line_index_of(lines: &[&[char]], offset: usize) -> usize {
    let mut pos = 0usize;
    for (i, line) in lines.iter().enumerate() {
        let end = pos + line.len();
        if offset <= end {
            return i;
        }
        pos = end + 1;
    }
    lines.len().saturating_sub(1)
}

/// Implements §4.7 step 4: fit the line to `budget` columns, truncating
/// with `...` (if the selection plus ellipses fits within the edges it
/// already touches) or eliding the untouched middle.
fn build_truncated_excerpt(
    chars: &[char],
    line_len: usize,
    raw_start: usize,
    raw_end: usize,
    budget: usize,
) -> Excerpt {
    let sel_start_c = raw_start.min(line_len);
    let sel_end_c = raw_end.min(line_len);
    let left_touches = sel_start_c == 0;
    let right_touches = sel_end_c == line_len;
    let left_cost = if left_touches { 0 } else { 3 };
    let right_cost = if right_touches { 0 } else { 3 };
    let window_budget = budget.saturating_sub(left_cost + right_cost);

    let raw_sel_width = raw_end as isize - raw_start as isize;

    if raw_sel_width > window_budget as isize {
        // The selection itself is wider than the room available even with
        // zero side-context: elide its own middle instead (§4.7 step 4,
        // "truncate middle" branch of the long-selection case).
        let inner_budget = window_budget.saturating_sub(3);
        let prefix_len = inner_budget.div_ceil(2);
        let suffix_len = inner_budget - prefix_len;
        let prefix: String = chars[sel_start_c..(sel_start_c + prefix_len).min(chars.len())]
            .iter()
            .collect();
        let suffix_start = sel_end_c.saturating_sub(suffix_len);
        let suffix: String = chars[suffix_start..sel_end_c].iter().collect();
        let left_ellipsis = if left_touches { "" } else { "..." };
        let right_ellipsis = if right_touches { "" } else { "..." };
        let text = format!("{left_ellipsis}{prefix}...{suffix}{right_ellipsis}");
        let offset = left_ellipsis.len() + 1;
        let end_offset = text.chars().count() + 1;
        return Excerpt {
            text,
            offset,
            end_offset,
        };
    }

    let extra_total = window_budget as isize - raw_sel_width.max(0);
    let extra_total = extra_total.max(0) as usize;
    let desired_left = extra_total / 2;
    let desired_right = extra_total - desired_left;

    let left_room = sel_start_c;
    let right_room = line_len - sel_end_c;
    let mut left_extra = desired_left.min(left_room);
    let mut right_extra = desired_right.min(right_room);
    let mut leftover = (desired_left - left_extra) + (desired_right - right_extra);
    if leftover > 0 {
        let room_left = left_room - left_extra;
        let take = leftover.min(room_left);
        left_extra += take;
        leftover -= take;
    }
    if leftover > 0 {
        let room_right = right_room - right_extra;
        let take = leftover.min(room_right);
        right_extra += take;
    }

    let window_start = sel_start_c - left_extra;
    let window_end = sel_end_c + right_extra;
    let window_text: String = chars[window_start..window_end].iter().collect();
    let left_ellipsis = if window_start > 0 { "..." } else { "" };
    let right_ellipsis = if window_end < line_len { "..." } else { "" };
    let text = format!("{left_ellipsis}{window_text}{right_ellipsis}");
    let offset = left_ellipsis.len() + raw_start.saturating_sub(window_start) + 1;
    let end_offset = left_ellipsis.len() + raw_end.saturating_sub(window_start) + 1;
    Excerpt {
        text,
        offset,
        end_offset,
    }
}

/// Render the full multi-line diagnostic (§4.7, §6 `format_syntax_error`):
/// a `File "...", line N, column N` header, the excerpt, and a caret
/// underline of the exact selection width.
#[must_use]
pub fn format_syntax_error(err: &SyntaxError) -> String {
    let Excerpt {
        text,
        offset,
        end_offset,
    } = excerpt(err);
    let caret_line = " ".repeat(offset - 1) + &"^".repeat(end_offset - offset);
    format!(
        "  File {:?}, line {}, column {}\n    {text}\n    {caret_line}\nSyntaxError: {}",
        err.filename, err.lineno, err.colno, err.msg
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err(text: &str, start: usize, end: usize) -> SyntaxError {
        SyntaxError::new("msg", "<string>", text, start, end)
    }

    fn check(budget: usize, text: &str, start: usize, end: usize, offset: usize, excerpt_text: &str, end_offset: usize) {
        let e = err(text, start, end);
        let got = excerpt_with_budget(&e, budget);
        assert_eq!(
            got,
            Excerpt {
                text: excerpt_text.to_owned(),
                offset,
                end_offset,
            },
            "budget={budget} text={text:?} start={start} end={end}"
        );
    }

    #[test]
    fn whole_short_line_no_truncation() {
        check(7, "current", 0, 7, 1, "current", 8);
        check(12, "current\nnext", 0, 7, 1, "current", 8);
        check(16, "previous\ncurrent", 9, 16, 1, "current", 8);
        check(17, "start-middle-end", 0, 5, 1, "start-middle-end", 6);
        check(8, "current\nnext", 0, 12, 1, "current", 8);
    }

    #[test]
    fn pointer_past_line_end() {
        check(8, "current", 7, 8, 8, "current", 9);
        check(8, "current\nnext", 7, 12, 8, "current", 9);
    }

    #[test]
    fn tabs_expand_one_for_one() {
        check(8, "\tcurrent", 1, 8, 2, " current", 9);
    }

    #[test]
    fn truncate_middle_single_char_selection() {
        check(7, "start-middle-end", 5, 6, 4, "...-...", 5);
    }

    #[test]
    fn truncate_middle_with_symmetric_context() {
        check(12, "start-middle-end", 7, 11, 5, "...middle...", 9);
    }

    #[test]
    fn truncate_left_only_touches_line_end() {
        check(6, "start-middle-end", 13, 16, 4, "...end", 7);
    }

    #[test]
    fn truncate_left_only_pointer_past_end() {
        check(7, "start-middle-end", 16, 17, 7, "...end", 8);
    }

    #[test]
    fn truncate_right_only_touches_line_start() {
        check(8, "start-middle-end", 0, 5, 1, "start...", 6);
    }

    #[test]
    fn elides_inside_an_overlong_selection() {
        check(13, "start-middle-end", 0, 16, 1, "start...e-end", 14);
    }

    #[test]
    fn format_syntax_error_includes_header_and_carets() {
        let e = err("line 1\nline 2", 12, 13);
        let rendered = format_syntax_error(&e);
        assert!(rendered.contains("line 2, column 6"));
        assert!(rendered.contains("line 2"));
        assert!(rendered.contains('^'));
    }

    #[test]
    fn multibyte_line_excerpt_indexes_by_code_point() {
        // "café" has a 2-byte 'é'; the byte offset of the trailing ", x"
        // must still select the one code point after it, not run past
        // the line or panic on a mid-character slice.
        let text = "café, x";
        let byte_offset = text.find(", x").unwrap();
        let e = SyntaxError::new("msg", "<string>", text, byte_offset, byte_offset + 1);
        assert_eq!(e.offset, 4); // code points: c,a,f,é -> comma at index 4
        let excerpt = excerpt_with_budget(&e, 80);
        assert_eq!(excerpt.text, text);
        assert_eq!(&excerpt.text[..], "café, x");
    }
}
