//! Choosing which part of a long diff to show.

use crate::result::{DiffLine, DiffResult};

/// Context kept around the changed region before trimming.
const FOCUS_CONTEXT_LINES: usize = 3;

/// A contiguous slice of a diff chosen to fit a line budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusWindow<'a> {
    /// Lines to show.
    pub lines: &'a [DiffLine],

    /// Lines left out above the window.
    pub hidden_before: usize,

    /// Lines left out below the window.
    pub hidden_after: usize,
}

impl DiffResult {
    /// Pick at most `max_lines` lines, centred on the changes.
    ///
    /// Short diffs are returned whole. Otherwise the window spans the first
    /// to last change plus a little context; if that is still too long the
    /// spare budget is split around the changes, shifting to whichever side
    /// has room. When the changes alone exceed the budget, the window starts
    /// at the first change.
    pub fn focus(&self, max_lines: usize) -> FocusWindow<'_> {
        focus_lines(&self.lines, max_lines)
    }
}

fn focus_lines(lines: &[DiffLine], max_lines: usize) -> FocusWindow<'_> {
    let total = lines.len();
    let window = move |start: usize, end: usize| FocusWindow {
        lines: &lines[start..end],
        hidden_before: start,
        hidden_after: total - end,
    };

    if total <= max_lines {
        return window(0, total);
    }

    let first = lines.iter().position(DiffLine::is_change);
    let last = lines.iter().rposition(DiffLine::is_change);
    let (Some(first), Some(last)) = (first, last) else {
        return window(0, max_lines);
    };

    let start = first.saturating_sub(FOCUS_CONTEXT_LINES);
    let end = (last + FOCUS_CONTEXT_LINES + 1).min(total);
    if end - start <= max_lines {
        return window(start, end);
    }

    let span = last - first + 1;
    if span >= max_lines {
        return window(first, first + max_lines);
    }

    let remaining = max_lines - span;
    let before = remaining / 2;
    let mut after = remaining - before;

    // Offsets relative to `start`.
    let rel_first = first - start;
    let rel_last = last - start;
    let selected = end - start;

    let mut new_start = if before > rel_first {
        after += before - rel_first;
        0
    } else {
        rel_first - before
    };

    let mut new_end = rel_last + 1 + after;
    if new_end > selected {
        new_start = new_start.saturating_sub(new_end - selected);
        new_end = selected;
    }

    window(start + new_start, start + new_end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn unchanged(n: usize) -> DiffLine {
        DiffLine::unchanged(n, n, format!("line {n}"))
    }

    /// `len` unchanged lines with an addition spliced in at each index.
    fn lines_with_changes(len: usize, changes: &[usize]) -> Vec<DiffLine> {
        (0..len)
            .map(|i| {
                if changes.contains(&i) {
                    DiffLine::added(i + 1, format!("new {i}"))
                } else {
                    unchanged(i + 1)
                }
            })
            .collect()
    }

    #[test]
    fn test_short_diff_is_whole() {
        let lines = lines_with_changes(5, &[2]);
        let window = focus_lines(&lines, 10);
        assert_eq!(window.lines.len(), 5);
        assert_eq!((window.hidden_before, window.hidden_after), (0, 0));
    }

    #[test]
    fn test_no_changes_takes_head() {
        let lines = lines_with_changes(20, &[]);
        let window = focus_lines(&lines, 8);
        assert_eq!(window.lines.len(), 8);
        assert_eq!((window.hidden_before, window.hidden_after), (0, 12));
    }

    #[test]
    fn test_change_with_context() {
        let lines = lines_with_changes(100, &[50]);
        let window = focus_lines(&lines, 20);

        assert_eq!(window.lines.len(), 7);
        assert_eq!(window.hidden_before, 47);
        assert_eq!(window.hidden_after, 46);
        assert!(window.lines[3].is_change());
    }

    #[test]
    fn test_trimmed_window_keeps_changes() {
        let lines = lines_with_changes(100, &[40, 45]);
        let window = focus_lines(&lines, 8);

        // Span of 6 changes-and-between plus one line either side.
        assert_eq!(window.lines.len(), 8);
        assert_eq!(window.hidden_before, 39);
        assert_eq!(window.hidden_after, 53);
        assert!(window.lines.first().is_some_and(|l| !l.is_change()));
        assert!(window.lines[1].is_change());
        assert!(window.lines[6].is_change());
    }

    #[test]
    fn test_changes_exceeding_budget_start_at_first_change() {
        let lines = lines_with_changes(100, &[10, 30]);
        let window = focus_lines(&lines, 5);

        assert_eq!(window.lines.len(), 5);
        assert_eq!(window.hidden_before, 10);
        assert_eq!(window.hidden_after, 85);
        assert!(window.lines[0].is_change());
    }

    #[test]
    fn test_change_near_top_shifts_budget_down() {
        let lines = lines_with_changes(100, &[0, 3]);
        let window = focus_lines(&lines, 6);

        assert_eq!(window.hidden_before, 0);
        assert_eq!(window.lines.len(), 6);
        assert_eq!(window.hidden_after, 94);
    }
}
