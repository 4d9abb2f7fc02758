//! Diff computation between two snapshots.

use diffwatch_snapshot::Snapshot;
use similar::{Algorithm, DiffTag, TextDiff};
use tracing::debug;

use crate::binary::is_binary_content;
use crate::result::{DiffLine, DiffResult};

/// Default number of context lines around each unified diff hunk.
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// Computes structured diffs between snapshots.
///
/// Holds no state between calls; one engine can serve any number of paths
/// and threads.
#[derive(Debug, Clone, Copy)]
pub struct DiffEngine {
    context_lines: usize,
}

impl DiffEngine {
    /// Create an engine with the default context size.
    pub fn new() -> Self {
        Self {
            context_lines: DEFAULT_CONTEXT_LINES,
        }
    }

    /// Set the unified diff context size.
    pub fn with_context_lines(mut self, lines: usize) -> Self {
        self.context_lines = lines;
        self
    }

    /// Compare `old` against `new`.
    ///
    /// Creation and deletion list every line of the surviving side. If either
    /// side looks binary, no lines are produced and `unified` only names the
    /// kind of change. Otherwise lines are aligned and each run of changes
    /// is emitted as all of its deletions followed by all of its additions.
    pub fn compute(&self, old: &Snapshot, new: &Snapshot) -> DiffResult {
        let mut result = DiffResult::empty(new.path());

        match (old.exists(), new.exists()) {
            (true, false) => {
                result.has_diff = true;
                result.is_deleted = true;

                if is_binary_content(old.content()) {
                    result.is_binary = true;
                    result.unified = format!("Binary file {} deleted\n", old.path().display());
                    return result;
                }

                result.unified = format!("--- {}\n+++ (deleted)\n", old.path().display());
                result.lines = split_lines(old.content())
                    .into_iter()
                    .enumerate()
                    .map(|(i, line)| DiffLine::deleted(i + 1, line_text(line)))
                    .collect();
            }
            (false, true) => {
                result.has_diff = true;
                result.is_new = true;

                if is_binary_content(new.content()) {
                    result.is_binary = true;
                    result.unified = format!("Binary file {} created\n", new.path().display());
                    return result;
                }

                result.unified = format!("--- (new file)\n+++ {}\n", new.path().display());
                result.lines = split_lines(new.content())
                    .into_iter()
                    .enumerate()
                    .map(|(i, line)| DiffLine::added(i + 1, line_text(line)))
                    .collect();
            }
            (true, true) => {
                let old_binary = is_binary_content(old.content());
                let new_binary = is_binary_content(new.content());

                if old_binary || new_binary {
                    result.is_binary = true;
                    result.has_diff = true;

                    let path = new.path().display();
                    result.unified = match (old_binary, new_binary) {
                        (true, true) => format!("Binary file {path} modified\n"),
                        (false, true) => format!("File {path} changed from text to binary\n"),
                        _ => format!("File {path} changed from binary to text\n"),
                    };
                    return result;
                }

                // Lines are compared as raw bytes with their terminators, so
                // line-ending and encoding changes still count as edits.
                let old_lines = split_lines(old.content());
                let new_lines = split_lines(new.content());

                let diff = TextDiff::configure()
                    .algorithm(Algorithm::Myers)
                    .newline_terminated(true)
                    .diff_slices(old_lines.as_slice(), new_lines.as_slice());

                result.unified = diff
                    .unified_diff()
                    .context_radius(self.context_lines)
                    .header(
                        &old.path().display().to_string(),
                        &new.path().display().to_string(),
                    )
                    .to_string();
                result.has_diff = !result.unified.is_empty();
                result.lines = structured_lines(&diff, &old_lines, &new_lines);
            }
            (false, false) => {}
        }

        debug!(
            "Computed diff for {} ({} lines, changed: {})",
            result.path.display(),
            result.lines.len(),
            result.has_diff
        );

        result
    }
}

impl Default for DiffEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Split after every `\n`, keeping the terminator on each line.
fn split_lines(content: &[u8]) -> Vec<&[u8]> {
    content.split_inclusive(|&b| b == b'\n').collect()
}

/// Display text of a line: terminator stripped, invalid UTF-8 replaced.
fn line_text(line: &[u8]) -> String {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    String::from_utf8_lossy(line).into_owned()
}

/// Turn the aligned ops into numbered lines.
///
/// Consecutive delete/insert/replace ops form one changed block; the whole
/// old side of the block is emitted before the whole new side, with no
/// attempt to pair individual lines.
fn structured_lines(
    diff: &TextDiff<'_, '_, '_, [u8]>,
    old_lines: &[&[u8]],
    new_lines: &[&[u8]],
) -> Vec<DiffLine> {
    let mut lines = Vec::with_capacity(old_lines.len().max(new_lines.len()));
    let mut deleted: Vec<DiffLine> = Vec::new();
    let mut added: Vec<DiffLine> = Vec::new();
    let old_line = |i: usize| DiffLine::deleted(i + 1, line_text(old_lines[i]));
    let new_line = |j: usize| DiffLine::added(j + 1, line_text(new_lines[j]));

    for op in diff.ops() {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => {
                lines.append(&mut deleted);
                lines.append(&mut added);
                for (i, j) in old_range.zip(new_range) {
                    lines.push(DiffLine::unchanged(i + 1, j + 1, line_text(old_lines[i])));
                }
            }
            DiffTag::Delete => deleted.extend(old_range.map(old_line)),
            DiffTag::Insert => added.extend(new_range.map(new_line)),
            DiffTag::Replace => {
                deleted.extend(old_range.map(old_line));
                added.extend(new_range.map(new_line));
            }
        }
    }
    lines.append(&mut deleted);
    lines.append(&mut added);

    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{DiffStats, LineKind};
    use pretty_assertions::assert_eq;

    fn text(path: &str, content: &str) -> Snapshot {
        Snapshot::present(path, content.to_string())
    }

    #[test]
    fn test_worked_example() {
        let engine = DiffEngine::new();
        let result = engine.compute(&text("/f.txt", "a\nb\nc\n"), &text("/f.txt", "a\nx\nc\n"));

        assert!(result.has_diff);
        assert!(!result.is_new && !result.is_deleted && !result.is_binary);
        assert_eq!(
            result.lines,
            vec![
                DiffLine::unchanged(1, 1, "a"),
                DiffLine::deleted(2, "b"),
                DiffLine::added(2, "x"),
                DiffLine::unchanged(3, 3, "c"),
            ]
        );
    }

    #[test]
    fn test_identical_content_has_no_diff() {
        let engine = DiffEngine::new();
        let snapshot = text("/f.txt", "one\ntwo\nthree\n");
        let result = engine.compute(&snapshot, &snapshot);

        assert!(!result.has_diff);
        assert!(result.unified.is_empty());
        assert_eq!(result.lines.len(), 3);
        assert!(result.lines.iter().all(|l| l.kind == LineKind::Unchanged));
    }

    #[test]
    fn test_replace_block_is_not_paired() {
        let engine = DiffEngine::new();
        let result = engine.compute(
            &text("/f.txt", "a\nb\nc\nd\n"),
            &text("/f.txt", "a\nx\ny\nz\nd\n"),
        );

        let kinds: Vec<LineKind> = result.lines.iter().map(|l| l.kind).collect();
        assert_eq!(
            kinds,
            vec![
                LineKind::Unchanged,
                LineKind::Deleted,
                LineKind::Deleted,
                LineKind::Added,
                LineKind::Added,
                LineKind::Added,
                LineKind::Unchanged,
            ]
        );
        assert_eq!(result.lines[6], DiffLine::unchanged(4, 5, "d"));
    }

    #[test]
    fn test_pure_insert_and_delete() {
        let engine = DiffEngine::new();

        let inserted = engine.compute(&text("/f", "a\nc\n"), &text("/f", "a\nb\nc\n"));
        assert_eq!(inserted.lines[1], DiffLine::added(2, "b"));
        assert_eq!(inserted.lines[2], DiffLine::unchanged(2, 3, "c"));

        let deleted = engine.compute(&text("/f", "a\nb\nc\n"), &text("/f", "a\nc\n"));
        assert_eq!(deleted.lines[1], DiffLine::deleted(2, "b"));
        assert_eq!(deleted.lines[2], DiffLine::unchanged(3, 2, "c"));
    }

    #[test]
    fn test_deleted_file_lists_every_line() {
        let engine = DiffEngine::new();
        let result = engine.compute(&text("/f.txt", "one\ntwo\nthree"), &Snapshot::absent("/f.txt"));

        assert!(result.has_diff);
        assert!(result.is_deleted);
        assert!(!result.is_new);
        assert_eq!(
            result.lines,
            vec![
                DiffLine::deleted(1, "one"),
                DiffLine::deleted(2, "two"),
                DiffLine::deleted(3, "three"),
            ]
        );
        assert_eq!(result.unified, "--- /f.txt\n+++ (deleted)\n");
    }

    #[test]
    fn test_new_file_lists_every_line() {
        let engine = DiffEngine::new();
        let result = engine.compute(&Snapshot::absent("/f.txt"), &text("/f.txt", "one\ntwo\n"));

        assert!(result.has_diff);
        assert!(result.is_new);
        assert!(!result.is_deleted);
        assert_eq!(
            result.lines,
            vec![DiffLine::added(1, "one"), DiffLine::added(2, "two")]
        );
    }

    #[test]
    fn test_binary_cases_have_no_lines() {
        let engine = DiffEngine::new();
        let binary = Snapshot::present("/img.png", b"\x89PNG\r\n\x1a\n\x00\x00".to_vec());
        let plain = text("/img.png", "hello\n");
        let absent = Snapshot::absent("/img.png");

        let created = engine.compute(&absent, &binary);
        assert!(created.is_binary && created.is_new && created.lines.is_empty());
        assert_eq!(created.unified, "Binary file /img.png created\n");

        let deleted = engine.compute(&binary, &absent);
        assert!(deleted.is_binary && deleted.is_deleted && deleted.lines.is_empty());
        assert_eq!(deleted.unified, "Binary file /img.png deleted\n");

        let modified = engine.compute(&binary, &binary);
        assert!(modified.is_binary && modified.has_diff && modified.lines.is_empty());
        assert_eq!(modified.unified, "Binary file /img.png modified\n");

        let to_binary = engine.compute(&plain, &binary);
        assert_eq!(to_binary.unified, "File /img.png changed from text to binary\n");

        let to_text = engine.compute(&binary, &plain);
        assert_eq!(to_text.unified, "File /img.png changed from binary to text\n");
        assert!(!to_text.is_new && !to_text.is_deleted);
    }

    #[test]
    fn test_neither_exists() {
        let engine = DiffEngine::new();
        let result = engine.compute(&Snapshot::absent("/f"), &Snapshot::absent("/f"));

        assert_eq!(result, DiffResult::empty("/f"));
    }

    #[test]
    fn test_unified_uses_three_lines_of_context() {
        let old: String = (1..=10).map(|i| format!("line {i}\n")).collect();
        let new = old.replace("line 5\n", "line five\n");

        let result = DiffEngine::new().compute(&text("/f.txt", &old), &text("/f.txt", &new));

        assert!(result.unified.starts_with("--- /f.txt\n+++ /f.txt\n"));
        assert!(result.unified.contains("@@ -2,7 +2,7 @@"));
        assert!(result.unified.contains("-line 5\n"));
        assert!(result.unified.contains("+line five\n"));
        assert!(!result.unified.contains("line 1\n"));
        assert!(!result.unified.contains("line 9\n"));
    }

    #[test]
    fn test_added_trailing_newline_is_a_change() {
        let engine = DiffEngine::new();
        let result = engine.compute(&text("/f", "a\nb"), &text("/f", "a\nb\n"));

        assert!(result.has_diff);
        assert!(!result.unified.is_empty());
        assert_eq!(
            result.lines,
            vec![
                DiffLine::unchanged(1, 1, "a"),
                DiffLine::deleted(2, "b"),
                DiffLine::added(2, "b"),
            ]
        );
    }

    #[test]
    fn test_line_ending_conversion_is_a_change() {
        let engine = DiffEngine::new();
        let result = engine.compute(&text("/f", "a\nb\n"), &text("/f", "a\r\nb\r\n"));

        assert!(result.has_diff);
        assert_eq!(
            result.stats(),
            DiffStats {
                added: 2,
                deleted: 2,
                unchanged: 0,
            }
        );
        assert!(result.lines.iter().all(|l| !l.content.ends_with('\r')));
    }

    #[test]
    fn test_non_utf8_edit_is_a_change() {
        let engine = DiffEngine::new();
        let old = Snapshot::present("/f", b"caf\xe9 ok\n".to_vec());
        let new = Snapshot::present("/f", b"caf\xe8 ok\n".to_vec());
        let result = engine.compute(&old, &new);

        assert!(result.has_diff);
        assert!(!result.is_binary);
        assert_eq!(
            result.lines,
            vec![
                DiffLine::deleted(1, "caf\u{FFFD} ok"),
                DiffLine::added(1, "caf\u{FFFD} ok"),
            ]
        );
    }

    #[test]
    fn test_crlf_lines() {
        let engine = DiffEngine::new();
        let result = engine.compute(&text("/f", "a\r\nb\r\n"), &text("/f", "a\r\nc\r\n"));

        assert_eq!(result.lines[0], DiffLine::unchanged(1, 1, "a"));
        assert_eq!(result.stats().added, 1);
        assert_eq!(result.stats().deleted, 1);
    }
}
