//! Text shown to the user: status line, queue listing, queue dump.

use crate::history::OpHistory;
use crate::queue::ClipQueue;

const ELLIPSIS: &str = "...";

/// Flatten `text` to one line and cut it to at most `max_len` characters,
/// marking cut text with a trailing ellipsis.
pub fn truncate(text: &str, max_len: usize) -> String {
    let flat: String = text.chars().filter(|c| *c != '\r' && *c != '\n').collect();
    if flat.chars().count() <= max_len {
        return flat;
    }
    if max_len < ELLIPSIS.len() {
        return flat.chars().take(max_len).collect();
    }
    let mut out: String = flat.chars().take(max_len - ELLIPSIS.len()).collect();
    out.push_str(ELLIPSIS);
    out
}

/// The status label: queue depth, listener state, and recent operations.
pub fn status_line(queued: usize, listening: bool, history: &OpHistory) -> String {
    let mut line = format!(
        "Items in queue: {} | Listener: {}",
        queued,
        if listening { "Active" } else { "Inactive" }
    );
    if !history.is_empty() {
        line.push_str(" | History: ");
        line.push_str(&history.tags());
    }
    line
}

/// Queue listing, most recent first, one truncated line per entry.
pub fn queue_lines(queue: &ClipQueue, max_len: usize) -> Vec<String> {
    queue
        .iter_recent()
        .map(|item| truncate(item, max_len))
        .collect()
}

/// Full queue contents, oldest first, as shown by the show-queue shortcut.
pub fn dump(queue: &ClipQueue) -> String {
    let mut text = String::from("Current Queue Contents:");
    for item in queue.iter() {
        text.push('\n');
        text.push_str(item);
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::Op;

    #[test]
    fn test_truncate_short_text_untouched() {
        assert_eq!(truncate("hello", 100), "hello");
        assert_eq!(truncate("", 100), "");
    }

    #[test]
    fn test_truncate_strips_line_breaks() {
        assert_eq!(truncate("a\r\nb\nc\rd", 100), "abcd");
    }

    #[test]
    fn test_truncate_long_text() {
        let long = "x".repeat(150);
        let cut = truncate(&long, 100);
        assert_eq!(cut.chars().count(), 100);
        assert!(cut.ends_with("..."));
        assert_eq!(truncate(&"y".repeat(100), 100), "y".repeat(100));
    }

    #[test]
    fn test_truncate_never_exceeds_limit() {
        let samples = ["line one\r\nline two\r\nline three", "żółw ☃ 日本語テキスト", "abc"];
        for sample in samples {
            for max in 0..12 {
                let cut = truncate(sample, max);
                assert!(cut.chars().count() <= max, "{:?} at {}", cut, max);
                assert!(!cut.contains('\n') && !cut.contains('\r'));
            }
        }
    }

    #[test]
    fn test_status_line() {
        let mut history = OpHistory::new(20);
        assert_eq!(
            status_line(0, false, &history),
            "Items in queue: 0 | Listener: Inactive"
        );
        history.record(Op::Copy);
        history.record(Op::Paste);
        assert_eq!(
            status_line(3, true, &history),
            "Items in queue: 3 | Listener: Active | History: VC"
        );
    }

    #[test]
    fn test_queue_lines_most_recent_first() {
        let mut q = ClipQueue::unbounded();
        q.push("first".into());
        q.push("second\r\nline".into());
        assert_eq!(queue_lines(&q, 100), vec!["secondline", "first"]);
    }

    #[test]
    fn test_dump_oldest_first() {
        let mut q = ClipQueue::unbounded();
        assert_eq!(dump(&q), "Current Queue Contents:");
        q.push("a".into());
        q.push("b".into());
        assert_eq!(dump(&q), "Current Queue Contents:\na\nb");
    }
}
