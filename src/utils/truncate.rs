//! Log Truncation
//!
//! Responses can be large (rendered views come back as base64 data URLs), so
//! they are shortened before they reach the logs. The prefix and suffix are
//! kept and the cut always lands on a UTF-8 boundary.

/// Default byte budget for values written to debug logs.
pub const LOG_BUDGET: usize = 512;

pub fn truncate_text(content: &str, max_bytes: usize) -> String {
    if content.len() <= max_bytes {
        return content.to_string();
    }

    if max_bytes == 0 {
        return format!("... [{} bytes truncated] ...", content.len());
    }

    let half = max_bytes / 2;

    let prefix_end = content
        .char_indices()
        .map(|(idx, c)| idx + c.len_utf8())
        .take_while(|end| *end <= half)
        .last()
        .unwrap_or(0);

    let suffix_target = content.len().saturating_sub(half);
    let suffix_start = content
        .char_indices()
        .rev()
        .map(|(idx, _)| idx)
        .take_while(|idx| *idx >= suffix_target)
        .last()
        .unwrap_or(content.len())
        .max(prefix_end);

    let prefix = &content[..prefix_end];
    let suffix = &content[suffix_start..];
    let dropped = content.len() - prefix.len() - suffix.len();

    format!("{} ... [{} bytes truncated] ... {}", prefix, dropped, suffix)
}

/// [`truncate_text`] with [`LOG_BUDGET`].
pub fn for_log(content: &str) -> String {
    truncate_text(content, LOG_BUDGET)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_is_untouched() {
        assert_eq!(truncate_text("{\"a\":1}", 64), "{\"a\":1}");
    }

    #[test]
    fn test_keeps_prefix_and_suffix() {
        let text = format!("data:image/png;base64,{}", "A".repeat(1000));
        let out = truncate_text(&text, 40);
        assert!(out.starts_with("data:image/png;base"));
        assert!(out.ends_with("AAAA"));
        assert!(out.contains("bytes truncated"));
    }

    #[test]
    fn test_respects_utf8_boundaries() {
        let text = "é".repeat(100);
        let out = truncate_text(&text, 20);
        assert!(out.starts_with("ééééé ..."));
        assert!(out.ends_with("... ééééé"));
    }

    #[test]
    fn test_zero_budget() {
        assert_eq!(truncate_text("abc", 0), "... [3 bytes truncated] ...");
    }
}
