//! Formatting utilities

/// Format a duration in milliseconds in human-readable form
pub fn duration_ms(ms: u64) -> String {
    if ms < 1000 {
        format!("{}ms", ms)
    } else if ms < 60000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        let mins = ms / 60000;
        let secs = (ms % 60000) / 1000;
        format!("{}m{}s", mins, secs)
    }
}

/// Truncate a string to max characters with ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        "...".to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

/// First `max_lines` lines of tool output plus a count of what was cut
pub fn head_lines(output: &str, max_lines: usize) -> String {
    let total = output.lines().count();
    let mut text = output
        .lines()
        .take(max_lines)
        .collect::<Vec<_>>()
        .join("\n");
    if total > max_lines {
        text.push_str(&format!("\n... and {} more lines", total - max_lines));
    }
    text
}
