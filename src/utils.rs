//! Utility functions for ids and log messages

use uuid::Uuid;

/// Random lowercase hex string of `len` characters (at most 32)
pub fn rand_string(len: usize) -> String {
    let hex = Uuid::new_v4().simple().to_string();
    hex[..len.min(hex.len())].to_string()
}

/// Cut `s` to `max_len` characters, marking the cut
pub fn shorten(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let mut short: String = s.chars().take(max_len).collect();
    short.push_str(" [truncated]");
    short
}

/// Collapse runs of whitespace into single spaces
pub fn compact(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_space = false;
    for c in s.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}
