//! Log truncation
//!
//! API bodies can carry full DKIM public keys and token verification payloads;
//! debug logs only ever see a bounded prefix.

/// Default number of bytes kept by [`truncate_for_log`].
const TRUNCATE_LIMIT: usize = 256;

/// Largest char boundary not after `index`.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    (0..=index).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

/// Truncate `s` to at most `limit` bytes (on a char boundary), noting the full length.
pub fn truncate_with_limit(s: &str, limit: usize) -> String {
    if s.len() <= limit {
        s.to_string()
    } else {
        format!(
            "{}... [truncated, total {} bytes]",
            &s[..floor_char_boundary(s, limit)],
            s.len()
        )
    }
}

/// Truncate a string for logging with the default limit.
pub fn truncate_for_log(s: &str) -> String {
    truncate_with_limit(s, TRUNCATE_LIMIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_body_unchanged() {
        let body = r#"{"success":true,"result":[]}"#;
        assert_eq!(truncate_for_log(body), body);
        assert_eq!(truncate_for_log(&"a".repeat(TRUNCATE_LIMIT)).len(), TRUNCATE_LIMIT);
    }

    #[test]
    fn dkim_key_is_cut() {
        let record = format!("v=DKIM1; k=rsa; p={}", "M".repeat(400));
        let logged = truncate_for_log(&record);
        assert!(logged.starts_with("v=DKIM1; k=rsa; p=MMM"));
        assert!(logged.ends_with(&format!("[truncated, total {} bytes]", record.len())));
    }

    #[test]
    fn respects_char_boundaries() {
        // 'é' is two bytes; a limit of 3 falls inside the second one.
        let logged = truncate_with_limit("ééé", 3);
        assert!(logged.starts_with("é..."));
    }
}
