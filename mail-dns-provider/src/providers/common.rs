//! Helpers shared by the provider implementations

use std::time::Duration;

use reqwest::Client;

use crate::error::{ProviderError, Result};
use crate::types::DnsRecordType;

// ============ HTTP Client ============

/// Connect timeout (seconds)
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Whole-request timeout (seconds)
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Build the HTTP client every provider uses.
pub fn create_http_client(provider: &str) -> Result<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS))
        .build()
        .map_err(|e| ProviderError::NetworkError {
            provider: provider.to_string(),
            detail: format!("Failed to create HTTP client: {e}"),
        })
}

// ============ HMAC-SHA256 ============

/// HMAC-SHA256 (used by Route53 request signing)
#[cfg(feature = "route53")]
pub fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    // HMAC accepts keys of any length, so this never fails.
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(key) else {
        return Vec::new();
    };
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

// ============ Domain names ============

/// Lowercase and strip the trailing dot.
pub fn normalize_domain_name(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Whether the zone `zone_name` is `domain` itself or one of its parents.
///
/// `example.com` covers `example.com` and `mail.example.com` but not
/// `badexample.com`.
pub fn zone_covers(zone_name: &str, domain: &str) -> bool {
    let zone = normalize_domain_name(zone_name);
    let domain = normalize_domain_name(domain);
    !zone.is_empty() && (domain == zone || domain.ends_with(&format!(".{zone}")))
}

/// Parse a record type name; `None` for types this library does not manage.
pub fn parse_record_type(record_type: &str) -> Option<DnsRecordType> {
    match record_type.trim().to_ascii_uppercase().as_str() {
        "TXT" => Some(DnsRecordType::Txt),
        "CNAME" => Some(DnsRecordType::Cname),
        _ => None,
    }
}

// ============ TXT content ============

/// Strip presentation-format quoting from TXT content.
///
/// `"v=spf1 ~all"` becomes `v=spf1 ~all`, and split strings such as
/// `"abc" "def"` are joined back into `abcdef`. Unquoted input is returned as is.
pub fn unquote_txt(value: &str) -> String {
    let value = value.trim();
    if !(value.starts_with('"') && value.ends_with('"') && value.len() >= 2) {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len());
    let mut in_quotes = false;
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => in_quotes = !in_quotes,
            '\\' if in_quotes => {
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
            }
            c if in_quotes => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unquote_txt_variants() {
        assert_eq!(unquote_txt("v=spf1 ~all"), "v=spf1 ~all");
        assert_eq!(unquote_txt("\"v=spf1 ~all\""), "v=spf1 ~all");
        assert_eq!(unquote_txt("\"abc\" \"def\""), "abcdef");
        assert_eq!(unquote_txt("\"say \\\"hi\\\"\""), "say \"hi\"");
    }

    #[test]
    fn normalize_strips_dot_and_case() {
        assert_eq!(normalize_domain_name("Example.COM."), "example.com");
        assert_eq!(normalize_domain_name("example.com"), "example.com");
    }

    #[test]
    fn zone_covers_exact_and_parent() {
        assert!(zone_covers("example.com", "example.com"));
        assert!(zone_covers("example.com.", "mail.example.com"));
        assert!(zone_covers("example.com", "a.b.example.com"));
        assert!(!zone_covers("example.com", "badexample.com"));
        assert!(!zone_covers("mail.example.com", "example.com"));
        assert!(!zone_covers("", "example.com"));
    }

    #[cfg(feature = "route53")]
    #[test]
    fn hmac_sha256_known_vector() {
        // RFC 4231 test case 2
        let mac = hmac_sha256(b"Jefe", b"what do ya want for nothing?");
        assert_eq!(
            hex::encode(mac),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }
}
