//! AWS Signature Version 4

use std::fmt::Write;

use sha2::{Digest, Sha256};

use crate::providers::common::hmac_sha256;
use crate::utils::log_sanitizer::truncate_for_log;

use super::Route53Provider;

const ALGORITHM: &str = "AWS4-HMAC-SHA256";
const SERVICE: &str = "route53";

/// Build a canonical query string: keys sorted, keys and values RFC 3986 encoded.
pub(crate) fn canonical_query(params: &[(&str, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| {
            (
                urlencoding::encode(k).into_owned(),
                urlencoding::encode(v).into_owned(),
            )
        })
        .collect();
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

impl Route53Provider {
    /// Compute the `Authorization` header for a request.
    /// Reference: <https://docs.aws.amazon.com/IAM/latest/UserGuide/create-signed-request.html>
    ///
    /// `amz_date` is `YYYYMMDDTHHMMSSZ`; `query` must already be canonical.
    pub(crate) fn sign(
        &self,
        method: &str,
        uri: &str,
        query: &str,
        headers: &[(String, String)],
        payload: &str,
        amz_date: &str,
    ) -> String {
        let date_stamp = amz_date.get(..8).unwrap_or(amz_date);

        let mut sorted_headers: Vec<_> = headers
            .iter()
            .map(|(k, v)| (k.to_lowercase(), v.trim().to_string()))
            .collect();
        sorted_headers.sort_by(|a, b| a.0.cmp(&b.0));

        let canonical_headers = sorted_headers
            .iter()
            .fold(String::new(), |mut acc, (k, v)| {
                let _ = writeln!(acc, "{k}:{v}");
                acc
            });
        let signed_headers = sorted_headers
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(";");

        let hashed_payload = hex::encode(Sha256::digest(payload.as_bytes()));

        let canonical_request = format!(
            "{method}\n{uri}\n{query}\n{canonical_headers}\n{signed_headers}\n{hashed_payload}"
        );
        log::debug!("CanonicalRequest:\n{}", truncate_for_log(&canonical_request));

        let credential_scope = format!("{date_stamp}/{}/{SERVICE}/aws4_request", self.region);
        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{credential_scope}\n{}",
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );
        log::debug!("StringToSign:\n{string_to_sign}");

        let k_date = hmac_sha256(
            format!("AWS4{}", self.secret_access_key).as_bytes(),
            date_stamp.as_bytes(),
        );
        let k_region = hmac_sha256(&k_date, self.region.as_bytes());
        let k_service = hmac_sha256(&k_region, SERVICE.as_bytes());
        let k_signing = hmac_sha256(&k_service, b"aws4_request");
        let signature = hex::encode(hmac_sha256(&k_signing, string_to_sign.as_bytes()));

        format!(
            "{ALGORITHM} Credential={}/{credential_scope}, SignedHeaders={signed_headers}, Signature={signature}",
            self.access_key_id
        )
    }
}
