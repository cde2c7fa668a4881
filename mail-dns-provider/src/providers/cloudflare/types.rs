//! Cloudflare API payloads

use serde::{Deserialize, Serialize};

/// Envelope wrapping every Cloudflare v4 response.
#[derive(Debug, Deserialize)]
pub struct CloudflareResponse<T> {
    pub success: bool,
    pub result: Option<T>,
    #[serde(default)]
    pub errors: Vec<CloudflareError>,
    pub result_info: Option<CloudflareResultInfo>,
}

#[derive(Debug, Deserialize)]
pub struct CloudflareError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct CloudflareResultInfo {
    pub page: u32,
    pub total_pages: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct CloudflareZone {
    pub id: String,
    pub name: String,
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct CloudflareDnsRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub name: String,
    pub content: String,
    pub ttl: u32,
}

/// Body of `POST /zones/{id}/dns_records`.
#[derive(Debug, Serialize)]
pub struct CreateRecordBody<'a> {
    #[serde(rename = "type")]
    pub record_type: &'static str,
    pub name: &'a str,
    pub content: &'a str,
    pub ttl: u32,
    /// Email records must never be proxied.
    pub proxied: bool,
}

/// Result of `GET /user/tokens/verify`.
#[derive(Debug, Deserialize)]
pub struct TokenVerifyResult {
    pub status: String,
}
