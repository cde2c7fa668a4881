//! Route53 HTTP request methods

use chrono::Utc;
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ProviderError, Result};
use crate::http_client::HttpUtils;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};
use crate::utils::log_sanitizer::truncate_for_log;

use super::Route53Provider;
use super::sign::canonical_query;
use super::types::{ErrorResponse, InvalidChangeBatchResponse};

impl Route53Provider {
    /// Map a non-2xx response to a [`ProviderError`].
    fn handle_response_error(&self, status: u16, response_text: &str, ctx: ErrorContext) -> Result<()> {
        if (200..300).contains(&status) {
            return Ok(());
        }

        let err = if let Ok(error) = quick_xml::de::from_str::<ErrorResponse>(response_text) {
            self.map_error(
                RawApiError::with_code(error.error.code, error.error.message),
                ctx,
            )
        } else if let Ok(batch) = quick_xml::de::from_str::<InvalidChangeBatchResponse>(response_text)
        {
            self.map_error(
                RawApiError::with_code("InvalidChangeBatch", batch.messages.message.join("; ")),
                ctx,
            )
        } else {
            match status {
                401 => ProviderError::InvalidCredentials {
                    provider: self.provider_name().to_string(),
                    raw_message: Some(format!("HTTP 401: {}", truncate_for_log(response_text))),
                },
                403 => ProviderError::PermissionDenied {
                    provider: self.provider_name().to_string(),
                    raw_message: Some(format!("HTTP 403: {}", truncate_for_log(response_text))),
                },
                _ => self.unknown_error(RawApiError::with_code(
                    status.to_string(),
                    format!("HTTP {status}: {}", truncate_for_log(response_text)),
                )),
            }
        };

        if err.is_expected() {
            log::warn!("[{}] API error: {err}", self.provider_name());
        } else {
            log::error!("[{}] API error: {err}", self.provider_name());
        }
        Err(err)
    }

    /// Sign and send a request; returns the response body of a 2xx response.
    async fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        payload: Option<String>,
        ctx: ErrorContext,
    ) -> Result<String> {
        let amz_date = Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        let canonical_query = canonical_query(query);
        let host = self.host().to_string();
        let payload = payload.unwrap_or_default();

        let headers = vec![
            ("Host".to_string(), host.clone()),
            ("X-Amz-Date".to_string(), amz_date.clone()),
        ];
        let authorization = self.sign(
            method.as_str(),
            path,
            &canonical_query,
            &headers,
            &payload,
            &amz_date,
        );

        let url = if canonical_query.is_empty() {
            format!("{}{path}", self.endpoint)
        } else {
            format!("{}{path}?{canonical_query}", self.endpoint)
        };
        let method_name = method.as_str().to_string();

        let mut request = self
            .client
            .request(method, &url)
            .header("Host", host)
            .header("X-Amz-Date", &amz_date)
            .header("Authorization", authorization);
        if !payload.is_empty() {
            log::debug!(
                "[{}] Request Body: {}",
                self.provider_name(),
                truncate_for_log(&payload)
            );
            request = request
                .header("Content-Type", "application/xml")
                .body(payload);
        }

        let (status, response_text) = HttpUtils::execute_request_with_retry(
            request,
            self.provider_name(),
            &method_name,
            &url,
            self.max_retries,
        )
        .await?;

        self.handle_response_error(status, &response_text, ctx)?;
        Ok(response_text)
    }

    fn parse_xml<T: DeserializeOwned>(&self, response_text: &str) -> Result<T> {
        quick_xml::de::from_str(response_text).map_err(|e| {
            log::error!("[{}] XML parse failed: {e}", self.provider_name());
            log::error!(
                "[{}] Raw response: {}",
                self.provider_name(),
                truncate_for_log(response_text)
            );
            self.parse_error(e)
        })
    }

    pub(crate) async fn get_xml<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        ctx: ErrorContext,
    ) -> Result<T> {
        let body = self.request(Method::GET, path, query, None, ctx).await?;
        self.parse_xml(&body)
    }

    pub(crate) async fn post_xml<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        ctx: ErrorContext,
    ) -> Result<T> {
        let payload = quick_xml::se::to_string(body).map_err(|e| self.serialization_error(e))?;
        let payload = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>{payload}");
        let body = self
            .request(Method::POST, path, &[], Some(payload), ctx)
            .await?;
        self.parse_xml(&body)
    }
}
