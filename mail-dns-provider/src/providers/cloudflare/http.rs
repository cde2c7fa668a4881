//! Cloudflare HTTP request methods

use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{ProviderError, Result};
use crate::http_client::HttpUtils;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::{CloudflareProvider, CloudflareResponse};

impl CloudflareProvider {
    /// Send a request and unwrap the Cloudflare envelope.
    ///
    /// Returns the whole envelope so paginated callers can read `result_info`.
    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
        ctx: ErrorContext,
    ) -> Result<CloudflareResponse<T>> {
        let url = format!("{}{path}", self.api_base);
        let method_name = method.as_str().to_string();

        let mut request = self
            .client
            .request(method, &url)
            .bearer_auth(&self.api_token);
        if let Some(body) = body {
            request = request
                .header("Content-Type", "application/json")
                .body(body);
        }

        let (status, response_text) = HttpUtils::execute_request_with_retry(
            request,
            self.provider_name(),
            &method_name,
            &url,
            self.max_retries,
        )
        .await?;

        let Ok(cf_response) = serde_json::from_str::<CloudflareResponse<T>>(&response_text) else {
            return Err(self.status_error(status, &response_text));
        };

        if !cf_response.success || !(200..300).contains(&status) {
            let raw = cf_response.errors.first().map_or_else(
                || RawApiError::new(format!("HTTP {status}")),
                |e| RawApiError::with_code(e.code.to_string(), e.message.clone()),
            );
            let err = match status {
                401 | 403 if raw.code.is_none() => self.status_error(status, &raw.message),
                _ => self.map_error(raw, ctx),
            };
            if err.is_expected() {
                log::warn!("[{}] API error: {err}", self.provider_name());
            } else {
                log::error!("[{}] API error: {err}", self.provider_name());
            }
            return Err(err);
        }

        Ok(cf_response)
    }

    /// Error for a response whose body is not a Cloudflare envelope.
    fn status_error(&self, status: u16, body: &str) -> ProviderError {
        match status {
            401 => ProviderError::InvalidCredentials {
                provider: self.provider_name().to_string(),
                raw_message: Some(format!("HTTP 401: {body}")),
            },
            403 => ProviderError::PermissionDenied {
                provider: self.provider_name().to_string(),
                raw_message: Some(format!("HTTP 403: {body}")),
            },
            200..300 => self.parse_error(format!("Unexpected response body: {body}")),
            _ => self.unknown_error(RawApiError::with_code(
                status.to_string(),
                format!("HTTP {status}: {body}"),
            )),
        }
    }

    /// GET returning the unwrapped `result`.
    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str, ctx: ErrorContext) -> Result<T> {
        self.request::<T>(Method::GET, path, None, ctx)
            .await?
            .result
            .ok_or_else(|| self.parse_error("Response is missing the 'result' field"))
    }

    /// GET one page of a list endpoint; returns the items and the total page count.
    pub(crate) async fn get_page<T: DeserializeOwned>(
        &self,
        path: &str,
        ctx: ErrorContext,
    ) -> Result<(Vec<T>, u32)> {
        let response = self.request::<Vec<T>>(Method::GET, path, None, ctx).await?;
        let total_pages = response
            .result_info
            .map_or(1, |info| info.total_pages.unwrap_or(info.page));
        Ok((response.result.unwrap_or_default(), total_pages))
    }

    /// POST a JSON body and return the unwrapped `result`.
    pub(crate) async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
        ctx: ErrorContext,
    ) -> Result<T> {
        let payload = serde_json::to_string(body).map_err(|e| self.serialization_error(e))?;
        log::debug!("[{}] Request Body: {payload}", self.provider_name());

        self.request::<T>(Method::POST, path, Some(payload), ctx)
            .await?
            .result
            .ok_or_else(|| self.parse_error("Response is missing the 'result' field"))
    }

    pub(crate) async fn delete(&self, path: &str, ctx: ErrorContext) -> Result<()> {
        self.request::<serde_json::Value>(Method::DELETE, path, None, ctx)
            .await
            .map(|_| ())
    }
}
