//! HTTP request execution shared by all providers
//!
//! Providers build their own `RequestBuilder` (URL, auth headers, signing, body)
//! and hand it here for sending, logging, transient-failure classification and
//! retrying. Response parsing stays with the provider.

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::error::ProviderError;
use crate::utils::log_sanitizer::truncate_for_log;

/// Upper bound for a server-provided `Retry-After`.
const MAX_RETRY_AFTER_SECS: u64 = 30;
/// Upper bound for exponential backoff.
const MAX_BACKOFF_MS: u64 = 10_000;

/// HTTP helper functions
pub struct HttpUtils;

impl HttpUtils {
    /// Send one request and return `(status, body)`.
    ///
    /// HTTP 429 becomes [`ProviderError::RateLimited`] (with `Retry-After` when
    /// sent) and 502/503/504 become [`ProviderError::NetworkError`]; every other
    /// status is returned to the caller for provider-specific handling.
    pub async fn execute_request(
        request_builder: RequestBuilder,
        provider_name: &str,
        method_name: &str,
        url: &str,
    ) -> Result<(u16, String), ProviderError> {
        log::debug!("[{provider_name}] {method_name} {url}");

        let response = request_builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout {
                    provider: provider_name.to_string(),
                    detail: e.to_string(),
                }
            } else {
                ProviderError::NetworkError {
                    provider: provider_name.to_string(),
                    detail: e.to_string(),
                }
            }
        })?;

        let status_code = response.status().as_u16();
        log::debug!("[{provider_name}] Response Status: {status_code}");

        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());

        if status_code == 429 {
            let body = response.text().await.unwrap_or_default();
            log::warn!("[{provider_name}] Rate limited (HTTP 429), retry_after={retry_after:?}");
            return Err(ProviderError::RateLimited {
                provider: provider_name.to_string(),
                retry_after,
                raw_message: Some(truncate_for_log(&body)),
            });
        }

        if matches!(status_code, 502..=504) {
            let body = response.text().await.unwrap_or_default();
            log::warn!("[{provider_name}] Server error (HTTP {status_code})");
            return Err(ProviderError::NetworkError {
                provider: provider_name.to_string(),
                detail: format!("HTTP {status_code}: {}", truncate_for_log(&body)),
            });
        }

        let response_text = response
            .text()
            .await
            .map_err(|e| ProviderError::NetworkError {
                provider: provider_name.to_string(),
                detail: format!("Failed to read response body: {e}"),
            })?;

        log::debug!(
            "[{provider_name}] Response Body: {}",
            truncate_for_log(&response_text)
        );

        Ok((status_code, response_text))
    }

    /// Decode a JSON body, mapping failures to [`ProviderError::ParseError`].
    pub fn parse_json<T>(response_text: &str, provider_name: &str) -> Result<T, ProviderError>
    where
        T: DeserializeOwned,
    {
        serde_json::from_str(response_text).map_err(|e| {
            log::error!("[{provider_name}] JSON parse failed: {e}");
            log::error!(
                "[{provider_name}] Raw response: {}",
                truncate_for_log(response_text)
            );
            ProviderError::ParseError {
                provider: provider_name.to_string(),
                detail: e.to_string(),
            }
        })
    }

    /// Like [`execute_request`](Self::execute_request) but retries transient
    /// failures up to `max_retries` times.
    ///
    /// Backoff doubles from 100ms up to 10s; a `Retry-After` from a 429 is
    /// honoured up to 30s. Non-transient errors return immediately.
    pub async fn execute_request_with_retry(
        request_builder: RequestBuilder,
        provider_name: &str,
        method_name: &str,
        url: &str,
        max_retries: u32,
    ) -> Result<(u16, String), ProviderError> {
        if max_retries == 0 {
            return Self::execute_request(request_builder, provider_name, method_name, url).await;
        }

        let mut last_error = None;

        for attempt in 0..=max_retries {
            // RequestBuilder is single-use.
            let Some(req) = request_builder.try_clone() else {
                log::warn!("[{provider_name}] Cannot clone request, disabling retry");
                return Self::execute_request(request_builder, provider_name, method_name, url)
                    .await;
            };

            match Self::execute_request(req, provider_name, method_name, url).await {
                Ok(resp) => return Ok(resp),
                Err(e) if attempt < max_retries && e.is_retryable() => {
                    let delay = retry_delay(&e, attempt);
                    log::warn!(
                        "[{}] Request failed (attempt {}/{}), retrying in {:.1}s: {}",
                        provider_name,
                        attempt + 1,
                        max_retries,
                        delay.as_secs_f32(),
                        e
                    );
                    tokio::time::sleep(delay).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| ProviderError::NetworkError {
            provider: provider_name.to_string(),
            detail: "All retries exhausted with no error captured".to_string(),
        }))
    }
}

fn retry_delay(error: &ProviderError, attempt: u32) -> Duration {
    if let ProviderError::RateLimited {
        retry_after: Some(secs),
        ..
    } = error
    {
        Duration::from_secs((*secs).min(MAX_RETRY_AFTER_SECS))
    } else {
        backoff_delay(attempt)
    }
}

/// 100ms, 200ms, 400ms, ... capped at 10s.
fn backoff_delay(attempt: u32) -> Duration {
    let capped_attempt = attempt.min(20);
    let delay_ms = 100_u64.saturating_mul(1_u64 << capped_attempt);
    Duration::from_millis(delay_ms.min(MAX_BACKOFF_MS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn backoff_doubles_then_caps() {
        assert_eq!(backoff_delay(0), Duration::from_millis(100));
        assert_eq!(backoff_delay(1), Duration::from_millis(200));
        assert_eq!(backoff_delay(3), Duration::from_millis(800));
        // 100 * 2^7 = 12800ms
        assert_eq!(backoff_delay(7), Duration::from_millis(10_000));
        assert_eq!(backoff_delay(64), Duration::from_millis(10_000));
    }

    #[test]
    fn retry_after_is_capped() {
        let e = ProviderError::RateLimited {
            provider: "test".into(),
            retry_after: Some(120),
            raw_message: None,
        };
        assert_eq!(retry_delay(&e, 0), Duration::from_secs(30));

        let e = ProviderError::RateLimited {
            provider: "test".into(),
            retry_after: None,
            raw_message: None,
        };
        assert_eq!(retry_delay(&e, 2), Duration::from_millis(400));
    }

    #[test]
    fn parse_json_invalid() {
        #[derive(serde::Deserialize, Debug)]
        #[allow(dead_code)]
        struct Foo {
            x: i32,
        }
        let result: Result<Foo, ProviderError> = HttpUtils::parse_json("not json", "test");
        assert!(
            matches!(&result, Err(ProviderError::ParseError { .. })),
            "unexpected parse result: {result:?}"
        );
    }

    #[tokio::test]
    async fn rate_limited_maps_retry_after() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/limited"))
            .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "7"))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/limited", server.uri());
        let res = HttpUtils::execute_request(client.get(&url), "test", "GET", &url).await;
        assert!(
            matches!(
                &res,
                Err(ProviderError::RateLimited {
                    retry_after: Some(7),
                    ..
                })
            ),
            "unexpected result: {res:?}"
        );
    }

    #[tokio::test]
    async fn retries_gateway_errors_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/flaky", server.uri());
        let res = HttpUtils::execute_request_with_retry(client.get(&url), "test", "GET", &url, 2)
            .await;
        assert!(
            matches!(&res, Ok((200, body)) if body == "ok"),
            "unexpected result: {res:?}"
        );
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/denied"))
            .respond_with(ResponseTemplate::new(401).set_body_string("nope"))
            .expect(1)
            .mount(&server)
            .await;

        let client = reqwest::Client::new();
        let url = format!("{}/denied", server.uri());
        let res = HttpUtils::execute_request_with_retry(client.get(&url), "test", "GET", &url, 3)
            .await;
        assert!(
            matches!(&res, Ok((401, _))),
            "unexpected result: {res:?}"
        );
    }
}
