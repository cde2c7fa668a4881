//! Route53 error mapping

use crate::error::ProviderError;
use crate::traits::{ErrorContext, ProviderErrorMapper, RawApiError};

use super::Route53Provider;

/// Route53 error codes
/// Reference: <https://docs.aws.amazon.com/Route53/latest/APIReference/CommonErrors.html>
impl ProviderErrorMapper for Route53Provider {
    fn provider_name(&self) -> &'static str {
        "route53"
    }

    fn map_error(&self, raw: RawApiError, context: ErrorContext) -> ProviderError {
        match raw.code.as_deref() {
            Some(
                "InvalidClientTokenId"
                | "SignatureDoesNotMatch"
                | "IncompleteSignature"
                | "MissingAuthenticationToken"
                | "UnrecognizedClientException"
                | "ExpiredToken",
            ) => ProviderError::InvalidCredentials {
                provider: self.provider_name().to_string(),
                raw_message: Some(raw.message),
            },

            Some("AccessDenied" | "AccessDeniedException" | "NotAuthorizedException") => {
                ProviderError::PermissionDenied {
                    provider: self.provider_name().to_string(),
                    raw_message: Some(raw.message),
                }
            }

            Some("NoSuchHostedZone") => ProviderError::DomainNotFound {
                provider: self.provider_name().to_string(),
                domain: context.domain.unwrap_or_else(|| "<unknown>".to_string()),
                raw_message: Some(raw.message),
            },

            Some("NoSuchChange") => ProviderError::RecordNotFound {
                provider: self.provider_name().to_string(),
                record_id: context.record_id.unwrap_or_else(|| "<unknown>".to_string()),
                raw_message: Some(raw.message),
            },

            // The batch is rejected as a whole; the message says why.
            Some("InvalidChangeBatch") => {
                let message = raw.message;
                if message.contains("already exists") {
                    ProviderError::RecordExists {
                        provider: self.provider_name().to_string(),
                        record_name: context
                            .record_name
                            .unwrap_or_else(|| "<unknown>".to_string()),
                        raw_message: Some(message),
                    }
                } else if message.contains("not found") {
                    ProviderError::RecordNotFound {
                        provider: self.provider_name().to_string(),
                        record_id: context
                            .record_id
                            .or(context.record_name)
                            .unwrap_or_else(|| "<unknown>".to_string()),
                        raw_message: Some(message),
                    }
                } else {
                    ProviderError::InvalidParameter {
                        provider: self.provider_name().to_string(),
                        param: "ChangeBatch".to_string(),
                        detail: message,
                    }
                }
            }

            Some("InvalidInput" | "InvalidDomainName" | "InvalidArgument") => {
                ProviderError::InvalidParameter {
                    provider: self.provider_name().to_string(),
                    param: "input".to_string(),
                    detail: raw.message,
                }
            }

            Some("Throttling" | "ThrottlingException" | "PriorRequestNotComplete") => {
                ProviderError::RateLimited {
                    provider: self.provider_name().to_string(),
                    retry_after: None,
                    raw_message: Some(raw.message),
                }
            }

            Some("TooManyHostedZones" | "LimitsExceeded") => ProviderError::QuotaExceeded {
                provider: self.provider_name().to_string(),
                raw_message: Some(raw.message),
            },

            _ => self.unknown_error(raw),
        }
    }
}
