//! DNS resolution abstraction used by verification

use std::time::Duration;

use async_trait::async_trait;
use hickory_resolver::{
    config::{ResolverConfig, ResolverOpts},
    name_server::TokioConnectionProvider,
    proto::rr::RecordType,
    ResolveError, TokioResolver,
};
use thiserror::Error;

/// Lookup failure, split so "nothing published" is not counted as an error
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DnsLookupError {
    /// NXDOMAIN or no records of the requested type
    #[error("no records found")]
    NoRecords,
    /// Anything else (SERVFAIL, timeout, network)
    #[error("lookup failed: {0}")]
    Failed(String),
}

pub type LookupResult = Result<Vec<String>, DnsLookupError>;

/// DNS resolver trait
///
/// TXT values come back with their character-strings joined; CNAME targets
/// come back lowercase without the trailing dot.
#[async_trait]
pub trait DnsResolver: Send + Sync {
    async fn txt_lookup(&self, name: &str) -> LookupResult;

    async fn cname_lookup(&self, name: &str) -> LookupResult;
}

/// Resolver over the host system configuration
pub struct HickoryDnsResolver {
    resolver: TokioResolver,
    timeout: Duration,
}

impl HickoryDnsResolver {
    /// System resolver; falls back to Hickory's default upstreams when the
    /// system configuration cannot be read.
    pub fn new(timeout: Duration) -> Self {
        Self::with_resolver(build_system_resolver(), timeout)
    }

    pub fn with_resolver(resolver: TokioResolver, timeout: Duration) -> Self {
        Self { resolver, timeout }
    }

    fn classify(err: &ResolveError) -> DnsLookupError {
        if err.is_no_records_found() || err.is_nx_domain() {
            DnsLookupError::NoRecords
        } else {
            DnsLookupError::Failed(err.to_string())
        }
    }
}

fn build_system_resolver() -> TokioResolver {
    #[cfg(any(unix, target_os = "windows"))]
    {
        match TokioResolver::builder_tokio() {
            Ok(builder) => return builder.build(),
            Err(e) => {
                log::warn!("Failed to load system DNS configuration, falling back to defaults: {e}");
            }
        }
    }

    TokioResolver::builder_with_config(
        ResolverConfig::default(),
        TokioConnectionProvider::default(),
    )
    .with_options(ResolverOpts::default())
    .build()
}

/// Absolute name so resolver search domains never apply.
fn fqdn(name: &str) -> String {
    let name = name.trim();
    if name.ends_with('.') {
        name.to_string()
    } else {
        format!("{name}.")
    }
}

#[async_trait]
impl DnsResolver for HickoryDnsResolver {
    async fn txt_lookup(&self, name: &str) -> LookupResult {
        let lookup = tokio::time::timeout(self.timeout, self.resolver.txt_lookup(fqdn(name)))
            .await
            .map_err(|_| DnsLookupError::Failed("timed out".to_string()))?
            .map_err(|e| Self::classify(&e))?;

        Ok(lookup
            .iter()
            .map(|txt| {
                txt.iter()
                    .map(|data| String::from_utf8_lossy(data).to_string())
                    .collect::<String>()
            })
            .collect())
    }

    async fn cname_lookup(&self, name: &str) -> LookupResult {
        let lookup = tokio::time::timeout(
            self.timeout,
            self.resolver.lookup(fqdn(name), RecordType::CNAME),
        )
        .await
        .map_err(|_| DnsLookupError::Failed("timed out".to_string()))?
        .map_err(|e| Self::classify(&e))?;

        let targets: Vec<String> = lookup
            .record_iter()
            .filter_map(|record| record.data().as_cname())
            .map(|cname| {
                cname
                    .0
                    .to_string()
                    .trim_end_matches('.')
                    .to_ascii_lowercase()
            })
            .collect();
        if targets.is_empty() {
            return Err(DnsLookupError::NoRecords);
        }
        Ok(targets)
    }
}
