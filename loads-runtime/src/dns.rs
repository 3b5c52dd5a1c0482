use crate::error::DnsError;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Mutex;
use tokio::net::lookup_host;
use tracing::debug;
use url::Url;

/// Result of [`DnsResolver::resolve`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved {
    /// The input URL with its host replaced by `resolved`.
    pub url: Url,
    pub original: String,
    pub resolved: IpAddr,
}

/// Host resolver with a per-instance cache, so that name resolution does not become the
/// bottleneck of a load test.
///
/// One resolver is created per run and handed to scenarios; nothing is cached process-wide.
#[derive(Debug, Default)]
pub struct DnsResolver {
    cache: Mutex<HashMap<String, Vec<IpAddr>>>,
}

impl DnsResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the host of `url`. When a host has several addresses one is picked at random on
    /// every call.
    pub async fn resolve(&self, url: &str) -> Result<Resolved, DnsError> {
        let mut url = Url::parse(url)?;
        let original = url
            .host_str()
            .ok_or_else(|| DnsError::NoHost(url.to_string()))?
            .trim_matches(|c| c == '[' || c == ']')
            .to_string();
        let port = url.port_or_known_default().unwrap_or(80);

        let addrs = match self.cached(&original)? {
            Some(addrs) => addrs,
            None => {
                let addrs: Vec<IpAddr> = lookup_host((original.as_str(), port))
                    .await?
                    .map(|addr| addr.ip())
                    .collect();
                debug!("Resolved {original} to {addrs:?}");
                self.cache.lock()?.insert(original.clone(), addrs.clone());
                addrs
            }
        };

        let resolved = *addrs
            .choose(&mut rand::thread_rng())
            .ok_or_else(|| DnsError::NoAddress(original.clone()))?;

        url.set_ip_host(resolved)
            .map_err(|_| DnsError::InvalidHost(url.to_string()))?;

        Ok(Resolved {
            url,
            original,
            resolved,
        })
    }

    /// Seed the cache, bypassing lookups for `host`.
    pub fn insert(&self, host: &str, addrs: Vec<IpAddr>) -> Result<(), DnsError> {
        self.cache.lock()?.insert(host.to_string(), addrs);
        Ok(())
    }

    pub fn cached(&self, host: &str) -> Result<Option<Vec<IpAddr>>, DnsError> {
        Ok(self.cache.lock()?.get(host).cloned())
    }
}
