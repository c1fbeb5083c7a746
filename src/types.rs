use std::sync::Arc;

use crate::ip::IpSource;
use crate::lookup::PublishedLookup;
use crate::provider::DnsProvider;

#[derive(Clone)]
pub struct AppState {
    pub dns_provider: Arc<dyn DnsProvider + Send + Sync>,
    pub ip_source: Arc<dyn IpSource + Send + Sync>,
    /// Consulted before the provider; a match skips all provider calls.
    pub published_lookup: Option<Arc<dyn PublishedLookup + Send + Sync>>,
    pub domain: String,
    pub ttl: u32,
}
