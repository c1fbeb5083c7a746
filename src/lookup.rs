use std::net::Ipv4Addr;

use async_trait::async_trait;
use hickory_resolver::TokioResolver;
use rootcause::Report;
use rootcause::prelude::ResultExt;

use crate::resolver::{CLOUDFLARE_DNS, GOOGLE_DNS, uncached_resolver};

#[async_trait]
pub trait PublishedLookup {
    async fn published_ipv4(&self, domain: &str) -> Result<Vec<Ipv4Addr>, Report>;
}

pub struct PublicDnsLookup {
    resolver: TokioResolver,
}

impl PublicDnsLookup {
    pub fn new() -> Self {
        Self {
            resolver: uncached_resolver(&[CLOUDFLARE_DNS, GOOGLE_DNS]),
        }
    }
}

impl Default for PublicDnsLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PublishedLookup for PublicDnsLookup {
    async fn published_ipv4(&self, domain: &str) -> Result<Vec<Ipv4Addr>, Report> {
        let answer = match self.resolver.ipv4_lookup(format!("{domain}.")).await {
            Err(e) if e.is_no_records_found() || e.is_nx_domain() => return Ok(Vec::new()),
            result => result
                .context("Resolving published A records")
                .attach(format!("domain: '{domain}'"))?,
        };
        Ok(answer.iter().map(|it| it.0).collect())
    }
}
