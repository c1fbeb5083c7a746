use std::net::{IpAddr, Ipv4Addr};

use async_trait::async_trait;
use hickory_resolver::TokioResolver;
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use rootcause::prelude::ResultExt;
use rootcause::{Report, report};
use tracing::debug;

use crate::resolver::{GOOGLE_DNS, uncached_resolver};

pub const DEFAULT_ECHO_URL: &str = "https://ipv4.icanhazip.com";

const MY_IP_RESOLVER: &str = "resolver1.opendns.com.";
const MY_IP_HOST: &str = "myip.opendns.com.";

#[async_trait]
pub trait IpSource {
    async fn current_ipv4(&self) -> Result<Ipv4Addr, Report>;
}

pub struct HttpEchoIpSource {
    url: String,
    client: reqwest::Client,
}

impl HttpEchoIpSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl IpSource for HttpEchoIpSource {
    async fn current_ipv4(&self) -> Result<Ipv4Addr, Report> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("Requesting public IP")
            .attach(format!("url: '{}'", self.url))?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .map(|it| it.to_str().unwrap_or("<invalid utf8>").to_string());
        let body = response
            .text()
            .await
            .context("Reading public IP response")
            .attach(format!("url: '{}'", self.url))?;

        parse_echo_response(status, content_type.as_deref(), &body)
            .attach(format!("url: '{}'", self.url))
    }
}

fn parse_echo_response(
    status: StatusCode,
    content_type: Option<&str>,
    body: &str,
) -> Result<Ipv4Addr, Report> {
    if status != StatusCode::OK {
        return Err(report!("HTTP error from IP echo service").attach(format!("status: {status}")));
    }

    let is_plain_text = content_type
        .is_some_and(|it| it == "text/plain" || it.starts_with("text/plain;"));
    if !is_plain_text {
        return Err(report!("Missing or bad content-type from IP echo service")
            .attach(format!("content-type: {content_type:?}")));
    }

    let body = body.trim();
    let ip = body
        .parse::<Ipv4Addr>()
        .context("Malformed response data from IP echo service")
        .attach(format!("response: {body:?}"))?;
    Ok(ip)
}

/// Asks OpenDNS which address our query arrived from.
///
/// The OpenDNS resolver itself is located through Google's public DNS so that
/// no local resolver or cache sits between us and the answer.
pub struct DnsIpSource {
    bootstrap: TokioResolver,
}

impl DnsIpSource {
    pub fn new() -> Self {
        Self {
            bootstrap: uncached_resolver(&[GOOGLE_DNS]),
        }
    }
}

impl Default for DnsIpSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IpSource for DnsIpSource {
    async fn current_ipv4(&self) -> Result<Ipv4Addr, Report> {
        let resolver_ips = self
            .bootstrap
            .ipv4_lookup(MY_IP_RESOLVER)
            .await
            .context("Resolving the OpenDNS resolver address")
            .attach(format!("host: '{MY_IP_RESOLVER}'"))?
            .iter()
            .map(|it| IpAddr::V4(it.0))
            .collect::<Vec<_>>();

        debug!(nameservers = ?resolver_ips, "Resolved OpenDNS resolver");

        let answer = uncached_resolver(&resolver_ips)
            .ipv4_lookup(MY_IP_HOST)
            .await
            .context("Looking up our public IP over DNS")
            .attach(format!("host: '{MY_IP_HOST}'"))?;

        answer
            .iter()
            .next()
            .map(|it| it.0)
            .ok_or_else(|| report!("No address returned for our public IP").attach(MY_IP_HOST))
    }
}
