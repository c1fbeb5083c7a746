use std::env::VarError;
use std::fmt;

use rootcause::prelude::ResultExt;
use rootcause::{Report, bail, report};

use crate::ip::DEFAULT_ECHO_URL;

const REQUIRED_VARS: &[&str] = &["CLOUDFLARE_EMAIL", "CLOUDFLARE_API_KEY", "DOMAIN"];
const DEFAULT_TTL: u32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpSourceKind {
    Http,
    Dns,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    pub auth_email: String,
    pub api_key: String,
    pub domain: String,
    pub ttl: u32,
    pub ip_source: IpSourceKind,
    pub echo_url: String,
    pub verify_via_dns: bool,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("auth_email", &self.auth_email)
            .field("api_key", &"<redacted>")
            .field("domain", &self.domain)
            .field("ttl", &self.ttl)
            .field("ip_source", &self.ip_source)
            .field("echo_url", &self.echo_url)
            .field("verify_via_dns", &self.verify_via_dns)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> Result<Self, Report> {
        Self::from_vars(std::env::var)
    }

    fn from_vars(var: impl Fn(&'static str) -> Result<String, VarError>) -> Result<Self, Report> {
        ensure_vars(&var, REQUIRED_VARS)?;

        let auth_email = var("CLOUDFLARE_EMAIL").context("CLOUDFLARE_EMAIL not set")?;
        let api_key = var("CLOUDFLARE_API_KEY").context("CLOUDFLARE_API_KEY not set")?;
        let domain = normalize_domain(&var("DOMAIN").context("DOMAIN not set")?)?;

        let ttl = match optional(&var, "DNS_TTL")? {
            Some(ttl) => parse_ttl(&ttl)?,
            None => DEFAULT_TTL,
        };
        let ip_source = match optional(&var, "IP_SOURCE")?.as_deref() {
            None | Some("http") => IpSourceKind::Http,
            Some("dns") => IpSourceKind::Dns,
            Some(other) => bail!("IP_SOURCE must be 'http' or 'dns', got '{}'", other),
        };
        let echo_url = optional(&var, "IP_ECHO_URL")?.unwrap_or_else(|| DEFAULT_ECHO_URL.to_string());
        let verify_via_dns = match optional(&var, "VERIFY_VIA_DNS")?.as_deref() {
            None | Some("false" | "0") => false,
            Some("true" | "1") => true,
            Some(other) => bail!("VERIFY_VIA_DNS must be 'true' or 'false', got '{}'", other),
        };

        Ok(Self {
            auth_email,
            api_key,
            domain,
            ttl,
            ip_source,
            echo_url,
            verify_via_dns,
        })
    }
}

fn ensure_vars(
    var: &impl Fn(&'static str) -> Result<String, VarError>,
    names: &[&'static str],
) -> Result<(), Report> {
    let mut error = report!("Missing required environment variable");
    let mut is_error = false;
    for name in names {
        match var(*name) {
            Ok(_) => continue,
            Err(VarError::NotPresent) => {
                error = error.attach(format!("'{}' is not set", name));
                is_error = true;
            }
            Err(VarError::NotUnicode(e)) => {
                error = error.attach(format!("'{}' is not valid unicode: '{}'", name, e.display()));
                is_error = true;
            }
        }
    }
    if is_error { Err(error) } else { Ok(()) }
}

// Unset and blank both mean "use the default".
fn optional(
    var: &impl Fn(&'static str) -> Result<String, VarError>,
    name: &'static str,
) -> Result<Option<String>, Report> {
    match var(name) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value.trim().to_string())),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(e)) => {
            bail!("'{}' is not valid unicode: '{}'", name, e.display())
        }
    }
}

// Cloudflare accepts 1 ("automatic") or 30 to 86400 seconds.
fn parse_ttl(raw: &str) -> Result<u32, Report> {
    let ttl = raw
        .parse::<u32>()
        .context("DNS_TTL is not a number of seconds")
        .attach(format!("DNS_TTL: '{raw}'"))?;
    if ttl != 1 && !(30..=86400).contains(&ttl) {
        bail!("DNS_TTL must be 1 or between 30 and 86400, got {}", ttl);
    }
    Ok(ttl)
}

fn normalize_domain(raw: &str) -> Result<String, Report> {
    let domain = raw.trim();
    let domain = domain.strip_suffix('.').unwrap_or(domain).to_ascii_lowercase();
    if domain.is_empty() || domain.split('.').any(str::is_empty) {
        bail!("DOMAIN '{}' is not a valid domain name", raw);
    }
    Ok(domain)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&'static str) -> Result<String, VarError> + use<> {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |name| map.get(name).cloned().ok_or(VarError::NotPresent)
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("CLOUDFLARE_EMAIL", "me@example.com"),
        ("CLOUDFLARE_API_KEY", "secret"),
        ("DOMAIN", "home.example.com"),
    ];

    fn config_with(extra: &[(&str, &str)]) -> Result<Config, Report> {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend_from_slice(extra);
        Config::from_vars(vars(&pairs))
    }

    #[test]
    fn defaults_apply_when_only_required_vars_are_set() {
        let config = config_with(&[]).unwrap();
        assert_eq!(config.auth_email, "me@example.com");
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.domain, "home.example.com");
        assert_eq!(config.ttl, 120);
        assert_eq!(config.ip_source, IpSourceKind::Http);
        assert_eq!(config.echo_url, DEFAULT_ECHO_URL);
        assert!(!config.verify_via_dns);
    }

    #[test]
    fn optional_vars_are_honoured() {
        let config = config_with(&[
            ("DNS_TTL", "300"),
            ("IP_SOURCE", "dns"),
            ("IP_ECHO_URL", "https://api.ipify.org"),
            ("VERIFY_VIA_DNS", "true"),
        ])
        .unwrap();
        assert_eq!(config.ttl, 300);
        assert_eq!(config.ip_source, IpSourceKind::Dns);
        assert_eq!(config.echo_url, "https://api.ipify.org");
        assert!(config.verify_via_dns);
    }

    #[test]
    fn from_env_reads_process_environment() {
        temp_env::with_vars(
            [
                ("CLOUDFLARE_EMAIL", Some("me@example.com")),
                ("CLOUDFLARE_API_KEY", Some("secret")),
                ("DOMAIN", Some("Home.Example.com")),
                ("DNS_TTL", Some("300")),
                ("IP_SOURCE", None),
                ("IP_ECHO_URL", None),
                ("VERIFY_VIA_DNS", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.domain, "home.example.com");
                assert_eq!(config.ttl, 300);
                assert_eq!(config.ip_source, IpSourceKind::Http);
            },
        );
    }

    #[test]
    fn missing_required_vars_fail() {
        let result = Config::from_vars(vars(&[("DOMAIN", "home.example.com")]));
        assert!(result.is_err());
    }

    #[test]
    fn invalid_ttl_fails() {
        assert!(config_with(&[("DNS_TTL", "soon")]).is_err());
        assert!(config_with(&[("DNS_TTL", "0")]).is_err());
        assert!(config_with(&[("DNS_TTL", "10")]).is_err());
        assert!(config_with(&[("DNS_TTL", "90000")]).is_err());
        assert_eq!(config_with(&[("DNS_TTL", "1")]).unwrap().ttl, 1);
    }

    #[test]
    fn unknown_ip_source_fails() {
        assert!(config_with(&[("IP_SOURCE", "stun")]).is_err());
    }

    #[test]
    fn domain_is_normalized() {
        assert_eq!(normalize_domain(" Home.Example.COM. ").unwrap(), "home.example.com");
        assert!(normalize_domain("").is_err());
        assert!(normalize_domain(".").is_err());
        assert!(normalize_domain("home..example.com").is_err());
    }

    #[test]
    fn debug_output_hides_api_key() {
        let config = config_with(&[]).unwrap();
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }
}
