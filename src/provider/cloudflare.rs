use async_trait::async_trait;
use derive_more::Display;
use reqwest::{Method, StatusCode};
use rootcause::prelude::ResultExt;
use rootcause::{Report, report};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use super::{DnsEntry, DnsProvider, DnsRecordType, RecordId, RecordSpec, Zone, ZoneId};

const API_BASE: &str = "https://api.cloudflare.com/client/v4";
const PAGE_SIZE: u32 = 50;

/// Cloudflare v4 client authenticating with an account email and global API key.
pub struct CloudflareProvider {
    api_base: String,
    auth_email: String,
    api_key: String,
    client: reqwest::Client,
}

impl CloudflareProvider {
    pub fn new(auth_email: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::with_api_base(API_BASE, auth_email, api_key)
    }

    fn with_api_base(
        api_base: impl Into<String>,
        auth_email: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            api_base: api_base.into(),
            auth_email: auth_email.into(),
            api_key: api_key.into(),
            client: reqwest::Client::new(),
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        query: &[(&str, &str)],
        body: Option<serde_json::Value>,
    ) -> Result<CloudflareResponse<T>, Report> {
        debug!(%method, endpoint, "Calling Cloudflare");

        let mut request = self
            .client
            .request(method.clone(), format!("{}{endpoint}", self.api_base))
            .header("X-Auth-Email", &self.auth_email)
            .header("X-Auth-Key", &self.api_key)
            .query(query);
        // `json` also sets the content type, so only mutating calls carry one
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .context("Sending request to Cloudflare")
            .attach(format!("request: {method} {endpoint}"))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .context("Reading Cloudflare response")
            .attach(format!("request: {method} {endpoint}"))
            .attach(format!("status: {status}"))?;

        decode_envelope(status, &text).attach(format!("request: {method} {endpoint}"))
    }

    async fn get_all_pages<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, Report> {
        let per_page = PAGE_SIZE.to_string();
        let mut items = Vec::new();
        let mut page = 1u32;

        loop {
            let page_str = page.to_string();
            let mut paged_query = query.to_vec();
            paged_query.push(("page", &page_str));
            paged_query.push(("per_page", &per_page));

            let response = self
                .send::<Vec<T>>(Method::GET, endpoint, &paged_query, None)
                .await?;
            let total_pages = response.result_info.as_ref().map_or(1, |it| it.total_pages);
            items.extend(response.into_result()?);

            if page >= total_pages {
                return Ok(items);
            }
            page += 1;
        }
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn list_zones(&self) -> Result<Vec<Zone>, Report> {
        let zones = self
            .get_all_pages::<CloudflareZone>("/zones", &[])
            .await
            .context("Listing Cloudflare zones")?;

        Ok(zones
            .into_iter()
            .map(|it| Zone {
                id: ZoneId(it.id),
                name: it.name,
            })
            .collect())
    }

    async fn list_records(
        &self,
        zone: &ZoneId,
        name: &str,
    ) -> Result<Vec<DnsEntry>, Report> {
        let records = self
            .get_all_pages::<CloudflareDnsRecord>(
                &format!("/zones/{zone}/dns_records"),
                &[("name", name)],
            )
            .await
            .context("Listing DNS records from Cloudflare")
            .attach(format!("zone: '{zone}'"))
            .attach(format!("name: '{name}'"))?;

        Ok(records.into_iter().filter_map(|it| it.into()).collect())
    }

    async fn create_record(&self, zone: &ZoneId, record: &RecordSpec) -> Result<RecordId, Report> {
        let created = self
            .send::<CloudflareDnsRecord>(
                Method::POST,
                &format!("/zones/{zone}/dns_records"),
                &[],
                Some(record_body(record)),
            )
            .await
            .context("Creating DNS record in Cloudflare")
            .attach(format!("zone: '{zone}'"))
            .attach(format!("name: '{}'", record.name))?
            .into_result()?;

        Ok(RecordId(created.id))
    }

    async fn update_record(
        &self,
        zone: &ZoneId,
        record_id: &RecordId,
        record: &RecordSpec,
    ) -> Result<RecordId, Report> {
        let updated = self
            .send::<CloudflareDnsRecord>(
                Method::PUT,
                &format!("/zones/{zone}/dns_records/{record_id}"),
                &[],
                Some(record_body(record)),
            )
            .await
            .context("Updating DNS record in Cloudflare")
            .attach(format!("zone: '{zone}'"))
            .attach(format!("record_id: '{record_id}'"))?
            .into_result()?;

        Ok(RecordId(updated.id))
    }
}

fn record_body(record: &RecordSpec) -> serde_json::Value {
    json!({
        "type": record.typ.to_string(),
        "name": record.name,
        "content": record.content,
        "ttl": record.ttl,
    })
}

fn decode_envelope<T: DeserializeOwned>(
    status: StatusCode,
    body: &str,
) -> Result<CloudflareResponse<T>, Report> {
    if status != StatusCode::OK {
        return Err(report!("HTTP error from Cloudflare")
            .attach(format!("status: {status}"))
            .attach(format!("response: {body:?}")));
    }

    let response = serde_json::from_str::<CloudflareResponse<T>>(body)
        .context("Parsing Cloudflare response")
        .attach(format!("response: {body:?}"))?;

    if !response.success {
        return Err(report!("{}", failure_message(&response.errors)));
    }

    Ok(response)
}

fn failure_message(errors: &[CloudflareError]) -> String {
    if errors.is_empty() {
        return "Non-success from Cloudflare".to_string();
    }
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(serde::Deserialize, Clone)]
struct CloudflareResponse<T> {
    success: bool,
    result: Option<T>,
    #[serde(default)]
    errors: Vec<CloudflareError>,
    result_info: Option<CloudflareResultInfo>,
}

impl<T> CloudflareResponse<T> {
    fn into_result(self) -> Result<T, Report> {
        self.result
            .ok_or_else(|| report!("Cloudflare reported success without a result"))
    }
}

#[derive(serde::Deserialize, Clone, Debug, Display)]
#[display("{code}: {message}")]
struct CloudflareError {
    code: i64,
    message: String,
}

#[derive(serde::Deserialize, Clone)]
struct CloudflareResultInfo {
    total_pages: u32,
}

#[derive(serde::Deserialize, Clone)]
struct CloudflareZone {
    id: String,
    name: String,
}

#[derive(serde::Deserialize, Clone)]
struct CloudflareDnsRecord {
    id: String,
    r#type: String,
    name: String,
    content: String,
}

impl From<CloudflareDnsRecord> for Option<DnsEntry> {
    fn from(record: CloudflareDnsRecord) -> Self {
        let typ = match record.r#type.as_str() {
            "A" => DnsRecordType::A,
            _ => {
                debug!(typ = %record.r#type, "Skipping unsupported record type");
                return None;
            }
        };
        Some(DnsEntry {
            typ,
            id: RecordId(record.id),
            name: record.name,
            content: record.content,
        })
    }
}
