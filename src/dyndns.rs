use rootcause::prelude::ResultExt;
use rootcause::{Report, report};
use tracing::{debug, info, warn};

use crate::domain::{find_zone, zone_candidates};
use crate::provider::{DnsRecordType, RecordId, RecordSpec};
use crate::types::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Unchanged,
    Created(RecordId),
    Updated(RecordId),
}

/// Points the A record of the configured domain at our current public IP.
///
/// Any error aborts the run. Running again with an unchanged IP performs no
/// mutating calls.
pub(crate) async fn sync_record(state: &AppState) -> Result<SyncOutcome, Report> {
    info!("Discovering public IPv4 address...");
    let local_ip = state
        .ip_source
        .current_ipv4()
        .await
        .context("Failed to discover public IP")?;
    info!(ip = %local_ip, "Got local IP");

    if let Some(lookup) = &state.published_lookup {
        let published = lookup
            .published_ipv4(&state.domain)
            .await
            .context("Failed to look up published record")
            .attach(format!("domain: '{}'", state.domain))?;
        debug!(domain = %state.domain, published = ?published, "Resolved published addresses");

        if published == [local_ip] {
            info!(domain = %state.domain, ip = %local_ip, "Published record already points at local IP; exiting");
            return Ok(SyncOutcome::Unchanged);
        }
    }

    info!("Listing Cloudflare zones...");
    let zones = state.dns_provider.list_zones().await?;
    let Some(zone) = find_zone(&zones, &state.domain) else {
        return Err(report!("No zone found for domain")
            .attach(format!("domain: '{}'", state.domain))
            .attach(format!("candidates: {:?}", zone_candidates(&state.domain))));
    };
    info!(zone_id = %zone.id, zone = %zone.name, "Got zone");

    info!("Listing DNS records for zone...");
    let records = state
        .dns_provider
        .list_records(&zone.id, &state.domain)
        .await?
        .into_iter()
        .filter(|it| it.typ == DnsRecordType::A && it.name.eq_ignore_ascii_case(&state.domain))
        .collect::<Vec<_>>();

    let desired = RecordSpec {
        typ: DnsRecordType::A,
        name: state.domain.clone(),
        content: local_ip.to_string(),
        ttl: state.ttl,
    };

    match records.as_slice() {
        [] => {
            info!("No DNS record found; creating one...");
            let record_id = state
                .dns_provider
                .create_record(&zone.id, &desired)
                .await
                .attach(format!("domain: '{}'", state.domain))?;
            info!(record_id = %record_id, domain = %state.domain, ip = %local_ip, "DNS record created");
            Ok(SyncOutcome::Created(record_id))
        }
        [record] if record.content == desired.content => {
            info!(domain = %state.domain, ip = %local_ip, "DNS record is already current; exiting");
            Ok(SyncOutcome::Unchanged)
        }
        [record] => {
            info!(record_id = %record.id, old_ip = %record.content, "Updating existing DNS record...");
            let record_id = state
                .dns_provider
                .update_record(&zone.id, &record.id, &desired)
                .await
                .attach(format!("domain: '{}'", state.domain))?;
            info!(record_id = %record_id, domain = %state.domain, ip = %local_ip, "DNS record updated");
            Ok(SyncOutcome::Updated(record_id))
        }
        _ => {
            warn!(domain = %state.domain, count = records.len(), "Refusing to pick between multiple A records");
            Err(report!("Multiple A records found for domain")
                .attach(format!("domain: '{}'", state.domain))
                .attach(format!(
                    "record_ids: {:?}",
                    records.iter().map(|it| &it.id.0).collect::<Vec<_>>()
                )))
        }
    }
}
