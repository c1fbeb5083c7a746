use async_trait::async_trait;
use derive_more::Display;
use rootcause::Report;

pub mod cloudflare;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub enum DnsRecordType {
    A,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub struct RecordId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub struct ZoneId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DnsEntry {
    pub typ: DnsRecordType,
    pub id: RecordId,
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordSpec {
    pub typ: DnsRecordType,
    pub name: String,
    pub content: String,
    pub ttl: u32,
}

#[async_trait]
pub trait DnsProvider {
    async fn list_zones(&self) -> Result<Vec<Zone>, Report>;

    async fn list_records(&self, zone: &ZoneId, name: &str) -> Result<Vec<DnsEntry>, Report>;

    async fn create_record(&self, zone: &ZoneId, record: &RecordSpec) -> Result<RecordId, Report>;

    async fn update_record(
        &self,
        zone: &ZoneId,
        record_id: &RecordId,
        record: &RecordSpec,
    ) -> Result<RecordId, Report>;
}
