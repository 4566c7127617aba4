//! Data-access ports for declaration generation.
//!
//! The engine never talks to storage directly: a [`PeriodDataGateway`]
//! snapshots the period's records, and a [`GenerationHistory`] receives an
//! audit entry after files are written. Both are object-safe so callers can
//! wire database-backed implementations behind `Arc<dyn _>`.
//!
//! [`InMemoryGateway`] and [`InMemoryHistory`] back the tests and the demo.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::{
    AtsError, ExportRecord, FiscalPeriod, PurchaseRecord, SaleRecord, TaxpayerProfile,
    VoidedDocumentStub, WithholdingRecord,
};

/// Everything one fiscal period contributes to a declaration.
#[derive(Debug, Clone, Default)]
pub struct PeriodData {
    pub purchases: Vec<PurchaseRecord>,
    pub sales: Vec<SaleRecord>,
    pub exports: Vec<ExportRecord>,
    pub withholdings: Vec<WithholdingRecord>,
    pub voided: Vec<VoidedDocumentStub>,
}

/// Read-only snapshot source for a tenant's period records.
///
/// Implementations must return records already filtered to the requested
/// tenant and period, ordered by emission date ascending; the engine applies
/// no further tenant scoping. The record queries are independent and the
/// generator issues them concurrently, so implementations should not assume
/// call order.
#[async_trait]
pub trait PeriodDataGateway: Send + Sync {
    /// Master data of the declaring company.
    ///
    /// Returns [`AtsError::TenantNotFound`] for unknown tenants.
    async fn taxpayer(&self, tenant: &str) -> Result<TaxpayerProfile, AtsError>;

    /// Declarable purchases of the period (validated or already included),
    /// each with its linked withholding lines hydrated.
    async fn purchases(
        &self,
        tenant: &str,
        period: FiscalPeriod,
    ) -> Result<Vec<PurchaseRecord>, AtsError>;

    /// Declarable sales of the period.
    async fn sales(&self, tenant: &str, period: FiscalPeriod)
    -> Result<Vec<SaleRecord>, AtsError>;

    /// Declarable exports of the period.
    async fn exports(
        &self,
        tenant: &str,
        period: FiscalPeriod,
    ) -> Result<Vec<ExportRecord>, AtsError>;

    /// All withholding lines of the period, linked or not.
    async fn withholdings(
        &self,
        tenant: &str,
        period: FiscalPeriod,
    ) -> Result<Vec<WithholdingRecord>, AtsError>;

    /// Identifier stubs of documents voided during the period.
    async fn voided_documents(
        &self,
        tenant: &str,
        period: FiscalPeriod,
    ) -> Result<Vec<VoidedDocumentStub>, AtsError>;
}

/// Declaration counts recorded alongside every generated file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationStatistics {
    /// Purchase detail entries written.
    pub purchases: usize,
    /// Aggregated sale groups written.
    pub sale_groups: usize,
    /// Establishments listed under `ventasEstablecimiento`.
    pub establishments: usize,
    /// Export detail entries written.
    pub exports: usize,
    /// Withholding lines fetched for the period, linked or not.
    pub withholdings: usize,
    /// Compacted voided-document ranges written.
    pub voided_ranges: usize,
    /// `totalVentas`: non-electronic sales plus export FOB total of the period.
    pub total_sales: Decimal,
    /// Size of the rendered XML in bytes.
    pub xml_bytes: usize,
    /// Size of the compressed archive in bytes.
    pub archive_bytes: usize,
}

/// Audit entry for one successful generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationEntry {
    pub tenant: String,
    pub period: FiscalPeriod,
    /// User or process that requested the run.
    pub requested_by: String,
    pub xml_path: PathBuf,
    pub zip_path: PathBuf,
    pub generated_at: DateTime<Utc>,
    /// Schema-validation outcome; findings never block generation.
    pub schema_valid: bool,
    pub statistics: GenerationStatistics,
}

/// Sink for generation audit entries.
///
/// Recording happens after the files exist on disk. There is no period
/// lock: two generators running for the same tenant and period both
/// succeed, last write wins on disk and both entries land in the history.
#[async_trait]
pub trait GenerationHistory: Send + Sync {
    async fn record(&self, entry: GenerationEntry) -> Result<(), AtsError>;
}

/// Map-backed gateway for tests and demos.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    taxpayers: HashMap<String, TaxpayerProfile>,
    periods: HashMap<(String, FiscalPeriod), PeriodData>,
}

impl InMemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_taxpayer(mut self, tenant: &str, profile: TaxpayerProfile) -> Self {
        self.taxpayers.insert(tenant.to_owned(), profile);
        self
    }

    pub fn with_period_data(mut self, tenant: &str, period: FiscalPeriod, data: PeriodData) -> Self {
        self.periods.insert((tenant.to_owned(), period), data);
        self
    }

    fn period(&self, tenant: &str, period: FiscalPeriod) -> Option<&PeriodData> {
        self.periods.get(&(tenant.to_owned(), period))
    }
}

#[async_trait]
impl PeriodDataGateway for InMemoryGateway {
    async fn taxpayer(&self, tenant: &str) -> Result<TaxpayerProfile, AtsError> {
        self.taxpayers
            .get(tenant)
            .cloned()
            .ok_or_else(|| AtsError::TenantNotFound(tenant.to_owned()))
    }

    async fn purchases(
        &self,
        tenant: &str,
        period: FiscalPeriod,
    ) -> Result<Vec<PurchaseRecord>, AtsError> {
        Ok(self
            .period(tenant, period)
            .map(|d| d.purchases.clone())
            .unwrap_or_default())
    }

    async fn sales(
        &self,
        tenant: &str,
        period: FiscalPeriod,
    ) -> Result<Vec<SaleRecord>, AtsError> {
        Ok(self
            .period(tenant, period)
            .map(|d| d.sales.clone())
            .unwrap_or_default())
    }

    async fn exports(
        &self,
        tenant: &str,
        period: FiscalPeriod,
    ) -> Result<Vec<ExportRecord>, AtsError> {
        Ok(self
            .period(tenant, period)
            .map(|d| d.exports.clone())
            .unwrap_or_default())
    }

    async fn withholdings(
        &self,
        tenant: &str,
        period: FiscalPeriod,
    ) -> Result<Vec<WithholdingRecord>, AtsError> {
        Ok(self
            .period(tenant, period)
            .map(|d| d.withholdings.clone())
            .unwrap_or_default())
    }

    async fn voided_documents(
        &self,
        tenant: &str,
        period: FiscalPeriod,
    ) -> Result<Vec<VoidedDocumentStub>, AtsError> {
        Ok(self
            .period(tenant, period)
            .map(|d| d.voided.clone())
            .unwrap_or_default())
    }
}

/// Vec-backed history sink for tests and demos.
#[derive(Debug, Default)]
pub struct InMemoryHistory {
    entries: Mutex<Vec<GenerationEntry>>,
}

impl InMemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the recorded entries, oldest first.
    pub fn entries(&self) -> Vec<GenerationEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl GenerationHistory for InMemoryHistory {
    async fn record(&self, entry: GenerationEntry) -> Result<(), AtsError> {
        self.entries
            .lock()
            .map_err(|_| AtsError::Gateway("history mutex poisoned".into()))?
            .push(entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_tenant_is_not_found() {
        let gateway = InMemoryGateway::new();
        let err = gateway.taxpayer("nadie").await.unwrap_err();
        assert!(matches!(err, AtsError::TenantNotFound(t) if t == "nadie"));
    }

    #[tokio::test]
    async fn missing_period_yields_empty_sets() {
        let gateway = InMemoryGateway::new().with_taxpayer(
            "acme",
            TaxpayerProfile {
                ruc: "1790012345001".into(),
                legal_name: "ACME CIA LTDA".into(),
            },
        );
        let period = FiscalPeriod::new(6, 2024).unwrap();
        assert!(gateway.purchases("acme", period).await.unwrap().is_empty());
        assert!(gateway.voided_documents("acme", period).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_keeps_insertion_order() {
        let history = InMemoryHistory::new();
        for month in 1..=3 {
            history
                .record(GenerationEntry {
                    tenant: "acme".into(),
                    period: FiscalPeriod::new(month, 2024).unwrap(),
                    requested_by: "contador@acme.ec".into(),
                    xml_path: PathBuf::from(format!("ATS{month:02}2024.xml")),
                    zip_path: PathBuf::from(format!("AT{month:02}2024.zip")),
                    generated_at: Utc::now(),
                    schema_valid: true,
                    statistics: GenerationStatistics::default(),
                })
                .await
                .unwrap();
        }
        let entries = history.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].period.month(), 1);
        assert_eq!(entries[2].period.month(), 3);
    }
}
