//! Generation orchestration: fetch, reconcile, aggregate, map, render,
//! validate, package, record.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use futures::try_join;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::aggregate::{
    compact_voided, establishment_count, group_sales, period_total_sales, sales_by_establishment,
};
use crate::core::{AtsError, ExportRecord, FiscalPeriod, TaxpayerProfile};
use crate::document::mapper::map_declaration;
use crate::gateway::{
    GenerationEntry, GenerationHistory, GenerationStatistics, PeriodData, PeriodDataGateway,
};
use crate::reconcile::{check_export, check_sale, reconcile_purchases};
use crate::schema::{SchemaValidator, ValidationReport, select_validator};
use crate::xml::{render, write_artifacts};

/// Process-level settings for the generator.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Directory under which per-tenant artifact directories are created.
    pub output_root: PathBuf,
    /// Path to the regulator's XSD; absent or unreadable selects the
    /// structural validator.
    pub xsd_path: Option<PathBuf>,
}

impl GeneratorConfig {
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            xsd_path: None,
        }
    }

    pub fn with_xsd(mut self, path: impl Into<PathBuf>) -> Self {
        self.xsd_path = Some(path.into());
        self
    }
}

/// Everything a successful generation hands back to the caller.
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub xml: String,
    pub archive: Vec<u8>,
    pub xml_path: PathBuf,
    pub zip_path: PathBuf,
    pub statistics: GenerationStatistics,
    /// Schema findings. Validation never blocks generation; check
    /// [`valid`](crate::schema::ValidationReport::valid) before filing.
    pub validation: ValidationReport,
}

/// Aggregate counts and sums for a period, without touching the filesystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub period: FiscalPeriod,
    pub purchases: usize,
    pub sale_groups: usize,
    pub establishments: usize,
    pub exports: usize,
    pub withholdings: usize,
    pub voided_ranges: usize,
    /// `totalVentas` as the declaration would carry it.
    pub total_sales: Decimal,
    /// Sum of declared purchase totals.
    pub total_purchases: Decimal,
}

/// The ATS generation engine.
///
/// Stateless between runs: every call works on its own snapshot of period
/// data. Nothing serializes concurrent runs for the same tenant and period;
/// they race on the same output paths, last write wins. Callers that must
/// prevent that need their own mutual exclusion around [`generate`].
///
/// [`generate`]: AtsGenerator::generate
pub struct AtsGenerator {
    gateway: Arc<dyn PeriodDataGateway>,
    history: Arc<dyn GenerationHistory>,
    validator: Arc<dyn SchemaValidator>,
    config: GeneratorConfig,
}

impl AtsGenerator {
    /// Build a generator, selecting the schema validator from the config.
    pub fn new(
        gateway: Arc<dyn PeriodDataGateway>,
        history: Arc<dyn GenerationHistory>,
        config: GeneratorConfig,
    ) -> Self {
        let validator = select_validator(config.xsd_path.as_deref());
        Self {
            gateway,
            history,
            validator,
            config,
        }
    }

    /// Replace the schema validator, for callers that wire their own.
    pub fn with_validator(mut self, validator: Arc<dyn SchemaValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Generate the declaration for one tenant and period, write the XML
    /// and archive, and record the run.
    pub async fn generate(
        &self,
        tenant: &str,
        period: &str,
        requested_by: &str,
    ) -> Result<GenerationResult, AtsError> {
        let period: FiscalPeriod = period.parse()?;
        info!(tenant, %period, requested_by, "generating ATS declaration");

        let (profile, data) = self.fetch(tenant, period).await?;

        let reconciled = reconcile_purchases(&data.purchases)?;
        for sale in data.sales.iter().filter(|s| s.state.is_declarable()) {
            check_sale(sale)?;
        }
        let exports = declarable_exports(&data.exports)?;

        let sale_groups = group_sales(&data.sales);
        let establishments = sales_by_establishment(&data.sales);
        let voided_ranges = compact_voided(&data.voided);
        let distinct_establishments = establishment_count(&data.sales);
        let total_sales = period_total_sales(&data.sales, &data.exports);
        debug!(
            purchases = reconciled.len(),
            sale_groups = sale_groups.len(),
            establishments = establishments.len(),
            exports = exports.len(),
            voided_ranges = voided_ranges.len(),
            %total_sales,
            "period aggregated"
        );

        let document = map_declaration(
            &profile,
            period,
            &reconciled,
            &sale_groups,
            &establishments,
            &exports,
            &voided_ranges,
            distinct_establishments,
            total_sales,
        );
        let xml = render(&document)?;
        debug!(bytes = xml.len(), "declaration rendered");

        let validation = self.validator.validate(&xml);
        if validation.valid {
            debug!(validator = self.validator.name(), "schema validation passed");
        } else {
            warn!(
                validator = self.validator.name(),
                errors = validation.errors.len(),
                warnings = validation.warnings.len(),
                "schema validation found problems; generation continues"
            );
        }

        let artifacts = write_artifacts(&self.config.output_root, &profile.ruc, period, &xml)?;
        info!(
            xml = %artifacts.xml_path.display(),
            archive = %artifacts.zip_path.display(),
            "artifacts written"
        );

        let statistics = GenerationStatistics {
            purchases: reconciled.len(),
            sale_groups: sale_groups.len(),
            establishments: establishments.len(),
            exports: exports.len(),
            withholdings: data.withholdings.len(),
            voided_ranges: voided_ranges.len(),
            total_sales,
            xml_bytes: xml.len(),
            archive_bytes: artifacts.archive.len(),
        };

        self.history
            .record(GenerationEntry {
                tenant: tenant.to_owned(),
                period,
                requested_by: requested_by.to_owned(),
                xml_path: artifacts.xml_path.clone(),
                zip_path: artifacts.zip_path.clone(),
                generated_at: Utc::now(),
                schema_valid: validation.valid,
                statistics: statistics.clone(),
            })
            .await?;

        Ok(GenerationResult {
            xml,
            archive: artifacts.archive,
            xml_path: artifacts.xml_path,
            zip_path: artifacts.zip_path,
            statistics,
            validation,
        })
    }

    /// Aggregate counts and sums for a period, skipping rendering,
    /// packaging and schema validation.
    pub async fn preview(&self, tenant: &str, period: &str) -> Result<PeriodSummary, AtsError> {
        let period: FiscalPeriod = period.parse()?;
        let (_, data) = self.fetch(tenant, period).await?;

        let reconciled = reconcile_purchases(&data.purchases)?;
        for sale in data.sales.iter().filter(|s| s.state.is_declarable()) {
            check_sale(sale)?;
        }
        let exports = declarable_exports(&data.exports)?;

        let total_purchases = reconciled
            .iter()
            .map(|r| r.purchase.declared_total)
            .sum();

        Ok(PeriodSummary {
            period,
            purchases: reconciled.len(),
            sale_groups: group_sales(&data.sales).len(),
            establishments: sales_by_establishment(&data.sales).len(),
            exports: exports.len(),
            withholdings: data.withholdings.len(),
            voided_ranges: compact_voided(&data.voided).len(),
            total_sales: period_total_sales(&data.sales, &data.exports),
            total_purchases,
        })
    }

    /// Snapshot the period: taxpayer first, then the four record queries
    /// concurrently, then the voided stubs.
    async fn fetch(
        &self,
        tenant: &str,
        period: FiscalPeriod,
    ) -> Result<(TaxpayerProfile, PeriodData), AtsError> {
        let profile = self.gateway.taxpayer(tenant).await?;

        let (purchases, sales, exports, withholdings) = try_join!(
            self.gateway.purchases(tenant, period),
            self.gateway.sales(tenant, period),
            self.gateway.exports(tenant, period),
            self.gateway.withholdings(tenant, period),
        )?;
        let voided = self.gateway.voided_documents(tenant, period).await?;
        debug!(
            purchases = purchases.len(),
            sales = sales.len(),
            exports = exports.len(),
            withholdings = withholdings.len(),
            voided = voided.len(),
            "period data fetched"
        );

        Ok((
            profile,
            PeriodData {
                purchases,
                sales,
                exports,
                withholdings,
                voided,
            },
        ))
    }
}

fn declarable_exports(exports: &[ExportRecord]) -> Result<Vec<ExportRecord>, AtsError> {
    let declarable: Vec<ExportRecord> = exports
        .iter()
        .filter(|e| e.state.is_declarable())
        .cloned()
        .collect();
    for export in &declarable {
        check_export(export)?;
    }
    Ok(declarable)
}
