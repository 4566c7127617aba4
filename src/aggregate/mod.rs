//! Period aggregation: sale grouping, establishment totals and
//! voided-document range compaction.

pub mod sales;
pub mod voided;

pub use sales::{
    EstablishmentSales, SaleGroup, establishment_count, group_sales, period_total_sales,
    sales_by_establishment,
};
pub use voided::{VoidedRange, compact_voided};
