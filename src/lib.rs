//! Core library for the erp-catalog-sync command line application.
//!
//! The library reconciles the product catalogs of two ERP company accounts.
//! Raw records are projected into canonical products by
//! [`erp::catalog::normalize`], compared with [`erp::catalog::compare`] and
//! merged by [`erp::catalog::merge`] into four delta buckets. IO adapters for
//! catalog dumps, delta files and the product API live under
//! [`erp::catalog::io`]; [`erp::catalog::apply`] and [`erp::catalog::report`]
//! push the deltas out and surface failures. [`erp::catalog::stock`] copies
//! warehouse stock between the systems and [`erp::catalog::sync`]
//! orchestrates a full run.

pub mod erp;

pub use erp::catalog::{
    Result, SyncError, apply, compare, config, error, io, merge, model, normalize, report, stock,
    sync,
};
