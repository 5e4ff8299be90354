pub mod catalog;
pub mod delta;
pub mod erp_api;
