pub mod apply;
pub mod compare;
pub mod config;
pub mod error;
pub mod io;
pub mod merge;
pub mod model;
pub mod normalize;
pub mod report;
pub mod stock;
pub mod sync;

pub use error::{Result, SyncError};
