//! Repository layer: collection-scoped database operations.
//!
//! Each collection lives in its own sub-module. All public functions are
//! re-exported here.

mod alert;
mod hospital;
mod patient;

pub use alert::*;
pub use hospital::*;
pub use patient::*;
