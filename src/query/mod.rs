//! Read-side query components (C7, C8): windowed aggregation and surge
//! pricing, both pure over data already folded into the store by the
//! aggregator.

pub mod surge;
pub mod windowed;

pub use surge::{calculate_surge, surge_for_cell};
pub use windowed::windowed_counts;
