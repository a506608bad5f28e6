//! Output modules for rendering benchmark results.
//!
//! Table (comfy-table), JSON, and a progress spinner (indicatif).

pub mod json;
pub mod progress;
pub mod table;
