//! Output formatting and persistence of the winning strategy
//!
//! - `text`: human-readable run report on stdout
//! - `json`: machine-readable run summary
//! - `sink`: long-term record of the chosen strategy

pub mod json;
pub mod sink;
pub mod text;
