//! Core domain types
//!
//! These types describe one pipeline run and everything it produces. They are
//! shared between the client (wire encoding) and the runner (orchestration).

pub mod dataset;
pub mod event;
pub mod lineage;
pub mod run;
