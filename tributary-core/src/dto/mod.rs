//! Data Transfer Objects for the node service
//!
//! Request payloads and response envelopes of the remote methods. Domain
//! types that travel unchanged (Event, DatasetConfig, LineageRecord) live in
//! `domain` and are embedded here where a method wraps them.

pub mod correlation;
pub mod dag;
pub mod event;
pub mod lineage;
