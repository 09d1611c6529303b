//! Tributary Core
//!
//! Core types shared by the Tributary pipeline coordinator.
//!
//! This crate contains:
//! - Domain types: pipeline runs, dataset configs, lineage records, events
//! - DTOs: request and response shapes of the node service methods

pub mod domain;
pub mod dto;
