//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into use-case level APIs.
//! - Keep request surfaces decoupled from storage details.

pub mod interval_service;
