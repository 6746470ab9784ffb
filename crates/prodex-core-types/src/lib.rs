//! Core types shared across prodex facilities
//!
//! This crate provides the vocabulary used by both the error and logging
//! facilities:
//!
//! - **Schema constants**: canonical field keys and event names

pub mod schema;
