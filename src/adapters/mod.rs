//! External system integrations for VitalStream.
//!
//! - [`blob`] - blob storage backing the checkpoint client
//! - [`consumers`] - concrete downstream consumers
//!
//! # Design Pattern
//!
//! Adapters isolate storage and delivery behind the [`blob::BlobStore`] and
//! [`crate::core::consumer::EventConsumer`] traits, so the core can be tested
//! with in-memory implementations.

pub mod blob;
pub mod consumers;
