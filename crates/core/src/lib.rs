//! Domain logic for interpreting uploaded images.
//!
//! Holds the annotation data model, the response normalizer, the safety
//! policy, the view builder and the provider traits the HTTP server and CLI
//! inject concrete cloud clients through.

pub mod annotation;
pub mod error;
pub mod languages;
pub mod normalizer;
pub mod pipeline;
pub mod providers;
pub mod safety;
pub mod upload;
pub mod view;
