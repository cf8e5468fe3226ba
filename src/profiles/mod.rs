//! Sampling regions into profiles and packaging them for output.

pub mod builder;
pub mod error;
pub mod writer;
