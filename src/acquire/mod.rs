//! Downloading and unpacking remote datasets into the local cache directory.

pub mod error;
pub mod fetcher;
