pub mod boundary_loader;
pub mod catalog;
pub mod crs;
pub mod error;
pub mod identifier;
