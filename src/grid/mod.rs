//! Regular longitude/latitude grids, nearest-cell lookup and monthly climatologies.

pub mod axis;
pub mod climatology;
pub mod error;
pub mod monthly_grid;
pub mod sample;
