//! Reporting and plotting helpers.
//!
//! Plots are small helper functions converting numerical data into
//! `plotly::Plot`; `report` assembles them into a standalone HTML page.
pub mod plots;
pub mod report;

pub use report::{Report, ReportSection};
