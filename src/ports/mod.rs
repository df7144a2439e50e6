//! Port traits at the I/O seams.

pub mod config_port;
pub mod fill_port;
pub mod report_port;
