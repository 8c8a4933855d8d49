//! Port traits at the seams between the screening domain and the outside world.

pub mod config_port;
pub mod data_port;
pub mod report_port;
