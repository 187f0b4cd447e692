//! Client for the Campaign Manager 360 reporting API, plus a polling sensor
//! that reports when an asynchronously generated report file is ready.

mod client;
mod config;
mod endpoints;
mod error;
mod sensor;
mod utils;

pub use client::CampaignManagerClient;
pub use config::{
    ClientBuilder, Connection, ImpersonationChain, DEFAULT_API_VERSION, DEFAULT_CONNECTION_ID,
};
pub use endpoints::files::{FileUrls, ReportFile};
pub use endpoints::reports::Report;
pub use error::{Error, Result};
pub use sensor::{
    wait_until_ready, PollContext, PollMode, ReportFileSensor, ReportFileStatusSource, Sensor,
};
