pub mod config;
pub mod logging;

pub mod analysis;
pub mod archive;
pub mod control;
pub mod convert;
pub mod dataset;
pub mod fetch;
pub mod layout;
pub mod pipeline;
pub mod retry;
pub mod scheduler;
pub mod sniff;
pub mod stats;
pub mod years;
