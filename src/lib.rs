pub mod batch;
pub mod calibration;
pub mod cli;
pub mod config;
pub mod error;
pub mod index;
pub mod logging;
pub mod photometry;
pub mod plot;
pub mod results;
pub mod scanner;
