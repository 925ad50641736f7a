pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod managers;
pub mod services;
pub mod utils;
