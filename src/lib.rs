// aifiler - AI-powered, local-first file and folder assistant
// Library exports

pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod planning;
pub mod providers;
