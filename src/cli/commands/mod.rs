pub mod config;
pub mod edit;
pub mod generate;
pub mod serve;
