pub mod analyzers;
pub mod config;
pub mod enrich;
pub mod loader;
pub mod mode;
pub mod output;
pub mod parser;
pub mod records;
