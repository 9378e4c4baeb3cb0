pub mod aws;
pub mod batch;
pub mod config;
pub mod discovery;
pub mod drain;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod output;
pub mod phases;
pub mod provider;
pub mod tagger;
pub mod tags;
pub mod types;

#[cfg(test)]
mod testing;
