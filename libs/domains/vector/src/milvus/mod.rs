mod client;
mod config;

pub use client::MilvusIndex;
pub use config::MilvusConfig;
