pub mod config;
pub mod logging;

pub mod checksum;
pub mod client;
pub mod downloader;
pub mod identifier;
pub mod report;
pub mod retry;
pub mod scheduler;
pub mod search;
pub mod storage;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use client::VtClient;
