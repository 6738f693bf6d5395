//! Extraction service client

mod client;

pub use client::HttpExtractionClient;
