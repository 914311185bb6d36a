//! HTTP client shared by the marketplace and translation clients

mod client;

pub use client::{HttpClient, HttpClientBuilder};
