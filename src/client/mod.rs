//! HTTP client for the exchange web app

pub mod messages;
pub mod rest;

pub use rest::{Credentials, HttpExchangeClient};
