//! src/lib.rs
pub mod account_client;
pub mod clock;
pub mod configuration;
pub mod constants;
pub mod document_store;
pub mod domain;
pub mod email_client;
pub mod errors;
pub mod liveness_client;
pub mod middleware;
pub mod openapi;
pub mod otp;
pub mod routes;
pub mod schemas;
pub mod startup;
pub mod telemetry;
pub mod utils;
pub mod verification;
