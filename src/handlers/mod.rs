//! Axum handlers, one module per resource.

pub mod admin;
pub mod appointments;
pub mod assistant;
pub mod auth;
pub mod cases;
pub mod clients;
pub mod documents;
pub mod invoices;
pub mod predefined;
pub mod prompts;
pub mod stats;
