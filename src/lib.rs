//! Comercia fulfillment engine
//!
//! Client-side order fulfillment for the Comercia business-management
//! platform: the cart store, authoritative stock validation, the staged
//! order submission pipeline, invoice rendering and attachment management,
//! and the order status lifecycle. The backend owns the data; this crate
//! issues commands against its REST surface and reconciles partial failures
//! client-side.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod api;
pub mod cart;
pub mod client;
pub mod config;
pub mod errors;
pub mod invoice;
pub mod logging;
pub mod models;
pub mod services;

pub use client::FulfillmentClient;
pub use config::AppConfig;
pub use errors::ServiceError;
