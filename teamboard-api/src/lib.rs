//! # Teamboard API Server Library
//!
//! HTTP surface of Teamboard: routing, request extraction, the response
//! envelope and error mapping. Business rules live in `teamboard_shared`.
//!
//! ## Modules
//!
//! - `app`: application state and router builder
//! - `config`: configuration from environment variables
//! - `error`: error handling and HTTP response mapping
//! - `extract`: JSON, path and query extractors that reject with `ApiError`
//! - `response`: success envelope
//! - `routes`: route handlers

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod response;
pub mod routes;
