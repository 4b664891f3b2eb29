//! Store Finder Library
//!
//! This module exposes the application, data clients and filter pipeline
//! for use by the binary and in integration tests.

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod favorites;
pub mod filter;
pub mod logging;
pub mod resolver;
pub mod route;
pub mod search;
pub mod ui;
