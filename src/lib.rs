//! Taskboard Library
//!
//! Personal task tracking: accounts, categorised tasks with priorities and
//! due dates, and a productivity dashboard. This module exports the core
//! components for the binary and for integration tests.

pub mod auth;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod motivation;
pub mod ordering;
pub mod stats;
pub mod types;
pub mod web;
