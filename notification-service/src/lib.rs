//! Notification Service - logs event notifications and serves the most
//! recent ones, expiring them after an hour.

pub mod config;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;
