//! HTTP request handlers

pub mod auth;
pub mod health;
pub mod property;
pub mod query;
