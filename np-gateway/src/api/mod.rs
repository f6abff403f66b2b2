//! HTTP API handlers

pub mod fusion;
pub mod health;
pub mod proxy;
pub mod tips;
