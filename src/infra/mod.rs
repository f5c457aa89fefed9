// src/infra/mod.rs

pub mod config;
pub mod credentials;
pub mod errors;
pub mod logger;
pub mod paths;
pub mod session;
