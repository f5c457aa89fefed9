// src/lib.rs - Library root for hoctap

pub mod api;
pub mod cli;
pub mod core;
pub mod imaging;
pub mod infra;
pub mod provider;
