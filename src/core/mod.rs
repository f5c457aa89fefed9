// src/core/mod.rs - Prompt composition and the question/answer flow

pub mod prompt;
pub mod tutor;
pub mod types;
