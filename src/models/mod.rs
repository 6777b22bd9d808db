// src/models/mod.rs

pub mod auth;
pub mod common;
pub mod free_quiz;
pub mod score_match_batch;
