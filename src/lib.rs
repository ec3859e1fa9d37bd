// src/lib.rs

//! Regulus export control notice scanner library

pub mod error;
pub mod models;
pub mod pipeline;
pub mod services;
pub mod storage;
pub mod utils;
