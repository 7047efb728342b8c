//! Pin Python requirements to a preferred package index and lock them with
//! hashes via an external compiler.

pub mod cli;
pub mod config;
pub mod index;
pub mod lock;
pub mod manifest;
pub mod pipeline;
pub mod requirement;
pub mod rewrite;
