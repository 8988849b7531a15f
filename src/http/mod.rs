//! The request pipeline: dispatch, response classification, and session retry.

mod classify;
mod client;

pub use classify::{Outcome, classify};
pub use client::RestClient;
