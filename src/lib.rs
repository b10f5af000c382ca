//! Library crate for host-sentinel-rs exposing reusable modules.
pub mod alerts;
pub mod catalog;
pub mod classify;
pub mod ports;
pub mod prober;
pub mod resolve;
pub mod scanner;
pub mod types;
