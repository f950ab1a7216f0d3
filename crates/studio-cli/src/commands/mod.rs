//! CLI command implementations

pub mod capture;
pub mod catalog;
pub mod classify;
pub mod describe;
pub mod view;
