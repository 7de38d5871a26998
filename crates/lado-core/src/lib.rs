//! Core types, policy functions and trait definitions for Lado's access
//! policy and subscription lifecycle.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! The policy functions in [`visibility`] and [`compliance`] are pure; all
//! I/O goes through [`store::PlatformStore`].

pub mod audit;
pub mod clock;
pub mod compliance;
pub mod config;
pub mod content;
pub mod engine;
pub mod error;
pub mod moderation;
pub mod store;
pub mod subscription;
pub mod user;
pub mod visibility;

pub use engine::AccessEngine;
pub use error::{Error, Result};
