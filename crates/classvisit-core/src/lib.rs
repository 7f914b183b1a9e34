//! Core types and trait definitions for the class-visit record service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it.

// Native `async fn` in traits; the store trait spells out `Send` futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod password;
pub mod report;
pub mod score;
pub mod store;
pub mod supervisor;
pub mod teacher;
pub mod user;
pub mod validate;
pub mod visit;

pub use error::{Entity, Error, FieldError, Result, StoreError};
