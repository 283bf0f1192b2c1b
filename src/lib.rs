//! Markdown-to-HTML publishing service.
//!
//! Uploads flow through validation, rendering, page assembly, identifier
//! allocation and persistence; published pages are then listed and served
//! straight from the page store.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
