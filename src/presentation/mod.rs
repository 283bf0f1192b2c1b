//! HTML document templates.

pub mod document;
