//! Markdown rendering.
//!
//! The pipeline is pure: it accepts markdown text and produces an HTML
//! fragment. Page assembly and persistence happen in the caller.

mod service;
mod types;

pub use service::{ComrakRenderService, RenderPipelineConfig};
pub use types::{RenderError, RenderService};
