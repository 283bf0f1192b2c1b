use thiserror::Error;

/// Converts markdown text into an HTML fragment.
///
/// Implementations must be side-effect free; any UTF-8 input is valid
/// markdown and degrades to literal text where it does not parse.
pub trait RenderService: Send + Sync {
    fn render(&self, markdown: &str) -> Result<String, RenderError>;
}

/// Failures raised while producing the HTML fragment.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to format markdown: {message}")]
    Markdown { message: String },
}
