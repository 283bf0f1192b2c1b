//! Page assembly: wraps a rendered fragment in the fixed document shell.

use askama::{Error as AskamaError, Template};
use thiserror::Error;

#[derive(Template)]
#[template(path = "page.html")]
struct PageDocumentTemplate<'a> {
    content_html: &'a str,
}

#[derive(Debug, Error)]
#[error("page template rendering failed")]
pub struct AssembleError {
    #[source]
    error: AskamaError,
}

/// Produces standalone HTML documents with the built-in stylesheet.
///
/// The fragment is embedded verbatim. It is trusted to be well-formed HTML as
/// produced by the renderer; nothing is escaped here.
#[derive(Debug, Clone, Copy, Default)]
pub struct PageAssembler;

impl PageAssembler {
    pub fn assemble(&self, fragment: &str) -> Result<String, AssembleError> {
        PageDocumentTemplate {
            content_html: fragment,
        }
        .render()
        .map_err(|error| AssembleError { error })
    }
}
