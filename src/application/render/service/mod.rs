mod config;

use comrak::{Arena, format_html, nodes::AstNode, parse_document};
use tracing::debug;

use crate::application::render::types::{RenderError, RenderService};

use config::{build_sanitizer, default_options};

/// Comrak-based rendering pipeline with optional Ammonia sanitisation.
pub struct ComrakRenderService {
    options: comrak::Options<'static>,
    sanitizer: Option<ammonia::Builder<'static>>,
}

impl ComrakRenderService {
    /// Construct a renderer with the GFM extensions enabled. Raw HTML in the
    /// source is passed through unless sanitisation is switched on.
    pub fn new(config: RenderPipelineConfig) -> Self {
        let sanitizer = config.sanitize.then(build_sanitizer);
        Self {
            options: default_options(),
            sanitizer,
        }
    }

    pub fn sanitizes(&self) -> bool {
        self.sanitizer.is_some()
    }
}

impl Default for ComrakRenderService {
    fn default() -> Self {
        Self::new(RenderPipelineConfig::default())
    }
}

impl RenderService for ComrakRenderService {
    fn render(&self, markdown: &str) -> Result<String, RenderError> {
        let arena = Arena::new();
        let root = parse_document(&arena, markdown, &self.options);

        let rendered_html = render_html_stage(root, &self.options)?;

        let html = match &self.sanitizer {
            Some(sanitizer) => sanitize_stage(&rendered_html, sanitizer),
            None => rendered_html,
        };

        debug!(
            target = "mdpage::render",
            markdown_bytes = markdown.len(),
            html_bytes = html.len(),
            sanitized = self.sanitizer.is_some(),
            "markdown rendered"
        );

        Ok(html)
    }
}

#[derive(Debug, Clone, Default)]
pub struct RenderPipelineConfig {
    pub sanitize: bool,
}

impl From<&crate::config::RenderSettings> for RenderPipelineConfig {
    fn from(settings: &crate::config::RenderSettings) -> Self {
        Self {
            sanitize: settings.sanitize,
        }
    }
}

fn render_html_stage<'a>(
    root: &'a AstNode<'a>,
    options: &comrak::Options<'static>,
) -> Result<String, RenderError> {
    let mut html = String::new();
    format_html(root, options, &mut html).map_err(|err| RenderError::Markdown {
        message: err.to_string(),
    })?;
    Ok(html)
}

fn sanitize_stage(html: &str, sanitizer: &ammonia::Builder<'static>) -> String {
    sanitizer.clean(html).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(markdown: &str) -> String {
        ComrakRenderService::default()
            .render(markdown)
            .expect("render succeeds")
    }

    #[test]
    fn renders_heading_and_paragraph() {
        let html = render("# Hello\n\nWorld");
        assert!(html.contains("<h1>Hello</h1>"), "{html}");
        assert!(html.contains("<p>World</p>"), "{html}");
    }

    #[test]
    fn renders_gfm_extensions() {
        let html = render("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~\n\n- [x] done\n");
        assert!(html.contains("<table>"), "{html}");
        assert!(html.contains("<del>gone</del>"), "{html}");
        assert!(html.contains("checkbox"), "{html}");
    }

    #[test]
    fn fenced_code_keeps_language_class() {
        let html = render("```rust\nfn main() {}\n```\n");
        assert!(html.contains("<pre"), "{html}");
        assert!(html.contains("language-rust"), "{html}");
    }

    #[test]
    fn raw_html_passes_through_by_default() {
        let html = render("<script>alert(1)</script>\n\ntext");
        assert!(html.contains("<script>alert(1)</script>"), "{html}");
    }

    #[test]
    fn sanitizer_strips_scripts_but_keeps_structure() {
        let service = ComrakRenderService::new(RenderPipelineConfig { sanitize: true });
        assert!(service.sanitizes());

        let html = service
            .render("# Title\n\n<script>alert(1)</script>\n\n> quoted\n\n```rust\nlet x = 1;\n```\n")
            .expect("render succeeds");
        assert!(!html.contains("<script"), "{html}");
        assert!(html.contains("<h1>Title</h1>"), "{html}");
        assert!(html.contains("<blockquote>"), "{html}");
        assert!(html.contains("language-rust"), "{html}");
    }

    #[test]
    fn arbitrary_text_degrades_to_paragraphs() {
        let html = render("just *unclosed emphasis and [a broken link(");
        assert!(html.starts_with("<p>"), "{html}");
    }
}
