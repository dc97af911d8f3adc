//! The render pipeline: inline resources, assemble the SVG, rasterize.

use crate::assemble::{svg_data_uri, svg_document, xhtml_fragment};
use crate::fetch::{fetch_all, is_inline, HttpFetcher, ResourceFetcher};
use crate::raster::{RenderedImage, Surface};
use crate::scan::{css_urls, html_srcs};
use crate::substitute::replace_literal;
use crate::{Dimensions, RenderConfig, Result};
use log::{debug, info, warn};
use std::collections::HashSet;

/// Renders HTML fragments with a fixed style source into images.
///
/// The style source is an ordered list of rule texts, concatenated as-is in
/// front of every rendered fragment.
pub struct ForeignHtmlRenderer<F = HttpFetcher> {
    styles: Vec<String>,
    fetcher: F,
    config: RenderConfig,
}

impl ForeignHtmlRenderer<HttpFetcher> {
    /// Create a renderer that fetches resources over HTTP (and from `file://`)
    pub fn new(styles: Vec<String>, config: RenderConfig) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config)?;
        Ok(Self::with_fetcher(styles, fetcher, config))
    }
}

impl<F: ResourceFetcher> ForeignHtmlRenderer<F> {
    /// Create a renderer with a custom resource fetcher
    pub fn with_fetcher(styles: Vec<String>, fetcher: F, config: RenderConfig) -> Self {
        Self {
            styles,
            fetcher,
            config,
        }
    }

    pub fn styles(&self) -> &[String] {
        &self.styles
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Inline every referenced resource and return the SVG document as a
    /// `data:image/svg+xml;base64,` URI.
    ///
    /// Style references are fetched and substituted before content references
    /// are scanned. `None` dimensions fall back to `RenderConfig::dimensions`.
    pub async fn build_svg_data_uri(&self, html: &str, dims: Option<Dimensions>) -> Result<String> {
        let dims = dims.unwrap_or(self.config.dimensions);

        let mut css = String::new();
        let mut css_refs = Vec::new();
        for rule in &self.styles {
            css_refs.extend(css_urls(rule));
            css.push_str(rule);
        }
        debug!("found {} url() reference(s) in {} style rule(s)", css_refs.len(), self.styles.len());
        let css = self.inline_resources(&css, css_refs).await?;

        let html_refs = html_srcs(html);
        debug!("found {} src= reference(s) in content", html_refs.len());
        let html = self.inline_resources(html, html_refs).await?;

        let svg = svg_document(&xhtml_fragment(&css, &html), dims);
        Ok(svg_data_uri(&svg))
    }

    /// Render into a decoded image
    pub async fn render_to_image(&self, html: &str, dims: Option<Dimensions>) -> Result<RenderedImage> {
        let uri = self.build_svg_data_uri(html, dims).await?;
        let image = RenderedImage::decode(&uri)?;
        info!("rendered {}x{} image", image.width(), image.height());
        Ok(image)
    }

    /// Render into a surface sized to the image's natural dimensions
    pub async fn render_to_canvas(&self, html: &str, dims: Option<Dimensions>) -> Result<Surface> {
        let image = self.render_to_image(html, dims).await?;
        Surface::from_image(&image)
    }

    /// Render into a `data:image/png;base64,` URI
    pub async fn render_to_base64_png(&self, html: &str, dims: Option<Dimensions>) -> Result<String> {
        self.render_to_canvas(html, dims).await?.to_png_data_uri()
    }

    /// Render into raw PNG bytes
    pub async fn render_to_png(&self, html: &str, dims: Option<Dimensions>) -> Result<Vec<u8>> {
        self.render_to_canvas(html, dims).await?.to_png()
    }

    // One fan-out phase: fetch each distinct reference once, then substitute.
    async fn inline_resources(&self, text: &str, refs: Vec<String>) -> Result<String> {
        let mut seen = HashSet::new();
        let mut urls = Vec::new();
        for r in refs {
            if r.is_empty() {
                warn!("skipping empty resource reference");
                continue;
            }
            if is_inline(&r) {
                continue;
            }
            if seen.insert(r.clone()) {
                urls.push(r);
            }
        }
        if urls.is_empty() {
            return Ok(text.to_string());
        }

        let fetched = fetch_all(&self.fetcher, &urls, self.config.fetch_concurrency).await?;
        // Key on the scanned reference; fetchers may report a resolved URL
        let pairs: Vec<(&str, String)> = urls
            .iter()
            .map(String::as_str)
            .zip(fetched.iter().map(|r| r.data_uri()))
            .collect();
        debug!("inlined {} resource(s)", pairs.len());
        replace_literal(text, &pairs)
    }
}
