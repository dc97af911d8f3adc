//! foreign-html
//!
//! Renders an HTML fragment plus its CSS into an image by inlining every
//! referenced resource as a data URI, wrapping the result in an SVG
//! `foreignObject` and rasterizing that SVG.
//!
//! # Pipeline
//!
//! - **scan**: naive `url(` / `src=` token scanning of style and content text
//! - **fetch**: concurrent fan-out over referenced resources, one phase for
//!   styles and one for content
//! - **substitute**: literal replacement of each reference with its data URI
//! - **assemble**: XHTML serialization inside an SVG document, base64 encoded
//! - **raster**: decode, draw onto a surface, encode PNG
//!
//! # Example
//!
//! ```no_run
//! use foreign_html::{Dimensions, ForeignHtmlRenderer, RenderConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RenderConfig {
//!     base_url: Some("https://example.com/".to_string()),
//!     ..Default::default()
//! };
//! let styles = vec![".logo{background:url(img/logo.png)}".to_string()];
//! let renderer = ForeignHtmlRenderer::new(styles, config)?;
//! let png = renderer
//!     .render_to_base64_png("<div class=\"logo\"></div>", Some(Dimensions::new(320, 200)))
//!     .await?;
//! assert!(png.starts_with("data:image/png;base64,"));
//! # Ok(())
//! # }
//! ```

use std::collections::HashMap;

pub mod error;
pub use error::{Error, Result};

pub mod assemble;
pub mod fetch;
pub mod raster;
pub mod renderer;
pub mod scan;
pub mod styles;
pub mod substitute;

pub use fetch::{HttpFetcher, Resource, ResourceFetcher, StaticFetcher};
pub use raster::{RenderedImage, Surface};
pub use renderer::ForeignHtmlRenderer;

/// Configuration for a renderer
///
/// Defaults are conservative: a 30 second per-request timeout, no base URL
/// (relative references fail to resolve), unbounded fetch fan-out and the
/// legacy 960×850 / 800×800 layout.
///
/// # Examples
///
/// ```
/// let cfg = foreign_html::RenderConfig::default();
/// assert_eq!(cfg.dimensions.width, 960);
/// ```
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// User agent string sent with resource requests
    pub user_agent: String,
    /// Timeout for each resource request in milliseconds
    pub timeout_ms: u64,
    /// Extra HTTP headers sent with resource requests
    pub headers: HashMap<String, String>,
    /// Base URL that relative references are resolved against
    pub base_url: Option<String>,
    /// Maximum in-flight requests per phase (0 => unbounded)
    pub fetch_concurrency: usize,
    /// Dimensions used when a render call passes none
    pub dimensions: Dimensions,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("foreign-html/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout_ms: 30000,
            headers: HashMap::new(),
            base_url: None,
            fetch_concurrency: 0,
            dimensions: Dimensions::default(),
        }
    }
}

/// Pixel size of the SVG document and of its `foreignObject`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
    pub object_width: u32,
    pub object_height: u32,
}

impl Dimensions {
    /// Document and `foreignObject` both `width`×`height`
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            object_width: width,
            object_height: height,
        }
    }
}

impl Default for Dimensions {
    fn default() -> Self {
        Self {
            width: 960,
            height: 850,
            object_width: 800,
            object_height: 800,
        }
    }
}
