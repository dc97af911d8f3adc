//! Rasterization: decode the assembled SVG, draw it onto a surface, encode PNG.
//!
//! Backed by `resvg`. HTML inside `foreignObject` is not laid out by resvg, so
//! only SVG-native content is painted; geometry and error behavior follow the
//! assembled document.

use crate::assemble::decode_data_uri;
use crate::{Error, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use resvg::usvg::{Options, Tree};
use tiny_skia::{Pixmap, Transform};
use std::fmt;

pub const PNG_DATA_URI_PREFIX: &str = "data:image/png;base64,";

/// A decoded image with its natural pixel size
pub struct RenderedImage {
    tree: Tree,
    width: u32,
    height: u32,
}

impl RenderedImage {
    /// Decode an SVG data URI
    pub fn decode(data_uri: &str) -> Result<Self> {
        let (_, bytes) = decode_data_uri(data_uri)?;
        Self::from_svg_bytes(&bytes)
    }

    /// Decode raw SVG bytes
    pub fn from_svg_bytes(bytes: &[u8]) -> Result<Self> {
        let opt = Options::default();
        let tree = Tree::from_data(bytes, &opt).map_err(|e| Error::Decode(format!("invalid SVG: {}", e)))?;
        let size = tree.size().to_int_size();
        Ok(Self {
            width: size.width(),
            height: size.height(),
            tree,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl fmt::Debug for RenderedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

/// An RGBA drawing surface
#[derive(Clone)]
pub struct Surface {
    pixmap: Pixmap,
}

impl Surface {
    /// Create a transparent surface
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width, height)
            .ok_or_else(|| Error::Render(format!("cannot allocate a {}x{} surface", width, height)))?;
        Ok(Self { pixmap })
    }

    /// Create a surface of the image's natural size with the image drawn at the origin
    pub fn from_image(image: &RenderedImage) -> Result<Self> {
        let mut surface = Self::new(image.width(), image.height())?;
        surface.draw(image);
        Ok(surface)
    }

    /// Draw an image at the origin
    pub fn draw(&mut self, image: &RenderedImage) {
        resvg::render(&image.tree, Transform::default(), &mut self.pixmap.as_mut());
    }

    pub fn width(&self) -> u32 {
        self.pixmap.width()
    }

    pub fn height(&self) -> u32 {
        self.pixmap.height()
    }

    /// Premultiplied RGBA pixel data, row-major
    pub fn pixels(&self) -> &[u8] {
        self.pixmap.data()
    }

    /// Encode the surface contents as PNG
    pub fn to_png(&self) -> Result<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| Error::Encode(format!("PNG encoding failed: {}", e)))
    }

    /// Encode the surface contents as a `data:image/png;base64,` URI
    pub fn to_png_data_uri(&self) -> Result<String> {
        let png = self.to_png()?;
        Ok(format!("{}{}", PNG_DATA_URI_PREFIX, STANDARD.encode(png)))
    }
}

impl fmt::Debug for Surface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width())
            .field("height", &self.height())
            .finish()
    }
}
