//! Lays a shopping list out on PDF pages.
//!
//! Rendering is split in two steps:
//! - [`paginate`] places every line on a page (pure, deterministic);
//! - [`ShoppingListRenderer`] turns the placed lines into printpdf operations
//!   and writes the finished document into memory or any [`Write`] sink.
//!
//! Fonts are resolved once when the renderer is built; without a configured
//! font the bundled Roboto face is embedded. Every render call works on its
//! own buffer, so concurrent calls never share output, and the same lines
//! always serialise to the same bytes.

use std::io::Write;
use std::path::Path;
use std::rc::Rc;

use printpdf::{
    FontId, Mm, Op, ParsedFont, PdfDocument, PdfPage, PdfSaveOptions, PdfWarnMsg, Point, Pt, TextItem,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use crate::contract::AggregatedLine;

const PAGE_WIDTH_MM: f32 = 210.0;
const PAGE_HEIGHT_MM: f32 = 297.0;
const PT_PER_MM: f32 = 72.0 / 25.4;

/// A4 width in points (about 595).
pub const PAGE_WIDTH_PT: f32 = PAGE_WIDTH_MM * PT_PER_MM;
/// A4 height in points (about 842).
pub const PAGE_HEIGHT_PT: f32 = PAGE_HEIGHT_MM * PT_PER_MM;

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to write rendered document: {0}")]
    RenderFailure(#[from] std::io::Error),
    #[error("invalid page layout: {0}")]
    InvalidLayout(String),
    #[error("font error: {0}")]
    Font(String),
}

/// Page geometry, in points from the bottom-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    pub font_size: f32,
    pub x: f32,
    pub top: f32,
    pub bottom: f32,
    pub line_height: f32,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            font_size: 12.0,
            x: 50.0,
            top: 750.0,
            bottom: 50.0,
            line_height: 20.0,
        }
    }
}

impl Layout {
    pub fn validate(&self) -> Result<(), RenderError> {
        let values = [self.font_size, self.x, self.top, self.bottom, self.line_height];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(RenderError::InvalidLayout("values must be finite".into()));
        }
        if self.font_size <= 0.0 {
            return Err(RenderError::InvalidLayout("font_size must be positive".into()));
        }
        if self.line_height <= 0.0 {
            return Err(RenderError::InvalidLayout("line_height must be positive".into()));
        }
        if self.bottom < 0.0 || self.top < self.bottom {
            return Err(RenderError::InvalidLayout(format!(
                "top ({}) must not be below bottom ({}) and bottom must not be negative",
                self.top, self.bottom
            )));
        }
        if self.top > PAGE_HEIGHT_PT {
            return Err(RenderError::InvalidLayout(format!(
                "top ({}) is above the page height ({PAGE_HEIGHT_PT:.2})",
                self.top
            )));
        }
        if self.x < 0.0 || self.x >= PAGE_WIDTH_PT {
            return Err(RenderError::InvalidLayout(format!(
                "x ({}) must lie within the page width ({PAGE_WIDTH_PT:.2})",
                self.x
            )));
        }
        Ok(())
    }

    /// Number of lines that fit on one page.
    pub fn lines_per_page(&self) -> usize {
        ((self.top - self.bottom) / self.line_height).floor() as usize + 1
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlacedLine {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub lines: Vec<PlacedLine>,
}

/// Place every line top-down; a new page starts whenever the cursor would
/// fall below the bottom margin. Always yields at least one page.
pub fn paginate(lines: &[AggregatedLine], layout: &Layout) -> Vec<PageLayout> {
    let mut pages = vec![PageLayout::default()];
    let mut y = layout.top;

    for line in lines {
        if y < layout.bottom {
            pages.push(PageLayout::default());
            y = layout.top;
        }
        if let Some(page) = pages.last_mut() {
            page.lines.push(PlacedLine {
                text: line.display_text(),
                x: layout.x,
                y,
            });
        }
        y -= layout.line_height;
    }
    pages
}

/// Roboto Medium (Apache-2.0); covers Latin, Cyrillic and the em dash
/// separator used by [`AggregatedLine::display_text`].
const BUNDLED_FONT: &[u8] = include_bytes!("../assets/fonts/RobotoMedium.ttf");

/// Resource name of the font inside every rendered document.
const DOCUMENT_FONT_ID: &str = "F1";

fn parse_font(bytes: &[u8]) -> Result<ParsedFont, RenderError> {
    let mut warnings: Vec<PdfWarnMsg> = Vec::new();
    let font = ParsedFont::from_bytes(bytes, 0, &mut warnings).ok_or_else(|| {
        error!(warnings = warnings.len(), "Failed to parse font");
        RenderError::Font("unsupported or corrupt font data".into())
    })?;
    if !warnings.is_empty() {
        warn!(warnings = warnings.len(), "Font parsed with warnings");
    }
    Ok(font)
}

fn bundled_font() -> Result<Rc<ParsedFont>, RenderError> {
    parse_font(BUNDLED_FONT).map(Rc::new)
}

/// Renders shopping lists with a fixed layout and a font resolved at construction.
///
/// Clones share the parsed font. printpdf fonts are not `Send`, so build one
/// renderer per worker thread.
#[derive(Clone)]
pub struct ShoppingListRenderer {
    title: String,
    layout: Layout,
    font: Rc<ParsedFont>,
    font_source: String,
}

impl std::fmt::Debug for ShoppingListRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShoppingListRenderer")
            .field("title", &self.title)
            .field("layout", &self.layout)
            .field("font", &self.font_source)
            .finish()
    }
}

impl ShoppingListRenderer {
    /// Renderer using the bundled font.
    pub fn new(title: impl Into<String>, layout: Layout) -> Result<Self, RenderError> {
        layout.validate()?;
        Ok(Self {
            title: title.into(),
            layout,
            font: bundled_font()?,
            font_source: "bundled".into(),
        })
    }

    /// Renderer embedding a TrueType/OpenType font read from `path`.
    pub fn with_font_file<P: AsRef<Path>>(
        title: impl Into<String>,
        layout: Layout,
        path: P,
    ) -> Result<Self, RenderError> {
        let path_ref = path.as_ref();
        let bytes = std::fs::read(path_ref).map_err(|e| {
            error!(error = ?e, path = %path_ref.display(), "Failed to read font file");
            RenderError::Font(format!("cannot read {}: {e}", path_ref.display()))
        })?;
        let mut renderer = Self::with_font_bytes(title, layout, &bytes)?;
        renderer.font_source = path_ref.display().to_string();
        Ok(renderer)
    }

    pub fn with_font_bytes(
        title: impl Into<String>,
        layout: Layout,
        bytes: &[u8],
    ) -> Result<Self, RenderError> {
        layout.validate()?;
        let font = parse_font(bytes)?;
        info!(size = bytes.len(), "Loaded embedded font");
        Ok(Self {
            title: title.into(),
            layout,
            font: Rc::new(font),
            font_source: "custom".into(),
        })
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Render into a fresh in-memory buffer.
    pub fn render(&self, lines: &[AggregatedLine]) -> Result<Vec<u8>, RenderError> {
        let mut buf = Vec::new();
        self.render_to(lines, &mut buf)?;
        Ok(buf)
    }

    /// Render into `out`, returning the number of bytes written.
    pub fn render_to<W: Write>(
        &self,
        lines: &[AggregatedLine],
        out: &mut W,
    ) -> Result<usize, RenderError> {
        let pages = paginate(lines, &self.layout);
        let bytes = self.build_document(&pages);

        out.write_all(&bytes)
            .and_then(|_| out.flush())
            .map_err(|e| {
                error!(error = ?e, "Failed to finalize shopping list document");
                RenderError::RenderFailure(e)
            })?;

        info!(
            lines = lines.len(),
            pages = pages.len(),
            size = bytes.len(),
            "Rendered shopping list document"
        );
        Ok(bytes.len())
    }

    fn build_document(&self, pages: &[PageLayout]) -> Vec<u8> {
        let mut doc = PdfDocument::new(&self.title);
        // add_font would pick a random id, and the id ends up as the font name.
        let font_id = FontId(DOCUMENT_FONT_ID.to_string());
        doc.resources
            .fonts
            .map
            .insert(font_id.clone(), self.font.as_ref().clone());
        let font_size = Pt(self.layout.font_size);

        let pdf_pages: Vec<PdfPage> = pages
            .iter()
            .enumerate()
            .map(|(index, page)| {
                debug!(page = index + 1, lines = page.lines.len(), "Laying out page");
                let mut ops = Vec::with_capacity(page.lines.len() * 2 + 3);
                ops.push(Op::StartTextSection);
                ops.push(Op::SetFontSize {
                    size: font_size,
                    font: font_id.clone(),
                });
                for placed in &page.lines {
                    ops.push(Op::SetTextCursor {
                        pos: Point {
                            x: Pt(placed.x),
                            y: Pt(placed.y),
                        },
                    });
                    ops.push(Op::WriteText {
                        items: vec![TextItem::Text(placed.text.clone())],
                        font: font_id.clone(),
                    });
                }
                ops.push(Op::EndTextSection);
                PdfPage::new(Mm(PAGE_WIDTH_MM), Mm(PAGE_HEIGHT_MM), ops)
            })
            .collect();

        let mut warnings: Vec<PdfWarnMsg> = Vec::new();
        let mut bytes = doc
            .with_pages(pdf_pages)
            .save(&PdfSaveOptions::default(), &mut warnings);
        if !warnings.is_empty() {
            debug!(warnings = warnings.len(), "PDF serialised with warnings");
        }
        if !pin_document_id(&mut bytes, &content_digest(&self.title, pages)) {
            debug!("No trailer /ID found, document id left as written");
        }
        bytes
    }
}

/// Uppercase hex SHA-256 of the title and every placed line.
fn content_digest(title: &str, pages: &[PageLayout]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    for (index, page) in pages.iter().enumerate() {
        hasher.update((index as u64).to_be_bytes());
        for placed in &page.lines {
            hasher.update(placed.text.as_bytes());
            hasher.update([0u8]);
        }
    }
    format!("{:X}", hasher.finalize())
}

/// Overwrite the two strings of the trailer `/ID` array in place with `digest`.
///
/// Lengths are kept so the cross-reference offsets stay valid. Returns false
/// when the document has no `/ID` entry.
fn pin_document_id(bytes: &mut [u8], digest: &str) -> bool {
    let Some(start) = bytes.windows(3).rposition(|w| w == b"/ID") else {
        return false;
    };
    let digest = digest.as_bytes();
    if digest.is_empty() {
        return false;
    }
    let half = digest.len().div_ceil(2);
    let mut pos = start + 3;
    for part in digest.chunks(half).take(2) {
        let Some(open) = bytes[pos..].iter().position(|b| *b == b'(') else {
            return false;
        };
        let open = pos + open + 1;
        let Some(close) = bytes[open..].iter().position(|b| *b == b')') else {
            return false;
        };
        let close = open + close;
        for (slot, ch) in bytes[open..close].iter_mut().zip(part.iter().cycle()) {
            *slot = *ch;
        }
        pos = close + 1;
    }
    true
}
