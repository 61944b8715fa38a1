//! Structured-document renderer with pluggable backends.
//!
//! A [`Driver`] holds process-wide image and output settings and creates
//! [`Context`]s, each of which owns an output directory and produces one
//! [`Document`]. The document is driven as a tree of nested
//! [`begin`](Document::begin) / [`end`](Document::end) calls and writes
//! markup through a [`RenderBackend`].
//!
//! # Architecture
//!
//! - [`XhtmlBackend`]: XHTML 1.1 with table layouts for floats and math
//! - numbering of sections, figures, tables and equations with labels that
//!   can be referenced before or after their target
//! - raster figures drawn on an [`image::RgbImage`] canvas and written as
//!   PNG, JPEG or GIF next to the document
//! - a macro engine with parameter placeholders
//! - an in-text citation engine that appends a references section
//!
//! # Example
//!
//! ```
//! use quill_render::{Element, ElementKind, XhtmlDriver};
//!
//! # fn main() -> Result<(), quill_render::DocumentError> {
//! let dir = tempfile::tempdir()?;
//! let mut doc = XhtmlDriver::new().create_context(dir.path())?.create_document()?;
//!
//! doc.begin(Element::Header)?;
//! doc.within(Element::Title, |d| d.write("Hello"))?;
//! doc.end(ElementKind::Header)?;
//! doc.begin(Element::Body)?;
//! doc.within(Element::Paragraph, |d| d.write("Some text."))?;
//! doc.end(ElementKind::Body)?;
//!
//! let summary = doc.close()?;
//! assert!(summary.path.ends_with("index.xhtml"));
//! # Ok(())
//! # }
//! ```

mod backend;
pub mod bib;
mod document;
mod driver;
mod element;
mod error;
mod label;
mod macros;
mod math;
mod output;
pub mod sequence;
mod xhtml;

pub use backend::{Float, InlineStyle, RenderBackend, Resource};
pub use bib::{BibRecord, CitationMode};
pub use document::{Document, MAX_SECTION_DEPTH, RenderSummary};
pub use driver::{Context, Driver, DriverSettings, XhtmlDriver};
pub use element::{Alignment, Element, ElementKind};
pub use error::DocumentError;
pub use label::{Label, LabelState, LabelType};
pub use macros::{MAX_MACRO_PARAMETERS, MacroDescriptor};
pub use math::MathOperator;
pub use sequence::{Sequence, SequenceType, TextSink, from_fn, write_sequence};
pub use xhtml::{XhtmlBackend, escape_xhtml};
