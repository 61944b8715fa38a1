//! Backend trait for format-specific markup.

use crate::element::Alignment;
use crate::math::MathOperator;

/// Inline text style.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InlineStyle {
    Emphasize,
    Subscript,
    Superscript,
    Normal,
}

/// Static file copied next to every rendered document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Resource {
    /// File name inside the assets crate and in the output directory.
    pub name: &'static str,
    /// Media the stylesheet applies to.
    pub media: &'static str,
}

/// Numbering and caption of a float (figure, series, table).
#[derive(Clone, Copy, Debug)]
pub struct Float<'a> {
    /// Sequential number.
    pub number: usize,
    /// Anchor id, present when the float is labelled.
    pub anchor: Option<&'a str>,
    /// Caption markup, possibly empty.
    pub caption: &'a str,
}

/// Backend for rendering document elements to a concrete format.
///
/// Hooks are associated functions that append markup to `out`. Text passed
/// in as `&str` parameters named `text` is unescaped plain text; every other
/// string parameter is markup the document already produced.
pub trait RenderBackend {
    /// Backend name used in logs.
    const NAME: &'static str;

    /// Extension of the main output file.
    const FILE_EXTENSION: &'static str;

    /// Markup for a non-breaking space.
    const NBSP: &'static str;

    /// Stylesheets linked from the document head and installed on close.
    const RESOURCES: &'static [Resource];

    /// Append `text` escaped for this format.
    fn escape(text: &str, out: &mut String);

    /// Preamble up to and including the opening of the head.
    fn document_start(out: &mut String);

    /// Rest of the head: title, metadata, stylesheet links; closes the head.
    ///
    /// All three parameters are plain text.
    fn head(title: Option<&str>, authors: Option<&str>, date: Option<&str>, out: &mut String);

    /// Opening of the body.
    fn body_start(out: &mut String);

    /// Title block at the top of the body (markup parameters).
    fn title_block(title: Option<&str>, authors: Option<&str>, date: Option<&str>, out: &mut String);

    /// Closing of body and document.
    fn body_end(out: &mut String);

    /// Opening of a section at `depth` (1 = top level).
    fn section_start(depth: usize, anchor: Option<&str>, out: &mut String);

    /// Closing of a section.
    fn section_end(out: &mut String);

    /// Section heading with its number.
    fn section_heading(depth: usize, number: &str, title: &str, out: &mut String);

    /// Opening of a section body.
    fn section_body_start(out: &mut String);

    /// Closing of a section body.
    fn section_body_end(out: &mut String);

    /// Opening of a paragraph.
    fn paragraph_start(out: &mut String);

    /// Closing of a paragraph.
    fn paragraph_end(out: &mut String);

    /// Opening of a styled inline span.
    fn inline_start(style: InlineStyle, out: &mut String);

    /// Closing of a styled inline span.
    fn inline_end(style: InlineStyle, out: &mut String);

    /// Opening of a bulleted or numbered list.
    fn list_start(ordered: bool, out: &mut String);

    /// Closing of a list.
    fn list_end(ordered: bool, out: &mut String);

    /// Opening of a list item.
    fn item_start(out: &mut String);

    /// Closing of a list item.
    fn item_end(out: &mut String);

    /// Raster image reference; `alt` is plain text.
    fn image(src: &str, alt: &str, width: u32, height: u32, out: &mut String);

    /// Complete figure.
    fn figure(float: Float<'_>, body: &str, out: &mut String);

    /// One cell of a figure series, lettered within the series.
    fn sub_figure(float: Float<'_>, letter: char, body: &str, out: &mut String);

    /// Complete figure series; `pages` holds sub-figure cells per row group.
    fn figure_series(float: Float<'_>, columns: usize, pages: &[Vec<String>], out: &mut String);

    /// Complete table; `body` holds the already rendered row groups.
    fn table(
        float: Float<'_>,
        header: Option<&str>,
        footer: Option<&str>,
        body: &str,
        out: &mut String,
    );

    /// Opening of a body row group.
    fn table_group_start(out: &mut String);

    /// Closing of a body row group.
    fn table_group_end(out: &mut String);

    /// Opening of a row.
    fn table_row_start(out: &mut String);

    /// Closing of a row.
    fn table_row_end(out: &mut String);

    /// Opening of a cell; `header` cells belong to a header group.
    fn table_cell_start(header: bool, span: usize, align: Option<Alignment>, out: &mut String);

    /// Closing of a cell.
    fn table_cell_end(header: bool, out: &mut String);

    /// Complete numbered equation.
    fn equation(number: usize, anchor: Option<&str>, body: &str, out: &mut String);

    /// Opening of inline math.
    fn inline_math_start(out: &mut String);

    /// Closing of inline math.
    fn inline_math_end(out: &mut String);

    /// Opening of a math name.
    fn math_name_start(out: &mut String);

    /// Closing of a math name.
    fn math_name_end(out: &mut String);

    /// Operator applied to rendered operands.
    fn math_operator(op: MathOperator, operands: &[String], out: &mut String);

    /// Hyperlink around already rendered `text`.
    fn link(href: &str, text: &str, out: &mut String);

    /// Opening of the references section.
    fn bibliography_start(out: &mut String);

    /// Opening of one reference entry.
    fn bibliography_entry_start(key: &str, index: usize, out: &mut String);

    /// Closing of one reference entry.
    fn bibliography_entry_end(out: &mut String);

    /// Closing of the references section.
    fn bibliography_end(out: &mut String);
}
