//! XHTML 1.1 backend.
//!
//! Floats and display math are laid out with tables so the output renders
//! in any XHTML user agent without scripts.

mod escape;
mod math;

use std::fmt::Write;

pub use escape::escape_xhtml;
use escape::escaped;

use crate::backend::{Float, InlineStyle, RenderBackend, Resource};
use crate::element::Alignment;
use crate::math::MathOperator;

const PREAMBLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">
<html xmlns="http://www.w3.org/1999/xhtml" xml:lang="en">
<head>
<meta http-equiv="Content-Type" content="application/xhtml+xml; charset=UTF-8"/>"#;

/// XHTML render backend.
///
/// Produces a single `.xhtml` file with:
/// - `div.section > hN.sectionHead + div.sectionBody` for sections
/// - captioned tables for figures, figure series and tables
/// - nested tables for two-dimensional math
/// - a trailing references list
#[derive(Clone, Copy, Debug)]
pub struct XhtmlBackend;

fn id_attr(anchor: Option<&str>) -> String {
    anchor.map_or_else(String::new, |a| format!(r#" id="{}""#, escaped(a)))
}

fn caption_title(kind: &str, number: &str, caption: &str, out: &mut String) {
    write!(out, r#"<span class="captionTitle">{kind}&#160;{number}"#).unwrap();
    if caption.is_empty() {
        out.push_str("</span>");
    } else {
        write!(out, ":</span> {caption}").unwrap();
    }
}

impl RenderBackend for XhtmlBackend {
    const NAME: &'static str = "xhtml";
    const FILE_EXTENSION: &'static str = "xhtml";
    const NBSP: &'static str = "&#160;";
    const RESOURCES: &'static [Resource] = &[
        Resource {
            name: quill_assets::SCREEN_CSS,
            media: "screen",
        },
        Resource {
            name: quill_assets::PRINT_CSS,
            media: "print",
        },
    ];

    fn escape(text: &str, out: &mut String) {
        escape_xhtml(text, out);
    }

    fn document_start(out: &mut String) {
        out.push_str(PREAMBLE);
    }

    fn head(title: Option<&str>, authors: Option<&str>, date: Option<&str>, out: &mut String) {
        write!(out, "\n<title>{}</title>", escaped(title.unwrap_or_default())).unwrap();
        if let Some(authors) = authors {
            write!(out, r#"<meta name="author" content="{}"/>"#, escaped(authors)).unwrap();
        }
        if let Some(date) = date {
            write!(out, r#"<meta name="date" content="{}"/>"#, escaped(date)).unwrap();
        }
        for resource in Self::RESOURCES {
            write!(
                out,
                r#"<link rel="stylesheet" type="{}" href="{}" media="{}"/>"#,
                quill_assets::mime_for(resource.name),
                resource.name,
                resource.media
            )
            .unwrap();
        }
        out.push_str("\n</head>");
    }

    fn body_start(out: &mut String) {
        out.push_str("\n<body>");
    }

    fn title_block(title: Option<&str>, authors: Option<&str>, date: Option<&str>, out: &mut String) {
        if let Some(title) = title {
            write!(out, r#"<h1 class="title">{title}</h1>"#).unwrap();
        }
        if let Some(authors) = authors {
            write!(out, r#"<div class="authors">{authors}</div>"#).unwrap();
        }
        if let Some(date) = date {
            write!(out, r#"<div class="date">{date}</div>"#).unwrap();
        }
    }

    fn body_end(out: &mut String) {
        out.push_str("\n</body>\n</html>\n");
    }

    fn section_start(_depth: usize, anchor: Option<&str>, out: &mut String) {
        write!(out, r#"<div class="section"{}>"#, id_attr(anchor)).unwrap();
    }

    fn section_end(out: &mut String) {
        out.push_str("</div>");
    }

    fn section_heading(depth: usize, number: &str, title: &str, out: &mut String) {
        let level = (depth + 1).min(6);
        write!(
            out,
            r#"<h{level} class="sectionHead"><span class="sectionNumber">{number}</span> {title}</h{level}>"#
        )
        .unwrap();
    }

    fn section_body_start(out: &mut String) {
        out.push_str(r#"<div class="sectionBody">"#);
    }

    fn section_body_end(out: &mut String) {
        out.push_str("</div>");
    }

    fn paragraph_start(out: &mut String) {
        out.push_str("<p>");
    }

    fn paragraph_end(out: &mut String) {
        out.push_str("</p>");
    }

    fn inline_start(style: InlineStyle, out: &mut String) {
        out.push_str(match style {
            InlineStyle::Emphasize => "<em>",
            InlineStyle::Subscript => "<sub>",
            InlineStyle::Superscript => "<sup>",
            InlineStyle::Normal => r#"<span class="normal">"#,
        });
    }

    fn inline_end(style: InlineStyle, out: &mut String) {
        out.push_str(match style {
            InlineStyle::Emphasize => "</em>",
            InlineStyle::Subscript => "</sub>",
            InlineStyle::Superscript => "</sup>",
            InlineStyle::Normal => "</span>",
        });
    }

    fn list_start(ordered: bool, out: &mut String) {
        out.push_str(if ordered { "<ol>" } else { "<ul>" });
    }

    fn list_end(ordered: bool, out: &mut String) {
        out.push_str(if ordered { "</ol>" } else { "</ul>" });
    }

    fn item_start(out: &mut String) {
        out.push_str("<li>");
    }

    fn item_end(out: &mut String) {
        out.push_str("</li>");
    }

    fn image(src: &str, alt: &str, width: u32, height: u32, out: &mut String) {
        write!(
            out,
            r#"<img src="{}" alt="{}" width="{width}" height="{height}"/>"#,
            escaped(src),
            escaped(alt)
        )
        .unwrap();
    }

    fn figure(float: Float<'_>, body: &str, out: &mut String) {
        write!(
            out,
            r#"<table class="figure"{}><tr><td class="figureBody">{body}</td></tr><tr><td class="caption">"#,
            id_attr(float.anchor)
        )
        .unwrap();
        caption_title("Figure", &float.number.to_string(), float.caption, out);
        out.push_str("</td></tr></table>");
    }

    fn sub_figure(float: Float<'_>, letter: char, body: &str, out: &mut String) {
        write!(
            out,
            r#"<td class="subFigure"{}><div class="figureBody">{body}</div><div class="caption"><span class="captionTitle">({letter})</span>"#,
            id_attr(float.anchor)
        )
        .unwrap();
        if !float.caption.is_empty() {
            write!(out, " {}", float.caption).unwrap();
        }
        out.push_str("</div></td>");
    }

    fn figure_series(float: Float<'_>, columns: usize, pages: &[Vec<String>], out: &mut String) {
        let columns = columns.max(1);
        write!(
            out,
            r#"<table class="figureSeries"{}>"#,
            id_attr(float.anchor)
        )
        .unwrap();
        for page in pages.iter().filter(|page| !page.is_empty()) {
            out.push_str("<tbody>");
            for row in page.chunks(columns) {
                out.push_str("<tr>");
                for cell in row {
                    out.push_str(cell);
                }
                out.push_str("</tr>");
            }
            out.push_str("</tbody>");
        }
        write!(
            out,
            r#"<tbody><tr><td class="caption" colspan="{columns}">"#
        )
        .unwrap();
        caption_title("Figure", &float.number.to_string(), float.caption, out);
        out.push_str("</td></tr></tbody></table>");
    }

    fn table(
        float: Float<'_>,
        header: Option<&str>,
        footer: Option<&str>,
        body: &str,
        out: &mut String,
    ) {
        write!(out, r#"<table class="table"{}><caption>"#, id_attr(float.anchor)).unwrap();
        caption_title("Table", &float.number.to_string(), float.caption, out);
        out.push_str("</caption>");
        if let Some(header) = header {
            write!(out, "<thead>{header}</thead>").unwrap();
        }
        if let Some(footer) = footer {
            write!(out, "<tfoot>{footer}</tfoot>").unwrap();
        }
        if body.is_empty() {
            out.push_str("<tbody><tr><td></td></tr></tbody>");
        } else {
            out.push_str(body);
        }
        out.push_str("</table>");
    }

    fn table_group_start(out: &mut String) {
        out.push_str("<tbody>");
    }

    fn table_group_end(out: &mut String) {
        out.push_str("</tbody>");
    }

    fn table_row_start(out: &mut String) {
        out.push_str("<tr>");
    }

    fn table_row_end(out: &mut String) {
        out.push_str("</tr>");
    }

    fn table_cell_start(header: bool, span: usize, align: Option<Alignment>, out: &mut String) {
        out.push_str(if header { "<th" } else { "<td" });
        if span > 1 {
            write!(out, r#" colspan="{span}""#).unwrap();
        }
        if let Some(align) = align {
            write!(out, r#" style="text-align: {}""#, align.css()).unwrap();
        }
        out.push('>');
    }

    fn table_cell_end(header: bool, out: &mut String) {
        out.push_str(if header { "</th>" } else { "</td>" });
    }

    fn equation(number: usize, anchor: Option<&str>, body: &str, out: &mut String) {
        write!(
            out,
            r#"<table class="equation"{}><tr><td class="equationBody">{body}</td><td class="equationNumber">({number})</td></tr></table>"#,
            id_attr(anchor)
        )
        .unwrap();
    }

    fn inline_math_start(out: &mut String) {
        out.push_str(r#"<span class="math">"#);
    }

    fn inline_math_end(out: &mut String) {
        out.push_str("</span>");
    }

    fn math_name_start(out: &mut String) {
        out.push_str(r#"<span class="mathName">"#);
    }

    fn math_name_end(out: &mut String) {
        out.push_str("</span>");
    }

    fn math_operator(op: MathOperator, operands: &[String], out: &mut String) {
        math::render_operator(op, operands, out);
    }

    fn link(href: &str, text: &str, out: &mut String) {
        write!(out, r#"<a href="{}">{text}</a>"#, escaped(href)).unwrap();
    }

    fn bibliography_start(out: &mut String) {
        out.push_str(
            r#"<div class="references"><h2 class="sectionHead">References</h2><ol class="references">"#,
        );
    }

    fn bibliography_entry_start(key: &str, _index: usize, out: &mut String) {
        write!(out, r#"<li id="{}">"#, escaped(key)).unwrap();
    }

    fn bibliography_entry_end(out: &mut String) {
        out.push_str("</li>");
    }

    fn bibliography_end(out: &mut String) {
        out.push_str("</ol></div>");
    }
}
