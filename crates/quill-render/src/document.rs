//! The document element state machine.
//!
//! Callers drive a [`Document`] through nested [`begin`](Document::begin) /
//! [`end`](Document::end) calls. Floats, titles and macro bodies are captured
//! into their own buffers and rendered when they end, so forward references,
//! captions and numbers can be settled before markup reaches the file.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use image::{DynamicImage, Rgb, RgbImage};
use quill_config::{ColorModel, ImageFormat};

use crate::backend::{Float, InlineStyle, RenderBackend};
use crate::bib::{BibRecord, Bibliography, CitationMode, citation_label, format_record};
use crate::driver::{DriverSettings, install_resources};
use crate::element::{Alignment, Element, ElementKind};
use crate::error::DocumentError;
use crate::label::{Label, LabelState, LabelTable, LabelType};
use crate::macros::{MacroDescriptor, MacroTable, marker, marker_index};
use crate::math::MathOperator;
use crate::output::{Captured, OutputChain};
use crate::sequence::{self, Sequence, SequenceType, TextSink};

/// Deepest allowed section nesting.
pub const MAX_SECTION_DEPTH: usize = 5;

/// Largest canvas side in pixels.
const MAX_CANVAS_SIDE: u32 = 20_000;

/// Grey level at or above which a black-and-white pixel is white.
const BLACK_WHITE_THRESHOLD: u8 = 128;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);

/// What a finished document produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderSummary {
    /// Main output file.
    pub path: PathBuf,
    /// Raster figure files, in the order they were written.
    pub images: Vec<PathBuf>,
    /// Installed stylesheets.
    pub resources: Vec<PathBuf>,
    pub sections: usize,
    pub figures: usize,
    pub tables: usize,
    pub equations: usize,
    /// Distinct records in the references section.
    pub citations: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    Start,
    Header,
    HeaderDone,
    Body,
    Done,
}

#[derive(Debug, Default)]
enum FigureContent {
    #[default]
    Empty,
    Markup(String),
    Raster(RgbImage),
}

/// Figure or sub-figure waiting for its number.
#[derive(Debug, Default)]
struct PendingFigure {
    label: Option<Label>,
    body: FigureContent,
    caption: Captured,
}

#[derive(Debug, Default)]
struct HeadState {
    title: Option<Captured>,
    authors: Vec<Captured>,
    date: Option<Captured>,
}

#[derive(Debug)]
enum FrameState {
    None,
    Section {
        label: Option<Label>,
        depth: usize,
        number: String,
    },
    Figure(PendingFigure),
    SubFigure(PendingFigure),
    FigureBody {
        width: u32,
        height: u32,
        canvas: Option<RgbImage>,
    },
    FigureSeries {
        label: Option<Label>,
        columns: usize,
        caption: Captured,
        pages: Vec<Vec<PendingFigure>>,
    },
    Table {
        label: Option<Label>,
        columns: Vec<Alignment>,
        caption: Captured,
        header: Option<String>,
        footer: Option<String>,
    },
    TableRow {
        header: bool,
        column: usize,
    },
    TableCell {
        header: bool,
    },
    Equation(Option<Label>),
    MathOp {
        op: MathOperator,
        operands: Vec<String>,
        texts: Vec<String>,
    },
    Macro(MacroDescriptor),
    /// Argument `n` of the enclosing invocation.
    Argument(usize),
    MacroInvocation {
        descriptor: MacroDescriptor,
        args: Vec<Option<Captured>>,
    },
    Inline(InlineStyle),
    List {
        ordered: bool,
    },
}

#[derive(Debug)]
struct Frame {
    kind: ElementKind,
    captured: bool,
    state: FrameState,
}

/// Append `text` to a plain-text buffer, keeping placeholder markers out.
fn push_plain(out: &mut String, text: &str) {
    out.extend(text.chars().map(|c| {
        if marker_index(c).is_some() {
            '\u{fffd}'
        } else {
            c
        }
    }));
}

/// Text sink writing escaped markup and plain text side by side.
struct MarkupSink<'a, B> {
    buffer: &'a mut Captured,
    _backend: PhantomData<fn() -> B>,
}

impl<'a, B: RenderBackend> MarkupSink<'a, B> {
    fn new(buffer: &'a mut Captured) -> Self {
        Self {
            buffer,
            _backend: PhantomData,
        }
    }
}

impl<B: RenderBackend> TextSink for MarkupSink<'_, B> {
    fn text(&mut self, text: &str) {
        B::escape(text, &mut self.buffer.markup);
        push_plain(&mut self.buffer.text, text);
    }

    fn nbsp(&mut self) {
        self.buffer.markup.push_str(B::NBSP);
        self.buffer.text.push('\u{a0}');
    }

    fn emphasized(&mut self, text: &str) {
        B::inline_start(InlineStyle::Emphasize, &mut self.buffer.markup);
        B::escape(text, &mut self.buffer.markup);
        B::inline_end(InlineStyle::Emphasize, &mut self.buffer.markup);
        push_plain(&mut self.buffer.text, text);
    }

    fn link(&mut self, href: &str, text: &str) {
        let mut inner = String::new();
        B::escape(text, &mut inner);
        B::link(href, &inner, &mut self.buffer.markup);
        push_plain(&mut self.buffer.text, text);
    }
}

/// Join already rendered items with `, ` and `and`.
fn join_and(items: &[String]) -> String {
    let mut out = String::new();
    let mut items = items;
    sequence::write_sequence(&mut out, &mut items, SequenceType::And, false);
    out
}

/// Convert millimetres to a pixel count at `dpi`, at least one pixel.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn mm_to_px(mm: f64, dpi: u32) -> Result<u32, DocumentError> {
    if !mm.is_finite() || mm < 0.0 {
        return Err(DocumentError::LimitExceeded(format!(
            "figure size {mm} mm is not a non-negative length"
        )));
    }
    let px = (mm / 25.4 * f64::from(dpi)).round().max(1.0);
    if px > f64::from(MAX_CANVAS_SIDE) {
        return Err(DocumentError::LimitExceeded(format!(
            "figure side of {mm} mm exceeds {MAX_CANVAS_SIDE} pixels at {dpi} DPI"
        )));
    }
    Ok(px as u32)
}

/// Apply the colour model, and widen to RGBA where the encoder needs it.
fn convert(canvas: &RgbImage, model: ColorModel, format: ImageFormat) -> DynamicImage {
    let image = match model {
        ColorModel::Rgb => DynamicImage::ImageRgb8(canvas.clone()),
        ColorModel::Gray => DynamicImage::ImageLuma8(image::imageops::grayscale(canvas)),
        ColorModel::BlackWhite => {
            let mut luma = image::imageops::grayscale(canvas);
            for pixel in luma.pixels_mut() {
                pixel.0[0] = if pixel.0[0] >= BLACK_WHITE_THRESHOLD {
                    255
                } else {
                    0
                };
            }
            DynamicImage::ImageLuma8(luma)
        }
    };
    match format {
        ImageFormat::Gif => DynamicImage::ImageRgba8(image.to_rgba8()),
        ImageFormat::Png | ImageFormat::Jpeg => image,
    }
}

fn encoder_format(format: ImageFormat) -> image::ImageFormat {
    match format {
        ImageFormat::Png => image::ImageFormat::Png,
        ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        ImageFormat::Gif => image::ImageFormat::Gif,
    }
}

/// A document being rendered into one output file.
///
/// Created by [`Context::create_document`](crate::Context::create_document).
#[derive(Debug)]
pub struct Document<B: RenderBackend> {
    out: OutputChain<BufWriter<File>>,
    path: PathBuf,
    dir: PathBuf,
    stem: String,
    settings: DriverSettings,
    phase: Phase,
    frames: Vec<Frame>,
    tag_depth: usize,
    section_counters: Vec<usize>,
    sections: usize,
    figures: usize,
    tables: usize,
    equations: usize,
    head: HeadState,
    labels: LabelTable,
    macros: MacroTable,
    bibliography: Bibliography,
    images: Vec<PathBuf>,
    _backend: PhantomData<fn() -> B>,
}

impl<B: RenderBackend> Document<B> {
    pub(crate) fn new(
        sink: BufWriter<File>,
        path: PathBuf,
        dir: PathBuf,
        stem: String,
        settings: DriverSettings,
    ) -> Self {
        Self {
            out: OutputChain::new(sink),
            path,
            dir,
            stem,
            settings,
            phase: Phase::Start,
            frames: Vec::new(),
            tag_depth: 0,
            section_counters: Vec::new(),
            sections: 0,
            figures: 0,
            tables: 0,
            equations: 0,
            head: HeadState::default(),
            labels: LabelTable::new(),
            macros: MacroTable::default(),
            bibliography: Bibliography::default(),
            images: Vec::new(),
            _backend: PhantomData,
        }
    }

    /// Path of the output file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of currently open elements.
    pub fn tag_depth(&self) -> usize {
        self.tag_depth
    }

    /// Create a label that can be attached to one element of type `kind`.
    pub fn create_label(&mut self, kind: LabelType) -> Label {
        self.labels.create(kind)
    }

    /// Current state of `label`.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Label` for a label of another document.
    pub fn label_state(&self, label: Label) -> Result<&LabelState, DocumentError> {
        self.labels.state(label)
    }

    fn top_kind(&self) -> Option<ElementKind> {
        self.frames.last().map(|f| f.kind)
    }

    fn markup(&mut self) -> &mut String {
        &mut self.out.current().markup
    }

    /// Start a new line indented by the tag depth in human-readable mode.
    fn newline(&mut self) {
        if self.settings.human_readable {
            let depth = self.tag_depth;
            let markup = self.markup();
            markup.push('\n');
            for _ in 0..depth {
                markup.push_str("  ");
            }
        }
    }

    fn check_phase(&self, kind: ElementKind) -> Result<(), DocumentError> {
        match (kind, self.phase) {
            (ElementKind::Header, Phase::Start) | (ElementKind::Body, Phase::HeaderDone) => Ok(()),
            (ElementKind::Header, _) => Err(DocumentError::Lifecycle(
                "the document header was already written".to_owned(),
            )),
            (ElementKind::Body, Phase::Start | Phase::Header) => Err(DocumentError::Lifecycle(
                "the body requires a completed header".to_owned(),
            )),
            (ElementKind::Body, _) => Err(DocumentError::Lifecycle(
                "the document already has a body".to_owned(),
            )),
            _ => Ok(()),
        }
    }

    /// Begin `element` inside the innermost open element.
    ///
    /// # Errors
    ///
    /// Returns a state error if the element may not appear here, its label
    /// is unusable, or a bounded resource overflows.
    pub fn begin(&mut self, element: Element) -> Result<(), DocumentError> {
        let kind = element.kind();
        let parent = self.top_kind();
        if !kind.allowed_in(parent) {
            return Err(DocumentError::IllegalNesting {
                element: kind,
                parent,
            });
        }
        self.check_phase(kind)?;
        let label = element.label();
        if let Some(label) = label {
            self.labels.check_attach(label, kind)?;
        }
        let (state, captured) = self.open(element)?;
        if let Some(label) = label {
            self.labels.attach(label, kind)?;
        }
        if captured {
            self.out.push();
        }
        self.frames.push(Frame {
            kind,
            captured,
            state,
        });
        self.tag_depth += 1;
        Ok(())
    }

    /// Write the start markup of `element` and build its frame state.
    #[allow(clippy::too_many_lines)]
    fn open(&mut self, element: Element) -> Result<(FrameState, bool), DocumentError> {
        let captures = element.kind().captures();
        let state = match element {
            Element::Header => {
                self.phase = Phase::Header;
                B::document_start(self.markup());
                FrameState::None
            }
            Element::Body => {
                self.phase = Phase::Body;
                B::body_start(self.markup());
                let title = self.head.title.as_ref().map(|c| c.markup.clone());
                let authors: Vec<String> =
                    self.head.authors.iter().map(|c| c.markup.clone()).collect();
                let authors = (!authors.is_empty()).then(|| join_and(&authors));
                let date = self.head.date.as_ref().map(|c| c.markup.clone());
                B::title_block(
                    title.as_deref(),
                    authors.as_deref(),
                    date.as_deref(),
                    self.markup(),
                );
                FrameState::None
            }
            Element::Section(label) => self.open_section(label)?,
            Element::SectionBody => {
                self.newline();
                B::section_body_start(self.markup());
                FrameState::None
            }
            Element::Paragraph => {
                self.newline();
                B::paragraph_start(self.markup());
                FrameState::None
            }
            Element::Figure(label) => FrameState::Figure(PendingFigure {
                label,
                ..PendingFigure::default()
            }),
            Element::FigureBody {
                width_mm,
                height_mm,
            } => FrameState::FigureBody {
                width: mm_to_px(width_mm, self.settings.image_dpi)?,
                height: mm_to_px(height_mm, self.settings.image_dpi)?,
                canvas: None,
            },
            Element::FigureSeries { label, columns } => {
                if columns == 0 {
                    return Err(DocumentError::LimitExceeded(
                        "a figure series needs at least one column".to_owned(),
                    ));
                }
                FrameState::FigureSeries {
                    label,
                    columns,
                    caption: Captured::default(),
                    pages: vec![Vec::new()],
                }
            }
            Element::FigureSeriesPage => {
                if let Some(FrameState::FigureSeries { pages, .. }) = self.parent_state_mut()
                    && pages.last().is_some_and(|page| !page.is_empty())
                {
                    pages.push(Vec::new());
                }
                FrameState::None
            }
            Element::SubFigure(label) => {
                if let Some(FrameState::FigureSeries { pages, .. }) = self.series_state_mut()
                    && pages.iter().map(Vec::len).sum::<usize>() >= 26
                {
                    return Err(DocumentError::LimitExceeded(
                        "a figure series holds at most 26 sub-figures".to_owned(),
                    ));
                }
                FrameState::SubFigure(PendingFigure {
                    label,
                    ..PendingFigure::default()
                })
            }
            Element::Table { label, columns } => FrameState::Table {
                label,
                columns,
                caption: Captured::default(),
                header: None,
                footer: None,
            },
            Element::TablePage => {
                self.newline();
                B::table_group_start(self.markup());
                FrameState::None
            }
            Element::TableRow => {
                let header = self.top_kind() == Some(ElementKind::TableHeader);
                self.newline();
                B::table_row_start(self.markup());
                FrameState::TableRow { header, column: 0 }
            }
            Element::TableCell { span, align } => self.open_cell(span, align),
            Element::Equation(label) => FrameState::Equation(label),
            Element::InlineMath => {
                B::inline_math_start(self.markup());
                FrameState::None
            }
            Element::MathOp(op) => FrameState::MathOp {
                op,
                operands: Vec::new(),
                texts: Vec::new(),
            },
            Element::MathName => {
                B::math_name_start(self.markup());
                FrameState::None
            }
            Element::Macro(descriptor) => FrameState::Macro(descriptor),
            Element::MacroInvocation(descriptor) => {
                let args = std::iter::repeat_with(|| None)
                    .take(descriptor.arity())
                    .collect();
                FrameState::MacroInvocation { descriptor, args }
            }
            Element::MacroParameter(index) => return self.open_parameter(index),
            Element::Emphasize => self.open_inline(InlineStyle::Emphasize),
            Element::Subscript => self.open_inline(InlineStyle::Subscript),
            Element::Superscript => self.open_inline(InlineStyle::Superscript),
            Element::NormalText => self.open_inline(InlineStyle::Normal),
            Element::Itemization => self.open_list(false),
            Element::Enumeration => self.open_list(true),
            Element::Item => {
                self.newline();
                B::item_start(self.markup());
                FrameState::None
            }
            Element::Title
            | Element::Authors
            | Element::Author
            | Element::Date
            | Element::SectionTitle
            | Element::Caption
            | Element::TableHeader
            | Element::TableFooter
            | Element::MathOpParam => FrameState::None,
        };
        Ok((state, captures))
    }

    fn open_section(&mut self, label: Option<Label>) -> Result<FrameState, DocumentError> {
        let depth = self
            .frames
            .iter()
            .filter(|f| f.kind == ElementKind::Section)
            .count()
            + 1;
        if depth > MAX_SECTION_DEPTH {
            return Err(DocumentError::LimitExceeded(format!(
                "sections nest at most {MAX_SECTION_DEPTH} levels deep"
            )));
        }
        self.section_counters.truncate(depth);
        if self.section_counters.len() == depth {
            if let Some(last) = self.section_counters.last_mut() {
                *last += 1;
            }
        } else {
            self.section_counters.push(1);
        }
        let number = self
            .section_counters
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(".");
        self.sections += 1;
        let anchor = label.map(Label::key);
        self.newline();
        B::section_start(depth, anchor.as_deref(), self.markup());
        Ok(FrameState::Section {
            label,
            depth,
            number,
        })
    }

    fn open_cell(&mut self, span: usize, align: Option<Alignment>) -> FrameState {
        let span = span.max(1);
        let (header, column) = match self.parent_state_mut() {
            Some(FrameState::TableRow { header, column }) => {
                let start = *column;
                *column += span;
                (*header, start)
            }
            _ => (false, 0),
        };
        let align = align.or_else(|| {
            self.frames.iter().rev().find_map(|f| match &f.state {
                FrameState::Table { columns, .. } => columns.get(column).copied(),
                _ => None,
            })
        });
        B::table_cell_start(header, span, align, self.markup());
        FrameState::TableCell { header }
    }

    fn open_inline(&mut self, style: InlineStyle) -> FrameState {
        B::inline_start(style, self.markup());
        FrameState::Inline(style)
    }

    fn open_list(&mut self, ordered: bool) -> FrameState {
        self.newline();
        B::list_start(ordered, self.markup());
        FrameState::List { ordered }
    }

    /// A parameter is an argument inside an invocation and a placeholder
    /// inside a definition.
    fn open_parameter(&mut self, index: usize) -> Result<(FrameState, bool), DocumentError> {
        if let Some(FrameState::MacroInvocation { descriptor, .. }) = self.parent_state_mut() {
            check_parameter(descriptor, index)?;
            return Ok((FrameState::Argument(index), true));
        }
        let definition = self.frames.iter().rev().find_map(|f| match &f.state {
            FrameState::Macro(descriptor) => Some(descriptor),
            _ => None,
        });
        let Some(descriptor) = definition else {
            return Err(DocumentError::IllegalNesting {
                element: ElementKind::MacroParameter,
                parent: self.top_kind(),
            });
        };
        check_parameter(descriptor, index)?;
        if let Some(c) = marker(index) {
            let buffer = self.out.current();
            buffer.markup.push(c);
            buffer.text.push(c);
        }
        Ok((FrameState::None, false))
    }

    fn parent_state_mut(&mut self) -> Option<&mut FrameState> {
        self.frames.last_mut().map(|f| &mut f.state)
    }

    fn series_state_mut(&mut self) -> Option<&mut FrameState> {
        self.frames
            .iter_mut()
            .rev()
            .find(|f| f.kind == ElementKind::FigureSeries)
            .map(|f| &mut f.state)
    }

    /// End the innermost element, which must be of `kind`.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::UnbalancedEnd` if another element is innermost,
    /// and propagates failures from rendering the element.
    pub fn end(&mut self, kind: ElementKind) -> Result<(), DocumentError> {
        let top = self.top_kind();
        if top != Some(kind) {
            return Err(DocumentError::UnbalancedEnd {
                expected: top,
                found: kind,
            });
        }
        let frame = self.frames.pop().ok_or(DocumentError::UnbalancedEnd {
            expected: None,
            found: kind,
        })?;
        let captured = if frame.captured {
            self.out.pop()?
        } else {
            Captured::default()
        };
        self.tag_depth -= 1;
        self.close_frame(frame, captured)?;
        self.out.maybe_flush()?;
        Ok(())
    }

    #[allow(clippy::too_many_lines)]
    fn close_frame(&mut self, frame: Frame, captured: Captured) -> Result<(), DocumentError> {
        match frame.state {
            FrameState::None => self.close_plain(frame.kind, captured)?,
            FrameState::Section { label, number, .. } => {
                // Untitled sections are numbered here instead of at their title.
                if let Some(label) = label {
                    self.labels.resolve(label, number)?;
                }
                self.newline();
                B::section_end(self.markup());
            }
            FrameState::Figure(pending) => self.close_figure(pending)?,
            FrameState::SubFigure(pending) => {
                if let Some(FrameState::FigureSeries { pages, .. }) = self.series_state_mut()
                    && let Some(page) = pages.last_mut()
                {
                    page.push(pending);
                }
            }
            FrameState::FigureBody { canvas, .. } => {
                let content = match canvas {
                    Some(canvas) => FigureContent::Raster(canvas),
                    None if captured.is_empty() => FigureContent::Empty,
                    None => FigureContent::Markup(captured.markup),
                };
                if let Some(FrameState::Figure(pending) | FrameState::SubFigure(pending)) =
                    self.parent_state_mut()
                {
                    pending.body = content;
                }
            }
            FrameState::FigureSeries {
                label,
                columns,
                caption,
                pages,
            } => self.close_series(label, columns, &caption, pages)?,
            FrameState::Table {
                label,
                caption,
                header,
                footer,
                ..
            } => {
                self.tables += 1;
                let number = self.tables;
                if let Some(label) = label {
                    self.labels.resolve(label, number.to_string())?;
                }
                let anchor = label.map(Label::key);
                let float = Float {
                    number,
                    anchor: anchor.as_deref(),
                    caption: &caption.markup,
                };
                self.newline();
                B::table(
                    float,
                    header.as_deref(),
                    footer.as_deref(),
                    &captured.markup,
                    &mut self.out.current().markup,
                );
            }
            FrameState::TableRow { .. } => B::table_row_end(self.markup()),
            FrameState::TableCell { header } => B::table_cell_end(header, self.markup()),
            FrameState::Equation(label) => {
                self.equations += 1;
                let number = self.equations;
                if let Some(label) = label {
                    self.labels.resolve(label, number.to_string())?;
                }
                let anchor = label.map(Label::key);
                self.newline();
                B::equation(number, anchor.as_deref(), &captured.markup, self.markup());
            }
            FrameState::MathOp {
                op,
                operands,
                texts,
            } => {
                op.check_operands(operands.len())?;
                let buffer = self.out.current();
                B::math_operator(op, &operands, &mut buffer.markup);
                buffer.text.push_str(&op.plain_text(&texts));
            }
            FrameState::Argument(index) => {
                if let Some(FrameState::MacroInvocation { args, .. }) = self.parent_state_mut()
                    && let Some(slot) = args.get_mut(index)
                {
                    *slot = Some(captured);
                }
            }
            FrameState::Macro(descriptor) => {
                self.macros
                    .define(&descriptor, &captured.markup, &captured.text);
            }
            FrameState::MacroInvocation { descriptor, args } => {
                self.expand_macro(&descriptor, &args);
            }
            FrameState::Inline(style) => B::inline_end(style, self.markup()),
            FrameState::List { ordered } => {
                self.newline();
                B::list_end(ordered, self.markup());
            }
        }
        Ok(())
    }

    /// End handling for elements without frame state.
    #[allow(clippy::too_many_lines)]
    fn close_plain(&mut self, kind: ElementKind, captured: Captured) -> Result<(), DocumentError> {
        match kind {
            ElementKind::Header => {
                let title = self.head.title.as_ref().map(|c| c.text.clone());
                let authors: Vec<String> =
                    self.head.authors.iter().map(|c| c.text.clone()).collect();
                let authors = (!authors.is_empty()).then(|| join_and(&authors));
                let date = self.head.date.as_ref().map(|c| c.text.clone());
                B::head(
                    title.as_deref(),
                    authors.as_deref(),
                    date.as_deref(),
                    self.markup(),
                );
                self.phase = Phase::HeaderDone;
            }
            ElementKind::Title => self.head.title = Some(captured),
            ElementKind::Author => self.head.authors.push(captured),
            ElementKind::Date => self.head.date = Some(captured),
            ElementKind::Body => {
                self.emit_bibliography();
                B::body_end(self.markup());
                self.phase = Phase::Done;
            }
            ElementKind::SectionTitle => {
                let Some(FrameState::Section {
                    label,
                    depth,
                    number,
                }) = self.parent_state_mut()
                else {
                    return Ok(());
                };
                let (label, depth, number) = (*label, *depth, number.clone());
                if let Some(label) = label {
                    self.labels.resolve(label, number.clone())?;
                }
                self.newline();
                B::section_heading(depth, &number, &captured.markup, self.markup());
            }
            ElementKind::SectionBody => {
                self.newline();
                B::section_body_end(self.markup());
            }
            ElementKind::Paragraph => B::paragraph_end(self.markup()),
            ElementKind::Caption => match self.parent_state_mut() {
                Some(FrameState::Figure(pending) | FrameState::SubFigure(pending)) => {
                    pending.caption = captured;
                }
                Some(
                    FrameState::FigureSeries { caption, .. } | FrameState::Table { caption, .. },
                ) => *caption = captured,
                _ => {}
            },
            ElementKind::TablePage => {
                self.newline();
                B::table_group_end(self.markup());
            }
            ElementKind::TableHeader | ElementKind::TableFooter => {
                if let Some(FrameState::Table { header, footer, .. }) = self.parent_state_mut() {
                    let slot = if kind == ElementKind::TableHeader {
                        header
                    } else {
                        footer
                    };
                    slot.get_or_insert_with(String::new)
                        .push_str(&captured.markup);
                }
            }
            ElementKind::InlineMath => B::inline_math_end(self.markup()),
            ElementKind::MathName => B::math_name_end(self.markup()),
            ElementKind::MathOpParam => {
                if let Some(FrameState::MathOp {
                    operands, texts, ..
                }) = self.parent_state_mut()
                {
                    operands.push(captured.markup);
                    texts.push(captured.text);
                }
            }
            ElementKind::Item => B::item_end(self.markup()),
            _ => {}
        }
        Ok(())
    }

    fn close_figure(&mut self, pending: PendingFigure) -> Result<(), DocumentError> {
        self.figures += 1;
        let number = self.figures;
        if let Some(label) = pending.label {
            self.labels.resolve(label, number.to_string())?;
        }
        let body = self.render_figure_body(pending.body, &number.to_string(), &pending.caption)?;
        let anchor = pending.label.map(Label::key);
        let float = Float {
            number,
            anchor: anchor.as_deref(),
            caption: &pending.caption.markup,
        };
        self.newline();
        B::figure(float, &body, &mut self.out.current().markup);
        Ok(())
    }

    fn close_series(
        &mut self,
        label: Option<Label>,
        columns: usize,
        caption: &Captured,
        pages: Vec<Vec<PendingFigure>>,
    ) -> Result<(), DocumentError> {
        self.figures += 1;
        let number = self.figures;
        if let Some(label) = label {
            self.labels.resolve(label, number.to_string())?;
        }
        let mut letters = 'a'..='z';
        let mut rendered = Vec::with_capacity(pages.len());
        for page in pages {
            let mut cells = Vec::with_capacity(page.len());
            for pending in page {
                let Some(letter) = letters.next() else {
                    return Err(DocumentError::LimitExceeded(
                        "a figure series holds at most 26 sub-figures".to_owned(),
                    ));
                };
                let info = format!("{number}{letter}");
                if let Some(sub_label) = pending.label {
                    self.labels.resolve(sub_label, info.clone())?;
                }
                let body = self.render_figure_body(pending.body, &info, &pending.caption)?;
                let anchor = pending.label.map(Label::key);
                let float = Float {
                    number,
                    anchor: anchor.as_deref(),
                    caption: &pending.caption.markup,
                };
                let mut cell = String::new();
                B::sub_figure(float, letter, &body, &mut cell);
                cells.push(cell);
            }
            rendered.push(cells);
        }
        let anchor = label.map(Label::key);
        let float = Float {
            number,
            anchor: anchor.as_deref(),
            caption: &caption.markup,
        };
        self.newline();
        B::figure_series(float, columns, &rendered, &mut self.out.current().markup);
        Ok(())
    }

    /// Markup for a figure body; raster canvases are written to disk first.
    fn render_figure_body(
        &mut self,
        body: FigureContent,
        suffix: &str,
        caption: &Captured,
    ) -> Result<String, DocumentError> {
        match body {
            FigureContent::Empty => Ok(String::new()),
            FigureContent::Markup(markup) => Ok(markup),
            FigureContent::Raster(canvas) => {
                self.write_raster(&canvas, suffix, caption.text.trim())
            }
        }
    }

    fn write_raster(
        &mut self,
        canvas: &RgbImage,
        suffix: &str,
        alt: &str,
    ) -> Result<String, DocumentError> {
        let format = self.settings.image_format;
        let name = format!("{}-figure{suffix}.{}", self.stem, format.extension());
        let path = self.dir.join(&name);
        let image = convert(canvas, self.settings.color_model, format);

        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        let mut writer = BufWriter::new(file);
        image.write_to(&mut writer, encoder_format(format))?;
        writer.flush()?;
        drop(writer);

        tracing::debug!(
            path = %path.display(),
            width = canvas.width(),
            height = canvas.height(),
            "Wrote figure image"
        );
        self.images.push(path);

        let mut markup = String::new();
        B::image(&name, alt, canvas.width(), canvas.height(), &mut markup);
        Ok(markup)
    }

    fn expand_macro(&mut self, descriptor: &MacroDescriptor, args: &[Option<Captured>]) {
        let Some(definition) = self.macros.get(descriptor) else {
            tracing::debug!(name = descriptor.name(), "Invoked undefined macro, rendering nothing");
            return;
        };
        let markup_args: Vec<Option<&str>> = args
            .iter()
            .map(|a| a.as_ref().map(|c| c.markup.as_str()))
            .collect();
        let text_args: Vec<Option<&str>> = args
            .iter()
            .map(|a| a.as_ref().map(|c| c.text.as_str()))
            .collect();
        let buffer = self.out.current();
        definition.markup.expand(&markup_args, &mut buffer.markup);
        definition.text.expand(&text_args, &mut buffer.text);
    }

    fn emit_bibliography(&mut self) {
        if self.bibliography.is_empty() {
            return;
        }
        self.newline();
        let buffer = self.out.current();
        B::bibliography_start(&mut buffer.markup);
        for entry in self.bibliography.entries() {
            B::bibliography_entry_start(&entry.key, entry.index, &mut buffer.markup);
            format_record(&mut MarkupSink::<B>::new(&mut *buffer), &entry.record);
            B::bibliography_entry_end(&mut buffer.markup);
        }
        B::bibliography_end(&mut buffer.markup);
        tracing::debug!(
            entries = self.bibliography.entries().len(),
            "Emitted bibliography"
        );
    }

    /// Begin `element`, run `f`, and end the element again.
    ///
    /// # Errors
    ///
    /// Propagates errors from `begin`, `f` and `end`.
    pub fn within<T>(
        &mut self,
        element: Element,
        f: impl FnOnce(&mut Self) -> Result<T, DocumentError>,
    ) -> Result<T, DocumentError> {
        let kind = element.kind();
        self.begin(element)?;
        let value = f(self)?;
        self.end(kind)?;
        Ok(value)
    }

    fn text_sink(&mut self) -> Result<MarkupSink<'_, B>, DocumentError> {
        let top = self.top_kind();
        if !top.is_some_and(ElementKind::accepts_text) {
            return Err(DocumentError::TextNotAllowed(top));
        }
        Ok(MarkupSink::new(self.out.current()))
    }

    /// Write escaped text.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::TextNotAllowed` if the innermost element holds no text.
    pub fn write(&mut self, text: &str) -> Result<(), DocumentError> {
        self.text_sink()?.text(text);
        self.out.maybe_flush()?;
        Ok(())
    }

    /// Write an integer, with a typographic minus sign when negative.
    pub fn write_number(&mut self, value: i64) -> Result<(), DocumentError> {
        let text = if value < 0 {
            format!("\u{2212}{}", value.unsigned_abs())
        } else {
            value.to_string()
        };
        self.write(&text)
    }

    /// Write a non-breaking space.
    pub fn write_nbsp(&mut self) -> Result<(), DocumentError> {
        self.text_sink()?.nbsp();
        Ok(())
    }

    /// Write `seq` joined according to `ty`.
    pub fn write_sequence(
        &mut self,
        seq: &mut dyn Sequence,
        ty: SequenceType,
        connect_with_nbsp: bool,
    ) -> Result<(), DocumentError> {
        let mut sink = self.text_sink()?;
        sequence::write_sequence(&mut sink, seq, ty, connect_with_nbsp);
        self.out.maybe_flush()?;
        Ok(())
    }

    /// Write references to `labels`, e.g. `Figures 1 and 2 and Table 3`.
    ///
    /// Consecutive labels of one type share a noun. Unresolved labels show
    /// `▲` if their element is open (it started above) and `▼` if it has
    /// not begun yet.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Label` for labels of another document and
    /// `DocumentError::TextNotAllowed` outside text.
    pub fn reference(
        &mut self,
        ty: SequenceType,
        labels: &[Label],
        connect_with_nbsp: bool,
    ) -> Result<(), DocumentError> {
        struct Item {
            noun: Option<&'static str>,
            href: String,
            text: String,
        }

        let mut items = Vec::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            let text = match self.labels.state(*label)? {
                LabelState::Resolved(info) => info.clone(),
                LabelState::Open => "\u{25b2}".to_owned(),
                LabelState::Pending => "\u{25bc}".to_owned(),
            };
            // Neighbours as written; a range shows only its two ends.
            let (previous, next) = if ty == SequenceType::FromTo {
                if i == 0 {
                    (None, labels.last().filter(|_| labels.len() > 1))
                } else {
                    (labels.first(), None)
                }
            } else {
                (i.checked_sub(1).and_then(|p| labels.get(p)), labels.get(i + 1))
            };
            let same_kind = |other: &Label| other.kind() == label.kind();
            let noun = previous
                .is_none_or(|p| !same_kind(p))
                .then(|| label.kind().noun(next.is_some_and(same_kind)));
            items.push(Item {
                noun,
                href: format!("#{}", label.key()),
                text,
            });
        }

        let mut seq = sequence::from_fn(items.len(), |i, sink: &mut dyn TextSink| {
            if let Some(item) = items.get(i) {
                if let Some(noun) = item.noun {
                    sink.text(noun);
                    sink.nbsp();
                }
                sink.link(&item.href, &item.text);
            }
        });
        self.write_sequence(&mut seq, ty, connect_with_nbsp)
    }

    /// Cite `records`; they are numbered in first-citation order.
    ///
    /// An empty list writes nothing.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::TextNotAllowed` outside text.
    pub fn cite(&mut self, mode: CitationMode, records: &[BibRecord]) -> Result<(), DocumentError> {
        if records.is_empty() {
            return Ok(());
        }
        self.text_sink()?;

        let mut cited: Vec<(usize, String, String)> = Vec::with_capacity(records.len());
        for record in records {
            let entry = self.bibliography.cite(record);
            if cited.iter().all(|(index, ..)| *index != entry.index) {
                cited.push((entry.index, entry.key.clone(), citation_label(record)));
            }
        }

        match mode {
            CitationMode::Id => {
                cited.sort_by_key(|(index, ..)| *index);
                let mut sink = self.text_sink()?;
                sink.text("[");
                for (i, (index, key, _)) in cited.iter().enumerate() {
                    if i > 0 {
                        sink.text(", ");
                    }
                    sink.link(&format!("#{key}"), &index.to_string());
                }
                sink.text("]");
            }
            CitationMode::AuthorsAndId => {
                let mut seq = sequence::from_fn(cited.len(), |i, sink: &mut dyn TextSink| {
                    if let Some((index, key, authors)) = cited.get(i) {
                        if !authors.is_empty() {
                            sink.text(authors);
                            sink.nbsp();
                        }
                        sink.text("[");
                        sink.link(&format!("#{key}"), &index.to_string());
                        sink.text("]");
                    }
                });
                let mut sink = self.text_sink()?;
                sequence::write_sequence(&mut sink, &mut seq, SequenceType::And, false);
            }
        }
        self.out.maybe_flush()?;
        Ok(())
    }

    /// Canvas of the innermost figure body, created white on first use.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Lifecycle` unless a figure body is innermost.
    pub fn canvas(&mut self) -> Result<&mut RgbImage, DocumentError> {
        match self.frames.last_mut().map(|f| &mut f.state) {
            Some(FrameState::FigureBody {
                width,
                height,
                canvas,
            }) => Ok(canvas.get_or_insert_with(|| RgbImage::from_pixel(*width, *height, WHITE))),
            _ => Err(DocumentError::Lifecycle(
                "a canvas is only available inside a figure body".to_owned(),
            )),
        }
    }

    /// Flush the output, install resources and report what was written.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::Lifecycle` if elements are still open or the
    /// body was never completed.
    pub fn close(self) -> Result<RenderSummary, DocumentError> {
        if let Some(frame) = self.frames.last() {
            return Err(DocumentError::Lifecycle(format!(
                "{} elements still open, innermost is {}",
                self.frames.len(),
                frame.kind
            )));
        }
        if self.phase != Phase::Done {
            return Err(DocumentError::Lifecycle(
                "the document body was not completed".to_owned(),
            ));
        }
        let writer = self.out.finish()?;
        drop(writer);
        let resources = install_resources::<B>(&self.dir)?;
        Ok(RenderSummary {
            path: self.path,
            images: self.images,
            resources,
            sections: self.sections,
            figures: self.figures,
            tables: self.tables,
            equations: self.equations,
            citations: self.bibliography.entries().len(),
        })
    }
}

fn check_parameter(descriptor: &MacroDescriptor, index: usize) -> Result<(), DocumentError> {
    if index >= descriptor.arity() {
        return Err(DocumentError::LimitExceeded(format!(
            "parameter {index} of macro {} exceeds its arity {}",
            descriptor.name(),
            descriptor.arity()
        )));
    }
    Ok(())
}
