//! Document element tree nodes and their nesting rules.

use std::fmt;

use crate::label::Label;
use crate::macros::MacroDescriptor;
use crate::math::MathOperator;

/// Horizontal alignment of a table column or cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Alignment {
    /// Flush left.
    Left,
    /// Centred.
    Center,
    /// Flush right.
    Right,
}

impl Alignment {
    /// CSS `text-align` value.
    #[must_use]
    pub const fn css(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Center => "center",
            Self::Right => "right",
        }
    }
}

/// A node of the document tree, passed to [`Document::begin`](crate::Document::begin).
#[derive(Clone, Debug)]
pub enum Element {
    /// Document preamble; holds title, authors and date.
    Header,
    /// Document title.
    Title,
    /// Container of [`Element::Author`].
    Authors,
    /// One author name.
    Author,
    /// Document date.
    Date,
    /// Document body; ending it emits the references section.
    Body,
    /// Numbered section.
    Section(Option<Label>),
    /// Heading of the enclosing section.
    SectionTitle,
    /// Content of the enclosing section.
    SectionBody,
    /// Paragraph of running text.
    Paragraph,
    /// Numbered figure with a body and a caption.
    Figure(Option<Label>),
    /// Figure content of the given physical size.
    FigureBody {
        /// Width in millimetres.
        width_mm: f64,
        /// Height in millimetres.
        height_mm: f64,
    },
    /// Numbered grid of sub-figures.
    FigureSeries {
        /// Label of the whole series.
        label: Option<Label>,
        /// Sub-figures per row.
        columns: usize,
    },
    /// Starts a new row group inside a figure series.
    FigureSeriesPage,
    /// Lettered figure inside a series.
    SubFigure(Option<Label>),
    /// Caption of a figure, sub-figure, series or table.
    Caption,
    /// Numbered table.
    Table {
        /// Label of the table.
        label: Option<Label>,
        /// Default alignment per column.
        columns: Vec<Alignment>,
    },
    /// Group of body rows.
    TablePage,
    /// Header rows; cells render as header cells.
    TableHeader,
    /// Footer rows.
    TableFooter,
    /// One table row.
    TableRow,
    /// One table cell.
    TableCell {
        /// Number of columns the cell spans.
        span: usize,
        /// Overrides the column alignment.
        align: Option<Alignment>,
    },
    /// Numbered display equation.
    Equation(Option<Label>),
    /// Math inside running text.
    InlineMath,
    /// Math operator applied to its [`Element::MathOpParam`] children.
    MathOp(MathOperator),
    /// One operand of the enclosing operator.
    MathOpParam,
    /// Variable or function name.
    MathName,
    /// Macro definition; the content becomes the template.
    Macro(MacroDescriptor),
    /// Macro expansion; the children are the arguments.
    MacroInvocation(MacroDescriptor),
    /// Placeholder inside a definition or argument inside an invocation.
    MacroParameter(usize),
    /// Emphasized text.
    Emphasize,
    /// Subscript.
    Subscript,
    /// Superscript.
    Superscript,
    /// Upright text, e.g. inside math.
    NormalText,
    /// Bulleted list.
    Itemization,
    /// Numbered list.
    Enumeration,
    /// List item.
    Item,
}

/// Payload-free discriminant of [`Element`], passed to [`Document::end`](crate::Document::end).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Header,
    Title,
    Authors,
    Author,
    Date,
    Body,
    Section,
    SectionTitle,
    SectionBody,
    Paragraph,
    Figure,
    FigureBody,
    FigureSeries,
    FigureSeriesPage,
    SubFigure,
    Caption,
    Table,
    TablePage,
    TableHeader,
    TableFooter,
    TableRow,
    TableCell,
    Equation,
    InlineMath,
    MathOp,
    MathOpParam,
    MathName,
    Macro,
    MacroInvocation,
    MacroParameter,
    Emphasize,
    Subscript,
    Superscript,
    NormalText,
    Itemization,
    Enumeration,
    Item,
}

impl Element {
    /// Discriminant of this element.
    #[must_use]
    pub const fn kind(&self) -> ElementKind {
        match self {
            Self::Header => ElementKind::Header,
            Self::Title => ElementKind::Title,
            Self::Authors => ElementKind::Authors,
            Self::Author => ElementKind::Author,
            Self::Date => ElementKind::Date,
            Self::Body => ElementKind::Body,
            Self::Section(_) => ElementKind::Section,
            Self::SectionTitle => ElementKind::SectionTitle,
            Self::SectionBody => ElementKind::SectionBody,
            Self::Paragraph => ElementKind::Paragraph,
            Self::Figure(_) => ElementKind::Figure,
            Self::FigureBody { .. } => ElementKind::FigureBody,
            Self::FigureSeries { .. } => ElementKind::FigureSeries,
            Self::FigureSeriesPage => ElementKind::FigureSeriesPage,
            Self::SubFigure(_) => ElementKind::SubFigure,
            Self::Caption => ElementKind::Caption,
            Self::Table { .. } => ElementKind::Table,
            Self::TablePage => ElementKind::TablePage,
            Self::TableHeader => ElementKind::TableHeader,
            Self::TableFooter => ElementKind::TableFooter,
            Self::TableRow => ElementKind::TableRow,
            Self::TableCell { .. } => ElementKind::TableCell,
            Self::Equation(_) => ElementKind::Equation,
            Self::InlineMath => ElementKind::InlineMath,
            Self::MathOp(_) => ElementKind::MathOp,
            Self::MathOpParam => ElementKind::MathOpParam,
            Self::MathName => ElementKind::MathName,
            Self::Macro(_) => ElementKind::Macro,
            Self::MacroInvocation(_) => ElementKind::MacroInvocation,
            Self::MacroParameter(_) => ElementKind::MacroParameter,
            Self::Emphasize => ElementKind::Emphasize,
            Self::Subscript => ElementKind::Subscript,
            Self::Superscript => ElementKind::Superscript,
            Self::NormalText => ElementKind::NormalText,
            Self::Itemization => ElementKind::Itemization,
            Self::Enumeration => ElementKind::Enumeration,
            Self::Item => ElementKind::Item,
        }
    }

    /// Label attached to this element, if any.
    #[must_use]
    pub const fn label(&self) -> Option<Label> {
        match self {
            Self::Section(label)
            | Self::Figure(label)
            | Self::SubFigure(label)
            | Self::Equation(label)
            | Self::FigureSeries { label, .. }
            | Self::Table { label, .. } => *label,
            _ => None,
        }
    }
}

impl ElementKind {
    /// Human-readable name used in error messages.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Header => "Header",
            Self::Title => "Title",
            Self::Authors => "Authors",
            Self::Author => "Author",
            Self::Date => "Date",
            Self::Body => "Body",
            Self::Section => "Section",
            Self::SectionTitle => "SectionTitle",
            Self::SectionBody => "SectionBody",
            Self::Paragraph => "Paragraph",
            Self::Figure => "Figure",
            Self::FigureBody => "FigureBody",
            Self::FigureSeries => "FigureSeries",
            Self::FigureSeriesPage => "FigureSeriesPage",
            Self::SubFigure => "SubFigure",
            Self::Caption => "Caption",
            Self::Table => "Table",
            Self::TablePage => "TablePage",
            Self::TableHeader => "TableHeader",
            Self::TableFooter => "TableFooter",
            Self::TableRow => "TableRow",
            Self::TableCell => "TableCell",
            Self::Equation => "Equation",
            Self::InlineMath => "InlineMath",
            Self::MathOp => "MathOp",
            Self::MathOpParam => "MathOpParam",
            Self::MathName => "MathName",
            Self::Macro => "Macro",
            Self::MacroInvocation => "MacroInvocation",
            Self::MacroParameter => "MacroParameter",
            Self::Emphasize => "Emphasize",
            Self::Subscript => "Subscript",
            Self::Superscript => "Superscript",
            Self::NormalText => "NormalText",
            Self::Itemization => "Itemization",
            Self::Enumeration => "Enumeration",
            Self::Item => "Item",
        }
    }

    /// Whether the element holds running text and inline elements.
    #[must_use]
    pub const fn accepts_inline(self) -> bool {
        matches!(
            self,
            Self::Title
                | Self::Author
                | Self::Date
                | Self::SectionTitle
                | Self::Paragraph
                | Self::Caption
                | Self::TableCell
                | Self::Item
                | Self::FigureBody
                | Self::Emphasize
                | Self::Subscript
                | Self::Superscript
                | Self::NormalText
                | Self::Macro
                | Self::MacroParameter
        )
    }

    /// Whether the element holds block-level content.
    #[must_use]
    pub const fn accepts_block(self) -> bool {
        matches!(
            self,
            Self::Body | Self::SectionBody | Self::Item | Self::Macro | Self::MacroParameter
        )
    }

    /// Whether the element holds math content.
    #[must_use]
    pub const fn accepts_math(self) -> bool {
        matches!(self, Self::Equation | Self::InlineMath | Self::MathOpParam)
    }

    /// Whether text may be written while this element is innermost.
    #[must_use]
    pub const fn accepts_text(self) -> bool {
        self.accepts_inline() || self.accepts_math() || matches!(self, Self::MathName)
    }

    /// Whether the element's content is captured into its own buffer.
    #[must_use]
    pub const fn captures(self) -> bool {
        matches!(
            self,
            Self::Title
                | Self::Author
                | Self::Date
                | Self::SectionTitle
                | Self::FigureBody
                | Self::Caption
                | Self::Table
                | Self::TableHeader
                | Self::TableFooter
                | Self::Equation
                | Self::MathOpParam
                | Self::Macro
        )
    }

    /// Whether this element may be begun directly inside `parent`.
    ///
    /// `MacroParameter` needs the whole stack and is refined by the document.
    #[must_use]
    pub const fn allowed_in(self, parent: Option<ElementKind>) -> bool {
        let Some(parent) = parent else {
            return matches!(self, Self::Header | Self::Body | Self::Macro);
        };
        match self {
            Self::Header | Self::Body => false,
            Self::Title | Self::Authors | Self::Date => matches!(parent, Self::Header),
            Self::Author => matches!(parent, Self::Authors),
            Self::Section => matches!(parent, Self::Body | Self::SectionBody),
            Self::SectionTitle | Self::SectionBody => matches!(parent, Self::Section),
            Self::FigureBody => matches!(parent, Self::Figure | Self::SubFigure),
            Self::Caption => matches!(
                parent,
                Self::Figure | Self::SubFigure | Self::FigureSeries | Self::Table
            ),
            Self::FigureSeriesPage => matches!(parent, Self::FigureSeries),
            Self::SubFigure => matches!(parent, Self::FigureSeries | Self::FigureSeriesPage),
            Self::TablePage | Self::TableHeader | Self::TableFooter => {
                matches!(parent, Self::Table)
            }
            Self::TableRow => matches!(
                parent,
                Self::TablePage | Self::TableHeader | Self::TableFooter
            ),
            Self::TableCell => matches!(parent, Self::TableRow),
            Self::Item => matches!(parent, Self::Itemization | Self::Enumeration),
            Self::MathOp | Self::MathName => parent.accepts_math(),
            Self::MathOpParam => matches!(parent, Self::MathOp),
            Self::Emphasize | Self::Subscript | Self::Superscript | Self::NormalText => {
                parent.accepts_inline() || parent.accepts_math()
            }
            Self::InlineMath => parent.accepts_inline(),
            Self::MacroParameter => {
                matches!(parent, Self::MacroInvocation) || parent.accepts_text()
            }
            Self::MacroInvocation | Self::Macro => {
                parent.accepts_inline() || parent.accepts_block() || parent.accepts_math()
            }
            Self::Paragraph
            | Self::Figure
            | Self::FigureSeries
            | Self::Table
            | Self::Equation
            | Self::Itemization
            | Self::Enumeration => parent.accepts_block(),
        }
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_accepts_header_and_body_only() {
        assert!(ElementKind::Header.allowed_in(None));
        assert!(ElementKind::Body.allowed_in(None));
        assert!(ElementKind::Macro.allowed_in(None));
        assert!(!ElementKind::Paragraph.allowed_in(None));
        assert!(!ElementKind::Section.allowed_in(None));
    }

    #[test]
    fn test_section_structure() {
        assert!(ElementKind::Section.allowed_in(Some(ElementKind::Body)));
        assert!(ElementKind::Section.allowed_in(Some(ElementKind::SectionBody)));
        assert!(!ElementKind::Section.allowed_in(Some(ElementKind::Section)));
        assert!(ElementKind::SectionTitle.allowed_in(Some(ElementKind::Section)));
        assert!(!ElementKind::SectionTitle.allowed_in(Some(ElementKind::Body)));
    }

    #[test]
    fn test_sub_figures_live_in_series() {
        assert!(ElementKind::SubFigure.allowed_in(Some(ElementKind::FigureSeries)));
        assert!(ElementKind::SubFigure.allowed_in(Some(ElementKind::FigureSeriesPage)));
        assert!(!ElementKind::SubFigure.allowed_in(Some(ElementKind::Figure)));
        assert!(ElementKind::FigureBody.allowed_in(Some(ElementKind::SubFigure)));
    }

    #[test]
    fn test_math_nesting() {
        assert!(ElementKind::MathOp.allowed_in(Some(ElementKind::Equation)));
        assert!(ElementKind::MathOp.allowed_in(Some(ElementKind::MathOpParam)));
        assert!(!ElementKind::MathOp.allowed_in(Some(ElementKind::Paragraph)));
        assert!(ElementKind::MathOpParam.allowed_in(Some(ElementKind::MathOp)));
        assert!(!ElementKind::MathOpParam.allowed_in(Some(ElementKind::Equation)));
        assert!(ElementKind::InlineMath.allowed_in(Some(ElementKind::Paragraph)));
    }

    #[test]
    fn test_text_acceptance() {
        assert!(ElementKind::Paragraph.accepts_text());
        assert!(ElementKind::MathName.accepts_text());
        assert!(!ElementKind::Body.accepts_text());
        assert!(!ElementKind::Table.accepts_text());
        assert!(!ElementKind::MathOp.accepts_text());
    }

    #[test]
    fn test_label_accessor() {
        assert_eq!(Element::Paragraph.label(), None);
        assert_eq!(Element::Figure(None).kind(), ElementKind::Figure);
    }
}
