//! Error type shared by the driver and the document state machine.

use crate::element::ElementKind;
use crate::math::MathOperator;

/// Error raised while configuring a driver or rendering a document.
///
/// I/O failures are passed through unchanged. Every other variant is a
/// state error caused by the caller driving the document incorrectly.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// I/O error from the output file, an image file or a resource copy.
    #[error(transparent)]
    Io(#[from] std::io::Error),
    /// Raster figure could not be encoded.
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
    /// Element begun under a parent that does not allow it.
    #[error("{element} is not allowed inside {}", .parent.map_or("the document root", ElementKind::name))]
    IllegalNesting {
        /// Element being begun.
        element: ElementKind,
        /// Innermost open element, `None` at the document root.
        parent: Option<ElementKind>,
    },
    /// Text written where the innermost element holds no text.
    #[error("text is not allowed inside {}", .0.map_or("the document root", ElementKind::name))]
    TextNotAllowed(Option<ElementKind>),
    /// `end` called for a kind that is not the innermost open element.
    #[error("cannot end {found}: innermost open element is {}", .expected.map_or("nothing", ElementKind::name))]
    UnbalancedEnd {
        /// Innermost open element, `None` if nothing is open.
        expected: Option<ElementKind>,
        /// Kind passed to `end`.
        found: ElementKind,
    },
    /// A bounded resource (section depth, macro arity, sub-figures) overflowed.
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),
    /// Label attached twice, attached to the wrong element, or foreign.
    #[error("Label error: {0}")]
    Label(String),
    /// Call out of order with the document lifecycle.
    #[error("Lifecycle error: {0}")]
    Lifecycle(String),
    /// `create_document` called twice on one context.
    #[error("a document was already created for this context")]
    AlreadyCreated,
    /// Driver settings out of range.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),
    /// Math operator given too few or too many operands.
    #[error("{operator:?} takes {min}..={max} operands, got {found}")]
    OperandCount {
        /// Operator being closed.
        operator: MathOperator,
        /// Number of operands supplied.
        found: usize,
        /// Fewest operands accepted.
        min: usize,
        /// Most operands accepted.
        max: usize,
    },
}
