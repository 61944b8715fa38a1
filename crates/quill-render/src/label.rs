//! Labels for cross-references and their resolution state.

use std::sync::atomic::{AtomicU32, Ordering};

use crate::element::ElementKind;
use crate::error::DocumentError;

/// Source of per-document label namespaces.
static NEXT_NAMESPACE: AtomicU32 = AtomicU32::new(1);

/// Kind of element a label may be attached to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LabelType {
    /// A section.
    Section,
    /// A figure or figure series.
    Figure,
    /// A sub-figure within a series.
    SubFigure,
    /// A table.
    Table,
    /// A display equation.
    Equation,
}

impl LabelType {
    /// Prefix of generated keys.
    #[must_use]
    pub const fn key_prefix(self) -> &'static str {
        match self {
            Self::Section => "sec",
            Self::Figure => "fig",
            Self::SubFigure => "subfig",
            Self::Table => "tab",
            Self::Equation => "eq",
        }
    }

    /// Noun used in front of references, e.g. `Figures 1 and 2`.
    #[must_use]
    pub const fn noun(self, plural: bool) -> &'static str {
        match (self, plural) {
            (Self::Section, false) => "Section",
            (Self::Section, true) => "Sections",
            (Self::Figure | Self::SubFigure, false) => "Figure",
            (Self::Figure | Self::SubFigure, true) => "Figures",
            (Self::Table, false) => "Table",
            (Self::Table, true) => "Tables",
            (Self::Equation, false) => "Equation",
            (Self::Equation, true) => "Equations",
        }
    }

    /// Whether a label of this type fits an element of `kind`.
    #[must_use]
    pub const fn fits(self, kind: ElementKind) -> bool {
        matches!(
            (self, kind),
            (Self::Section, ElementKind::Section)
                | (Self::Figure, ElementKind::Figure | ElementKind::FigureSeries)
                | (Self::SubFigure, ElementKind::SubFigure)
                | (Self::Table, ElementKind::Table)
                | (Self::Equation, ElementKind::Equation)
        )
    }

    const fn slot(self) -> usize {
        match self {
            Self::Section => 0,
            Self::Figure => 1,
            Self::SubFigure => 2,
            Self::Table => 3,
            Self::Equation => 4,
        }
    }
}

/// Handle to a cross-reference target created by
/// [`Document::create_label`](crate::Document::create_label).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Label {
    namespace: u32,
    index: u32,
    ordinal: u32,
    kind: LabelType,
}

impl Label {
    /// Type of element this label targets.
    #[must_use]
    pub const fn kind(self) -> LabelType {
        self.kind
    }

    /// Generated key, also used as the anchor id (`fig2`).
    #[must_use]
    pub fn key(self) -> String {
        format!("{}{}", self.kind.key_prefix(), self.ordinal)
    }
}

/// Resolution state of a label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LabelState {
    /// Target element not begun yet.
    Pending,
    /// Target element begun but not numbered yet.
    Open,
    /// Numbered; holds the display index (`1.2`, `3`, `3b`).
    Resolved(String),
}

#[derive(Debug)]
struct Entry {
    state: LabelState,
    attached: bool,
}

/// Per-document label table.
#[derive(Debug)]
pub(crate) struct LabelTable {
    namespace: u32,
    entries: Vec<Entry>,
    counters: [u32; 5],
}

impl LabelTable {
    pub(crate) fn new() -> Self {
        Self {
            namespace: NEXT_NAMESPACE.fetch_add(1, Ordering::Relaxed),
            entries: Vec::new(),
            counters: [0; 5],
        }
    }

    pub(crate) fn create(&mut self, kind: LabelType) -> Label {
        let counter = &mut self.counters[kind.slot()];
        *counter += 1;
        #[allow(clippy::cast_possible_truncation)]
        let index = self.entries.len() as u32;
        self.entries.push(Entry {
            state: LabelState::Pending,
            attached: false,
        });
        Label {
            namespace: self.namespace,
            index,
            ordinal: *counter,
            kind,
        }
    }

    fn entry(&self, label: Label) -> Result<&Entry, DocumentError> {
        self.check_owner(label)?;
        self.entries
            .get(label.index as usize)
            .ok_or_else(|| DocumentError::Label(format!("unknown label {}", label.key())))
    }

    fn entry_mut(&mut self, label: Label) -> Result<&mut Entry, DocumentError> {
        self.check_owner(label)?;
        self.entries
            .get_mut(label.index as usize)
            .ok_or_else(|| DocumentError::Label(format!("unknown label {}", label.key())))
    }

    fn check_owner(&self, label: Label) -> Result<(), DocumentError> {
        if label.namespace == self.namespace {
            Ok(())
        } else {
            Err(DocumentError::Label(format!(
                "label {} belongs to another document",
                label.key()
            )))
        }
    }

    /// Fail if `label` cannot be attached to an element of `kind`.
    pub(crate) fn check_attach(&self, label: Label, kind: ElementKind) -> Result<(), DocumentError> {
        if !label.kind.fits(kind) {
            return Err(DocumentError::Label(format!(
                "label {} cannot be attached to {kind}",
                label.key()
            )));
        }
        if self.entry(label)?.attached {
            return Err(DocumentError::Label(format!(
                "label {} is already attached",
                label.key()
            )));
        }
        Ok(())
    }

    /// Attach `label` to an element of `kind` being begun and mark it open.
    pub(crate) fn attach(&mut self, label: Label, kind: ElementKind) -> Result<(), DocumentError> {
        self.check_attach(label, kind)?;
        let entry = self.entry_mut(label)?;
        entry.attached = true;
        entry.state = LabelState::Open;
        Ok(())
    }

    pub(crate) fn resolve(&mut self, label: Label, info: String) -> Result<(), DocumentError> {
        self.entry_mut(label)?.state = LabelState::Resolved(info);
        Ok(())
    }

    pub(crate) fn state(&self, label: Label) -> Result<&LabelState, DocumentError> {
        Ok(&self.entry(label)?.state)
    }
}
