//! Macro definitions and template expansion.
//!
//! A definition body is captured with each parameter placeholder written as a
//! private-use marker character. Parsing the captured body yields a
//! [`Template`] of literal runs and parameter slots.

use std::collections::HashMap;

use static_assertions::const_assert;

use crate::error::DocumentError;

/// Largest number of parameters a macro may declare.
pub const MAX_MACRO_PARAMETERS: usize = 9;

/// First placeholder marker; parameter `i` is `MARKER_BASE + i`.
const MARKER_BASE: u32 = 0xE000;

// Markers must stay inside the BMP private use area.
const_assert!(MARKER_BASE as usize + MAX_MACRO_PARAMETERS <= 0xF8FF);

/// Marker character standing for parameter `index`.
pub(crate) fn marker(index: usize) -> Option<char> {
    if index >= MAX_MACRO_PARAMETERS {
        return None;
    }
    u32::try_from(index)
        .ok()
        .and_then(|i| char::from_u32(MARKER_BASE + i))
}

/// Parameter index encoded by `c`, if it is a marker.
pub(crate) fn marker_index(c: char) -> Option<usize> {
    let offset = u32::from(c).checked_sub(MARKER_BASE)? as usize;
    (offset < MAX_MACRO_PARAMETERS).then_some(offset)
}

/// Identity and arity of a macro.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MacroDescriptor {
    name: String,
    arity: usize,
}

impl MacroDescriptor {
    /// Create a descriptor.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::LimitExceeded` if `arity` exceeds
    /// [`MAX_MACRO_PARAMETERS`].
    pub fn new(name: impl Into<String>, arity: usize) -> Result<Self, DocumentError> {
        let name = name.into();
        if arity > MAX_MACRO_PARAMETERS {
            return Err(DocumentError::LimitExceeded(format!(
                "macro {name} declares {arity} parameters, at most {MAX_MACRO_PARAMETERS} are allowed"
            )));
        }
        Ok(Self { name, arity })
    }

    /// Macro name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of parameters.
    #[must_use]
    pub const fn arity(&self) -> usize {
        self.arity
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Part {
    Literal(String),
    Param(usize),
}

/// Parsed macro body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub(crate) struct Template {
    parts: Vec<Part>,
}

impl Template {
    pub(crate) fn parse(body: &str) -> Self {
        let mut parts = Vec::new();
        let mut literal = String::new();
        for c in body.chars() {
            if let Some(index) = marker_index(c) {
                if !literal.is_empty() {
                    parts.push(Part::Literal(std::mem::take(&mut literal)));
                }
                parts.push(Part::Param(index));
            } else {
                literal.push(c);
            }
        }
        if !literal.is_empty() {
            parts.push(Part::Literal(literal));
        }
        Self { parts }
    }

    /// Append the expansion to `out`; missing arguments expand to nothing.
    pub(crate) fn expand(&self, args: &[Option<&str>], out: &mut String) {
        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Param(index) => {
                    if let Some(Some(arg)) = args.get(*index) {
                        out.push_str(arg);
                    }
                }
            }
        }
    }
}

/// A defined macro: markup and plain-text templates.
#[derive(Clone, Debug)]
pub(crate) struct MacroDefinition {
    pub(crate) markup: Template,
    pub(crate) text: Template,
}

/// Per-document macro table keyed by name.
#[derive(Debug, Default)]
pub(crate) struct MacroTable {
    definitions: HashMap<String, MacroDefinition>,
}

impl MacroTable {
    pub(crate) fn define(&mut self, descriptor: &MacroDescriptor, markup: &str, text: &str) {
        let definition = MacroDefinition {
            markup: Template::parse(markup),
            text: Template::parse(text),
        };
        if self
            .definitions
            .insert(descriptor.name.clone(), definition)
            .is_some()
        {
            tracing::warn!(name = %descriptor.name, "Macro redefined, replacing earlier template");
        }
    }

    pub(crate) fn get(&self, descriptor: &MacroDescriptor) -> Option<&MacroDefinition> {
        self.definitions.get(&descriptor.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_descriptor_arity_limit() {
        assert!(MacroDescriptor::new("ok", MAX_MACRO_PARAMETERS).is_ok());
        let err = MacroDescriptor::new("too_many", MAX_MACRO_PARAMETERS + 1).unwrap_err();
        assert!(matches!(err, DocumentError::LimitExceeded(_)));
    }

    #[test]
    fn test_marker_round_trip() {
        assert_eq!(marker(0), Some('\u{E000}'));
        assert_eq!(marker(8), Some('\u{E008}'));
        assert_eq!(marker(9), None);
        assert_eq!(marker_index('\u{E003}'), Some(3));
        assert_eq!(marker_index('\u{E009}'), None);
        assert_eq!(marker_index('a'), None);
    }

    #[test]
    fn test_template_expansion() {
        let body = format!("<b>{}</b> and {}{}!", '\u{E001}', '\u{E000}', '\u{E001}');
        let template = Template::parse(&body);

        let mut out = String::new();
        template.expand(&[Some("x"), Some("y")], &mut out);

        assert_eq!(out, "<b>y</b> and xy!");
    }

    #[test]
    fn test_missing_argument_expands_to_nothing() {
        let template = Template::parse("[\u{E000}|\u{E002}]");
        let mut out = String::new();
        template.expand(&[None, Some("unused")], &mut out);
        assert_eq!(out, "[|]");
    }

    #[test]
    fn test_redefinition_replaces() {
        let mut table = MacroTable::default();
        let descriptor = MacroDescriptor::new("m", 0).unwrap();
        table.define(&descriptor, "first", "first");
        table.define(&descriptor, "second", "second");

        let mut out = String::new();
        table.get(&descriptor).unwrap().markup.expand(&[], &mut out);
        assert_eq!(out, "second");
    }

    #[test]
    fn test_lookup_by_name() {
        let mut table = MacroTable::default();
        table.define(&MacroDescriptor::new("m", 1).unwrap(), "a", "a");
        // Identity is the name; a descriptor with another arity still finds it.
        assert!(table.get(&MacroDescriptor::new("m", 2).unwrap()).is_some());
        assert!(table.get(&MacroDescriptor::new("n", 1).unwrap()).is_none());
    }
}
