//! Natural-language joining of item lists: `A, B, and C`, `either A or B`,
//! `1 to 4`.

/// Destination for plain or styled running text.
///
/// The defaults degrade styling to plain text, which is what a `String`
/// sink wants.
pub trait TextSink {
    /// Append literal text.
    fn text(&mut self, text: &str);

    /// Append a non-breaking space.
    fn nbsp(&mut self);

    /// Append emphasized text.
    fn emphasized(&mut self, text: &str) {
        self.text(text);
    }

    /// Append a hyperlink.
    fn link(&mut self, _href: &str, text: &str) {
        self.text(text);
    }
}

impl TextSink for String {
    fn text(&mut self, text: &str) {
        self.push_str(text);
    }

    fn nbsp(&mut self) {
        self.push('\u{a0}');
    }
}

/// A list of items that can be written one at a time.
pub trait Sequence {
    /// Number of items.
    fn len(&self) -> usize;

    /// Whether there are no items.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write item `index` to `sink`.
    fn write_item(&mut self, index: usize, sink: &mut dyn TextSink);
}

impl<T: AsRef<str>> Sequence for &[T] {
    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn write_item(&mut self, index: usize, sink: &mut dyn TextSink) {
        if let Some(item) = self.get(index) {
            sink.text(item.as_ref());
        }
    }
}

impl<T: AsRef<str>> Sequence for Vec<T> {
    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn write_item(&mut self, index: usize, sink: &mut dyn TextSink) {
        if let Some(item) = self.get(index) {
            sink.text(item.as_ref());
        }
    }
}

/// Sequence whose items are produced by a closure.
pub struct FnSequence<F> {
    len: usize,
    write: F,
}

/// Build a sequence of `len` items written by `write(index, sink)`.
pub fn from_fn<F>(len: usize, write: F) -> FnSequence<F>
where
    F: FnMut(usize, &mut dyn TextSink),
{
    FnSequence { len, write }
}

impl<F> Sequence for FnSequence<F>
where
    F: FnMut(usize, &mut dyn TextSink),
{
    fn len(&self) -> usize {
        self.len
    }

    fn write_item(&mut self, index: usize, sink: &mut dyn TextSink) {
        (self.write)(index, sink);
    }
}

/// How the items of a sequence are joined.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SequenceType {
    /// `A, B, C`
    Comma,
    /// `A, B, and C`
    And,
    /// `A, B, or C`
    Or,
    /// `either A, B, or C`
    Xor,
    /// `neither A, B, nor C`
    Nor,
    /// `A to C`
    FromTo,
}

impl SequenceType {
    /// Text in front of a lone item.
    const fn single_prefix(self) -> &'static str {
        match self {
            Self::Nor => "not ",
            _ => "",
        }
    }

    /// Text in front of the first of several items.
    const fn multi_prefix(self) -> &'static str {
        match self {
            Self::Xor => "either ",
            Self::Nor => "neither ",
            _ => "",
        }
    }

    /// Word between the last two items.
    const fn conjunction(self) -> Option<&'static str> {
        match self {
            Self::Comma => None,
            Self::And => Some("and"),
            Self::Or | Self::Xor => Some("or"),
            Self::Nor => Some("nor"),
            Self::FromTo => Some("to"),
        }
    }
}

/// Write `seq` joined according to `ty`.
///
/// With `connect_with_nbsp` the last item is bound to the conjunction by a
/// non-breaking space.
pub fn write_sequence(
    sink: &mut dyn TextSink,
    seq: &mut dyn Sequence,
    ty: SequenceType,
    connect_with_nbsp: bool,
) {
    let len = seq.len();
    match len {
        0 => {}
        1 => {
            sink.text(ty.single_prefix());
            seq.write_item(0, sink);
        }
        _ => {
            sink.text(ty.multi_prefix());
            let stop = if ty == SequenceType::FromTo { 1 } else { len - 1 };
            for index in 0..stop {
                if index > 0 {
                    sink.text(", ");
                }
                seq.write_item(index, sink);
            }
            if stop > 1 || ty == SequenceType::Comma {
                sink.text(",");
            }
            if let Some(word) = ty.conjunction() {
                sink.text(" ");
                sink.text(word);
            }
            if connect_with_nbsp {
                sink.nbsp();
            } else {
                sink.text(" ");
            }
            seq.write_item(len - 1, sink);
        }
    }
}
