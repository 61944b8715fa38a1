//! Bibliographic records, their formatting and citation bookkeeping.

mod citation;
mod date;
mod format;
mod record;

pub use citation::{BibReference, CitationMode};
pub(crate) use citation::{Bibliography, citation_label};
pub use date::{BibDate, DatePart, Month, format_date, format_date_span};
pub use format::format_record;
pub use record::{
    BibRecord, BookInfo, PageRange, Person, ProceedingsInfo, Publisher, RecordKind, ThesisType,
};
