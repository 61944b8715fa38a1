//! Reference-list entries for each record type.

use super::date::{BibDate, format_date_span};
use super::record::{
    BibRecord, BookInfo, PageRange, Person, ProceedingsInfo, Publisher, RecordKind,
};
use crate::sequence::{SequenceType, TextSink, from_fn, write_sequence};

/// Writes comma-separated fields, inserting the comma lazily.
struct FieldWriter<'a> {
    sink: &'a mut dyn TextSink,
    needs_comma: bool,
}

impl FieldWriter<'_> {
    fn begin(&mut self) -> &mut dyn TextSink {
        if self.needs_comma {
            self.sink.text(", ");
        }
        self.needs_comma = true;
        &mut *self.sink
    }

    fn text(&mut self, text: &str) {
        self.begin().text(text);
    }

    fn emphasized(&mut self, prefix: &str, text: &str) {
        let sink = self.begin();
        sink.text(prefix);
        sink.emphasized(text);
    }

    fn people(&mut self, prefix: &str, people: &[Person]) {
        if people.is_empty() {
            return;
        }
        let sink = self.begin();
        sink.text(prefix);
        write_people(sink, people);
    }

    fn publisher(&mut self, publisher: &Publisher) {
        let sink = self.begin();
        if let Some(address) = &publisher.address {
            sink.text(address);
            sink.text(": ");
        }
        sink.text(&publisher.name);
    }
}

fn write_people(sink: &mut dyn TextSink, people: &[Person]) {
    let mut seq = from_fn(people.len(), |i, sink: &mut dyn TextSink| {
        if let Some(person) = people.get(i) {
            sink.text(&person.full_name());
        }
    });
    write_sequence(sink, &mut seq, SequenceType::And, false);
}

/// Write one reference-list entry for `record`.
///
/// Layout: `by A, B, and C: “Title”, fields…, date. doi link uri link`
pub fn format_record(sink: &mut dyn TextSink, record: &BibRecord) {
    if !record.authors.is_empty() {
        sink.text("by ");
        write_people(sink, &record.authors);
        sink.text(": ");
    }
    sink.text("\u{201c}");
    sink.text(&record.title);
    sink.text("\u{201d}");

    let mut fields = FieldWriter {
        sink: &mut *sink,
        needs_comma: true,
    };
    let date_written = write_kind_fields(&mut fields, &record.kind);
    if !date_written && let Some(date) = &record.date {
        fields.text(&format_date_span(date, None));
    }

    sink.text(".");
    if let Some(doi) = &record.doi {
        sink.text(" ");
        sink.link(&format!("https://doi.org/{doi}"), &format!("doi:{doi}"));
    }
    if let Some(uri) = &record.uri {
        sink.text(" ");
        sink.link(uri, uri);
    }
}

/// Write the type-specific fields. Returns whether a date was written.
fn write_kind_fields(fields: &mut FieldWriter<'_>, kind: &RecordKind) -> bool {
    match kind {
        RecordKind::Article {
            journal,
            volume,
            issue,
            pages,
        } => {
            fields.emphasized("", journal);
            let sink = &mut *fields.sink;
            if let Some(volume) = volume {
                sink.text(" ");
                sink.text(volume);
            }
            if let Some(issue) = issue {
                sink.text(if volume.is_some() { "(" } else { " (" });
                sink.text(issue);
                sink.text(")");
            }
            if let Some(pages) = pages {
                if volume.is_some() || issue.is_some() {
                    sink.text(":");
                    sink.text(&pages.span());
                } else {
                    fields.text(&pages.describe());
                }
            }
            false
        }
        RecordKind::Book(book) => {
            write_book(fields, book, true);
            false
        }
        RecordKind::Proceedings(proceedings) => write_proceedings(fields, proceedings, None),
        RecordKind::InProceedings {
            booktitle,
            proceedings,
            pages,
        } => {
            fields.emphasized("in ", booktitle);
            let pages = pages.map(PageRange::describe);
            write_proceedings(fields, proceedings, pages.as_deref())
        }
        RecordKind::InCollection {
            booktitle,
            book,
            chapter,
            pages,
        } => {
            fields.emphasized("in ", booktitle);
            write_book(fields, book, false);
            if let Some(chapter) = chapter {
                fields.text(&format!("chapter {chapter}"));
            }
            if let Some(pages) = pages {
                fields.text(&pages.describe());
            }
            if let Some(publisher) = &book.publisher {
                fields.publisher(publisher);
            }
            false
        }
        RecordKind::TechReport {
            number,
            series,
            institute,
        } => {
            match number {
                Some(number) => fields.text(&format!("Technical Report {number}")),
                None => fields.text("Technical Report"),
            }
            if let Some(series) = series {
                fields.text(series);
            }
            if let Some(institute) = institute {
                fields.publisher(institute);
            }
            false
        }
        RecordKind::Thesis {
            thesis_type,
            school,
        } => {
            fields.text(thesis_type.describe());
            fields.publisher(school);
            false
        }
        RecordKind::Website { publisher } => {
            if let Some(publisher) = publisher {
                fields.text(publisher);
            }
            false
        }
    }
}

/// Editors, series and volume, edition, and optionally the publisher.
fn write_book(fields: &mut FieldWriter<'_>, book: &BookInfo, with_publisher: bool) {
    fields.people("edited by ", &book.editors);
    match (&book.volume, &book.series) {
        (Some(volume), Some(series)) => fields.text(&format!("volume {volume} of {series}")),
        (Some(volume), None) => fields.text(&format!("volume {volume}")),
        (None, Some(series)) => fields.text(series),
        (None, None) => {}
    }
    if let Some(edition) = &book.edition {
        fields.text(&format!("{edition} edition"));
    }
    if with_publisher && let Some(publisher) = &book.publisher {
        fields.publisher(publisher);
    }
}

/// Book fields, event location and span, publisher, pages.
fn write_proceedings(
    fields: &mut FieldWriter<'_>,
    proceedings: &ProceedingsInfo,
    pages: Option<&str>,
) -> bool {
    write_book(fields, &proceedings.book, false);
    if let Some(location) = &proceedings.location {
        fields.text(location);
    }
    let span = proceedings
        .start
        .as_ref()
        .map(|start: &BibDate| format_date_span(start, proceedings.end.as_ref()));
    if let Some(span) = &span {
        fields.text(span);
    }
    if let Some(publisher) = &proceedings.book.publisher {
        fields.publisher(publisher);
    }
    if let Some(pages) = pages {
        fields.text(pages);
    }
    span.is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bib::{Month, ThesisType};
    use pretty_assertions::assert_eq;

    fn render(record: &BibRecord) -> String {
        let mut out = String::new();
        format_record(&mut out, record);
        out
    }

    fn weise() -> Person {
        Person::new("Thomas", "Weise")
    }

    #[test]
    fn test_article() {
        let record = BibRecord::new(
            "Benchmarking Optimization Algorithms",
            RecordKind::Article {
                journal: "IEEE Computational Intelligence Magazine".to_owned(),
                volume: Some("9".to_owned()),
                issue: Some("3".to_owned()),
                pages: Some(PageRange::new(40, 52)),
            },
        )
        .with_authors([weise(), Person::new("Raymond", "Chiong"), Person::new("Ke", "Tang")])
        .with_date(BibDate::month(2014, Month::August))
        .with_doi("10.1109/MCI.2014.2326101");

        assert_eq!(
            render(&record),
            "by Thomas Weise, Raymond Chiong, and Ke Tang: \u{201c}Benchmarking Optimization \
             Algorithms\u{201d}, IEEE Computational Intelligence Magazine 9(3):40\u{2013}52, \
             August 2014. doi:10.1109/MCI.2014.2326101"
        );
    }

    #[test]
    fn test_book_with_series_and_publisher() {
        let record = BibRecord::new(
            "Global Optimization Algorithms",
            RecordKind::Book(BookInfo {
                series: Some("Lecture Notes".to_owned()),
                volume: Some("12".to_owned()),
                edition: Some("second".to_owned()),
                publisher: Some(Publisher::new("Springer").with_address("Berlin")),
                ..BookInfo::default()
            }),
        )
        .with_authors([weise()])
        .with_date(BibDate::year(2009));

        assert_eq!(
            render(&record),
            "by Thomas Weise: \u{201c}Global Optimization Algorithms\u{201d}, volume 12 of \
             Lecture Notes, second edition, Berlin: Springer, 2009."
        );
    }

    #[test]
    fn test_in_proceedings_event_span_replaces_date() {
        let record = BibRecord::new(
            "A Paper",
            RecordKind::InProceedings {
                booktitle: "Proceedings of the Conference".to_owned(),
                proceedings: ProceedingsInfo {
                    book: BookInfo {
                        editors: vec![Person::new("Ann", "Editor"), Person::new("Bob", "Other")],
                        ..BookInfo::default()
                    },
                    location: Some("Vienna, Austria".to_owned()),
                    start: BibDate::day(2012, Month::July, 7),
                    end: BibDate::day(2012, Month::July, 11),
                },
                pages: Some(PageRange::new(3, 9)),
            },
        )
        .with_authors([weise()])
        .with_date(BibDate::year(2012));

        assert_eq!(
            render(&record),
            "by Thomas Weise: \u{201c}A Paper\u{201d}, in Proceedings of the Conference, edited \
             by Ann Editor and Bob Other, Vienna, Austria, July 7\u{2013}11, 2012, pages \
             3\u{2013}9."
        );
    }

    #[test]
    fn test_thesis_and_uri() {
        let record = BibRecord::new(
            "Evolutionary Optimization",
            RecordKind::Thesis {
                thesis_type: ThesisType::PhD,
                school: Publisher::new("University of Kassel").with_address("Kassel, Germany"),
            },
        )
        .with_authors([weise()])
        .with_uri("https://example.org/thesis.pdf");

        assert_eq!(
            render(&record),
            "by Thomas Weise: \u{201c}Evolutionary Optimization\u{201d}, Ph.D. thesis, Kassel, \
             Germany: University of Kassel. https://example.org/thesis.pdf"
        );
    }

    #[test]
    fn test_tech_report_without_authors() {
        let record = BibRecord::new(
            "Results",
            RecordKind::TechReport {
                number: Some("TR-7".to_owned()),
                series: None,
                institute: Some(Publisher::new("Institute")),
            },
        )
        .with_date(BibDate::quarter(2020, 3).unwrap());

        assert_eq!(
            render(&record),
            "\u{201c}Results\u{201d}, Technical Report TR-7, Institute, Q3 2020."
        );
    }

    #[test]
    fn test_website() {
        let record = BibRecord::new(
            "Project Page",
            RecordKind::Website {
                publisher: Some("GitHub".to_owned()),
            },
        );
        assert_eq!(render(&record), "\u{201c}Project Page\u{201d}, GitHub.");
    }

    #[test]
    fn test_in_collection() {
        let record = BibRecord::new(
            "Chapter Title",
            RecordKind::InCollection {
                booktitle: "Handbook".to_owned(),
                book: BookInfo {
                    publisher: Some(Publisher::new("Wiley")),
                    ..BookInfo::default()
                },
                chapter: Some("4".to_owned()),
                pages: Some(PageRange::new(10, 20)),
            },
        );
        assert_eq!(
            render(&record),
            "\u{201c}Chapter Title\u{201d}, in Handbook, chapter 4, pages 10\u{2013}20, Wiley."
        );
    }
}
