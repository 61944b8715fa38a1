use super::date::BibDate;

/// A person named in a record.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Person {
    /// Given names.
    pub given: String,
    /// Family name.
    pub family: String,
}

impl Person {
    #[must_use]
    pub fn new(given: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            given: given.into(),
            family: family.into(),
        }
    }

    /// `Given Family`, or just the family name if no given name is known.
    #[must_use]
    pub fn full_name(&self) -> String {
        if self.given.is_empty() {
            self.family.clone()
        } else {
            format!("{} {}", self.given, self.family)
        }
    }
}

/// Inclusive page range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PageRange {
    pub first: u32,
    pub last: u32,
}

impl PageRange {
    #[must_use]
    pub const fn new(first: u32, last: u32) -> Self {
        Self { first, last }
    }

    /// `pages 17–23` or `page 17`.
    pub(crate) fn describe(self) -> String {
        if self.first == self.last {
            format!("page {}", self.first)
        } else {
            format!("pages {}", self.span())
        }
    }

    /// `17–23` or `17`.
    pub(crate) fn span(self) -> String {
        if self.first == self.last {
            self.first.to_string()
        } else {
            format!("{}\u{2013}{}", self.first, self.last)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Publisher {
    pub name: String,
    pub address: Option<String>,
}

impl Publisher {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
        }
    }

    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ThesisType {
    Bachelor,
    Master,
    Diploma,
    PhD,
}

impl ThesisType {
    pub(crate) const fn describe(self) -> &'static str {
        match self {
            Self::Bachelor => "Bachelor's thesis",
            Self::Master => "Master's thesis",
            Self::Diploma => "Diploma thesis",
            Self::PhD => "Ph.D. thesis",
        }
    }
}

/// Fields shared by books and the books that contain a cited part.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct BookInfo {
    pub editors: Vec<Person>,
    pub series: Option<String>,
    pub volume: Option<String>,
    pub edition: Option<String>,
    pub publisher: Option<Publisher>,
}

/// Book fields plus where and when the event took place.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ProceedingsInfo {
    pub book: BookInfo,
    pub location: Option<String>,
    pub start: Option<BibDate>,
    pub end: Option<BibDate>,
}

/// Record type with its type-specific fields.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Article {
        journal: String,
        volume: Option<String>,
        issue: Option<String>,
        pages: Option<PageRange>,
    },
    Book(BookInfo),
    Proceedings(ProceedingsInfo),
    InProceedings {
        booktitle: String,
        proceedings: ProceedingsInfo,
        pages: Option<PageRange>,
    },
    InCollection {
        booktitle: String,
        book: BookInfo,
        chapter: Option<String>,
        pages: Option<PageRange>,
    },
    TechReport {
        number: Option<String>,
        series: Option<String>,
        institute: Option<Publisher>,
    },
    Thesis {
        thesis_type: ThesisType,
        school: Publisher,
    },
    Website {
        publisher: Option<String>,
    },
}

/// A citable work. Equal records are the same bibliography entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BibRecord {
    pub authors: Vec<Person>,
    pub title: String,
    pub date: Option<BibDate>,
    pub doi: Option<String>,
    pub uri: Option<String>,
    pub kind: RecordKind,
}

impl BibRecord {
    #[must_use]
    pub fn new(title: impl Into<String>, kind: RecordKind) -> Self {
        Self {
            authors: Vec::new(),
            title: title.into(),
            date: None,
            doi: None,
            uri: None,
            kind,
        }
    }

    #[must_use]
    pub fn with_authors(mut self, authors: impl IntoIterator<Item = Person>) -> Self {
        self.authors = authors.into_iter().collect();
        self
    }

    #[must_use]
    pub fn with_date(mut self, date: BibDate) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn with_doi(mut self, doi: impl Into<String>) -> Self {
        self.doi = Some(doi.into());
        self
    }

    #[must_use]
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    /// Year used for the citation key: the record date, else the event start.
    pub(crate) fn year(&self) -> Option<i32> {
        self.date.map(|d| d.year).or_else(|| match &self.kind {
            RecordKind::Proceedings(p) | RecordKind::InProceedings { proceedings: p, .. } => {
                p.start.map(|d| d.year)
            }
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_range() {
        assert_eq!(PageRange::new(17, 23).describe(), "pages 17\u{2013}23");
        assert_eq!(PageRange::new(5, 5).describe(), "page 5");
    }

    #[test]
    fn test_full_name() {
        assert_eq!(Person::new("Thomas", "Weise").full_name(), "Thomas Weise");
        assert_eq!(Person::new("", "Plato").full_name(), "Plato");
    }

    #[test]
    fn test_year_falls_back_to_event() {
        let record = BibRecord::new(
            "Proceedings",
            RecordKind::Proceedings(ProceedingsInfo {
                start: Some(BibDate::year(2009)),
                ..ProceedingsInfo::default()
            }),
        );
        assert_eq!(record.year(), Some(2009));
        assert_eq!(
            record.with_date(BibDate::year(2010)).year(),
            Some(2010)
        );
    }
}
