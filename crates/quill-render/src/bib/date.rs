//! Publication dates and merged date ranges.
//!
//! A range collapses the parts both ends share:
//!
//! | start            | end              | output                     |
//! |------------------|------------------|----------------------------|
//! | June 24, 1985    | June 26, 1985    | `June 24–26, 1985`         |
//! | February 3, 2002 | March 5, 2002    | `February 3–March 5, 2002` |
//! | February 2002    | March 2002       | `February–March 2002`      |
//! | February 2002    | 2002             | `February 2002`            |
//! | June 24, 1985    | June 1985        | `June 24, 1985`            |
//! | 1999             | 2001             | `1999–2001`                |

const EN_DASH: char = '\u{2013}';

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Month {
    January = 1,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::January => "January",
            Self::February => "February",
            Self::March => "March",
            Self::April => "April",
            Self::May => "May",
            Self::June => "June",
            Self::July => "July",
            Self::August => "August",
            Self::September => "September",
            Self::October => "October",
            Self::November => "November",
            Self::December => "December",
        }
    }

    /// Number of days in this month of `year`.
    #[must_use]
    pub const fn days(self, year: i32) -> u8 {
        match self {
            Self::February if is_leap_year(year) => 29,
            Self::February => 28,
            Self::April | Self::June | Self::September | Self::November => 30,
            _ => 31,
        }
    }
}

const fn is_leap_year(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

/// Precision below the year.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DatePart {
    Year,
    Quarter(u8),
    Month(Month),
    Day(Month, u8),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BibDate {
    pub year: i32,
    pub part: DatePart,
}

impl BibDate {
    #[must_use]
    pub const fn year(year: i32) -> Self {
        Self {
            year,
            part: DatePart::Year,
        }
    }

    /// Quarter `1..=4` of `year`, or `None` for any other quarter.
    #[must_use]
    pub const fn quarter(year: i32, quarter: u8) -> Option<Self> {
        if quarter < 1 || quarter > 4 {
            return None;
        }
        Some(Self {
            year,
            part: DatePart::Quarter(quarter),
        })
    }

    #[must_use]
    pub const fn month(year: i32, month: Month) -> Self {
        Self {
            year,
            part: DatePart::Month(month),
        }
    }

    /// A calendar day, or `None` if `month` of `year` has no such day.
    #[must_use]
    pub const fn day(year: i32, month: Month, day: u8) -> Option<Self> {
        if day < 1 || day > month.days(year) {
            return None;
        }
        Some(Self {
            year,
            part: DatePart::Day(month, day),
        })
    }

    /// Whether the part names a real quarter or day of the year.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        match self.part {
            DatePart::Year | DatePart::Month(_) => true,
            DatePart::Quarter(q) => q >= 1 && q <= 4,
            DatePart::Day(m, d) => d >= 1 && d <= m.days(self.year),
        }
    }

    /// Drop an out-of-range quarter to the year and an out-of-range day to
    /// its month. Only reachable through the public fields.
    const fn coarsened(self) -> Self {
        if self.is_valid() {
            return self;
        }
        let part = match self.part {
            DatePart::Day(m, _) => DatePart::Month(m),
            _ => DatePart::Year,
        };
        Self {
            year: self.year,
            part,
        }
    }

    const fn has_day(self) -> bool {
        matches!(self.part, DatePart::Day(..))
    }
}

/// Sub-year part without the year: `June 1`, `June`, `Q2`, or empty.
fn part_text(part: DatePart) -> String {
    match part {
        DatePart::Year => String::new(),
        DatePart::Quarter(q) => format!("Q{q}"),
        DatePart::Month(m) => m.name().to_owned(),
        DatePart::Day(m, d) => format!("{} {d}", m.name()),
    }
}

/// Append the year, preceded by a comma only after a day.
fn push_year(out: &mut String, date_has_day: bool, year: i32) {
    out.push_str(if date_has_day { ", " } else { " " });
    out.push_str(&year.to_string());
}

/// Single date: `June 1, 1996`, `June 1996`, `Q2 1996` or `1996`.
#[must_use]
pub fn format_date(date: &BibDate) -> String {
    let date = date.coarsened();
    if date.part == DatePart::Year {
        return date.year.to_string();
    }
    let mut out = part_text(date.part);
    push_year(&mut out, date.has_day(), date.year);
    out
}

/// Date range from `start` to `end`, sharing what both ends have in common.
///
/// Without an end, or with an equal end, this is [`format_date`] of the start.
/// A day and its own month collapse to the day.
#[must_use]
pub fn format_date_span(start: &BibDate, end: Option<&BibDate>) -> String {
    let start = &start.coarsened();
    let Some(end) = end.map(|end| end.coarsened()).filter(|end| end != start) else {
        return format_date(start);
    };
    let end = &end;
    if start.year != end.year {
        return format!("{}{EN_DASH}{}", format_date(start), format_date(end));
    }
    match (start.part, end.part) {
        (DatePart::Year, _) => format_date(end),
        (_, DatePart::Year) => format_date(start),
        (DatePart::Day(m1, _), DatePart::Month(m2)) if m1 == m2 => format_date(start),
        (DatePart::Month(m1), DatePart::Day(m2, _)) if m1 == m2 => format_date(end),
        (DatePart::Day(m1, d1), DatePart::Day(m2, d2)) if m1 == m2 => {
            format!("{} {d1}{EN_DASH}{d2}, {}", m1.name(), start.year)
        }
        (first, last) => {
            let mut out = part_text(first);
            out.push(EN_DASH);
            out.push_str(&part_text(last));
            push_year(&mut out, end.has_day(), end.year);
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn day(year: i32, month: Month, day: u8) -> BibDate {
        BibDate::day(year, month, day).unwrap()
    }

    fn quarter(year: i32, quarter: u8) -> BibDate {
        BibDate::quarter(year, quarter).unwrap()
    }

    #[test]
    fn test_single_dates() {
        assert_eq!(format_date(&day(1996, Month::June, 1)), "June 1, 1996");
        assert_eq!(format_date(&BibDate::month(1996, Month::June)), "June 1996");
        assert_eq!(format_date(&quarter(1996, 2)), "Q2 1996");
        assert_eq!(format_date(&BibDate::year(1996)), "1996");
    }

    #[test]
    fn test_equal_dates_collapse() {
        let dates = [
            day(1996, Month::June, 1),
            BibDate::month(1996, Month::June),
            quarter(1996, 2),
            BibDate::year(1996),
        ];
        for date in dates {
            assert_eq!(format_date_span(&date, Some(&date)), format_date(&date));
            assert_eq!(format_date_span(&date, None), format_date(&date));
        }
    }

    #[test]
    fn test_same_month_days() {
        assert_eq!(
            format_date_span(
                &day(1985, Month::June, 24),
                Some(&day(1985, Month::June, 26))
            ),
            "June 24\u{2013}26, 1985"
        );
    }

    #[test]
    fn test_same_year_different_months() {
        assert_eq!(
            format_date_span(
                &day(2002, Month::February, 3),
                Some(&day(2002, Month::March, 5))
            ),
            "February 3\u{2013}March 5, 2002"
        );
        assert_eq!(
            format_date_span(
                &BibDate::month(2002, Month::February),
                Some(&BibDate::month(2002, Month::March))
            ),
            "February\u{2013}March 2002"
        );
        assert_eq!(
            format_date_span(
                &quarter(2002, 1),
                Some(&day(2002, Month::March, 5))
            ),
            "Q1\u{2013}March 5, 2002"
        );
    }

    #[test]
    fn test_year_only_side_takes_precise_date() {
        assert_eq!(
            format_date_span(
                &BibDate::month(2002, Month::February),
                Some(&BibDate::year(2002))
            ),
            "February 2002"
        );
        assert_eq!(
            format_date_span(
                &BibDate::year(2002),
                Some(&day(2002, Month::May, 9))
            ),
            "May 9, 2002"
        );
    }

    #[test]
    fn test_different_years() {
        assert_eq!(
            format_date_span(&BibDate::year(1999), Some(&BibDate::year(2001))),
            "1999\u{2013}2001"
        );
        assert_eq!(
            format_date_span(
                &day(1999, Month::December, 30),
                Some(&day(2000, Month::January, 2))
            ),
            "December 30, 1999\u{2013}January 2, 2000"
        );
    }

    #[test]
    fn test_day_and_same_month_take_precise_date() {
        assert_eq!(
            format_date_span(&day(1985, Month::June, 24), Some(&BibDate::month(1985, Month::June))),
            "June 24, 1985"
        );
        assert_eq!(
            format_date_span(&BibDate::month(1985, Month::June), Some(&day(1985, Month::June, 26))),
            "June 26, 1985"
        );
        assert_eq!(
            format_date_span(&day(1985, Month::May, 31), Some(&BibDate::month(1985, Month::June))),
            "May 31\u{2013}June 1985"
        );
    }

    #[test]
    fn test_out_of_range_parts_are_rejected() {
        assert_eq!(BibDate::quarter(2002, 0), None);
        assert_eq!(BibDate::quarter(2002, 7), None);
        assert_eq!(BibDate::day(2002, Month::February, 31), None);
        assert_eq!(BibDate::day(2002, Month::February, 29), None);
        assert_eq!(BibDate::day(2002, Month::April, 0), None);
        assert!(BibDate::day(2004, Month::February, 29).is_some());
        assert!(BibDate::day(2000, Month::February, 29).is_some());
        assert_eq!(BibDate::day(1900, Month::February, 29), None);
        assert!(BibDate::day(2002, Month::December, 31).is_some());
    }

    #[test]
    fn test_out_of_range_fields_lose_precision() {
        let bad_quarter = BibDate {
            year: 2002,
            part: DatePart::Quarter(7),
        };
        let bad_day = BibDate {
            year: 2002,
            part: DatePart::Day(Month::February, 31),
        };
        assert!(!bad_quarter.is_valid());
        assert!(!bad_day.is_valid());
        assert_eq!(format_date(&bad_quarter), "2002");
        assert_eq!(format_date(&bad_day), "February 2002");
        assert_eq!(
            format_date_span(&bad_day, Some(&day(2002, Month::March, 5))),
            "February\u{2013}March 5, 2002"
        );
    }
}
