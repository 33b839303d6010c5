use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

/// Anything occupying an inclusive range of calendar days.
pub trait DateSpan {
    fn start_date(&self) -> NaiveDate;
    fn end_date(&self) -> NaiveDate;

    /// True when any covered day falls in `year`.
    fn touches_year(&self, year: i32) -> bool {
        self.start_date().year() <= year && year <= self.end_date().year()
    }
}

/// Every day from `start` to `end`, both included. Empty when `end < start`.
pub fn enumerate_days(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |day| *day <= end)
}

/// Expand each item's range into a day → items index.
///
/// Multi-day items land in every covered bucket; overlapping items for the
/// same person are kept as distinct entries.
pub fn build_day_index<T>(items: &[T]) -> BTreeMap<NaiveDate, Vec<T>>
where
    T: DateSpan + Clone,
{
    index_days(items, |start, end| Some((start, end)))
}

/// Like [`build_day_index`], keeping only the days from `from` to `to`.
///
/// Spans are clipped to the window before expansion, so a long span costs
/// no more than the window it overlaps.
pub fn build_day_index_between<T>(
    items: &[T],
    from: NaiveDate,
    to: NaiveDate,
) -> BTreeMap<NaiveDate, Vec<T>>
where
    T: DateSpan + Clone,
{
    index_days(items, |start, end| {
        let (start, end) = (start.max(from), end.min(to));
        (start <= end).then_some((start, end))
    })
}

fn index_days<T, F>(items: &[T], clip: F) -> BTreeMap<NaiveDate, Vec<T>>
where
    T: DateSpan + Clone,
    F: Fn(NaiveDate, NaiveDate) -> Option<(NaiveDate, NaiveDate)>,
{
    let mut index: BTreeMap<NaiveDate, Vec<T>> = BTreeMap::new();
    for item in items {
        let Some((start, end)) = clip(item.start_date(), item.end_date()) else {
            continue;
        };
        for day in enumerate_days(start, end) {
            index.entry(day).or_default().push(item.clone());
        }
    }
    index
}

/// First and last day of `year`.
pub fn year_bounds(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year, 12, 31)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Span(&'static str, NaiveDate, NaiveDate);

    impl DateSpan for Span {
        fn start_date(&self) -> NaiveDate {
            self.1
        }
        fn end_date(&self) -> NaiveDate {
            self.2
        }
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn span_of_n_days_lands_in_n_buckets() {
        let items = vec![Span("jordan", d(2025, 3, 4), d(2025, 3, 8))];
        let index = build_day_index(&items);

        assert_eq!(index.len(), 5);
        assert!(index.contains_key(&d(2025, 3, 4)));
        assert!(index.contains_key(&d(2025, 3, 8)));
        assert_eq!(index.values().map(Vec::len).sum::<usize>(), 5);
    }

    #[test]
    fn ranges_cross_month_and_year_boundaries() {
        let days: Vec<_> = enumerate_days(d(2025, 12, 30), d(2026, 1, 2)).collect();
        assert_eq!(
            days,
            vec![d(2025, 12, 30), d(2025, 12, 31), d(2026, 1, 1), d(2026, 1, 2)]
        );
    }

    #[test]
    fn overlapping_requests_are_not_deduplicated() {
        let items = vec![
            Span("nina-a", d(2025, 10, 21), d(2025, 10, 22)),
            Span("nina-b", d(2025, 10, 22), d(2025, 10, 24)),
        ];
        let index = build_day_index(&items);
        assert_eq!(index[&d(2025, 10, 22)].len(), 2);
        assert_eq!(index[&d(2025, 10, 21)], vec![items[0].clone()]);
    }

    #[test]
    fn inverted_span_contributes_nothing() {
        let items = vec![Span("bad", d(2025, 5, 22), d(2025, 5, 20))];
        assert!(build_day_index(&items).is_empty());
    }

    #[test]
    fn window_keeps_middle_year_of_a_long_span() {
        let items = vec![Span("sabbatical", d(2024, 12, 1), d(2026, 1, 31))];
        assert!(items[0].touches_year(2025));

        let (from, to) = year_bounds(2025).unwrap();
        let index = build_day_index_between(&items, from, to);
        assert_eq!(index.len(), 365);
        assert_eq!(index.keys().next(), Some(&d(2025, 1, 1)));
        assert_eq!(index.keys().last(), Some(&d(2025, 12, 31)));
    }

    #[test]
    fn window_skips_spans_outside_it() {
        let items = vec![Span("early", d(2024, 3, 1), d(2024, 3, 2))];
        let (from, to) = year_bounds(2025).unwrap();
        assert!(build_day_index_between(&items, from, to).is_empty());
    }

    #[test]
    fn single_day_span_has_one_bucket() {
        let items = vec![Span("one", d(2025, 1, 11), d(2025, 1, 11))];
        assert_eq!(build_day_index(&items).len(), 1);
        assert!(items[0].touches_year(2025));
        assert!(!items[0].touches_year(2024));
    }
}
