//! Calendar view
//!
//! Arranges daily stats for display: a year -> month -> day grid covering
//! every day from the first recorded one through today, and a fixed-length
//! series of the most recent days for charting.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::Serialize;

use crate::stats::DailyStat;

/// Longest series the view will build, about ten years
pub const MAX_WINDOW_DAYS: usize = 3660;

/// One month of the calendar grid
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthGrid {
    /// Empty slots before the 1st so weeks start on Monday
    pub leading_padding: u32,
    /// Day of month -> stat; `None` for days without activity
    pub days: BTreeMap<u32, Option<DailyStat>>,
}

impl MonthGrid {
    fn new(year: i32, month: u32) -> Self {
        let leading_padding = NaiveDate::from_ymd_opt(year, month, 1)
            .map_or(0, |first| first.weekday().num_days_from_monday());
        Self {
            leading_padding,
            days: BTreeMap::new(),
        }
    }

    /// Grid cells in display order
    ///
    /// Padding and days before the first covered one are `None`, so every
    /// seventh cell is a Monday.
    pub fn cells(&self) -> Vec<Option<(u32, Option<&DailyStat>)>> {
        let first = self.days.keys().next().copied().unwrap_or(1);
        let padding = (0..self.leading_padding + first - 1).map(|_| None);
        let days = self.days.iter().map(|(day, stat)| Some((*day, stat.as_ref())));
        padding.chain(days).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    pub stat: Option<DailyStat>,
}

/// Calendar-shaped view over the daily stats
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalendarView {
    pub today: NaiveDate,
    pub by_year_month_day: BTreeMap<i32, BTreeMap<u32, MonthGrid>>,
    /// `window_days` points (at most [`MAX_WINDOW_DAYS`]), oldest first, the
    /// last one being `today`
    pub series: Vec<SeriesPoint>,
}

impl CalendarView {
    /// Build the view from daily stats in any order
    pub fn build(daily_stats: impl IntoIterator<Item = DailyStat>, window_days: usize, today: NaiveDate) -> Self {
        let stats: BTreeMap<NaiveDate, DailyStat> = daily_stats.into_iter().map(|d| (d.date, d)).collect();

        let mut view = Self {
            today,
            by_year_month_day: BTreeMap::new(),
            series: Vec::new(),
        };

        if let (Some(first), Some(last)) = (stats.keys().next(), stats.keys().next_back()) {
            let end = (*last).max(today);
            for date in first.iter_days().take_while(|d| *d <= end) {
                view.set(date, stats.get(&date).cloned());
            }
        }

        // Never reach back past the earliest representable date
        let available = today.signed_duration_since(NaiveDate::MIN).num_days() as usize + 1;
        let window_days = window_days.min(MAX_WINDOW_DAYS).min(available);
        let start = today
            .checked_sub_signed(Duration::days(window_days.saturating_sub(1) as i64))
            .unwrap_or(NaiveDate::MIN);
        view.series = start
            .iter_days()
            .take(window_days)
            .map(|date| SeriesPoint {
                date,
                stat: stats.get(&date).cloned(),
            })
            .collect();

        view
    }

    fn set(&mut self, date: NaiveDate, stat: Option<DailyStat>) {
        self.by_year_month_day
            .entry(date.year())
            .or_default()
            .entry(date.month())
            .or_insert_with(|| MonthGrid::new(date.year(), date.month()))
            .days
            .insert(date.day(), stat);
    }

    /// Stat recorded for `date`, if the grid covers it and it had activity
    pub fn get(&self, date: NaiveDate) -> Option<&DailyStat> {
        self.month(date.year(), date.month())?.days.get(&date.day())?.as_ref()
    }

    pub fn month(&self, year: i32, month: u32) -> Option<&MonthGrid> {
        self.by_year_month_day.get(&year)?.get(&month)
    }

    /// Months in calendar order
    pub fn months(&self) -> impl Iterator<Item = (i32, u32, &MonthGrid)> {
        self.by_year_month_day
            .iter()
            .flat_map(|(year, months)| months.iter().map(move |(month, grid)| (*year, *month, grid)))
    }

    /// Largest `words_added` in the series, for chart scaling
    pub fn max_words_added(&self) -> u64 {
        self.series
            .iter()
            .filter_map(|p| p.stat.as_ref())
            .map(|s| s.words_added)
            .max()
            .unwrap_or(0)
    }

    /// Indices into the series that fall on a Monday
    pub fn week_starts(&self) -> Vec<usize> {
        self.series
            .iter()
            .enumerate()
            .filter(|(_, p)| p.date.weekday() == Weekday::Mon)
            .map(|(i, _)| i)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn stat(date: NaiveDate, added: u64) -> DailyStat {
        let mut stat = DailyStat::new(date);
        stat.words_added = added;
        stat
    }

    #[test]
    fn test_single_day_mid_month() {
        let today = day(2024, 3, 20);
        let view = CalendarView::build(vec![stat(day(2024, 3, 15), 42)], 100, today);

        assert_eq!(view.series.len(), 100);
        assert_eq!(view.series.last().unwrap().date, today);
        assert_eq!(view.series.iter().filter(|p| p.stat.is_some()).count(), 1);
        assert_eq!(view.get(day(2024, 3, 15)).unwrap().words_added, 42);
        assert_eq!(view.max_words_added(), 42);

        let march = view.month(2024, 3).unwrap();
        let covered: Vec<u32> = march.days.keys().copied().collect();
        assert_eq!(covered, (15..=20).collect::<Vec<_>>());
        // 2024-03-01 is a Friday
        assert_eq!(march.leading_padding, 4);
    }

    #[test]
    fn test_grid_has_no_holes_across_months() {
        let today = day(2024, 2, 3);
        let view = CalendarView::build(vec![stat(day(2024, 1, 30), 5), stat(day(2024, 2, 1), 7)], 10, today);

        let january = view.month(2024, 1).unwrap();
        assert_eq!(january.days.len(), 2);
        assert!(january.days[&31].is_none());
        let february = view.month(2024, 2).unwrap();
        assert_eq!(february.days.len(), 3);
        assert_eq!(view.get(day(2024, 2, 1)).unwrap().words_added, 7);
        assert!(view.get(day(2024, 2, 2)).is_none());

        let months: Vec<(i32, u32)> = view.months().map(|(y, m, _)| (y, m)).collect();
        assert_eq!(months, vec![(2024, 1), (2024, 2)]);
    }

    #[test]
    fn test_empty_view() {
        let view = CalendarView::build(Vec::new(), 7, day(2024, 1, 7));
        assert!(view.by_year_month_day.is_empty());
        assert_eq!(view.series.len(), 7);
        assert_eq!(view.max_words_added(), 0);
        // 2024-01-01 is a Monday
        assert_eq!(view.week_starts(), vec![0]);
    }

    #[test]
    fn test_window_is_capped() {
        let view = CalendarView::build(vec![stat(day(2024, 1, 1), 3)], 200_000_000, day(2024, 1, 1));
        assert_eq!(view.series.len(), MAX_WINDOW_DAYS);
        assert_eq!(view.series.last().unwrap().date, day(2024, 1, 1));

        let view = CalendarView::build(Vec::new(), usize::MAX, NaiveDate::MIN);
        assert_eq!(view.series.len(), 1);
        assert_eq!(view.series[0].date, NaiveDate::MIN);
    }

    #[test]
    fn test_cells_start_with_padding() {
        let view = CalendarView::build(vec![stat(day(2024, 9, 1), 1)], 1, day(2024, 9, 2));
        let september = view.month(2024, 9).unwrap();
        let cells = september.cells();
        // 2024-09-01 is a Sunday
        assert_eq!(september.leading_padding, 6);
        assert!(cells[..6].iter().all(|c| c.is_none()));
        assert_eq!(cells[6].map(|(d, _)| d), Some(1));
        assert_eq!(cells.len(), 8);
    }

    #[test]
    fn test_cells_blank_before_first_day() {
        let view = CalendarView::build(vec![stat(day(2024, 3, 15), 1)], 1, day(2024, 3, 16));
        let cells = view.month(2024, 3).unwrap().cells();
        // 4 padding slots plus March 1st to 14th
        assert!(cells[..18].iter().all(|c| c.is_none()));
        assert_eq!(cells[18].map(|(d, _)| d), Some(15));
        assert_eq!(cells.len(), 20);
    }
}
