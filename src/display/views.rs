//! Text rendering of the statistics for the terminal
//!
//! Each renderer returns a `String` so commands can print it or tests can
//! inspect it. Table cells are left uncoloured to keep columns aligned.

use chrono::NaiveDate;

use crate::calendar::{CalendarView, MonthGrid};
use crate::display::{format_compact_table, signed, ColourManager};
use crate::service::{DayDetail, DocumentDetail};
use crate::stats::{DailyStat, UserIdentity, WordPair};
use crate::sweep::{DocumentStatus, SweepReport};

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
const WEEKDAY_HEADER: &str = "Mo Tu We Th Fr Sa Su";

/// Table of daily stats, one row per day
pub fn render_days(days: &[DailyStat], colours: &ColourManager) -> String {
    if days.is_empty() {
        return format!("{}\n", colours.info("No daily stats recorded."));
    }

    let rows: Vec<Vec<String>> = days
        .iter()
        .map(|day| {
            vec![
                day.key(),
                format!("+{}", day.words_added),
                format!("-{}", day.words_removed),
                signed(day.net()),
                day.file_revisions.len().to_string(),
                day.revision_count().to_string(),
            ]
        })
        .collect();

    let (added, removed) = crate::stats::daily::totals(days);
    let mut out = format_compact_table(&["Day", "Added", "Removed", "Net", "Files", "Revisions"], &rows);
    out.push_str(&format!(
        "\n  {} days, {} added, {} removed\n",
        days.len(),
        colours.added(added),
        colours.removed(removed)
    ));
    out
}

/// Revisions of one document with their word deltas
pub fn render_document(detail: &DocumentDetail, colours: &ColourManager) -> String {
    let mut out = format!("{} ({})\n", colours.highlight(&detail.title), detail.file_id);
    if detail.rows.is_empty() {
        out.push_str("  no revisions\n");
        return out;
    }

    let rows: Vec<Vec<String>> = detail
        .rows
        .iter()
        .map(|row| {
            vec![
                row.revision.day().to_string(),
                row.revision.time_of_day(),
                row.revision.revision_id.clone(),
                row.revision.user_name.clone(),
                row.revision.word_count.to_string(),
                signed(row.delta),
            ]
        })
        .collect();
    out.push_str(&format_compact_table(
        &["Day", "Time", "Revision", "Author", "Words", "Delta"],
        &rows,
    ));
    out
}

/// One day: its totals, then every document revision that landed on it
pub fn render_day_detail(detail: &DayDetail, colours: &ColourManager) -> String {
    let stat = &detail.stat;
    let mut out = format!(
        "{}  {} {}  net {}\n",
        colours.highlight(&stat.key()),
        colours.added(stat.words_added),
        colours.removed(stat.words_removed),
        signed(stat.net())
    );

    for document in &detail.documents {
        out.push('\n');
        out.push_str(&render_document(document, colours));
    }
    for file_id in &detail.missing {
        out.push_str(&format!("\n{}\n", colours.warning(&format!("{} is not in the database", file_id))));
    }
    out
}

/// Month grids followed by the recent-days series as a sparkline
pub fn render_calendar(view: &CalendarView, colours: &ColourManager) -> String {
    let mut out = String::new();
    let peak = view
        .by_year_month_day
        .values()
        .flat_map(|months| months.values())
        .flat_map(|grid| grid.days.values().flatten())
        .map(|stat| stat.words_added)
        .max()
        .unwrap_or(0);

    for (year, month, grid) in view.months() {
        out.push_str(&render_month(year, month, grid, peak, colours));
        out.push('\n');
    }

    if let (Some(first), Some(last)) = (view.series.first(), view.series.last()) {
        let stats: Vec<&DailyStat> = view.series.iter().filter_map(|p| p.stat.as_ref()).collect();
        let (added, removed) = crate::stats::daily::totals(stats.iter().copied());
        out.push_str(&format!(
            "{} to {}: {} added, {} removed on {} active days\n",
            first.date,
            last.date,
            colours.added(added),
            colours.removed(removed),
            stats.len()
        ));
        out.push_str(&sparkline(view));
        out.push('\n');
    }
    out
}

fn render_month(year: i32, month: u32, grid: &MonthGrid, peak: u64, colours: &ColourManager) -> String {
    let title = NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_else(|| format!("{}-{:02}", year, month));

    let mut out = format!("{}\n{}\n", colours.highlight(&title), WEEKDAY_HEADER);
    let cells = grid.cells();
    for week in cells.chunks(7) {
        let line: Vec<String> = week
            .iter()
            .map(|cell| match cell {
                None => "  ".to_string(),
                Some((day, None)) => format!("{:>2}", day),
                Some((day, Some(stat))) => {
                    let text = format!("{:>2}", day);
                    if stat.words_added * 2 >= peak && peak > 0 {
                        colours.success(&text).to_string()
                    } else {
                        colours.info(&text).to_string()
                    }
                }
            })
            .collect();
        out.push_str(line.join(" ").trim_end());
        out.push('\n');
    }
    out
}

/// One character per series day scaled to the busiest day; blank when idle
pub fn sparkline(view: &CalendarView) -> String {
    let max = view.max_words_added();
    view.series
        .iter()
        .map(|point| match &point.stat {
            Some(stat) if max > 0 && stat.words_added > 0 => {
                let level = (stat.words_added * (SPARK_LEVELS.len() as u64 - 1)) / max;
                SPARK_LEVELS[level as usize]
            }
            _ => ' ',
        })
        .collect()
}

/// Sweep summary line plus one line per document that did not build cleanly
pub fn render_sweep_report(report: &SweepReport, colours: &ColourManager) -> String {
    let summary = report.to_string();
    let mut out = if report.is_complete() {
        format!("{}\n", colours.success(&summary))
    } else {
        format!("{}\n", colours.warning(&summary))
    };

    for document in &report.documents {
        match &document.status {
            DocumentStatus::Failed { reason } => {
                out.push_str(&format!(
                    "  {} {} ({}): {}\n",
                    colours.error("failed"),
                    document.title,
                    document.file_id,
                    reason
                ));
            }
            DocumentStatus::Built { skipped, .. } => {
                for revision in skipped {
                    out.push_str(&format!(
                        "  {} {} revision {}: {}\n",
                        colours.warning("skipped"),
                        document.title,
                        revision.revision_id,
                        revision.reason
                    ));
                }
            }
            DocumentStatus::Cancelled => {}
        }
    }
    out
}

/// Word count of a text with its most frequent words
pub fn render_word_count(total: u64, words: &[WordPair], colours: &ColourManager) -> String {
    let mut out = format!("{} words\n", colours.highlight(&total.to_string()));
    let rows: Vec<Vec<String>> = words
        .iter()
        .map(|pair| {
            vec![
                pair.word.clone(),
                pair.count.to_string(),
                format!("{:.2}%", pair.ratio * 100.0),
            ]
        })
        .collect();
    out.push_str(&format_compact_table(&["Word", "Count", "Share"], &rows));
    out
}

pub fn render_user(user: Option<&UserIdentity>, colours: &ColourManager) -> String {
    match user {
        Some(user) => format!("{}\n", user),
        None => format!("{}\n", colours.info("No user stored.")),
    }
}
