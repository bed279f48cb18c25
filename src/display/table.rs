//! Compact table formatting shared by the command output

use prettytable::{format, Cell, Row, Table};

/// Format a compact table with headers and rows using prettytable-rs clean format
///
/// Every line is indented by two spaces. Returns an empty string when there
/// are no rows.
pub fn format_compact_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    if rows.is_empty() {
        return String::new();
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_CLEAN);

    table.add_row(Row::new(headers.iter().map(|h| Cell::new(h)).collect()));
    for row in rows {
        table.add_row(Row::new(row.iter().map(|cell| Cell::new(cell)).collect()));
    }

    let mut result = String::new();
    for line in table.to_string().lines() {
        result.push_str("  ");
        result.push_str(line.trim_end());
        result.push('\n');
    }
    result
}

/// Format a signed word delta as `+N` or `-N`
pub fn signed(delta: i64) -> String {
    if delta < 0 {
        format!("-{}", delta.unsigned_abs())
    } else {
        format!("+{}", delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_table() {
        let rows = vec![
            vec!["2024-01-01".to_string(), "120".to_string()],
            vec!["2024-01-02".to_string(), "7".to_string()],
        ];
        let table = format_compact_table(&["Day", "Added"], &rows);

        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().all(|l| l.starts_with("  ")));
        assert!(lines[0].contains("Day") && lines[0].contains("Added"));
        assert!(lines[2].contains("2024-01-02"));
    }

    #[test]
    fn test_empty_table() {
        assert!(format_compact_table(&["Day"], &[]).is_empty());
    }

    #[test]
    fn test_signed() {
        assert_eq!(signed(12), "+12");
        assert_eq!(signed(0), "+0");
        assert_eq!(signed(-4), "-4");
    }
}
