//! Per-file report lines and human-readable byte counts

use crate::action::Action;
use crate::record::SyncRecord;

/// Width of the bracketed space column
const SPACE_WIDTH: usize = 9;

const UNITS: [(&str, f64); 3] = [("KB", 1e3), ("MB", 1e6), ("GB", 1e9)];

/// Format a signed byte count with 1000-based units; zero renders blank
pub fn format_space(bytes: i64) -> String {
    if bytes == 0 {
        return String::new();
    }

    let magnitude = bytes.unsigned_abs() as f64;
    if magnitude < 1e3 {
        return format!("{} B", bytes);
    }
    let sign = if bytes < 0 { "-" } else { "" };

    // Pick the unit after rounding so 999.96 KB shows as 1.0 MB
    let mut shown = (0.0, "GB");
    for (unit, scale) in UNITS {
        shown = ((magnitude / scale * 10.0).round() / 10.0, unit);
        if shown.0 < 1e3 {
            break;
        }
    }

    format!("{}{:.1} {}", sign, shown.0, shown.1)
}

/// `[<space>] <description> <path>` for one record about to be executed
pub fn report_line(record: &SyncRecord, action: Action) -> String {
    format!(
        "[{:>width$}] {} {}",
        format_space(action.space_effect(record)),
        action,
        record.path.display(),
        width = SPACE_WIDTH
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FileAttrs;
    use std::time::UNIX_EPOCH;

    #[test]
    fn test_format_space_units() {
        assert_eq!(format_space(0), "");
        assert_eq!(format_space(5), "5 B");
        assert_eq!(format_space(999), "999 B");
        assert_eq!(format_space(1_000), "1.0 KB");
        assert_eq!(format_space(1_500), "1.5 KB");
        assert_eq!(format_space(2_500_000), "2.5 MB");
        assert_eq!(format_space(7_260_000_000), "7.3 GB");
    }

    #[test]
    fn test_format_space_rounds_into_next_unit() {
        assert_eq!(format_space(999_940), "999.9 KB");
        assert_eq!(format_space(999_960), "1.0 MB");
        assert_eq!(format_space(999_960_000), "1.0 GB");
        assert_eq!(format_space(-999_999), "-1.0 MB");
        assert_eq!(format_space(1_500_000_000_000), "1500.0 GB");
    }

    #[test]
    fn test_format_space_negative() {
        assert_eq!(format_space(-100), "-100 B");
        assert_eq!(format_space(-3_000_000), "-3.0 MB");
    }

    #[test]
    fn test_report_line_layout() {
        let record = SyncRecord::new("dir/file.txt", Some(FileAttrs::new(5, UNIX_EPOCH)), None);

        assert_eq!(
            report_line(&record, Action::Create),
            "[      5 B] copy dir/file.txt"
        );
        assert_eq!(
            report_line(&record, Action::TooOldSkip),
            "[         ] skip (too old) dir/file.txt"
        );
    }

    #[test]
    fn test_report_line_for_delete_shows_freed_space() {
        let record = SyncRecord::new("old", None, Some(FileAttrs::new(100, UNIX_EPOCH)));
        assert_eq!(report_line(&record, Action::Delete), "[   -100 B] delete old");
    }
}
