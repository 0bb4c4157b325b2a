use std::time::Duration;

use chrono::NaiveDate;

/// Format a date the way the inventory API expects it (dd/mm/yyyy)
pub fn format_day_month_year(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Parse a dd/mm/yyyy date as produced by the inventory API
pub fn parse_day_month_year(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%d/%m/%Y").ok()
}

/// Render an age for status lines: "just now", "5m ago", "2h ago", "3d ago"
pub fn age_display(age: Duration) -> String {
    let minutes = age.as_secs() / 60;
    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        if minutes % 60 >= 30 {
            // Round up: 1h 30m+ becomes 2h
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        if (minutes % 1440) / 60 >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_month_year_round_trip() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 9).unwrap();
        assert_eq!(format_day_month_year(date), "09/01/2026");
        assert_eq!(parse_day_month_year("09/01/2026"), Some(date));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_day_month_year(""), None);
        assert_eq!(parse_day_month_year("2026-01-09"), None);
        assert_eq!(parse_day_month_year("31/02/2026"), None);
    }

    #[test]
    fn test_age_display() {
        assert_eq!(age_display(Duration::from_secs(20)), "just now");
        assert_eq!(age_display(Duration::from_secs(2 * 60)), "2m ago");
        assert_eq!(age_display(Duration::from_secs(90 * 60)), "2h ago");
        assert_eq!(age_display(Duration::from_secs(70 * 60)), "1h ago");
        assert_eq!(age_display(Duration::from_secs(36 * 3600)), "2d ago");
    }

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("Hello", 10), "Hello");
        assert_eq!(truncate_string("Hello World", 8), "Hello...");
        assert_eq!(truncate_string("Hi", 2), "Hi");
    }
}
