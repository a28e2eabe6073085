use chrono::{DateTime, Utc};

/// Prettify a sheet column header for display:
/// underscores become spaces and each word is capitalized,
/// so "winners_name" renders as "Winners Name".
pub fn format_header(header: &str) -> String {
    header
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Human-friendly age of a timestamp, for the status bar.
pub fn relative_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - then).num_minutes();
    if minutes < 1 {
        // Covers clock skew too
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        format!("{}h ago", minutes / 60)
    } else {
        format!("{}d ago", minutes / 1440)
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate(s: &str, max_len: usize) -> String {
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
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_format_header() {
        assert_eq!(format_header("winners_name"), "Winners Name");
        assert_eq!(format_header("Position"), "Position");
        assert_eq!(format_header("sign_up_form"), "Sign Up Form");
        assert_eq!(format_header(""), "");
    }

    #[test]
    fn test_relative_age() {
        let now = Utc::now();
        assert_eq!(relative_age(now, now), "just now");
        assert_eq!(relative_age(now - Duration::minutes(5), now), "5m ago");
        assert_eq!(relative_age(now - Duration::hours(3), now), "3h ago");
        assert_eq!(relative_age(now - Duration::days(2), now), "2d ago");
        // Skewed clocks never show a negative age
        assert_eq!(relative_age(now + Duration::minutes(2), now), "just now");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Hello", 10), "Hello");
        assert_eq!(truncate("Hello World", 8), "Hello...");
        assert_eq!(truncate("Hi", 2), "Hi");
    }
}
