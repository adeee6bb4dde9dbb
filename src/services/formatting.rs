use once_cell::sync::Lazy;
use regex::Regex;

static ISO_DURATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^P(?:(\d+)D)?(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)(?:\.\d+)?S)?)?$")
        .expect("ISO_DURATION is a valid regex pattern")
});

/// Longest prefix of `text` with at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}

/// Formats an ISO 8601 duration (`PT1H2M3S`) as `H:MM:SS` or `MM:SS`.
pub fn format_duration(iso: &str) -> String {
    let Some(total_seconds) = parse_iso_duration(iso) else {
        return "00:00".to_string();
    };
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    if hours > 0 {
        format!("{}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

pub fn parse_iso_duration(iso: &str) -> Option<u64> {
    let captures = ISO_DURATION.captures(iso.trim())?;
    let part = |index: usize| -> Option<u64> {
        match captures.get(index) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };
    Some(part(1)? * 86_400 + part(2)? * 3600 + part(3)? * 60 + part(4)?)
}

/// Compact view count: `1.2B`, `3.4M`, `5.6K`, or the plain number.
pub fn format_views(raw: &str) -> String {
    let Ok(views) = raw.trim().parse::<u64>() else {
        return "0".to_string();
    };
    if views >= 1_000_000_000 {
        format!("{:.1}B", views as f64 / 1_000_000_000.0)
    } else if views >= 1_000_000 {
        format!("{:.1}M", views as f64 / 1_000_000.0)
    } else if views >= 1_000 {
        format!("{:.1}K", views as f64 / 1_000.0)
    } else {
        views.to_string()
    }
}

/// Inverse of [`format_views`], for sorting.
pub fn parse_view_count(formatted: &str) -> u64 {
    let formatted = formatted.trim();
    let (number, multiplier) = match formatted.chars().last() {
        Some('B') => (&formatted[..formatted.len() - 1], 1_000_000_000.0),
        Some('M') => (&formatted[..formatted.len() - 1], 1_000_000.0),
        Some('K') => (&formatted[..formatted.len() - 1], 1_000.0),
        _ => (formatted, 1.0),
    };
    number
        .parse::<f64>()
        .map(|n| (n * multiplier).round() as u64)
        .unwrap_or(0)
}

/// Coarse "N years ago" label from an RFC 3339 publish timestamp.
pub fn format_publish_date(published_at: Option<&str>, current_year: i32) -> String {
    let Some(published_at) = published_at.filter(|p| !p.trim().is_empty()) else {
        return "Recently".to_string();
    };
    let year = published_at
        .get(..4)
        .and_then(|year| year.parse::<i32>().ok());
    match year.map(|year| current_year - year) {
        Some(years) if years <= 0 => "This year".to_string(),
        Some(1) => "1 year ago".to_string(),
        Some(years) => format!("{} years ago", years),
        None => "Unknown date".to_string(),
    }
}
