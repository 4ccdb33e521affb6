/// Checks whether path segments have the shape of calendar navigation
///
/// Calendar pages on listing sites are addressed by date rather than slug:
///
/// * `YYYY`
/// * `YYYY/M` or `YYYY/MM`
/// * `YYYY/M/D` up to `YYYY/MM/DD`
///
/// Anything else, including longer numeric paths, is not date navigation.
///
/// # Examples
///
/// ```
/// use event_harvester::url::is_date_navigation;
///
/// assert!(is_date_navigation(&["2024"]));
/// assert!(is_date_navigation(&["2024", "5"]));
/// assert!(is_date_navigation(&["2024", "05", "01"]));
/// assert!(!is_date_navigation(&["my-cool-party"]));
/// ```
pub fn is_date_navigation(segments: &[&str]) -> bool {
    match segments {
        [year] => is_year(year),
        [year, month] => is_year(year) && is_short_number(month),
        [year, month, day] => is_year(year) && is_short_number(month) && is_short_number(day),
        _ => false,
    }
}

/// Checks whether any segment contains an alphabetic character
pub fn has_alphabetic_segment(segments: &[&str]) -> bool {
    segments
        .iter()
        .any(|segment| segment.chars().any(char::is_alphabetic))
}

fn is_year(segment: &str) -> bool {
    segment.len() == 4 && is_all_digits(segment)
}

fn is_short_number(segment: &str) -> bool {
    (1..=2).contains(&segment.len()) && is_all_digits(segment)
}

fn is_all_digits(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit())
}
