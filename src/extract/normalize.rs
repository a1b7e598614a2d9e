//! Value normalizers for extracted text
//!
//! Small, pure helpers used by the field rule pipeline and by the output
//! layer (file name slugs).

use url::Url;

/// Extracts a numeric price by keeping only the digits of a string
///
/// Decimal separators are dropped along with currency symbols, so
/// `"$99.99"` becomes `"9999"`. Leading zeros are removed. The digits are
/// kept as text, so prices of any length survive.
///
/// # Examples
///
/// ```
/// use listing_harvest::extract::normalize::clean_price;
///
/// assert_eq!(clean_price(Some("₹1,234")).as_deref(), Some("1234"));
/// assert_eq!(clean_price(Some("Price: 1,500")).as_deref(), Some("1500"));
/// assert_eq!(clean_price(None), None);
/// ```
pub fn clean_price(raw: Option<&str>) -> Option<String> {
    let digits: String = raw?.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    match digits.trim_start_matches('0') {
        "" => Some("0".to_string()),
        significant => Some(significant.to_string()),
    }
}

/// Returns the first run of ASCII digits in a string as a number
pub fn extract_number(text: Option<&str>) -> Option<u64> {
    let text = text?;
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let run: String = text[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    run.parse().ok()
}

/// Collapses every whitespace run into a single space and trims the ends
pub fn normalize_whitespace(text: Option<&str>) -> Option<String> {
    let text = text?;
    if text.is_empty() {
        return None;
    }
    Some(text.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// Removes NUL and control characters (keeping `\n` and `\t`), then
/// normalizes whitespace
///
/// Returns None when nothing printable is left.
pub fn sanitize_text(text: &str) -> Option<String> {
    let kept: String = text
        .chars()
        .filter(|&c| c == '\n' || c == '\t' || !c.is_control())
        .collect();
    let collapsed = kept.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

/// Truncates text to `max_length` characters, suffix included
pub fn truncate_text(text: &str, max_length: usize, suffix: &str) -> String {
    if text.chars().count() <= max_length {
        return text.to_string();
    }
    let keep = max_length.saturating_sub(suffix.chars().count());
    let mut out: String = text.chars().take(keep).collect();
    out.push_str(suffix);
    out
}

/// Turns arbitrary text into a safe file name component
///
/// Lowercases, removes everything that is not a word character, whitespace
/// or `-`, joins the remaining words with `_`, and trims to `max_length`.
pub fn sanitize_filename(name: &str, max_length: usize) -> String {
    let lowered = name.to_lowercase();
    let filtered: String = lowered
        .chars()
        .filter(|&c| c.is_alphanumeric() || c == '_' || c == '-' || c.is_whitespace())
        .collect();

    let mut joined = String::with_capacity(filtered.len());
    let mut in_separator = false;
    for c in filtered.chars() {
        if c == '-' || c.is_whitespace() {
            if !in_separator {
                joined.push('_');
                in_separator = true;
            }
        } else {
            joined.push(c);
            in_separator = false;
        }
    }

    let truncated: String = joined.chars().take(max_length).collect();
    truncated.trim_matches('_').to_string()
}

/// Returns true for absolute http(s) URLs that carry a host
pub fn is_valid_url(url: Option<&str>) -> bool {
    let Some(url) = url else {
        return false;
    };
    match Url::parse(url) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https")
                && parsed.host_str().is_some_and(|h| !h.is_empty())
        }
        Err(_) => false,
    }
}

/// Returns the first whitespace-separated word (`"4.5 out of 5"` → `"4.5"`)
pub fn first_word(text: &str) -> Option<&str> {
    text.split_whitespace().next()
}

/// Resolves a link href to an absolute URL and validates it
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only links
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<String> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    base_url
        .join(href)
        .ok()
        .map(|absolute| absolute.to_string())
        .filter(|absolute| is_valid_url(Some(absolute.as_str())))
}
