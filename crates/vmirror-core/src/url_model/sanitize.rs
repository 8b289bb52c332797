//! Filesystem-safe rendering of breadcrumb paths and item titles.

/// Characters that separate catalogue levels in a breadcrumb string.
const HIERARCHY_DELIMITERS: [char; 2] = ['/', '>'];

/// Punctuation kept in titles besides alphanumerics and spaces.
const TITLE_PUNCTUATION: [char; 4] = ['.', '_', '-', '('];
const TITLE_PUNCTUATION_CLOSE: char = ')';

/// Linux NAME_MAX.
const NAME_MAX: usize = 255;

/// Title used when nothing printable survives sanitization.
pub const UNTITLED: &str = "untitled";

/// Longest prefix of `s` that fits in `budget` bytes without splitting a char.
fn truncate_to(s: &str, budget: usize) -> &str {
    if s.len() <= budget {
        return s;
    }
    let mut take = budget;
    while take > 0 && !s.is_char_boundary(take) {
        take -= 1;
    }
    &s[..take]
}

fn sanitize_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for c in segment.chars() {
        match c {
            ':' => out.push('-'),
            '?' | '*' | '"' | '<' | '|' | '\\' | '\0' => {}
            c if c.is_control() => {}
            c => out.push(c),
        }
    }
    let trimmed = out.trim_matches(|c: char| c == ' ' || c == '.');
    truncate_to(trimmed, NAME_MAX).to_string()
}

/// Turns a breadcrumb string (`"Beginner > Flips/Back"`) into a relative directory path.
///
/// - `/` and `>` become directory separators
/// - `:` becomes `-`; `? * " < | \` and control characters are removed
/// - each segment is trimmed of spaces and dots, so `.` and `..` can never survive
/// - empty segments are dropped
pub fn sanitize_path(path: &str) -> String {
    path.split(|c| HIERARCHY_DELIMITERS.contains(&c))
        .map(sanitize_segment)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

/// Keeps alphanumerics, spaces and `._-()` from a title; trailing whitespace is dropped.
pub fn sanitize_title(title: &str) -> String {
    sanitize_title_within(title, NAME_MAX)
}

/// Like [`sanitize_title`], cut to at most `budget` bytes.
fn sanitize_title_within(title: &str, budget: usize) -> String {
    let kept: String = title
        .chars()
        .filter(|c| {
            c.is_alphanumeric()
                || *c == ' '
                || TITLE_PUNCTUATION.contains(c)
                || *c == TITLE_PUNCTUATION_CLOSE
        })
        .collect();
    let trimmed = kept.trim_end().trim_start_matches('.');
    let cut = truncate_to(trimmed, budget).trim_end();
    if cut.is_empty() {
        UNTITLED.to_string()
    } else {
        cut.to_string()
    }
}

/// Relative output path for an item: `sanitize(path)/sanitize(title)<extension>`.
///
/// An empty breadcrumb puts the file at the root of the destination. The
/// title is cut so the file name, extension included, fits in NAME_MAX.
pub fn output_path(path: &str, title: &str, extension: &str) -> String {
    let dir = sanitize_path(path);
    let budget = NAME_MAX.saturating_sub(extension.len()).max(UNTITLED.len());
    let file = format!("{}{}", sanitize_title_within(title, budget), extension);
    if dir.is_empty() {
        file
    } else {
        format!("{dir}/{file}")
    }
}
