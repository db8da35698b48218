//! Folder name parsing for movie releases
//!
//! Handles names like:
//! - "Inception (2010)"
//! - "Movie.Title.2023.1080p.WEB-DL"
//! - "[Group] Spirited Away [2001]"

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Characters that separate tokens in release names
static TOKEN_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s._(){}\[\]]+").unwrap());

/// A token that is a whole 19xx or 20xx year
static YEAR_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(19\d{2}|20\d{2})$").unwrap());

static WORD_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s._]+").unwrap());

/// Title and year extracted from a folder or file name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedMovie {
    pub title: String,
    pub year: Option<u32>,
}

/// Parse a movie folder (or file stem) name.
pub fn parse_movie(name: &str) -> ParsedMovie {
    ParsedMovie {
        title: display_name(name),
        year: extract_year(name),
    }
}

/// Find the first plausible release year in `text`.
///
/// Tokens are split on whitespace, dots, underscores and brackets; the first
/// four-digit token strictly between 1900 and 2100 wins.
pub fn extract_year(text: &str) -> Option<u32> {
    tokens(text).find_map(|token| {
        let year: u32 = YEAR_TOKEN.captures(token)?.get(1)?.as_str().parse().ok()?;
        (year > 1900).then_some(year)
    })
}

/// Human readable title for a folder name.
///
/// Everything before the first `(` or `[` when that leaves something,
/// otherwise the tokens preceding the year. Falls back to the raw name.
pub fn display_name(name: &str) -> String {
    let before_bracket = name
        .split(['(', '['])
        .next()
        .map(clean_title)
        .unwrap_or_default();
    if !before_bracket.is_empty() && before_bracket != clean_title(name) {
        return before_bracket;
    }

    if let Some(year) = extract_year(name) {
        let year = year.to_string();
        let title: Vec<&str> = tokens(name).take_while(|t| *t != year).collect();
        if !title.is_empty() {
            return title.join(" ");
        }
    }

    let cleaned = clean_title(name);
    if cleaned.is_empty() {
        name.trim().to_string()
    } else {
        cleaned
    }
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    TOKEN_SEPARATOR.split(text).filter(|t| !t.is_empty())
}

/// Dots and underscores become spaces, runs of spaces collapse to one
fn clean_title(s: &str) -> String {
    WORD_SEPARATOR.replace_all(s, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_year_in_parentheses() {
        assert_eq!(extract_year("Inception (2010)"), Some(2010));
    }

    #[test]
    fn test_year_in_dotted_release_name() {
        assert_eq!(extract_year("Movie.Title.2023.1080p"), Some(2023));
    }

    #[test]
    fn test_no_year() {
        assert_eq!(extract_year("NoYearHere"), None);
    }

    #[test]
    fn test_year_bounds_are_exclusive() {
        assert_eq!(extract_year("Old 1900"), None);
        assert_eq!(extract_year("Future 2100"), None);
        assert_eq!(extract_year("Metropolis 1927"), Some(1927));
    }

    #[test]
    fn test_first_qualifying_year_wins() {
        assert_eq!(extract_year("2001 A Space Odyssey (1968)"), Some(2001));
        assert_eq!(extract_year("Blade Runner 2049 [2017]"), Some(2049));
    }

    #[test]
    fn test_resolution_is_not_a_year() {
        assert_eq!(extract_year("Movie 1080p 2160p"), None);
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("Inception (2010)"), "Inception");
        assert_eq!(display_name("Movie.Title.2023.1080p"), "Movie Title");
        assert_eq!(display_name("NoYearHere"), "NoYearHere");
        assert_eq!(display_name("The_Matrix [1999]"), "The Matrix");
    }

    #[test]
    fn test_display_name_leading_bracket() {
        // Nothing before the bracket, so the year split takes over
        assert_eq!(display_name("[Group] Spirited Away 2001"), "Group Spirited Away");
    }

    #[test]
    fn test_separator_runs_collapse() {
        assert_eq!(clean_title(" The..Matrix__Reloaded  "), "The Matrix Reloaded");
        assert_eq!(display_name("Movie..Title__2023"), "Movie Title");
        assert_eq!(extract_year("Heat__[1995]"), Some(1995));
    }

    #[test]
    fn test_parse_movie() {
        let parsed = parse_movie("Heat (1995)");
        assert_eq!(parsed.title, "Heat");
        assert_eq!(parsed.year, Some(1995));
    }
}
