//! Curriculum units
//!
//! A curriculum is the ordered list of unit titles that drives one teaching
//! session. It is either supplied directly or extracted from the headings
//! of the document text.

use serde::Serialize;
use std::collections::HashSet;

/// Headings like `Chapter 3: Cells`
const HEADING_KEYWORDS: [&str; 3] = ["Chapter", "Unit", "Section"];

/// Numbered headings are only trusted when at least this many are found
const MIN_NUMBERED_HEADINGS: usize = 3;
const MAX_NUMBERED_HEADINGS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurriculumUnit {
    /// 1-based position in the curriculum
    pub index: usize,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Curriculum {
    units: Vec<CurriculumUnit>,
}

impl Curriculum {
    /// Build from explicit titles; blanks and case-insensitive repeats are dropped
    pub fn from_titles<I, S>(titles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let units = titles
            .into_iter()
            .filter_map(|title| {
                let title = title.as_ref().trim();
                (!title.is_empty() && seen.insert(title.to_lowercase())).then(|| title.to_string())
            })
            .enumerate()
            .map(|(i, title)| CurriculumUnit { index: i + 1, title })
            .collect();
        Self { units }
    }

    /// Extract unit titles from document headings
    ///
    /// Keyword headings (`Chapter N`, `Unit N`, `Section N`) win; otherwise
    /// numbered headings (`N. Title`, `N.M Title`) are used. May be empty.
    pub fn extract(text: &str) -> Self {
        let mut keyword: Vec<(u32, String)> = text.lines().filter_map(keyword_heading).collect();
        if !keyword.is_empty() {
            keyword.sort_by_key(|(n, _)| *n);
            return Self::from_titles(keyword.into_iter().map(|(_, t)| t));
        }

        let mut numbered: Vec<((u32, u32), String)> =
            text.lines().filter_map(numbered_heading).collect();
        if numbered.len() < MIN_NUMBERED_HEADINGS {
            return Self::default();
        }
        numbered.sort_by_key(|(n, _)| *n);
        Self::from_titles(
            numbered
                .into_iter()
                .take(MAX_NUMBERED_HEADINGS)
                .map(|(_, t)| t),
        )
    }

    pub fn units(&self) -> &[CurriculumUnit] {
        &self.units
    }

    /// Unit by 1-based index
    pub fn get(&self, index: usize) -> Option<&CurriculumUnit> {
        index.checked_sub(1).and_then(|i| self.units.get(i))
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn titles(&self) -> Vec<String> {
        self.units.iter().map(|u| u.title.clone()).collect()
    }
}

/// `Chapter 3: Cell Division` → (3, "Chapter 3: Cell Division")
fn keyword_heading(line: &str) -> Option<(u32, String)> {
    let line = line.trim();
    let keyword = HEADING_KEYWORDS.iter().find(|k| {
        line.len() > k.len()
            && line.is_char_boundary(k.len())
            && line[..k.len()].eq_ignore_ascii_case(k)
    })?;

    let rest = &line[keyword.len()..];
    let after_space = rest.trim_start();
    if after_space.len() == rest.len() {
        return None;
    }

    let (number, rest) = leading_number(after_space)?;
    let separator = rest.chars().next()?;
    if !matches!(separator, ':' | '.' | '-' | ' ' | '\t') {
        return None;
    }
    let title = rest
        .trim_start_matches([':', '.', '-', ' ', '\t'])
        .trim();
    let length = title.chars().count();
    if !(4..100).contains(&length) {
        return None;
    }

    Some((number, format!("{} {}: {}", keyword, number, title)))
}

/// `2.1 Newton's Laws` → ((2, 1), "Newton's Laws")
fn numbered_heading(line: &str) -> Option<((u32, u32), String)> {
    let line = line.trim();
    let (major, rest) = leading_number(line)?;
    let rest = rest.strip_prefix('.')?;
    let (minor, rest) = leading_number(rest).unwrap_or((0, rest));
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }

    let title = rest.trim();
    let length = title.chars().count();
    if !(10..=80).contains(&length)
        || !title.starts_with(|c: char| c.is_uppercase())
        || has_digit_run(title)
    {
        return None;
    }
    Some(((major, minor), title.to_string()))
}

fn leading_number(text: &str) -> Option<(u32, &str)> {
    let digits = text.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits == 0 {
        return None;
    }
    let number = text[..digits].parse().ok()?;
    Some((number, &text[digits..]))
}

/// Page numbers and dates make a line look like a table-of-contents entry
fn has_digit_run(text: &str) -> bool {
    let mut run = 0;
    for c in text.chars() {
        if c.is_ascii_digit() {
            run += 1;
            if run >= 2 {
                return true;
            }
        } else {
            run = 0;
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_titles_dedups_and_indexes() {
        let curriculum = Curriculum::from_titles(["Atoms", "  ", "Molecules", "atoms", "Bonds"]);
        assert_eq!(curriculum.titles(), vec!["Atoms", "Molecules", "Bonds"]);
        assert_eq!(curriculum.get(1).unwrap().title, "Atoms");
        assert_eq!(curriculum.get(3).unwrap().index, 3);
        assert!(curriculum.get(0).is_none());
        assert!(curriculum.get(4).is_none());
    }

    #[test]
    fn test_extracts_chapter_headings_in_order() {
        let text = "Preface\n\
            CHAPTER 2: Cell Division\n\
            Some body text.\n\
            Chapter 1 - The Cell\n\
            chapter 3 Genetics and Heredity\n\
            Chapter 4: Ok\n\
            Chapter 1 - the cell\n";
        let curriculum = Curriculum::extract(text);
        assert_eq!(
            curriculum.titles(),
            vec![
                "Chapter 1: The Cell",
                "Chapter 2: Cell Division",
                "Chapter 3: Genetics and Heredity",
            ]
        );
    }

    #[test]
    fn test_keyword_needs_separating_space() {
        assert!(keyword_heading("Chapter1: Intro to things").is_none());
        assert!(keyword_heading("Unity 3: Game engines").is_none());
        assert_eq!(
            keyword_heading("Unit 3: Forces and Motion").unwrap().1,
            "Unit 3: Forces and Motion"
        );
    }

    #[test]
    fn test_numbered_headings_fallback() {
        let text = "2. Forces and Motion\n\
            1. Introduction to Physics\n\
            1.1 Units and Measurement\n\
            3. see page 45 for details\n\
            4. Short\n";
        let curriculum = Curriculum::extract(text);
        assert_eq!(
            curriculum.titles(),
            vec!["Introduction to Physics", "Units and Measurement", "Forces and Motion"]
        );
    }

    #[test]
    fn test_too_few_numbered_headings_yields_empty() {
        let text = "1. Introduction to Physics\n2. Forces and Motion\n";
        assert!(Curriculum::extract(text).is_empty());
    }
}
