/*
 Copyright (c) 2025 Mark Hughes

 This program is free software: you can redistribute it and/or modify
 it under the terms of the GNU Affero General Public License as published by
 the Free Software Foundation, either version 3 of the License, or
 (at your option) any later version.

 This program is distributed in the hope that it will be useful,
 but WITHOUT ANY WARRANTY; without even the implied warranty of
 MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 GNU Affero General Public License for more details.

 You should have received a copy of the GNU Affero General Public License
 along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

//! Deployed version directories and the ordering used to rank them.

use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

/// A directory holding one complete deployed copy of the static assets,
/// e.g. `/srv/mediawiki/php-1.27.0-wmf.12`.
///
/// The version identifier is the final component of the path. Roots order by
/// [`compare_versions`] on that identifier, with the full path as tie-break so
/// that ordering stays total.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct VersionRoot {
    path: PathBuf,
}

impl VersionRoot {
    pub fn new(path: impl Into<PathBuf>) -> VersionRoot {
        VersionRoot { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The version identifier, ie the directory name (eg. "php-1.27.0-wmf.12")
    pub fn version(&self) -> String {
        match self.path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => String::new(),
        }
    }
}

impl fmt::Display for VersionRoot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

impl Ord for VersionRoot {
    fn cmp(&self, other: &Self) -> Ordering {
        compare_versions(&self.version(), &other.version()).then_with(|| self.path.cmp(&other.path))
    }
}

impl PartialOrd for VersionRoot {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Part<'a> {
    Number(&'a str),
    Text(&'a str),
}

// Rank of a number in the special form ordering
const NUMBER_RANK: i8 = 4;

/// Compare two version identifiers the way deployment tooling has always
/// ranked branch directories (PHP `version_compare()`).
///
/// Identifiers are split at '.', '-', '_', '+' (and any other punctuation) and at
/// every switch between digits and letters. Numeric parts compare as numbers.
/// Text parts compare by release stage:
///
/// ```text
/// <anything else> < dev < alpha = a < beta = b < RC = rc < <number> < pl = p
/// ```
///
/// When one identifier has more parts, a trailing number makes it newer
/// ("1.0.1" > "1.0") while a trailing pre-release tag makes it older ("1.0rc1" < "1.0").
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a_parts = split_version(a);
    let b_parts = split_version(b);

    for (a_part, b_part) in a_parts.iter().zip(b_parts.iter()) {
        let ordering = compare_parts(*a_part, *b_part);
        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    match a_parts.len().cmp(&b_parts.len()) {
        Ordering::Equal => Ordering::Equal,
        Ordering::Greater => trailing_part_ordering(a_parts[b_parts.len()]),
        Ordering::Less => trailing_part_ordering(b_parts[a_parts.len()]).reverse(),
    }
}

// How a version with an extra trailing part compares to one without it
fn trailing_part_ordering(part: Part) -> Ordering {
    match part {
        Part::Number(_) => Ordering::Greater,
        Part::Text(text) => special_rank(text).cmp(&NUMBER_RANK),
    }
}

fn compare_parts(a: Part, b: Part) -> Ordering {
    match (a, b) {
        (Part::Number(a), Part::Number(b)) => compare_numeric(a, b),
        (Part::Text(a), Part::Text(b)) => special_rank(a).cmp(&special_rank(b)),
        (Part::Number(_), Part::Text(b)) => NUMBER_RANK.cmp(&special_rank(b)),
        (Part::Text(a), Part::Number(_)) => special_rank(a).cmp(&NUMBER_RANK),
    }
}

// Compare digit strings of any length without parsing them
fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

// Forms are matched by prefix and in this order, so "alpha" wins over "a"
const SPECIAL_FORMS: [(&str, i8); 9] = [
    ("dev", 0),
    ("alpha", 1),
    ("a", 1),
    ("beta", 2),
    ("b", 2),
    ("RC", 3),
    ("rc", 3),
    ("pl", 5),
    ("p", 5),
];

fn special_rank(text: &str) -> i8 {
    for (form, rank) in SPECIAL_FORMS {
        if text.starts_with(form) {
            return rank;
        }
    }
    -6
}

fn split_version(version: &str) -> Vec<Part<'_>> {
    let mut parts = Vec::new();
    let mut start: Option<(usize, bool)> = None;

    for (index, c) in version.char_indices() {
        let is_digit = c.is_ascii_digit();
        let is_alpha = c.is_alphanumeric() && !is_digit;
        match start {
            Some((_, was_digit)) if (is_digit && was_digit) || (is_alpha && !was_digit) => {}
            Some((from, was_digit)) => {
                parts.push(make_part(&version[from..index], was_digit));
                start = (is_digit || is_alpha).then_some((index, is_digit));
            }
            None => start = (is_digit || is_alpha).then_some((index, is_digit)),
        }
    }
    if let Some((from, was_digit)) = start {
        parts.push(make_part(&version[from..], was_digit));
    }
    parts
}

fn make_part(text: &str, is_digit: bool) -> Part<'_> {
    if is_digit {
        Part::Number(text)
    } else {
        Part::Text(text)
    }
}
