// LogDelta - GPL-3.0-or-later
// This file is part of LogDelta.
//
// Copyright (C) 2026 The LogDelta Authors
//
// LogDelta is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// LogDelta is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with LogDelta.  If not, see <https://www.gnu.org/licenses/>.

//! Template extraction: replace the variable parts of a log message with
//! placeholders and derive a stable fingerprint from the result.

use fancy_regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

/// Number of digest bytes kept in a fingerprint
pub const FINGERPRINT_BYTES: usize = 8;

/// Ordered substitutions. Each pass runs over the whole output of the previous one.
static SUBSTITUTIONS: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (
            r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
            "<UUID>",
        ),
        (r"\b[0-9a-fA-F]{16,64}\b", "<HEX>"),
        (r"\b\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}\b", "<IP>"),
        (
            r"\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:?\d{2})?",
            "<TIME>",
        ),
        (r"\b\d+(?:\.\d+)?(?:ns|us|µs|ms|s|m|h)\b", "<DUR>"),
        (r"\b\d+(?:\.\d+)?\b", "<NUM>"),
        (r#""[^"]*""#, "<STR>"),
        (r"'[^']*'", "<STR>"),
        (r"(^|\s)/[^\s:]+", "${1}<PATH>"),
        (r"[\w.+-]+@[\w-]+(?:\.[\w-]+)+", "<EMAIL>"),
    ]
    .into_iter()
    .map(|(pattern, placeholder)| {
        (
            Regex::new(pattern).expect("template substitution pattern must compile"),
            placeholder,
        )
    })
    .collect()
});

static WHITESPACE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern must compile"));

/// Short content-derived cluster key: the first [`FINGERPRINT_BYTES`] of the
/// SHA-256 digest of a template, hex-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    #[must_use]
    pub fn of(template: &str) -> Self {
        let digest = Sha256::digest(template.as_bytes());
        Self(hex::encode(&digest[..FINGERPRINT_BYTES]))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A message reduced to its invariant shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedTemplate {
    pub template: String,
    pub fingerprint: Fingerprint,
}

/// Reduce `message` to a template and fingerprint it.
#[must_use]
pub fn extract(message: &str) -> ExtractedTemplate {
    profiling::scope!("template::extract");
    let template = templatize(message);
    let fingerprint = Fingerprint::of(&template);
    ExtractedTemplate {
        template,
        fingerprint,
    }
}

/// Apply every substitution in order, then collapse whitespace.
#[must_use]
pub fn templatize(message: &str) -> String {
    let mut template = message.to_string();
    for (pattern, placeholder) in SUBSTITUTIONS.iter() {
        // A pass that hits the backtrack limit keeps the text it was handed.
        if let Ok(replaced) = pattern
            .try_replacen(&template, 0, *placeholder)
            .map(Cow::into_owned)
        {
            template = replaced;
        }
    }
    WHITESPACE_PATTERN
        .replace_all(&template, " ")
        .trim()
        .to_string()
}
