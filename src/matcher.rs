// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Line patterns
//!
//! Every pattern looks at a single line on its own. Lines are raw bytes so
//! that whatever binary payload a dump carries is copied through untouched.

use once_cell::sync::Lazy;
use regex::bytes::{NoExpand, Regex, RegexBuilder};
use std::borrow::Cow;

use super::error::{Error, Result};

// Byte-wise, ASCII-only case folding: latin1 dumps are matched as they are.
static SCHEMA_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i-u)^CREATE\s+(?:DATABASE|SCHEMA)\b").expect("valid schema pattern")
});

static TABLE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i-u)^CREATE\s+TABLE\b").expect("valid table pattern"));

/// `CREATE DATABASE ... `name`` at the start of a line
pub fn match_schema_marker(line: &[u8]) -> Option<String> {
    capture_name(&SCHEMA_MARKER, line)
}

/// `CREATE TABLE ... `name`` at the start of a line
pub fn match_table_marker(line: &[u8]) -> Option<String> {
    capture_name(&TABLE_MARKER, line)
}

fn capture_name(re: &Regex, line: &[u8]) -> Option<String> {
    let keyword = re.find(line)?;
    last_quoted_name(&line[keyword.end()..]).map(|name| String::from_utf8_lossy(&name).into_owned())
}

/// The last complete backtick-quoted identifier, `` unescaped to `.
/// Anything may sit between the backticks except a line break.
fn last_quoted_name(rest: &[u8]) -> Option<Vec<u8>> {
    let mut last = None;
    let mut i = 0;

    while i < rest.len() {
        if rest[i] != b'`' {
            i += 1;
            continue;
        }

        let mut name = Vec::new();
        let mut j = i + 1;
        loop {
            match rest.get(j) {
                None | Some(b'\r') | Some(b'\n') => return last,
                Some(b'`') if rest.get(j + 1) == Some(&b'`') => {
                    name.push(b'`');
                    j += 2;
                }
                Some(b'`') => break,
                Some(&c) => {
                    name.push(c);
                    j += 1;
                }
            }
        }

        if !name.is_empty() {
            last = Some(name);
        }
        i = j + 1;
    }

    last
}

/// Finds and replaces one engine identifier, ignoring case.
#[derive(Debug, Clone)]
pub struct EngineMatcher {
    source: Regex,
    target: String,
}

impl EngineMatcher {
    pub fn new(source: &str, target: &str) -> Result<Self> {
        let source = RegexBuilder::new(&format!("(?-u){}", regex::escape(source)))
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::InvalidEngine(e.to_string()))?;

        Ok(EngineMatcher {
            source,
            target: target.to_string(),
        })
    }

    pub fn is_match(&self, line: &[u8]) -> bool {
        self.source.is_match(line)
    }

    /// Every occurrence replaced by the target literal, the rest of the line
    /// (terminator included) as it was.
    pub fn substitute<'l>(&self, line: &'l [u8]) -> Cow<'l, [u8]> {
        self.source
            .replace_all(line, NoExpand(self.target.as_bytes()))
    }
}
