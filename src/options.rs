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

//! Conversion settings

use super::error::{Error, Result};
use super::exclusion::ExclusionSet;

pub const DEFAULT_SOURCE_ENGINE: &str = "MyISAM";
pub const DEFAULT_TARGET_ENGINE: &str = "InnoDB";

/// What to rewrite, into what, and where not to.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertOptions {
    /// Engine identifier searched for, case-insensitively
    pub source_engine: String,
    /// Literal written in place of every source occurrence
    pub target_engine: String,
    /// Schemas left untouched on top of the system schema
    pub excluded: Vec<String>,
    /// Schema context in effect before the first `CREATE DATABASE` line.
    /// `None` leaves the dump preamble untouched.
    pub assumed_schema: Option<String>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions {
            source_engine: DEFAULT_SOURCE_ENGINE.to_string(),
            target_engine: DEFAULT_TARGET_ENGINE.to_string(),
            excluded: vec![],
            assumed_schema: None,
        }
    }
}

impl ConvertOptions {
    pub fn new() -> Self {
        ConvertOptions::default()
    }

    pub fn engines(mut self, source: &str, target: &str) -> Self {
        self.source_engine = source.to_string();
        self.target_engine = target.to_string();
        self
    }

    pub fn exclude<I, S>(mut self, schemas: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.excluded.extend(schemas.into_iter().map(Into::into));
        self
    }

    pub fn assume_schema(mut self, schema: Option<String>) -> Self {
        self.assumed_schema = schema;
        self
    }

    pub fn exclusion_set(&self) -> ExclusionSet {
        ExclusionSet::new(&self.excluded)
    }

    /// Rejects engine pairs that would make a second run rewrite the output
    /// of the first one again.
    pub fn validate(&self) -> Result<()> {
        let source = self.source_engine.trim();
        let target = self.target_engine.trim();

        if source.is_empty() {
            return Err(Error::InvalidEngine(
                "source engine must not be empty".to_string(),
            ));
        }
        if target.is_empty() {
            return Err(Error::InvalidEngine(
                "target engine must not be empty".to_string(),
            ));
        }
        if target.to_uppercase().contains(&source.to_uppercase()) {
            return Err(Error::InvalidEngine(format!(
                "target engine {} contains source engine {}",
                target, source
            )));
        }

        Ok(())
    }
}
