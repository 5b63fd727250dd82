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

//! Schemas whose tables are never touched

use std::collections::HashSet;

/// The MySQL system schema. Always excluded.
pub const SYSTEM_SCHEMA: &str = "mysql";

/// Case-insensitive set of schema names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionSet {
    names: HashSet<String>,
}

impl Default for ExclusionSet {
    fn default() -> Self {
        ExclusionSet::new(std::iter::empty::<&str>())
    }
}

impl ExclusionSet {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut names: HashSet<String> = names
            .into_iter()
            .map(|name| normalize(name.as_ref()))
            .collect();
        names.insert(normalize(SYSTEM_SCHEMA));

        ExclusionSet { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(&normalize(name))
    }
}

fn normalize(name: &str) -> String {
    name.trim().to_uppercase()
}
