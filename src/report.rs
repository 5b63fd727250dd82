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

//! Diagnostics emitted while a dump is converted
//!
//! The transformer never logs by itself: it hands [`Event`]s to whatever
//! [`Reporter`] it was given. [`LogReporter`] forwards them to the `log`
//! facade, [`Recorder`] keeps them around as data.

use log::{debug, info, warn};
use std::fmt;

use super::transformer::Stats;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Schema and table boundaries plus the final summary
    Coarse,
    /// Also every changed line, before and after
    Fine,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    SchemaFound {
        line: u64,
        name: String,
        excluded: bool,
    },
    TableFound {
        line: u64,
        name: String,
    },
    /// A `CREATE TABLE` seen before any `CREATE DATABASE`
    TableOutsideSchema {
        line: u64,
        name: String,
    },
    /// Only produced when the reporter asks for [`Verbosity::Fine`]
    LineChanged {
        line: u64,
        schema: Option<String>,
        table: Option<String>,
        before: String,
        after: String,
    },
    Summary(Stats),
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Event::SchemaFound {
                line,
                name,
                excluded,
            } => write!(
                f,
                "Line {}: Found database {} (excluded = {})",
                line,
                name,
                if *excluded { "Yes" } else { "No" }
            ),
            Event::TableFound { line, name } => write!(f, "Line {}: Found table {}", line, name),
            Event::TableOutsideSchema { line, name } => write!(
                f,
                "Line {}: Found table {} before any database, keeping previous state",
                line, name
            ),
            Event::LineChanged {
                line,
                schema,
                table,
                before,
                after,
            } => write!(
                f,
                "Line {}: Changing {}.{} `{}` -> `{}`",
                line,
                schema.as_deref().unwrap_or("?"),
                table.as_deref().unwrap_or("?"),
                before,
                after
            ),
            Event::Summary(stats) => write!(f, "{}", stats),
        }
    }
}

pub trait Reporter {
    fn verbosity(&self) -> Verbosity;

    fn report(&mut self, event: Event);
}

impl<R: Reporter + ?Sized> Reporter for &mut R {
    fn verbosity(&self) -> Verbosity {
        (**self).verbosity()
    }

    fn report(&mut self, event: Event) {
        (**self).report(event)
    }
}

/// Sends events to the `log` facade.
#[derive(Debug, Clone, Copy)]
pub struct LogReporter {
    verbosity: Verbosity,
}

impl LogReporter {
    pub fn new(verbosity: Verbosity) -> Self {
        LogReporter { verbosity }
    }
}

impl Reporter for LogReporter {
    fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    fn report(&mut self, event: Event) {
        match event {
            Event::LineChanged { .. } => {
                if self.verbosity == Verbosity::Fine {
                    debug!("{}", event)
                }
            }
            Event::TableOutsideSchema { .. } => warn!("{}", event),
            _ => info!("{}", event),
        }
    }
}

/// Keeps every event it receives.
#[derive(Debug, Clone)]
pub struct Recorder {
    verbosity: Verbosity,
    pub events: Vec<Event>,
}

impl Default for Recorder {
    fn default() -> Self {
        Recorder::new(Verbosity::Fine)
    }
}

impl Recorder {
    pub fn new(verbosity: Verbosity) -> Self {
        Recorder {
            verbosity,
            events: vec![],
        }
    }

    pub fn changed_lines(&self) -> impl Iterator<Item = u64> + '_ {
        self.events.iter().filter_map(|event| match event {
            Event::LineChanged { line, .. } => Some(*line),
            _ => None,
        })
    }
}

impl Reporter for Recorder {
    fn verbosity(&self) -> Verbosity {
        self.verbosity
    }

    fn report(&mut self, event: Event) {
        self.events.push(event);
    }
}
