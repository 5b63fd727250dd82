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

//! MySQL mysqldump storage engine rewriter in Rust
//!
//! This crate streams a mysqldump file and rewrites the storage engine of
//! its tables (`MyISAM` to `InnoDB` by default) on the fly, except for the
//! tables of excluded databases such as the `mysql` system schema. The dump
//! is never parsed: every line is matched against a few case-insensitive
//! patterns, so memory use does not grow with the size of the dump.
//!
//! ```rust,no_run
//! use mysqldump_engine_rewriter::{convert, ConvertOptions, LogReporter, Verbosity};
//! # use std::fs::File;
//! # use std::io::{self, BufReader};
//! # fn main() -> Result<(), mysqldump_engine_rewriter::Error> {
//! # let file: String = std::env::args().collect::<Vec<String>>()[1].clone();
//!
//! let options = ConvertOptions::new()
//!     // mysql is always excluded, add your own
//!     .exclude(vec!["sys", "performance_schema"]);
//!
//! let stats = convert(
//!     BufReader::new(File::open(&file)?),
//!     io::stdout(),
//!     &options,
//!     LogReporter::new(Verbosity::Coarse),
//! )?;
//! eprintln!("{}", stats);
//! # Ok(())
//! # }
//! ```
//!

#![warn(clippy::all)]
#![forbid(unsafe_code)]

mod error;
mod exclusion;
mod files;
mod matcher;
mod options;
mod report;
mod transformer;

pub use error::{Error, Result};
pub use exclusion::{ExclusionSet, SYSTEM_SCHEMA};
pub use files::convert_file;
pub use matcher::{match_schema_marker, match_table_marker, EngineMatcher};
pub use options::{ConvertOptions, DEFAULT_SOURCE_ENGINE, DEFAULT_TARGET_ENGINE};
pub use report::{Event, LogReporter, Recorder, Reporter, Verbosity};
pub use transformer::{convert, Stats, Transformer};
