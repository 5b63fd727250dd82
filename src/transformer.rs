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

//! Dump stream transformer
//!
//! Reads a dump line by line, remembers which database the current line
//! belongs to and rewrites the engine token unless that database is excluded.

use std::fmt;
use std::io::{self, BufRead, Write};

use super::error::Result;
use super::exclusion::ExclusionSet;
use super::matcher::{match_schema_marker, match_table_marker, EngineMatcher};
use super::options::ConvertOptions;
use super::report::{Event, Reporter, Verbosity};

/// Line counters of a run. `changed + preserved == read` after every line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub lines_read: u64,
    pub lines_changed: u64,
    pub lines_preserved: u64,
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "Read {} lines. {} lines changed, {} lines preserved",
            grouped(self.lines_read),
            grouped(self.lines_changed),
            grouped(self.lines_preserved)
        )
    }
}

// 1234567 -> "1,234,567"
fn grouped(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[derive(Debug, Clone, Default)]
struct SchemaContext {
    name: Option<String>,
    excluded: bool,
}

pub struct Transformer<R: Reporter> {
    engine: EngineMatcher,
    exclusions: ExclusionSet,
    schema: SchemaContext,
    table: Option<String>,
    stats: Stats,
    reporter: R,
}

impl<R: Reporter> Transformer<R> {
    pub fn new(options: &ConvertOptions, reporter: R) -> Result<Self> {
        options.validate()?;

        let engine = EngineMatcher::new(
            options.source_engine.trim(),
            options.target_engine.trim(),
        )?;
        let exclusions = options.exclusion_set();

        // Without an assumed schema, whatever precedes the first
        // CREATE DATABASE is left alone.
        let schema = match &options.assumed_schema {
            Some(name) => SchemaContext {
                excluded: exclusions.contains(name),
                name: Some(name.clone()),
            },
            None => SchemaContext {
                name: None,
                excluded: true,
            },
        };

        Ok(Transformer {
            engine,
            exclusions,
            schema,
            table: None,
            stats: Stats::default(),
            reporter,
        })
    }

    /// Streams `input` into `output`. The writer is flushed before returning.
    pub fn run<I: BufRead, O: Write>(&mut self, mut input: I, mut output: O) -> Result<Stats> {
        let mut line = Vec::new();
        loop {
            line.clear();
            if input.read_until(b'\n', &mut line)? == 0 {
                break;
            }
            self.process_line(&line, &mut output)?;
        }
        output.flush()?;

        self.reporter.report(Event::Summary(self.stats));
        Ok(self.stats)
    }

    /// Handles one line, terminator included, and writes its output.
    pub fn process_line<O: Write>(&mut self, line: &[u8], output: &mut O) -> io::Result<()> {
        let number = self.stats.lines_read + 1;

        if let Some(name) = match_schema_marker(line) {
            self.schema.excluded = self.exclusions.contains(&name);
            self.reporter.report(Event::SchemaFound {
                line: number,
                name: name.clone(),
                excluded: self.schema.excluded,
            });
            self.schema.name = Some(name);
        }

        if let Some(name) = match_table_marker(line) {
            match &self.schema.name {
                Some(schema) => {
                    self.schema.excluded = self.exclusions.contains(schema);
                    self.reporter.report(Event::TableFound {
                        line: number,
                        name: name.clone(),
                    });
                }
                None => self.reporter.report(Event::TableOutsideSchema {
                    line: number,
                    name: name.clone(),
                }),
            }
            self.table = Some(name);
        }

        if !self.schema.excluded && self.engine.is_match(line) {
            let changed = self.engine.substitute(line);
            if self.reporter.verbosity() == Verbosity::Fine {
                self.reporter.report(Event::LineChanged {
                    line: number,
                    schema: self.schema.name.clone(),
                    table: self.table.clone(),
                    before: trimmed(line),
                    after: trimmed(&changed),
                });
            }
            output.write_all(&changed)?;
            self.stats.lines_changed += 1;
        } else {
            output.write_all(line)?;
            self.stats.lines_preserved += 1;
        }

        self.stats.lines_read += 1;
        Ok(())
    }

    pub fn stats(&self) -> Stats {
        self.stats
    }

    pub fn current_schema(&self) -> Option<&str> {
        self.schema.name.as_deref()
    }

    pub fn current_table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    pub fn is_excluded(&self) -> bool {
        self.schema.excluded
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }
}

fn trimmed(line: &[u8]) -> String {
    String::from_utf8_lossy(line).trim_end().to_string()
}

/// Converts a whole stream in one call.
pub fn convert<I, O, R>(input: I, output: O, options: &ConvertOptions, reporter: R) -> Result<Stats>
where
    I: BufRead,
    O: Write,
    R: Reporter,
{
    Transformer::new(options, reporter)?.run(input, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::Recorder;
    use matches::assert_matches;
    use pretty_assertions::assert_eq;

    fn run(input: &str, options: &ConvertOptions) -> (String, Stats, Vec<Event>) {
        let mut output = Vec::new();
        let mut recorder = Recorder::default();
        let stats = convert(input.as_bytes(), &mut output, options, &mut recorder).unwrap();
        (String::from_utf8(output).unwrap(), stats, recorder.events)
    }

    #[test]
    fn grouped_counts() {
        assert_eq!(grouped(0), "0");
        assert_eq!(grouped(999), "999");
        assert_eq!(grouped(1000), "1,000");
        assert_eq!(grouped(1234567), "1,234,567");
    }

    #[test]
    fn included_schema_is_converted() {
        let (output, stats, _) = run(
            "CREATE DATABASE `appdb`;\n) ENGINE=MyISAM;\n",
            &ConvertOptions::default(),
        );
        assert_eq!(output, "CREATE DATABASE `appdb`;\n) ENGINE=InnoDB;\n");
        assert_eq!(stats.lines_changed, 1);
        assert_eq!(stats.lines_preserved, 1);
        assert_eq!(stats.lines_read, 2);
    }

    #[test]
    fn system_schema_is_preserved() {
        let input = "CREATE DATABASE `mysql`;\n) ENGINE=MyISAM;\n";
        let (output, stats, _) = run(input, &ConvertOptions::default());
        assert_eq!(output, input);
        assert_eq!(stats.lines_changed, 0);
        assert_eq!(stats.lines_preserved, 2);
    }

    #[test]
    fn source_case_does_not_matter() {
        let (output, _, _) = run(
            "CREATE DATABASE `appdb`;\n) engine=myisam;\n",
            &ConvertOptions::default(),
        );
        assert_eq!(output, "CREATE DATABASE `appdb`;\n) engine=InnoDB;\n");
    }

    #[test]
    fn preamble_before_first_schema_is_untouched() {
        let input = "-- comment about MyISAM\nCREATE TABLE `t` (\n) ENGINE=MyISAM;\n";
        let (output, stats, events) = run(input, &ConvertOptions::default());
        assert_eq!(output, input);
        assert_eq!(stats.lines_changed, 0);
        assert_matches!(
            events[0],
            Event::TableOutsideSchema { line: 2, ref name } if name == "t"
        );
    }

    #[test]
    fn assumed_schema_converts_single_database_dumps() {
        let options = ConvertOptions::new().assume_schema(Some("appdb".to_string()));
        let (output, stats, events) = run("CREATE TABLE `t` (\n) ENGINE=MyISAM;\n", &options);
        assert_eq!(output, "CREATE TABLE `t` (\n) ENGINE=InnoDB;\n");
        assert_eq!(stats.lines_changed, 1);
        assert_matches!(events[0], Event::TableFound { line: 1, .. });
    }

    #[test]
    fn assumed_excluded_schema_stays_excluded() {
        let options = ConvertOptions::new().assume_schema(Some("MYSQL".to_string()));
        let input = "CREATE TABLE `user` (\n) ENGINE=MyISAM;\n";
        let (output, _, _) = run(input, &options);
        assert_eq!(output, input);
    }

    #[test]
    fn exclusion_follows_schema_boundaries() {
        let input = "\
CREATE DATABASE `mysql`;
CREATE TABLE `user` (
) ENGINE=MyISAM;
CREATE DATABASE `appdb`;
CREATE TABLE `orders` (
) ENGINE=MyISAM;
CREATE DATABASE `Archive`;
) ENGINE=MYISAM;
";
        let options = ConvertOptions::new().exclude(vec!["archive"]);
        let (output, stats, events) = run(input, &options);

        assert_eq!(
            output,
            input.replacen(") ENGINE=MyISAM;\nCREATE DATABASE `Archive`", ") ENGINE=InnoDB;\nCREATE DATABASE `Archive`", 1)
        );
        assert_eq!(stats.lines_changed, 1);
        assert_eq!(stats.lines_read, 8);

        let schemas: Vec<(String, bool)> = events
            .iter()
            .filter_map(|event| match event {
                Event::SchemaFound { name, excluded, .. } => Some((name.clone(), *excluded)),
                _ => None,
            })
            .collect();
        assert_eq!(
            schemas,
            vec![
                ("mysql".to_string(), true),
                ("appdb".to_string(), false),
                ("Archive".to_string(), true),
            ]
        );
    }

    #[test]
    fn excluded_schema_with_hyphenated_name() {
        let input = "\
CREATE DATABASE `appdb`;
) ENGINE=MyISAM;
CREATE DATABASE /*!32312 IF NOT EXISTS*/ `legacy-db` /*!40100 DEFAULT CHARACTER SET latin1 */;
CREATE TABLE `t` (
) ENGINE=MyISAM;
";
        let options = ConvertOptions::new().exclude(vec!["legacy-db"]);
        let (output, stats, events) = run(input, &options);

        assert_eq!(output, input.replacen("MyISAM", "InnoDB", 1));
        assert_eq!(stats.lines_changed, 1);
        assert_matches!(
            events[2],
            Event::SchemaFound { line: 3, ref name, excluded: true } if name == "legacy-db"
        );
    }

    #[test]
    fn changed_line_event_carries_context() {
        let (_, _, events) = run(
            "CREATE DATABASE `appdb`;\nCREATE TABLE `users` (\n) ENGINE=MyISAM;\r\n",
            &ConvertOptions::default(),
        );
        assert_eq!(
            events[2],
            Event::LineChanged {
                line: 3,
                schema: Some("appdb".to_string()),
                table: Some("users".to_string()),
                before: ") ENGINE=MyISAM;".to_string(),
                after: ") ENGINE=InnoDB;".to_string(),
            }
        );
        assert_matches!(events[3], Event::Summary(Stats { lines_read: 3, .. }));
    }

    #[test]
    fn coarse_reporter_gets_no_line_events() {
        let mut recorder = Recorder::new(Verbosity::Coarse);
        let mut output = Vec::new();
        convert(
            &b"CREATE DATABASE `appdb`;\n) ENGINE=MyISAM;\n"[..],
            &mut output,
            &ConvertOptions::default(),
            &mut recorder,
        )
        .unwrap();
        assert_eq!(recorder.changed_lines().count(), 0);
        assert_eq!(recorder.events.len(), 2);
    }

    #[test]
    fn terminators_are_kept() {
        let input = "CREATE DATABASE `appdb`;\r\n) ENGINE=MyISAM;\r\n\r\n) ENGINE=MyISAM";
        let (output, stats, _) = run(input, &ConvertOptions::default());
        assert_eq!(
            output,
            "CREATE DATABASE `appdb`;\r\n) ENGINE=InnoDB;\r\n\r\n) ENGINE=InnoDB"
        );
        assert_eq!(stats.lines_read, 4);
    }

    #[test]
    fn non_utf8_payload_passes_through() {
        let mut input = b"CREATE DATABASE `appdb`;\nINSERT INTO `t` VALUES ('".to_vec();
        input.extend_from_slice(&[0xff, 0xfe, 0x00]);
        input.extend_from_slice(b"');\n) ENGINE=MyISAM;\n");

        let mut output = Vec::new();
        let stats = convert(
            &input[..],
            &mut output,
            &ConvertOptions::default(),
            Recorder::default(),
        )
        .unwrap();

        let mut expected = input.clone();
        let at = expected.len() - b"MyISAM;\n".len();
        expected.splice(at..at + 6, b"InnoDB".iter().cloned());
        assert_eq!(output, expected);
        assert_eq!(stats.lines_changed, 1);
    }

    #[test]
    fn second_run_changes_nothing() {
        let input = "CREATE DATABASE `appdb`;\n) ENGINE=MyISAM;\n-- myisam\n";
        let (first, _, _) = run(input, &ConvertOptions::default());
        let (second, stats, _) = run(&first, &ConvertOptions::default());
        assert_eq!(first, second);
        assert_eq!(stats.lines_changed, 0);
    }

    #[test]
    fn empty_input() {
        let (output, stats, events) = run("", &ConvertOptions::default());
        assert_eq!(output, "");
        assert_eq!(stats, Stats::default());
        assert_eq!(events, vec![Event::Summary(Stats::default())]);
    }

    #[test]
    fn state_is_observable_between_lines() {
        let mut transformer = Transformer::new(&ConvertOptions::default(), Recorder::default()).unwrap();
        let mut sink = Vec::new();
        assert!(transformer.is_excluded());

        transformer.process_line(b"CREATE DATABASE `appdb`;\n", &mut sink).unwrap();
        transformer.process_line(b"CREATE TABLE `users` (\n", &mut sink).unwrap();
        assert_eq!(transformer.current_schema(), Some("appdb"));
        assert_eq!(transformer.current_table(), Some("users"));
        assert!(!transformer.is_excluded());

        let stats = transformer.stats();
        assert_eq!(stats.lines_changed + stats.lines_preserved, stats.lines_read);
        assert_eq!(transformer.into_reporter().events.len(), 2);
    }

    #[test]
    fn invalid_options_fail_before_reading() {
        let options = ConvertOptions::new().engines("", "InnoDB");
        assert!(Transformer::new(&options, Recorder::default()).is_err());
    }

    #[test]
    fn custom_engines() {
        let options = ConvertOptions::new().engines("InnoDB", "Aria");
        let (output, _, _) = run("CREATE DATABASE `appdb`;\n) ENGINE=innodb;\n", &options);
        assert_eq!(output, "CREATE DATABASE `appdb`;\n) ENGINE=Aria;\n");
    }
}
