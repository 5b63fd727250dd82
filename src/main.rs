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

use anyhow::Context;
use clap::Parser;
use log::{debug, error, LevelFilter};
use std::io::Write;
use std::path::PathBuf;

use mysqldump_engine_rewriter::{
    convert_file, ConvertOptions, LogReporter, Verbosity, DEFAULT_SOURCE_ENGINE,
    DEFAULT_TARGET_ENGINE,
};

/// Convert the tables of a mysqldump file from one storage engine to another,
/// leaving the mysql system schema (and any excluded schema) alone.
#[derive(Parser)]
#[command(name = "mysqldump-engine-rewriter", version)]
struct Cli {
    /// Input mysqldump file
    input: PathBuf,

    /// Output mysqldump file
    output: PathBuf,

    /// Log every changed line
    #[arg(short, long)]
    verbose: bool,

    /// Overwrite an existing output file
    #[arg(short, long)]
    force: bool,

    /// Engine to replace
    #[arg(long, default_value = DEFAULT_SOURCE_ENGINE)]
    from: String,

    /// Engine written instead
    #[arg(long, default_value = DEFAULT_TARGET_ENGINE)]
    to: String,

    /// Databases whose tables are kept as they are (mysql always is)
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<String>,

    /// Database the dump starts in, for dumps without CREATE DATABASE lines
    #[arg(long)]
    assume_schema: Option<String>,
}

fn main() {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format(|buf, record| {
            writeln!(
                buf,
                "{}:{:<7}: {}",
                buf.timestamp(),
                record.level(),
                record.args()
            )
        })
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let options = ConvertOptions::new()
        .engines(&cli.from, &cli.to)
        .exclude(cli.exclude.iter().cloned())
        .assume_schema(cli.assume_schema.clone());

    let verbosity = if cli.verbose {
        Verbosity::Fine
    } else {
        Verbosity::Coarse
    };

    let stats = convert_file(
        &cli.input,
        &cli.output,
        cli.force,
        &options,
        LogReporter::new(verbosity),
    )
    .with_context(|| format!("converting {}", cli.input.display()))?;

    debug!("Wrote {} ({} lines)", cli.output.display(), stats.lines_read);
    Ok(())
}
