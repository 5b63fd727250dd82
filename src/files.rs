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

//! File to file conversion
//!
//! The converted dump is written to a temporary file next to the destination
//! and only renamed over it once the whole input went through.

use log::debug;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::Path;
use tempfile::NamedTempFile;

use super::error::{Error, Result};
use super::options::ConvertOptions;
use super::report::Reporter;
use super::transformer::{Stats, Transformer};

const BUFFER_SIZE: usize = 256 * 1024;

pub fn convert_file<R: Reporter>(
    input: &Path,
    output: &Path,
    force: bool,
    options: &ConvertOptions,
    reporter: R,
) -> Result<Stats> {
    debug!(
        "Converting {} to {}. Forcible = {}",
        input.display(),
        output.display(),
        if force { "Yes" } else { "No" }
    );

    // A forced overwrite keeps the mode of the file it replaces.
    let replaced = match fs::metadata(output) {
        Ok(_) if !force => return Err(Error::OutputExists(output.to_path_buf())),
        Ok(metadata) => Some(metadata.permissions()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => return Err(Error::file(output, e)),
    };

    // Bad engine settings should not leave an empty temporary file behind.
    let mut transformer = Transformer::new(options, reporter)?;

    let reader = File::open(input).map_err(|e| Error::file(input, e))?;
    debug!("Opened {} for reading", input.display());

    let directory = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = staging_file(directory).map_err(|e| Error::file(directory, e))?;
    if let Some(permissions) = replaced {
        staged
            .as_file()
            .set_permissions(permissions)
            .map_err(|e| Error::file(staged.path(), e))?;
    }
    debug!("Opened {} for writing", staged.path().display());

    let stats = transformer.run(
        BufReader::with_capacity(BUFFER_SIZE, reader),
        BufWriter::with_capacity(BUFFER_SIZE, staged.as_file_mut()),
    )?;

    staged.persist(output).map_err(|e| Error::Persist {
        path: output.to_path_buf(),
        source: e.error,
    })?;
    debug!("Moved converted dump to {}", output.display());

    Ok(stats)
}

/// Created with the mode a plain `File::create` would give: 0666 minus the
/// umask, instead of the owner-only default of temporary files.
#[cfg(unix)]
fn staging_file(directory: &Path) -> io::Result<NamedTempFile> {
    use std::os::unix::fs::PermissionsExt;

    tempfile::Builder::new()
        .permissions(fs::Permissions::from_mode(0o666))
        .tempfile_in(directory)
}

#[cfg(not(unix))]
fn staging_file(directory: &Path) -> io::Result<NamedTempFile> {
    NamedTempFile::new_in(directory)
}
