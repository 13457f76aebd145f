//! Finding `.vm` inputs on disk and naming the `.asm` output.

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::ast::VmFile;
use crate::error::{Error, Result};
use crate::parser;

pub const SOURCE_EXT: &str = "vm";
pub const OUTPUT_EXT: &str = "asm";

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |source| Error::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn invalid_input(path: &Path, message: &str) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source: std::io::Error::new(std::io::ErrorKind::InvalidInput, message.to_string()),
    }
}

fn is_source(path: &Path) -> bool {
    path.extension().and_then(|ext| ext.to_str()) == Some(SOURCE_EXT)
}

/// The `.vm` files to translate for `path`: the file itself, or every
/// `.vm` file directly inside a directory, sorted by name.
pub fn collect(path: &Path) -> Result<Vec<PathBuf>> {
    let meta = fs::metadata(path).map_err(io_error(path))?;
    if meta.is_file() {
        if !is_source(path) {
            return Err(invalid_input(path, "expected a .vm file"));
        }
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = vec![];
    for entry in fs::read_dir(path).map_err(io_error(path))? {
        let entry = entry.map_err(io_error(path))?;
        let candidate = entry.path();
        if is_source(&candidate) && candidate.is_file() {
            files.push(candidate);
        }
    }
    if files.is_empty() {
        return Err(invalid_input(path, "directory contains no .vm files"));
    }
    files.sort();
    debug!("{} source file(s) in {}", files.len(), path.display());
    Ok(files)
}

/// `Foo.vm` -> `Foo.asm` beside it; `dir/` -> `dir/dir.asm`.
pub fn output_path(input: &Path) -> PathBuf {
    if input.is_dir() {
        let mut name = input
            .canonicalize()
            .ok()
            .and_then(|dir| dir.file_name().map(|n| n.to_os_string()))
            .unwrap_or_else(|| "out".into());
        name.push(".");
        name.push(OUTPUT_EXT);
        input.join(name)
    } else {
        input.with_extension(OUTPUT_EXT)
    }
}

/// Read and parse one source file, named by its stem.
pub fn load(path: &Path) -> Result<VmFile> {
    let data = fs::read_to_string(path).map_err(io_error(path))?;
    let name = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| invalid_input(path, "file name is not valid UTF-8"))?;
    let file = parser::parse(name, &data)?;
    info!("parsed {} ({} line(s))", path.display(), file.commands.len());
    Ok(file)
}
