use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::dataset::Record;
use crate::error::{ConsoleError, Result};

/// Completion marker written after every fragment is flushed.
pub const SUCCESS_MARKER: &str = "_SUCCESS";

/// Replace `dest` with a directory of JSON-lines fragments plus `_SUCCESS`.
///
/// Fragments are built in a sibling staging directory and moved into place
/// only after the marker exists, so a failed run leaves the previous output
/// untouched. Rows are split into at most `partitions` contiguous fragments;
/// reading fragments in name order yields the rows in their original order.
/// Returns the number of fragments written (zero for an empty subset).
pub fn write_partitioned(dest: &Path, rows: &[&Record], partitions: usize) -> Result<usize> {
    let staging = staging_dir(dest);
    if staging.exists() {
        fs::remove_dir_all(&staging).map_err(|e| ConsoleError::export_io(&staging, e))?;
    }

    let written = match stage_fragments(&staging, rows, partitions) {
        Ok(n) => n,
        Err(e) => {
            if let Err(cleanup) = fs::remove_dir_all(&staging) {
                warn!(path = %staging.display(), "failed to remove staging dir: {}", cleanup);
            }
            return Err(e);
        }
    };

    if dest.exists() {
        fs::remove_dir_all(dest).map_err(|e| ConsoleError::export_io(dest, e))?;
    }
    fs::rename(&staging, dest).map_err(|e| ConsoleError::export_io(dest, e))?;

    debug!(dest = %dest.display(), rows = rows.len(), fragments = written, "partitioned output committed");
    Ok(written)
}

fn stage_fragments(staging: &Path, rows: &[&Record], partitions: usize) -> Result<usize> {
    fs::create_dir_all(staging).map_err(|e| ConsoleError::export_io(staging, e))?;

    let lines = rows
        .iter()
        .map(|r| serde_json::to_string(r))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| ConsoleError::FilterCompute(format!("row not serializable: {}", e)))?;

    // Content digest keeps fragment names stable for identical subsets.
    let mut hasher = blake3::Hasher::new();
    for line in &lines {
        hasher.update(line.as_bytes());
        hasher.update(b"\n");
    }
    let digest = hasher.finalize().to_hex();
    let digest = &digest.as_str()[..12];

    let count = partitions.max(1).min(lines.len());
    let mut written = 0;
    if count > 0 {
        let chunk_len = lines.len().div_ceil(count);
        for (idx, chunk) in lines.chunks(chunk_len).enumerate() {
            let path = staging.join(format!("part-{:05}-{}.json", idx, digest));
            write_lines(&path, chunk)?;
            written += 1;
        }
    }

    let marker = staging.join(SUCCESS_MARKER);
    File::create(&marker).map_err(|e| ConsoleError::export_io(&marker, e))?;
    Ok(written)
}

fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let file = File::create(path).map_err(|e| ConsoleError::export_io(path, e))?;
    let mut out = BufWriter::new(file);
    for line in lines {
        out.write_all(line.as_bytes())
            .and_then(|_| out.write_all(b"\n"))
            .map_err(|e| ConsoleError::export_io(path, e))?;
    }
    out.flush().map_err(|e| ConsoleError::export_io(path, e))
}

fn staging_dir(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    dest.with_file_name(format!(".{}.staging", name))
}

/// Overwrite `path` with the rows as one indented JSON array.
pub fn write_document(path: &Path, rows: &[&Record]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| ConsoleError::export_io(parent, e))?;
    }
    let file = File::create(path).map_err(|e| ConsoleError::export_io(path, e))?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, rows)
        .map_err(|e| ConsoleError::export_io(path, e.into()))?;
    out.write_all(b"\n")
        .and_then(|_| out.flush())
        .map_err(|e| ConsoleError::export_io(path, e))?;
    debug!(path = %path.display(), rows = rows.len(), "consolidated document written");
    Ok(())
}

/// Read back a committed partitioned directory, fragments in name order.
/// Fails if the completion marker is missing.
pub fn read_partitioned(dir: &Path) -> Result<Vec<Record>> {
    if !dir.join(SUCCESS_MARKER).exists() {
        return Err(ConsoleError::FilterCompute(format!(
            "{} has no {} marker",
            dir.display(),
            SUCCESS_MARKER
        )));
    }

    let mut fragments: Vec<PathBuf> = fs::read_dir(dir)
        .map_err(|e| ConsoleError::export_io(dir, e))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("part-") && n.ends_with(".json"))
        })
        .collect();
    fragments.sort();

    let mut records = Vec::new();
    for path in fragments {
        let file = File::open(&path).map_err(|e| ConsoleError::export_io(&path, e))?;
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| ConsoleError::export_io(&path, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let record: Record = serde_json::from_str(&line)
                .map_err(|e| ConsoleError::Parse(format!("{}: {}", path.display(), e)))?;
            records.push(record);
        }
    }
    Ok(records)
}
