// dbrestore/src/restore/archive.rs
use flate2::read::{GzDecoder, MultiGzDecoder};
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::errors::{RestoreError, Result};
use crate::restore::locator::ArchiveDescriptor;

const SQL_SUFFIX: &str = ".sql";
const SQL_GZ_SUFFIX: &str = ".sql.gz";
const COPY_CHUNK_SIZE: usize = 8 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerFormat {
    Zip,
    Tar,
    TarGz,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Multi-entry archive that is unpacked before the payload is searched for.
    Container(ContainerFormat),
    /// A single gzip-compressed `.sql` stream.
    CompressedSql,
}

impl ArchiveKind {
    /// Classifies an archive by file name. Matching is case-insensitive.
    pub fn detect(file_name: &str) -> Option<Self> {
        let name = file_name.to_ascii_lowercase();
        if name.ends_with(".zip") {
            Some(ArchiveKind::Container(ContainerFormat::Zip))
        } else if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveKind::Container(ContainerFormat::TarGz))
        } else if name.ends_with(".tar") {
            Some(ArchiveKind::Container(ContainerFormat::Tar))
        } else if name.ends_with(SQL_GZ_SUFFIX) {
            Some(ArchiveKind::CompressedSql)
        } else {
            None
        }
    }

    /// Short format name for listings.
    pub fn label(self) -> &'static str {
        match self {
            ArchiveKind::Container(ContainerFormat::Zip) => "zip",
            ArchiveKind::Container(ContainerFormat::Tar) => "tar",
            ArchiveKind::Container(ContainerFormat::TarGz) => "tar.gz",
            ArchiveKind::CompressedSql => "sql.gz",
        }
    }
}

/// The single plain-text SQL file chosen for replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlPayload {
    pub path: PathBuf,
}

/// Produces a `.sql` file inside `workspace` from the located archive.
///
/// Callers check the result with [`validate_payload`] before handing it to the client.
pub fn extract_payload(archive: &ArchiveDescriptor, workspace: &Path) -> Result<SqlPayload> {
    let path = match archive.kind {
        ArchiveKind::Container(format) => extract_container(archive, format, workspace)?,
        ArchiveKind::CompressedSql => {
            let stripped = strip_gz_suffix(&archive.basename)
                .filter(|_| has_suffix(&archive.basename, SQL_GZ_SUFFIX))
                .ok_or_else(|| RestoreError::UnsupportedFormat {
                    path: archive.absolute_path.clone(),
                })?;
            let target = workspace.join(stripped);
            decompress_gzip(&archive.absolute_path, &target)?;
            target
        }
    };

    Ok(SqlPayload { path })
}

fn extract_container(
    archive: &ArchiveDescriptor,
    format: ContainerFormat,
    workspace: &Path,
) -> Result<PathBuf> {
    match format {
        ContainerFormat::Zip => extract_zip(&archive.absolute_path, workspace)?,
        ContainerFormat::Tar => extract_tar(&archive.absolute_path, workspace, false)?,
        ContainerFormat::TarGz => extract_tar(&archive.absolute_path, workspace, true)?,
    }

    if let Some(sql) = find_first_with_suffix(workspace, SQL_SUFFIX) {
        tracing::debug!(payload = %sql.display(), "found SQL file in archive");
        return Ok(sql);
    }

    if let Some(compressed) = find_first_with_suffix(workspace, SQL_GZ_SUFFIX) {
        let file_name = compressed
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if let Some(stripped) = strip_gz_suffix(&file_name) {
            let target = compressed.with_file_name(stripped);
            tracing::debug!(
                source = %compressed.display(),
                target = %target.display(),
                "decompressing nested SQL dump"
            );
            decompress_gzip(&compressed, &target)?;
            return Ok(target);
        }
    }

    Err(RestoreError::SqlPayloadMissing {
        path: archive.absolute_path.clone(),
    })
}

/// Unpacks every zip entry into `dest`. Entries that would escape `dest` are skipped.
fn extract_zip(archive_path: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive_path)
        .map_err(|e| RestoreError::extraction_io(archive_path, e))?;
    let corrupt = |e: zip::result::ZipError| RestoreError::ArchiveCorrupt {
        path: archive_path.to_path_buf(),
        detail: e.to_string(),
    };
    let mut zip = zip::ZipArchive::new(file).map_err(corrupt)?;

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i).map_err(corrupt)?;
        let Some(relative) = entry.enclosed_name().map(Path::to_path_buf) else {
            tracing::warn!(entry = entry.name(), "skipping archive entry with unsafe path");
            continue;
        };
        let output_path = dest.join(relative);

        if entry.is_dir() {
            std::fs::create_dir_all(&output_path)
                .map_err(|e| RestoreError::extraction_io(&output_path, e))?;
            continue;
        }
        if let Some(parent) = output_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RestoreError::extraction_io(parent, e))?;
        }
        let mut outfile = File::create(&output_path)
            .map_err(|e| RestoreError::extraction_io(&output_path, e))?;
        std::io::copy(&mut entry, &mut outfile)
            .map_err(|e| RestoreError::extraction_io(&output_path, e))?;
    }

    Ok(())
}

fn extract_tar(archive_path: &Path, dest: &Path, gzipped: bool) -> Result<()> {
    let file = File::open(archive_path)
        .map_err(|e| RestoreError::extraction_io(archive_path, e))?;
    let reader: Box<dyn Read> = if gzipped {
        Box::new(GzDecoder::new(file))
    } else {
        Box::new(file)
    };

    // `unpack` refuses entries that would land outside `dest`.
    tar::Archive::new(reader)
        .unpack(dest)
        .map_err(|e| RestoreError::ArchiveCorrupt {
            path: archive_path.to_path_buf(),
            detail: e.to_string(),
        })
}

/// Depth-first walk in file-name order; the first regular file with `suffix` wins.
fn find_first_with_suffix(root: &Path, suffix: &str) -> Option<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .find(|entry| has_suffix(&entry.file_name().to_string_lossy(), suffix))
        .map(|entry| entry.into_path())
}

/// Streams a gzip file into `target` in fixed-size chunks.
fn decompress_gzip(source: &Path, target: &Path) -> Result<u64> {
    let input = File::open(source).map_err(|e| RestoreError::extraction_io(source, e))?;
    let mut decoder = MultiGzDecoder::new(input);
    let mut output = File::create(target).map_err(|e| RestoreError::extraction_io(target, e))?;

    let mut buffer = vec![0u8; COPY_CHUNK_SIZE];
    let mut written = 0u64;
    loop {
        let read = decoder
            .read(&mut buffer)
            .map_err(|e| RestoreError::extraction_io(source, e))?;
        if read == 0 {
            break;
        }
        output
            .write_all(&buffer[..read])
            .map_err(|e| RestoreError::extraction_io(target, e))?;
        written += read as u64;
    }
    output.flush().map_err(|e| RestoreError::extraction_io(target, e))?;

    tracing::debug!(source = %source.display(), bytes = written, "decompressed gzip stream");
    Ok(written)
}

/// Checks that the payload is a regular, openable file and returns its size in bytes.
pub fn validate_payload(payload: &SqlPayload) -> Result<u64> {
    let unreadable = || RestoreError::SqlPayloadUnreadable {
        path: payload.path.clone(),
    };
    let metadata = std::fs::metadata(&payload.path).map_err(|_| unreadable())?;
    if !metadata.is_file() {
        return Err(unreadable());
    }
    File::open(&payload.path).map_err(|_| unreadable())?;
    Ok(metadata.len())
}

fn has_suffix(name: &str, suffix: &str) -> bool {
    name.to_ascii_lowercase().ends_with(suffix)
}

fn strip_gz_suffix(name: &str) -> Option<&str> {
    if has_suffix(name, ".gz") && name.len() > 3 {
        Some(&name[..name.len() - 3])
    } else {
        None
    }
}
