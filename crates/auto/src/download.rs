//! Report downloader.
//!
//! Maps download links to local paths and writes each one through the
//! [`ResourceClient`]. The output path is either a directory, in which case
//! every file keeps the last segment of its link, or an explicit file name
//! (recognized by an `.html`, `.csv` or `.json` extension), in which case the
//! first link gets that name and later links get `<stem>_<i>.<ext>`.
//! A directory name already written in the same batch is indexed the same way.

use std::path::{Path, PathBuf};

use acuctl_core::metrics as m;
use tracing::{info, warn};

use crate::client::ResourceClient;
use crate::error::WorkflowError;

/// Extensions that mark an output path as an explicit file name.
const FILE_EXTENSIONS: [&str; 3] = ["html", "csv", "json"];

/// Where downloaded files go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
    /// Keep each link's own file name inside this directory.
    Directory(PathBuf),
    /// Use this file name for the first link; index the rest.
    File {
        /// Directory holding the file (may be empty for the working directory)
        dir: PathBuf,
        /// Explicit file name
        file_name: String,
    },
}

impl OutputTarget {
    /// Classifies an output path by its extension (case-insensitive).
    pub fn classify(path: &Path) -> Self {
        let is_file = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| FILE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()));

        if is_file {
            if let Some(file_name) = path.file_name().and_then(|n| n.to_str()) {
                return Self::File {
                    dir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
                    file_name: file_name.to_owned(),
                };
            }
        }
        Self::Directory(path.to_path_buf())
    }

    /// Destination path for the `index`-th link.
    pub fn destination(&self, index: usize, link: &str) -> PathBuf {
        match self {
            Self::Directory(dir) => dir.join(link_file_name(link, index)),
            Self::File { dir, file_name } if index == 0 => dir.join(file_name),
            Self::File { dir, file_name } => dir.join(indexed_name(file_name, index)),
        }
    }

    fn dir(&self) -> &Path {
        match self {
            Self::Directory(dir) => dir,
            Self::File { dir, .. } => dir,
        }
    }
}

/// Last path segment of a link, without query or fragment.
fn link_file_name(link: &str, index: usize) -> String {
    let path = link.split(['?', '#']).next().unwrap_or(link);
    match path.trim_end_matches('/').rsplit('/').next() {
        Some(name) if !name.is_empty() && name != "." && name != ".." => name.to_owned(),
        _ => format!("download_{index}"),
    }
}

/// `report.html` + 2 -> `report_2.html`
fn indexed_name(file_name: &str, index: usize) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext)) => format!("{stem}_{index}.{ext}"),
        None => format!("{file_name}_{index}"),
    }
}

/// `dest`, or an indexed sibling of it when `dest` is already taken.
fn unique_destination(dest: PathBuf, index: usize, taken: &[PathBuf]) -> PathBuf {
    if !taken.contains(&dest) {
        return dest;
    }
    let Some(name) = dest.file_name().and_then(|n| n.to_str()).map(str::to_owned) else {
        return dest;
    };
    (index..)
        .map(|i| dest.with_file_name(indexed_name(&name, i)))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or(dest)
}

/// Downloads every link into `output` and returns the written paths in order.
///
/// Parent directories are created as needed. The first failure stops the
/// batch; files written before it stay on disk.
///
/// # Errors
///
/// `WorkflowError::Io` when a directory or file cannot be created, or any
/// error from [`ResourceClient::download`].
pub async fn download_all<C: ResourceClient>(
    client: &C,
    links: &[String],
    output: &Path,
) -> Result<Vec<PathBuf>, WorkflowError> {
    let target = OutputTarget::classify(output);
    let mut written = Vec::with_capacity(links.len());

    if !links.is_empty() && !target.dir().as_os_str().is_empty() {
        tokio::fs::create_dir_all(target.dir())
            .await
            .map_err(|e| WorkflowError::io(target.dir(), e))?;
    }

    for (index, link) in links.iter().enumerate() {
        let wanted = target.destination(index, link);
        let dest = unique_destination(wanted.clone(), index, &written);
        if dest != wanted {
            warn!(
                link = %link,
                wanted = %wanted.display(),
                path = %dest.display(),
                "file name already used in this batch"
            );
        }
        let bytes = client.download(link, &dest).await?;
        metrics::counter!(m::AUTO_DOWNLOADED_BYTES_TOTAL).increment(bytes);
        info!(link = %link, path = %dest.display(), bytes, "downloaded file");
        written.push(dest);
    }

    Ok(written)
}
