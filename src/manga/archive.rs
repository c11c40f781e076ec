use super::chapter::archive_file_name;
use crate::error::{FetchError, Result};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

/// Packs every file under `pages_dir` into `<output_dir>/<title>-<chapter:03>.cbz`,
/// then removes the pages and `pages_dir` itself.
///
/// Entries are named by their path relative to `pages_dir` and stored in
/// path order, so `page_000.jpg` comes first. The archive is written next to its final
/// location and renamed into place, a failed run never leaves a truncated
/// `.cbz` behind.
pub fn build_archive(
    output_dir: &Path,
    pages_dir: &Path,
    title: &str,
    chapter: u32,
) -> Result<PathBuf> {
    let mut pages = Vec::new();
    collect_files(pages_dir, &mut pages)?;
    pages.sort();

    fs::create_dir_all(output_dir).map_err(FetchError::fs(output_dir))?;
    let archive = output_dir.join(archive_file_name(title, chapter));
    let partial = archive.with_extension("cbz.part");

    if let Err(err) = write_zip(&partial, pages_dir, &pages) {
        let _ = fs::remove_file(&partial);
        return Err(err);
    }
    fs::rename(&partial, &archive).map_err(FetchError::fs(&archive))?;
    info!(archive = ?archive, pages = pages.len(), "Created archive");

    for page in &pages {
        fs::remove_file(page).map_err(FetchError::fs(page))?;
    }
    fs::remove_dir_all(pages_dir).map_err(FetchError::fs(pages_dir))?;
    debug!(dir = ?pages_dir, "Removed pages directory");

    Ok(archive)
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    for entry in fs::read_dir(dir).map_err(FetchError::fs(dir))? {
        let path = entry.map_err(FetchError::fs(dir))?.path();
        // Something else is touching the directory if an entry we were just
        // handed cannot be stat'ed.
        let metadata = fs::metadata(&path).map_err(FetchError::fs(&path))?;
        if metadata.is_dir() {
            collect_files(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

fn entry_name(pages_dir: &Path, page: &Path) -> Result<String> {
    let relative = page
        .strip_prefix(pages_dir)
        .map_err(|_| FetchError::State {
            path: page.to_path_buf(),
        })?;
    let parts: Vec<String> = relative
        .components()
        .map(|part| part.as_os_str().to_string_lossy().into_owned())
        .collect();
    Ok(parts.join("/"))
}

fn write_zip(path: &Path, pages_dir: &Path, pages: &[PathBuf]) -> Result<()> {
    let zip_err = |source: zip::result::ZipError| FetchError::Archive {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(FetchError::fs(path))?;
    let mut writer = ZipWriter::new(file);
    // Page images are already compressed.
    let options = FileOptions::default().compression_method(CompressionMethod::Stored);

    for page in pages {
        let name = entry_name(pages_dir, page)?;
        writer.start_file(name, options).map_err(zip_err)?;
        let mut source = File::open(page).map_err(FetchError::fs(page))?;
        io::copy(&mut source, &mut writer).map_err(FetchError::fs(path))?;
    }
    writer.finish().map_err(zip_err)?;
    Ok(())
}
