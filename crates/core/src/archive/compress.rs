//! Directory compression.

use std::fs::File;
use std::io;
use std::path::Path;

use walkdir::WalkDir;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use super::error::ArchiveError;

/// Compress the tree under `source` into a zip at `target`, keeping relative paths.
///
/// Directories get their own `name/` entries. Returns the number of files stored.
///
/// # Errors
///
/// Returns an error if the tree cannot be read or the archive cannot be written.
pub fn zip_dir(source: &Path, target: &Path) -> Result<usize, ArchiveError> {
    if !source.is_dir() {
        return Err(ArchiveError::Walk(format!(
            "{} is not a directory",
            source.display()
        )));
    }
    let file = File::create(target).map_err(|e| ArchiveError::io(target, &e))?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default();
    let mut files = 0;

    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        let name = path
            .strip_prefix(source)
            .map_err(|e| ArchiveError::Walk(e.to_string()))?
            .to_string_lossy()
            .replace('\\', "/");

        if entry.file_type().is_dir() {
            writer.add_directory(name, options)?;
        } else {
            writer.start_file(name, options)?;
            let mut input = File::open(path).map_err(|e| ArchiveError::io(path, &e))?;
            io::copy(&mut input, &mut writer).map_err(|e| ArchiveError::io(path, &e))?;
            files += 1;
        }
    }

    writer.finish()?;
    Ok(files)
}
