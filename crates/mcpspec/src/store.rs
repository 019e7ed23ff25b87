use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::document::SpecDocument;
use crate::error::McpSpecError;

/// Reads the document at `path`. A missing file yields `Ok(None)`.
pub fn load(path: &Path) -> Result<Option<SpecDocument>, McpSpecError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(McpSpecError::Io(err).context(format!("reading {}", path.display())));
        }
    };

    SpecDocument::parse(&content)
        .map(Some)
        .map_err(|err| err.context(path.display()))
}

/// Writes `document` to `path` in full, replacing any existing file atomically.
pub fn save(path: &Path, document: &SpecDocument) -> Result<(), McpSpecError> {
    let yaml = document.to_yaml()?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let writing = || format!("writing {}", path.display());
    fs::create_dir_all(dir).map_err(|err| {
        McpSpecError::Io(err).context(format!("creating {}", dir.display()))
    })?;

    let mut staged =
        NamedTempFile::new_in(dir).map_err(|err| McpSpecError::Io(err).context(writing()))?;
    staged
        .write_all(yaml.as_bytes())
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|err| McpSpecError::Io(err).context(writing()))?;
    staged
        .persist(path)
        .map_err(|err| McpSpecError::Io(err.error).context(writing()))?;
    Ok(())
}
