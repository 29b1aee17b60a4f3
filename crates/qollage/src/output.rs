//! Delivery of rendered artifacts: atomic file output and inline display.

use std::{
    fmt,
    io::Write,
    path::{Path, PathBuf},
};

use log::{debug, info};
use tempfile::NamedTempFile;

use crate::{
    QollageError,
    config::{Dialect, ImageFormat},
    layout::Diagram,
};

/// Image bytes produced by a rasterizer.
#[derive(Clone, PartialEq, Eq)]
pub struct RenderedImage {
    format: ImageFormat,
    data: Vec<u8>,
}

impl RenderedImage {
    pub fn new(format: ImageFormat, data: Vec<u8>) -> Self {
        Self { format, data }
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

impl fmt::Debug for RenderedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderedImage")
            .field("format", &self.format)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// The result of drawing one circuit.
#[derive(Debug, Clone)]
pub struct Rendering {
    markup: String,
    dialect: Dialect,
    image: Option<RenderedImage>,
    diagram: Diagram,
    written_to: Option<std::path::PathBuf>,
}

impl Rendering {
    pub(crate) fn new(markup: String, dialect: Dialect, diagram: Diagram) -> Self {
        Self {
            markup,
            dialect,
            image: None,
            diagram,
            written_to: None,
        }
    }

    pub(crate) fn set_image(&mut self, image: RenderedImage) {
        self.image = Some(image);
    }

    pub(crate) fn set_written_to(&mut self, path: &Path) {
        self.written_to = Some(path.to_path_buf());
    }

    /// The intermediate markup in [`Rendering::dialect`].
    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// The rasterized image, present when rendering as an image was requested.
    pub fn image(&self) -> Option<&RenderedImage> {
        self.image.as_ref()
    }

    /// The positioned diagram the markup was emitted from.
    pub fn diagram(&self) -> &Diagram {
        &self.diagram
    }

    /// The file the artifact was written to, if any.
    pub fn written_to(&self) -> Option<&Path> {
        self.written_to.as_deref()
    }

    /// File extension of [`Rendering::artifact`].
    pub fn extension(&self) -> &'static str {
        match &self.image {
            Some(image) => image.format().extension(),
            None => self.dialect.extension(),
        }
    }

    /// Bytes of the final artifact: the image when present, the markup otherwise.
    pub fn artifact(&self) -> &[u8] {
        match &self.image {
            Some(image) => image.data(),
            None => self.markup.as_bytes(),
        }
    }
}

/// A host-provided side channel able to show a rendering in place,
/// e.g. a notebook front end.
pub trait InlineViewer: Send + Sync {
    fn display(&self, rendering: &Rendering) -> Result<(), QollageError>;
}

/// File name used when the output path names a directory.
pub const DEFAULT_FILE_STEM: &str = "circuit";

/// Resolves a user supplied output path to the file actually written.
///
/// An existing directory receives `circuit.<extension>`; a path without an
/// extension gets `extension` appended. Anything else is used as given.
pub fn resolve_output_path(path: &Path, extension: &str) -> PathBuf {
    if path.is_dir() {
        path.join(format!("{DEFAULT_FILE_STEM}.{extension}"))
    } else if path.extension().is_none() {
        path.with_extension(extension)
    } else {
        path.to_path_buf()
    }
}

/// Writes `bytes` to `path` so that readers never observe a partial file.
///
/// The data goes to a temporary file in the target directory, which is
/// flushed and synced before being renamed over `path`. On failure the
/// temporary file is removed and `path` is left untouched.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), QollageError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let io_failure = |err: std::io::Error| QollageError::io_failure(path, err);

    let mut file = NamedTempFile::new_in(parent).map_err(io_failure)?;
    debug!(temp_path:? = file.path(), path:?; "Writing output");
    file.write_all(bytes).map_err(io_failure)?;
    file.flush().map_err(io_failure)?;
    file.as_file().sync_all().map_err(io_failure)?;
    file.persist(path).map_err(|err| io_failure(err.error))?;

    info!(path:?, bytes = bytes.len(); "Output written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_write_atomically_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("circuit.typ");

        write_atomically(&path, b"#set page()").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"#set page()");
    }

    #[test]
    fn test_write_atomically_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("circuit.svg");
        fs::write(&path, "old").unwrap();

        write_atomically(&path, b"new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("circuit.png");

        let err = write_atomically(&path, b"data").unwrap_err();
        match err {
            QollageError::IoFailure { path: failed, .. } => assert_eq!(failed, path),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!path.exists());
    }

    #[test]
    fn test_resolve_output_path() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            resolve_output_path(dir.path(), "png"),
            dir.path().join("circuit.png")
        );
        assert_eq!(
            resolve_output_path(&dir.path().join("bell"), "typ"),
            dir.path().join("bell.typ")
        );
        assert_eq!(
            resolve_output_path(&dir.path().join("bell.pdf"), "png"),
            dir.path().join("bell.pdf")
        );
    }

    #[test]
    fn test_rendered_image_debug_hides_bytes() {
        let image = RenderedImage::new(ImageFormat::Png, vec![0; 1024]);
        let debug = format!("{image:?}");
        assert!(debug.contains("1024"));
        assert!(debug.contains("Png"));
    }
}
