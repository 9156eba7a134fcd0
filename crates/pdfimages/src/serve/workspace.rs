use std::io::Write;
use std::path::{Path, PathBuf};

use pdfimages_core::ExtractedImage;
use zip::write::SimpleFileOptions;

const UPLOAD_FILE: &str = "upload.pdf";

/// Name of the archive handed back to clients.
pub const ARCHIVE_FILE: &str = "images.zip";

/// Request-scoped scratch directory holding the uploaded document and the
/// archive built from it. Removed with everything in it when dropped, so
/// concurrent requests never see each other's files.
#[derive(Debug)]
pub struct Workspace {
    dir: tempfile::TempDir,
}

impl Workspace {
    /// Create a fresh directory under `root`, creating `root` if needed.
    pub fn create(root: &Path) -> std::io::Result<Self> {
        std::fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new()
            .prefix("pdfimages-")
            .tempdir_in(root)?;
        Ok(Workspace { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Where the uploaded document is spooled.
    pub fn upload_path(&self) -> PathBuf {
        self.dir.path().join(UPLOAD_FILE)
    }

    /// Zip `images` into the workspace, one entry per image named by its
    /// file name, and return the archive path.
    pub fn write_archive(&self, images: &[ExtractedImage]) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(ARCHIVE_FILE);
        let mut archive = zip::ZipWriter::new(std::fs::File::create(&path)?);
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

        for image in images {
            archive
                .start_file(image.file_name.as_str(), options)
                .map_err(std::io::Error::other)?;
            archive.write_all(&image.bytes)?;
        }
        archive.finish().map_err(std::io::Error::other)?;

        log::debug!("archived {} images into {}", images.len(), path.display());
        Ok(path)
    }
}
