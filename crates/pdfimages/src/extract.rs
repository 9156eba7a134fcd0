use std::path::{Path, PathBuf};

use pdf::ExtractOptions;
use pdfimages_core::{ExtractedImage, Extraction};

use crate::prelude::{eprintln, println, *};
use crate::report::Report;
use crate::OnError;

#[derive(Debug, clap::Parser)]
#[command(name = "extract")]
#[command(about = "Write every image of a PDF to a directory")]
pub struct App {
    /// Path to the PDF file
    pub path: PathBuf,

    /// Directory the images are written to
    #[arg(short, long, env = "PDFIMAGES_OUTPUT", default_value = ".")]
    pub output: PathBuf,

    /// What to do when a single image cannot be extracted
    #[arg(long, env = "PDFIMAGES_ON_ERROR", value_enum, default_value_t = OnError::Skip)]
    pub on_error: OnError,

    /// Print the result as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let bytes = std::fs::read(&app.path)
        .wrap_err_with(|| f!("Failed to read {}", app.path.display()))?;

    if global.verbose {
        eprintln!(
            "Extracting images from {} ({} bytes)...",
            app.path.display(),
            bytes.len()
        );
    }

    let options = ExtractOptions::with_policy(app.on_error.into());
    let extraction = pdf::extract_images(&bytes, &options).map_err(|e| eyre!(e))?;
    let written = write_images(&app.output, &extraction.images)?;

    if global.verbose {
        eprintln!("Wrote {} files to {}", written.len(), app.output.display());
    }

    if app.json {
        let report = Report::from_extraction(&extraction, false);
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_summary(&extraction);
    }

    Ok(())
}

/// Write each image under `dir`, creating the directory if needed.
fn write_images(dir: &Path, images: &[ExtractedImage]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).wrap_err_with(|| f!("Failed to create {}", dir.display()))?;

    images
        .iter()
        .map(|image| {
            let path = dir.join(&image.file_name);
            std::fs::write(&path, &image.bytes)
                .wrap_err_with(|| f!("Failed to write {}", path.display()))?;
            Ok(path)
        })
        .collect()
}

fn print_summary(extraction: &Extraction) {
    if extraction.images.is_empty() {
        println!("No images found.");
    } else {
        let mut table = new_table();
        table.add_row(prettytable::row!["File", "Kind", "Size", "Source", "Name"]);
        for image in &extraction.images {
            table.add_row(prettytable::row![
                &image.file_name,
                image.kind,
                human_size(image.bytes.len()),
                image.source,
                &image.name
            ]);
        }
        table.printstd();
    }

    if !extraction.failures.is_empty() {
        eprintln!("\n{} image(s) could not be extracted:", extraction.failures.len());
        for failure in &extraction.failures {
            eprintln!("  {}", failure.error);
        }
    }
}
