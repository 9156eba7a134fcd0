use crate::prelude::*;
use clap::Parser;

mod error;
mod extract;
mod prelude;
mod report;
mod serve;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Extract embedded images from PDF documents, as files or over HTTP"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// Whether to display additional information.
    #[clap(long, env = "PDFIMAGES_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

/// What to do when a single image cannot be extracted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OnError {
    /// Stop at the first failing image.
    Abort,
    /// Report the failing image and keep going.
    #[default]
    Skip,
}

impl From<OnError> for pdfimages_core::FailurePolicy {
    fn from(value: OnError) -> Self {
        match value {
            OnError::Abort => pdfimages_core::FailurePolicy::Abort,
            OnError::Skip => pdfimages_core::FailurePolicy::Skip,
        }
    }
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Write every image of a PDF to a directory
    Extract(crate::extract::App),

    /// Serve the extractor over HTTP
    Serve(crate::serve::App),
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    color_eyre::install()?;

    let app = App::parse();

    match app.command {
        SubCommands::Extract(sub_app) => crate::extract::run(sub_app, app.global).await,
        SubCommands::Serve(sub_app) => crate::serve::run(sub_app, app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
