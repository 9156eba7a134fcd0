use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{DefaultBodyLimit, Multipart, Query, State},
    http::{header, HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tower_http::cors::{Any, CorsLayer};

use pdf::ExtractOptions;

use crate::prelude::{eprintln, *};
use crate::report::Report;
use crate::OnError;

pub mod workspace;

use workspace::Workspace;

/// Multipart field carrying the uploaded document.
const UPLOAD_FIELD: &str = "pdf";

const ZIP_MIME: &str = "application/zip";

/// Number of images that could not be extracted, sent with zip responses.
const FAILURES_HEADER: &str = "x-extraction-failures";

/// Response body of `POST /convert`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON report with base64 image data.
    #[default]
    Json,
    /// `images.zip` holding every extracted file.
    Zip,
}

impl OutputFormat {
    /// An explicit `?format=` wins, then an `Accept: application/zip` header.
    fn negotiate(requested: Option<Self>, headers: &HeaderMap) -> Self {
        if let Some(format) = requested {
            return format;
        }

        let wants_zip = headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|accept| {
                accept
                    .split(',')
                    .any(|media| media.trim().starts_with(ZIP_MIME))
            });

        if wants_zip {
            OutputFormat::Zip
        } else {
            OutputFormat::Json
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ConvertParams {
    pub format: Option<OutputFormat>,
}

enum Converted {
    Report(Report),
    Archive { bytes: Vec<u8>, failures: usize },
}

impl IntoResponse for Converted {
    fn into_response(self) -> Response {
        match self {
            Converted::Report(report) => Json(report).into_response(),
            Converted::Archive { bytes, failures } => (
                [
                    (header::CONTENT_TYPE, HeaderValue::from_static(ZIP_MIME)),
                    (
                        header::CONTENT_DISPOSITION,
                        HeaderValue::from_static("attachment; filename=\"images.zip\""),
                    ),
                    (HeaderName::from_static(FAILURES_HEADER), HeaderValue::from(failures)),
                ],
                bytes,
            )
                .into_response(),
        }
    }
}

#[derive(Debug, clap::Parser)]
#[command(name = "serve")]
#[command(about = "Serve the extractor over HTTP")]
pub struct App {
    /// Port to listen on
    #[arg(short, long, env = "PDFIMAGES_PORT", default_value = "3000")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, env = "PDFIMAGES_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Root for per-request scratch directories (defaults to the system temp dir)
    #[arg(long, env = "PDFIMAGES_WORKDIR")]
    pub workdir: Option<PathBuf>,

    /// Largest accepted upload, in megabytes
    #[arg(long, default_value = "50")]
    pub max_upload_mb: usize,

    /// What to do when a single image cannot be extracted
    #[arg(long, env = "PDFIMAGES_ON_ERROR", value_enum, default_value_t = OnError::Skip)]
    pub on_error: OnError,
}

#[derive(Debug, Clone)]
pub struct ServerState {
    pub workdir: PathBuf,
    pub options: ExtractOptions,
}

pub async fn run(app: App, global: crate::Global) -> Result<()> {
    let addr = f!("{}:{}", app.host, app.port);
    let state = ServerState {
        workdir: app.workdir.unwrap_or_else(std::env::temp_dir),
        options: ExtractOptions::with_policy(app.on_error.into()),
    };

    if global.verbose {
        eprintln!("Starting pdfimages server on {addr}...");
        eprintln!("Workspaces under {}", state.workdir.display());
    }

    let app_router = router(state, app.max_upload_mb.saturating_mul(1024 * 1024));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("Failed to bind to {}: {}", addr, e))?;

    if global.verbose {
        eprintln!("Convert endpoint: http://{addr}/convert");
        eprintln!("Health endpoint: http://{addr}/health");
    }

    axum::serve(listener, app_router)
        .await
        .map_err(|e| eyre!("Server error: {e}"))?;

    Ok(())
}

pub fn router(state: ServerState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/convert", post(convert_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .with_state(Arc::new(state))
}

async fn health_handler() -> &'static str {
    "ok"
}

async fn convert_handler(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<ConvertParams>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Converted, Error> {
    let format = OutputFormat::negotiate(params.format, &headers);
    let workspace = Workspace::create(&state.workdir)?;

    let size = receive_upload(&mut multipart, &workspace.upload_path()).await?;
    log::debug!("received upload of {size} bytes into {}", workspace.path().display());

    run_blocking(move || convert_upload(&state, &workspace, format)).await
}

/// Stream the `pdf` field into `dest` and return how many bytes landed.
async fn receive_upload(multipart: &mut Multipart, dest: &Path) -> Result<u64, Error> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::InvalidUpload(e.to_string()))?
    {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| Error::InvalidUpload(e.to_string()))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        if written == 0 {
            return Err(Error::MissingUpload(f!("field `{UPLOAD_FIELD}` is empty")));
        }
        return Ok(written);
    }

    Err(Error::MissingUpload(f!(
        "expected a multipart field named `{UPLOAD_FIELD}`"
    )))
}

fn convert_upload(
    state: &ServerState,
    workspace: &Workspace,
    format: OutputFormat,
) -> Result<Converted, Error> {
    let document = std::fs::read(workspace.upload_path())?;
    let extraction = pdf::extract_images(&document, &state.options)?;
    log::info!(
        "converted upload: {} images, {} failures",
        extraction.images.len(),
        extraction.failures.len()
    );

    match format {
        OutputFormat::Json => Ok(Converted::Report(Report::from_extraction(&extraction, true))),
        OutputFormat::Zip => {
            let archive = workspace.write_archive(&extraction.images)?;
            Ok(Converted::Archive {
                bytes: std::fs::read(archive)?,
                failures: extraction.failures.len(),
            })
        }
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, Error>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, Error> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| Error::Internal(f!("Task join error: {e}")))?
}
