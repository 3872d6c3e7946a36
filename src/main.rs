//! Command-line driver for the mechcount viewer.
//!
//! Loads a drawing, runs the mock detection service on the worker thread,
//! renders the annotated viewport to PNG, prints the per-category summary
//! and exports the result.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use mechcount::config::{ConfigError, ViewerConfig};
use mechcount::export::FileSink;
use mechcount::render::ViewportSize;
use mechcount::session::{Session, SessionError};
use mechcount::source::UploadedFile;
use mechcount::zoom_math::ZoomDirection;

const USAGE: &str = "Usage: mechcount <image> [--out <dir>] [--format <json|coco|voc>] \
                     [--viewport <W>x<H>] [--zoom <steps>] [--config <file>]";

/// Extra time allowed on top of the service delay before giving up.
const DETECTION_GRACE: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("{0}\n{usage}", usage = USAGE)]
    Usage(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to read {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path:?}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to encode frame: {0}")]
    Encode(#[from] image::ImageError),

    #[error("{}", .0.user_message())]
    Session(#[from] SessionError),
}

#[derive(Debug, Clone, PartialEq)]
struct CliArgs {
    input: PathBuf,
    out_dir: PathBuf,
    format: String,
    viewport: Option<ViewportSize>,
    zoom_steps: i32,
    config: Option<PathBuf>,
}

impl CliArgs {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Self, CliError> {
        let mut input = None;
        let mut out_dir = PathBuf::from(".");
        let mut format = mechcount::export::NATIVE_FORMAT.to_string();
        let mut viewport = None;
        let mut zoom_steps = 0;
        let mut config = None;

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| CliError::Usage(format!("{} needs a value", flag)))
            };
            match arg.as_str() {
                "--out" => out_dir = PathBuf::from(value("--out")?),
                "--format" => format = value("--format")?,
                "--viewport" => viewport = Some(parse_viewport(&value("--viewport")?)?),
                "--zoom" => {
                    let raw = value("--zoom")?;
                    zoom_steps = raw
                        .parse()
                        .map_err(|_| CliError::Usage(format!("invalid zoom steps '{}'", raw)))?;
                }
                "--config" => config = Some(PathBuf::from(value("--config")?)),
                flag if flag.starts_with("--") => {
                    return Err(CliError::Usage(format!("unknown option {}", flag)));
                }
                path if input.is_none() => input = Some(PathBuf::from(path)),
                extra => return Err(CliError::Usage(format!("unexpected argument {}", extra))),
            }
        }

        Ok(Self {
            input: input.ok_or_else(|| CliError::Usage("missing input image".to_string()))?,
            out_dir,
            format,
            viewport,
            zoom_steps,
            config,
        })
    }
}

fn parse_viewport(raw: &str) -> Result<ViewportSize, CliError> {
    let invalid = || CliError::Usage(format!("invalid viewport '{}', expected WxH", raw));
    let (w, h) = raw.split_once(['x', 'X']).ok_or_else(invalid)?;
    let width: u32 = w.trim().parse().map_err(|_| invalid())?;
    let height: u32 = h.trim().parse().map_err(|_| invalid())?;
    if width == 0 || height == 0 {
        return Err(invalid());
    }
    Ok(ViewportSize::new(width, height))
}

/// MIME type from the file extension, as a browser file picker reports it.
fn mime_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        _ => "application/octet-stream",
    }
}

fn load_config(path: Option<&Path>) -> Result<ViewerConfig, CliError> {
    match path {
        Some(path) => Ok(ViewerConfig::load_from_path(path)?),
        None => Ok(ViewerConfig::load_from_default_path().unwrap_or_default()),
    }
}

fn init_logging(config: &ViewerConfig) {
    env_logger::Builder::new()
        .filter_level(config.log_level.to_level_filter())
        .parse_default_env()
        .init();
}

fn run(args: CliArgs, config: &ViewerConfig) -> Result<(), CliError> {
    let bytes = std::fs::read(&args.input).map_err(|source| CliError::Read {
        path: args.input.clone(),
        source,
    })?;
    let filename = args
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    let service = Arc::new(config.mock_service());
    let mut session = Session::new(config, service, "Command line")?;

    session.upload(UploadedFile::new(
        filename,
        mime_type_for(&args.input),
        bytes,
    ))?;
    println!("Processing {}...", args.input.display());
    session.wait_for_result(Duration::from_millis(config.mock_delay_ms) + DETECTION_GRACE)?;

    let viewer = session.viewer_mut();
    let direction = if args.zoom_steps >= 0 {
        ZoomDirection::In
    } else {
        ZoomDirection::Out
    };
    for _ in 0..args.zoom_steps.unsigned_abs() {
        viewer.zoom(direction, None);
    }

    let size = args.viewport.unwrap_or_else(|| config.viewport_size());
    let frame = viewer.render(size);
    let png = frame.to_png()?;

    std::fs::create_dir_all(&args.out_dir).map_err(|source| CliError::Write {
        path: args.out_dir.clone(),
        source,
    })?;
    let stem = args
        .input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let frame_path = args.out_dir.join(format!("{}-annotated.png", stem));
    std::fs::write(&frame_path, png).map_err(|source| CliError::Write {
        path: frame_path.clone(),
        source,
    })?;

    print_summary(&session);
    println!("Annotated view: {}", frame_path.display());

    let export_path = session.export(&args.format, &mut FileSink::new(&args.out_dir))?;
    println!("Results exported: {}", export_path.display());
    Ok(())
}

fn print_summary(session: &Session) {
    let viewer = session.viewer();
    let Some(result) = viewer.result() else {
        println!("No detection results.");
        return;
    };

    println!();
    println!("Detected Parts");
    for row in result.summary(viewer.palette()) {
        let [r, g, b] = row.color;
        println!(
            "  #{:02X}{:02X}{:02X}  {:<16} {:>4}   avg {:>3.0}%",
            r,
            g,
            b,
            row.category,
            row.count,
            row.mean_confidence * 100.0
        );
    }
    let processing = viewer
        .processing_time()
        .map(|t| format!(", processed in {:.1}s", t.as_secs_f32()))
        .unwrap_or_default();
    println!(
        "  Total: {} parts, mean confidence {:.0}%{}, zoom {}%",
        result.total_count(),
        result.mean_confidence() * 100.0,
        processing,
        viewer.transform().zoom_percent()
    );
    println!();
}

fn main() -> ExitCode {
    let args = match CliArgs::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::from(2);
        }
    };

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", e);
            return ExitCode::FAILURE;
        }
    };
    init_logging(&config);

    match run(args, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{:?}", e);
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}
