use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, error::ErrorKind};
use tower_lsp::{LspService, Server};
use tracing::info;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use jai_analyzer::{ConfigError, JaiLanguageServer, LaunchOptions, ServerSettings};

#[derive(Parser, Debug)]
#[command(name = "jai-analyzer", version, about)]
struct Args {
    #[arg(long, short)]
    verbose: bool,

    #[arg(long)]
    log_file: Option<String>,

    /// Directory holding the definition extension under `src/`.
    /// Defaults to the directory of this executable.
    #[arg(long)]
    install_dir: Option<PathBuf>,

    /// Jai compiler executable.
    #[arg(long)]
    jai_path: Option<String>,

    /// File compiled once at startup to build the initial index.
    #[arg(long)]
    build_file: Option<String>,

    /// Extra arguments passed to the compiler before its `--`.
    #[arg(last = true)]
    build_args: Vec<String>,
}

fn default_log_path() -> PathBuf {
    let dir = dirs_or_tmp();
    dir.join("jai-analyzer.log")
}

fn dirs_or_tmp() -> PathBuf {
    if let Some(cache) = std::env::var_os("HOME") {
        let dir = PathBuf::from(cache).join(".jai-analyzer");
        if std::fs::create_dir_all(&dir).is_ok() {
            return dir;
        }
    }
    std::env::temp_dir()
}

/// The executable's directory, or its parent when the binary sits in a
/// `bin/` or `out/` directory of the installation.
fn default_install_dir() -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let dir = exe.parent()?;
    match dir.file_name().and_then(|name| name.to_str()) {
        Some("bin" | "out") => dir.parent().map(Path::to_path_buf),
        _ => Some(dir.to_path_buf()),
    }
}

fn launch_options(args: &Args) -> Result<LaunchOptions, ConfigError> {
    let install_dir = args.install_dir.clone().or_else(default_install_dir).unwrap_or_else(|| PathBuf::from("."));
    if !install_dir.is_dir() {
        return Err(ConfigError::MissingInstallDir(install_dir));
    }
    let settings = ServerSettings::from_cli(args.jai_path.as_deref(), args.build_file.as_deref(), &args.build_args)?;
    Ok(LaunchOptions::new(install_dir).with_settings(settings))
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    let options = match launch_options(&args) {
        Ok(options) => options,
        Err(error) => Args::command().error(ErrorKind::ValueValidation, error).exit(),
    };

    let stderr_filter = if args.verbose {
        EnvFilter::new("jai_analyzer=debug,tower_lsp=debug")
    } else {
        EnvFilter::new("jai_analyzer=info,tower_lsp=warn")
    };

    let file_filter = if args.verbose {
        EnvFilter::new("jai_analyzer=debug,tower_lsp=info")
    } else {
        EnvFilter::new("jai_analyzer=info,tower_lsp=warn")
    };

    let log_path = args.log_file.as_ref().map(PathBuf::from).unwrap_or_else(default_log_path);

    let file_appender = tracing_appender::rolling::never(
        log_path.parent().unwrap_or(Path::new(".")),
        log_path.file_name().unwrap_or(std::ffi::OsStr::new("jai-analyzer.log")),
    );

    let file_layer =
        fmt::layer().with_writer(file_appender).with_ansi(false).with_target(false).with_filter(file_filter);

    let stderr_layer =
        fmt::layer().with_writer(std::io::stderr).with_ansi(false).with_target(false).with_filter(stderr_filter);

    tracing_subscriber::registry().with(file_layer).with(stderr_layer).init();

    info!("Starting Jai Analyzer server v{}", env!("CARGO_PKG_VERSION"));
    info!("Log file: {}", log_path.display());
    info!("Install directory: {}", options.install_dir.display());

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| JaiLanguageServer::new(client, options));

    Server::new(stdin, stdout, socket).serve(service).await;

    info!("Jai Analyzer server stopped");
}
