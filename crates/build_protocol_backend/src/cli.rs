use std::path::{Path, PathBuf};

use build_protocol_types::{
    BackendCapabilities, CondaUrl, FrontendCapabilities, Method, Platform, SourceDir,
    procedures::{
        conda_metadata::{CondaMetadataParams, CondaMetadataResult},
        initialize::InitializeParams,
    },
};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use miette::{Context, IntoDiagnostic};
use tracing_subscriber::EnvFilter;

use crate::{protocol::ProtocolInstantiator, server::Server, session::Session};

#[allow(missing_docs)]
#[derive(Parser)]
#[clap(version)]
pub struct App {
    /// The subcommand to run.
    #[clap(subcommand)]
    command: Option<Commands>,

    /// The port to expose the json-rpc server on. If not specified will
    /// communicate with stdin/stdout.
    #[clap(long)]
    http_port: Option<u16>,

    /// Enable verbose logging.
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the backend for a source directory and print its
    /// capabilities.
    Capabilities {
        /// The directory that contains the source files.
        #[clap(long, default_value = ".")]
        source_dir: PathBuf,
    },

    /// Print the metadata of the packages that the source directory would
    /// produce.
    GetCondaMetadata {
        /// The directory that contains the source files.
        #[clap(long, default_value = ".")]
        source_dir: PathBuf,

        /// The platform to query, defaults to the current platform.
        #[clap(long)]
        target_platform: Option<Platform>,

        /// The channels to use for any resolution, in order of priority.
        #[clap(long = "channel")]
        channels: Vec<CondaUrl>,
    },
}

/// Run the sever on the specified port or over stdin/stdout.
async fn run_server<T: ProtocolInstantiator>(port: Option<u16>, protocol: T) -> miette::Result<()> {
    let server = Server::new(protocol);
    if let Some(port) = port {
        server.run_over_http(port)
    } else {
        // running over stdin/stdout
        server.run().await
    }
}

/// Installs the global tracing subscriber. Logs go to stderr because stdout
/// carries the json-rpc stream.
fn init_logging(verbose: &Verbosity<InfoLevel>) -> miette::Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(verbose.tracing_level_filter().into())
        .from_env()
        .into_diagnostic()
        .context("invalid RUST_LOG filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| miette::miette!("failed to initialize logging: {err}"))
}

/// The actual implementation of the main function that runs the CLI.
pub(crate) async fn main_impl<T: ProtocolInstantiator, F: FnOnce() -> T>(
    factory: F,
    args: App,
) -> miette::Result<()> {
    init_logging(&args.verbose)?;

    let factory = factory();

    match args.command {
        None => run_server(args.http_port, factory).await,
        Some(Commands::Capabilities { source_dir }) => {
            let capabilities = capabilities(factory, &source_dir).await?;
            eprintln!(
                "Supports {}: {}",
                Method::CondaMetadata,
                match capabilities.provides_conda_metadata {
                    Some(provided) => provided.to_string(),
                    None => String::from("unspecified"),
                }
            );
            Ok(())
        }
        Some(Commands::GetCondaMetadata {
            source_dir,
            target_platform,
            channels,
        }) => {
            let channel_base_urls = (!channels.is_empty()).then_some(channels);
            let metadata =
                get_conda_metadata(factory, &source_dir, target_platform, channel_base_urls)
                    .await?;
            println!(
                "{}",
                serde_yaml::to_string(&metadata).into_diagnostic()?
            );
            Ok(())
        }
    }
}

/// The entry point for the CLI which should be called from the backends
/// implementation.
pub async fn main<T: ProtocolInstantiator, F: FnOnce() -> T>(factory: F) -> miette::Result<()> {
    let args = App::parse();
    main_impl(factory, args).await
}

/// The entry point for the CLI which should be called from the backends
/// implementation, with explicit arguments.
pub async fn main_ext<T: ProtocolInstantiator, F: FnOnce() -> T>(
    factory: F,
    args: Vec<String>,
) -> miette::Result<()> {
    let args = App::parse_from(args);
    main_impl(factory, args).await
}

fn initialize_params(source_dir: &Path) -> miette::Result<InitializeParams> {
    Ok(InitializeParams {
        source_dir: SourceDir::new(source_dir)?,
        capabilities: FrontendCapabilities {},
    })
}

/// Returns the capabilities the backend declares for `source_dir`.
async fn capabilities<T: ProtocolInstantiator>(
    factory: T,
    source_dir: &Path,
) -> miette::Result<BackendCapabilities> {
    let mut session = Session::new(factory);
    let result = session.initialize(initialize_params(source_dir)?).await?;
    Ok(result.capabilities)
}

/// Runs a complete session in-process, acting as the frontend: initialize,
/// check the declared capabilities, and query the metadata.
pub(crate) async fn get_conda_metadata<T: ProtocolInstantiator>(
    factory: T,
    source_dir: &Path,
    target_platform: Option<Platform>,
    channel_base_urls: Option<Vec<CondaUrl>>,
) -> miette::Result<CondaMetadataResult> {
    let mut session = Session::new(factory);
    let result = session.initialize(initialize_params(source_dir)?).await?;

    // A frontend does not rely on an unspecified capability.
    if !result.capabilities.provides_conda_metadata() {
        miette::bail!(
            "the build backend does not provide '{}' for {}",
            Method::CondaMetadata,
            source_dir.display()
        );
    }

    Ok(session
        .conda_metadata(CondaMetadataParams {
            target_platform,
            channel_base_urls,
        })
        .await?)
}
