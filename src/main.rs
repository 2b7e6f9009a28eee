use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use rosmsg_java_gen::codegen;
use rosmsg_java_gen::config::{RunConfig, SourceList, split_list};
use rosmsg_java_gen::error::Result;
use rosmsg_java_gen::msg_file::MsgFileResolver;
use rosmsg_java_gen::resolver::DescriptorResolver;
use rosmsg_java_gen::schema;

/// Generate Java message classes from ROS message descriptors.
///
/// Resolves the requested root messages and every message type they
/// reference, then writes one Gson-backed Java class per unique type.
#[derive(Parser)]
#[command(name = "rosmsg-java-gen", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a descriptor bundle and cache it locally.
    #[cfg(feature = "download")]
    DownloadDescriptors {
        /// URL serving the descriptor bundle JSON.
        #[arg(long, env = "ROSMSG_BUNDLE_URL")]
        url: String,

        /// Where to save the bundle.
        #[arg(long, default_value = "descriptors.json")]
        output: PathBuf,
    },

    /// Generate Java classes for the requested messages.
    Generate {
        /// Java source root.
        #[arg(long, default_value = "src/main/java")]
        root: PathBuf,

        /// Package path below the source root receiving generated classes.
        #[arg(long, default_value = "frc/team88/ros/messages")]
        messages: String,

        /// JSON file listing root messages: {"sources": ["pkg/Type", ...]}.
        #[arg(long)]
        sources: Option<PathBuf>,

        /// Comma-separated extra root messages.
        ///
        /// Example: --types nav_msgs/Odometry,sensor_msgs/Imu
        #[arg(long)]
        types: Option<String>,

        /// JSON file listing messages the project already provides.
        #[arg(long)]
        exclude_sources: Option<PathBuf>,

        /// Comma-separated messages the project already provides.
        #[arg(long)]
        exclude: Option<String>,

        /// Package holding the project's RosMessage base class.
        #[arg(long, default_value = "frc.team88.ros")]
        external_package: String,

        /// Descriptor bundle JSON file.
        #[arg(long, conflicts_with = "msg_path", required_unless_present = "msg_path")]
        descriptors: Option<PathBuf>,

        /// Directory searched for <pkg>/msg/<Name>.msg files. Repeatable.
        #[arg(long)]
        msg_path: Vec<PathBuf>,

        /// Suppress non-error output.
        #[arg(long, short)]
        quiet: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let quiet = matches!(cli.command, Commands::Generate { quiet: true, .. });
    let default_level = if quiet { "warn" } else { "info" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .init();

    if let Err(e) = run(cli) {
        eprintln!("error: {e}");

        // Print cause chain.
        let mut source = std::error::Error::source(&e);
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = std::error::Error::source(cause);
        }

        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        #[cfg(feature = "download")]
        Commands::DownloadDescriptors { url, output } => {
            let rt = tokio::runtime::Runtime::new()
                .map_err(|e| rosmsg_java_gen::error::Error::Download(e.to_string()))?;
            rt.block_on(schema::download_bundle(&url, &output))?;
        }

        Commands::Generate {
            root,
            messages,
            sources,
            types,
            exclude_sources,
            exclude,
            external_package,
            descriptors,
            msg_path,
            quiet: _,
        } => {
            let mut roots = Vec::new();
            if let Some(path) = &sources {
                roots.extend(SourceList::load(path)?.sources);
            }
            roots.extend(types.as_deref().map(split_list).unwrap_or_default());

            let mut excluded = Vec::new();
            if let Some(path) = &exclude_sources {
                excluded.extend(SourceList::load(path)?.sources);
            }
            excluded.extend(exclude.as_deref().map(split_list).unwrap_or_default());

            let config = RunConfig::new(&root, &messages, &external_package, roots, excluded)?;

            let resolver: Box<dyn DescriptorResolver> = match descriptors {
                Some(path) => {
                    tracing::info!(path = %path.display(), "loading descriptor bundle");
                    let bundle = schema::load_bundle(&path)?;
                    tracing::info!(messages = bundle.messages.len(), "loaded descriptor bundle");
                    Box::new(bundle)
                }
                None => {
                    tracing::info!(roots = msg_path.len(), "resolving .msg files");
                    Box::new(MsgFileResolver::new(msg_path))
                }
            };

            tracing::info!(roots = config.roots.len(), "generating Java classes");
            let generation = codegen::generate(resolver.as_ref(), &config.roots, &config.naming)?;
            codegen::write_files(&config.output_dir, &generation.files)?;

            let stats = &generation.stats;
            tracing::info!(
                roots = stats.roots_processed,
                descriptors = stats.descriptors_resolved,
                classes = stats.classes_emitted,
                constants = stats.constants_emitted,
                "done"
            );
            if stats.excluded_references > 0 {
                tracing::info!(
                    count = stats.excluded_references,
                    "referenced excluded types from the external package"
                );
            }
        }
    }

    Ok(())
}
