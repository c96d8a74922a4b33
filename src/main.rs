//! layergen CLI entrypoint
//! Loads the design and configuration, runs every hook through the plugin
//! registry and writes the rendered files.
#![deny(unsafe_code)]

use std::path::{Path, PathBuf};

// External imports (alphabetized)
use anyhow::Context;
use clap::Parser;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use layergen::codegen::FileSet;
use layergen::core::config::PipelineConfig;
use layergen::design::load_design;
use layergen::output::{FileSystemOutput, OutputService};
use layergen::plugin::{GenContext, PrimaryGenerator};
use layergen::plugins::builtin_registry;
use layergen::render::{TemplateRenderer, TeraRenderer, apply_permissions};
use layergen::scaffold::ScaffoldGenerator;

#[derive(Parser)]
#[command(name = "layergen")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Generate code for a design, layering the enabled plugins on top
    Generate {
        /// Design description (YAML)
        #[arg(long)]
        design: PathBuf,
        /// Pipeline configuration (TOML or YAML)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Files produced by an external primary generator (YAML); the
        /// reference generator is used when absent
        #[arg(long)]
        base: Option<PathBuf>,
        /// Hooks to run, in order; overrides the configuration
        #[arg(long = "hook")]
        hooks: Vec<String>,
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Fail on missing files, sections and unmatched patterns
        #[arg(long)]
        strict: bool,
        /// Import path of the generated package root
        #[arg(long)]
        genpkg: Option<String>,
    },
    /// List the built-in plugins
    Plugins,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with default level INFO
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Generate {
            design,
            config,
            base,
            hooks,
            output_dir,
            strict,
            genpkg,
        } => {
            let config = resolve_config(config.as_deref(), hooks, output_dir, strict, genpkg)?;
            generate(&design, base.as_deref(), &config).await?
        }
        Commands::Plugins => list_plugins(),
    }
    Ok(())
}

/// Configuration file values, overridden by command line flags
fn resolve_config(
    path: Option<&Path>,
    hooks: Vec<String>,
    output_dir: Option<PathBuf>,
    strict: bool,
    genpkg: Option<String>,
) -> anyhow::Result<PipelineConfig> {
    let mut config = match path {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("Failed to load configuration {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if !hooks.is_empty() {
        config.hooks = hooks;
    }
    if let Some(dir) = output_dir {
        config.output_dir = dir;
    }
    if strict {
        config.strict = true;
    }
    if let Some(genpkg) = genpkg {
        config.genpkg = genpkg;
    }
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

async fn generate(design: &Path, base: Option<&Path>, config: &PipelineConfig) -> anyhow::Result<()> {
    info!(
        design = %design.display(),
        genpkg = %config.genpkg,
        hooks = ?config.hooks,
        strict = config.strict,
        "Generating"
    );

    let base = match base {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read base files {}", path.display()))?;
            let files: FileSet = serde_yaml::from_str(&text)
                .with_context(|| format!("Failed to parse base files {}", path.display()))?;
            Some(files)
        }
        None => None,
    };

    let registry = builtin_registry(config);
    let ctx = GenContext::new(config.genpkg.clone()).with_strictness(config.strictness());
    let renderer = TeraRenderer::new();
    let output = FileSystemOutput::new(&config.output_dir);

    for hook in &config.hooks {
        // Each hook sees the design as loaded, not as augmented by earlier hooks
        let mut roots = load_design(design)
            .with_context(|| format!("Failed to load design {}", design.display()))?;

        let primary: Box<dyn PrimaryGenerator> = match &base {
            Some(files) => Box::new(files.clone()),
            None => Box::new(ScaffoldGenerator::for_hook(hook)),
        };
        let files = registry
            .run(hook, &ctx, &mut roots, primary.as_ref())
            .with_context(|| format!("Hook '{hook}' failed"))?;

        let mut artifacts = renderer
            .render(&files)
            .with_context(|| format!("Failed to render files of hook '{hook}'"))?;
        apply_permissions(&mut artifacts);
        output
            .write_artifacts(&artifacts)
            .await
            .with_context(|| format!("Failed to write files of hook '{hook}'"))?;

        info!(hook = %hook, files = artifacts.len(), "Hook complete");
    }

    info!(output = %config.output_dir.display(), "✅ Generation complete");
    Ok(())
}

fn list_plugins() {
    let registry = builtin_registry(&PipelineConfig::default());
    for hook in registry.hooks() {
        println!("{hook}:");
        for plugin in registry.plugins(&hook) {
            let prepare = if plugin.has_prepare { " (prepare)" } else { "" };
            println!("  {:<14} {}{}", plugin.name, plugin.phase, prepare);
        }
    }
}
