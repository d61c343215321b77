//! zinc: Binds syntax dumps and reports diagnostics.
//!
//! Usage:
//!   zinc [options] [module.json...]
//!
//! Without module arguments the modules listed in `zinc.json` are bound.

mod render;

use std::path::{Path, PathBuf};
use std::process;
use std::time::Instant;

use clap::Parser as ClapParser;
use miette::{IntoDiagnostic, Result, WrapErr};
use tracing::{debug, info};
use zinc_compiler::Session;
use zinc_core::SyntaxArena;
use zinc_options::{parse_config_file, CompilerOptions, TargetOptions, ZincConfig};

#[derive(ClapParser, Debug)]
#[command(name = "zinc", version, about = "zinc - semantic binder for syntax dumps")]
struct Cli {
    /// Syntax dumps to bind, one module per file.
    #[arg(value_name = "MODULE")]
    modules: Vec<PathBuf>,

    /// Path to zinc.json.
    #[arg(short = 'p', long = "project")]
    project: Option<PathBuf>,

    /// Target pointer size in bits.
    #[arg(long, value_parser = ["32", "64"])]
    pointer_width: Option<String>,

    /// Name of each module's entry-point function.
    #[arg(long)]
    entry_name: Option<String>,

    /// Worker threads for post-binding verification.
    #[arg(long)]
    threads: Option<usize>,

    /// Stop reporting after this many errors.
    #[arg(long)]
    max_errors: Option<usize>,

    /// Print a summary line for each bound module.
    #[arg(long)]
    summary: bool,

    /// Log binder activity (`ZINC_LOG` overrides).
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Options given on the command line, overriding zinc.json.
    fn overrides(&self) -> CompilerOptions {
        CompilerOptions {
            target: TargetOptions {
                pointer_width: self.pointer_width.as_deref().and_then(|width| width.parse().ok()),
            },
            max_nesting_depth: None,
            entry_name: self.entry_name.clone(),
            threads: self.threads,
            max_errors: self.max_errors,
        }
    }
}

fn setup_logging(verbose: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("ZINC_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);
    let code = run(&cli)?;
    process::exit(code);
}

/// Returns the process exit code: 0 on success, 2 when binding reported
/// errors.
fn run(cli: &Cli) -> Result<i32> {
    let start = Instant::now();
    let (config, config_path) = load_config(cli)?;

    let mut options = config.compiler_options.clone();
    options.merge(&cli.overrides());

    let modules: Vec<PathBuf> = if cli.modules.is_empty() {
        config_path
            .as_deref()
            .map(|path| config.module_paths(path))
            .unwrap_or_default()
    } else {
        cli.modules.clone()
    };
    if modules.is_empty() {
        return Err(miette::miette!("no input modules; pass syntax dumps or list them in zinc.json"));
    }
    debug!(modules = modules.len(), "resolved input modules");

    let session = Session::new(options).into_diagnostic()?;
    let arena = SyntaxArena::new();
    let syntax = session.load_modules(&arena, &modules).into_diagnostic()?;
    debug!(bytes = arena.allocated_bytes(), "loaded syntax dumps");
    let compilation = session.compile(&syntax).into_diagnostic()?;

    let files: Vec<String> = modules.iter().map(|path| path.display().to_string()).collect();
    render::emit(compilation.diagnostics.diagnostics(), &files);

    let code = if compilation.succeeded() {
        if cli.summary {
            for summary in &compilation.summaries {
                println!(
                    "{}: {} statements, {} functions, {} nodes",
                    summary.name, summary.statements, summary.functions, summary.nodes
                );
            }
        }
        0
    } else {
        let count = compilation.diagnostics.error_count();
        eprintln!("\nFound {} error{}.", count, if count == 1 { "" } else { "s" });
        2
    };
    drop(compilation);
    session.finish();
    info!(elapsed_ms = start.elapsed().as_millis() as u64, "done");
    Ok(code)
}

/// The explicit project file, else `zinc.json` in the working directory
/// when it exists, else defaults.
fn load_config(cli: &Cli) -> Result<(ZincConfig, Option<PathBuf>)> {
    let path = match &cli.project {
        Some(path) => Some(path.clone()),
        None => Some(PathBuf::from("zinc.json")).filter(|path| Path::new(path).exists()),
    };
    let Some(path) = path else {
        return Ok((ZincConfig::default(), None));
    };
    let config = parse_config_file(&path)
        .into_diagnostic()
        .wrap_err_with(|| format!("failed to read project '{}'", path.display()))?;
    Ok((config, Some(path)))
}
