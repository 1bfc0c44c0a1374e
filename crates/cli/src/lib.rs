#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![deny(unused_must_use)]

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::*;
use gilt_resolve::{
    DescriptorLocator, FileSource, IgnoreStore, ModuleRegistry, ModulesReport, Prompter,
    ResolvedReport, ScriptedPrompter, SymbolSession, get_modules, get_modules_resolved,
};
use indexmap::IndexSet;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod prompt;
pub mod report;

use config::{ConfigFile, DEFAULT_CONFIG_FILE};
use prompt::TerminalPrompter;

#[derive(Parser, Debug)]
#[command(version, about, disable_help_subcommand = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load modules and their dependencies, show version conflicts
    List(CommonArgs),
    /// Decide which version of every conflicting namespace is used
    Resolve(ResolveArgs),
    /// Resolve, then report type references that do not map to a symbol
    Check(ResolveArgs),
}

#[derive(Args, Debug)]
pub struct CommonArgs {
    /// Package names or trailing-wildcard patterns (e.g. `Gtk-3.0`, `Gtk-*`)
    #[arg(required = true, value_name = "PATTERN")]
    pub patterns: Vec<String>,

    /// Directory to search for descriptors (repeatable)
    #[arg(short, long = "dir", value_name = "DIR")]
    pub dirs: Vec<PathBuf>,

    /// Package name to leave out (repeatable)
    #[arg(short, long, value_name = "NAME")]
    pub ignore: Vec<String>,

    /// Descriptor file extension
    #[arg(long)]
    pub extension: Option<String>,

    #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    /// Keep every version without asking
    #[arg(short, long)]
    pub yes: bool,

    /// Answer prompts from this list instead of the terminal (repeatable)
    #[arg(long = "answer", value_name = "CHOICE")]
    pub answers: Vec<String>,
}

impl Command {
    fn common(&self) -> &CommonArgs {
        match self {
            Command::List(common) => common,
            Command::Resolve(args) | Command::Check(args) => &args.common,
        }
    }
}

/// Initialize logging. `RUST_LOG` overrides the default filter.
pub fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("info,gilt_resolve=debug,gilt_cli=debug")
        } else {
            EnvFilter::new("warn,gilt_resolve=info,gilt_cli=info")
        }
    });
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Parse arguments from the process and run
pub fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.command.common().verbose);
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::List(common) => run_list(&common),
        Command::Resolve(args) => run_resolve(&args).map(|_| ()),
        Command::Check(args) => run_check(&args),
    }
}

/// Locator, config file and merged ignore list for one invocation
struct Environment {
    config: ConfigFile,
    locator: DescriptorLocator,
    ignore: Vec<String>,
}

impl Environment {
    fn new(common: &CommonArgs) -> Result<Self> {
        let config = ConfigFile::load(&common.config)?;

        let mut dirs: Vec<PathBuf> = config.config.search_dirs.clone();
        dirs.extend(common.dirs.iter().cloned());
        if dirs.is_empty() {
            dirs.push(PathBuf::from("."));
        }

        let extension = common
            .extension
            .clone()
            .or_else(|| config.config.extension.clone());
        let mut locator = DescriptorLocator::new(dirs);
        if let Some(extension) = extension {
            locator = locator.with_extension(extension);
        }

        let ignore: IndexSet<String> = config
            .load_ignored()?
            .into_iter()
            .chain(common.ignore.iter().cloned())
            .collect();

        Ok(Self {
            config,
            locator,
            ignore: ignore.into_iter().collect(),
        })
    }

    fn registry(&self) -> ModuleRegistry<FileSource> {
        ModuleRegistry::new(FileSource::json(self.locator.clone()))
    }
}

fn run_list(common: &CommonArgs) -> Result<()> {
    let env = Environment::new(common)?;
    let mut registry = env.registry();
    let report: ModulesReport =
        get_modules(&env.locator, &mut registry, &common.patterns, &env.ignore)
            .context("Module discovery failed")?;
    report::print_modules(&report);
    Ok(())
}

fn resolve_with(
    args: &ResolveArgs,
    env: &mut Environment,
    registry: &mut ModuleRegistry<FileSource>,
) -> Result<ResolvedReport> {
    let prompter: Box<dyn Prompter> = if args.answers.is_empty() {
        Box::new(TerminalPrompter::stdio())
    } else {
        Box::new(ScriptedPrompter::new(args.answers.iter().cloned()))
    };

    let report = get_modules_resolved(
        &env.locator,
        registry,
        &args.common.patterns,
        &env.ignore,
        args.yes,
        prompter,
        Some(&mut env.config),
    )
    .context("Module resolution failed")?;
    Ok(report)
}

fn run_resolve(args: &ResolveArgs) -> Result<ResolvedReport> {
    let mut env = Environment::new(&args.common)?;
    let mut registry = env.registry();
    let report = resolve_with(args, &mut env, &mut registry)?;
    report::print_resolved(&report);
    Ok(report)
}

fn run_check(args: &ResolveArgs) -> Result<()> {
    let mut env = Environment::new(&args.common)?;
    let mut registry = env.registry();
    let report = resolve_with(args, &mut env, &mut registry)?;
    report::print_resolved(&report);

    let mut session = SymbolSession::new();
    for resolved in &report.keep {
        if let Some(document) = registry.document(resolved.package_name()) {
            session.register_document(&resolved.module, document);
        }
    }

    let mut unresolved = Vec::new();
    for resolved in &report.keep {
        if let Some(document) = registry.document(resolved.package_name()) {
            unresolved.extend(session.unresolved_references(&resolved.module, document));
        }
    }

    println!();
    if unresolved.is_empty() {
        println!(
            "{} all {} symbols resolve",
            "✓".green().bold(),
            session.len()
        );
    } else {
        report::print_unresolved(&unresolved);
    }
    Ok(())
}
