use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tqe_cli::{compiled_set_from_files, CommandTransformerFactory};
use tqe_core::{EnhancementService, JsonSettingsStore, TqeConfig};
use tqe_enhance::{BatchReport, CompileContext, LocalCompileContext};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn project_arg() -> Arg {
    Arg::new("project")
        .long("project")
        .short('p')
        .default_value(".")
        .value_parser(value_parser!(PathBuf))
        .help("Project root directory")
}

fn config_arg() -> Arg {
    Arg::new("config")
        .long("config")
        .value_parser(value_parser!(PathBuf))
        .help("Config file to use instead of <project>/tqe.toml")
}

fn cli() -> Command {
    Command::new("tqe")
        .version(tqe_cli::VERSION)
        .about("Type query bean enhancement for compiled classes")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("enhance")
                .about("Raise a compilation-finished event for the given class files")
                .arg(project_arg())
                .arg(config_arg())
                .arg(
                    Arg::new("transformer")
                        .long("transformer")
                        .short('t')
                        .help("Transformer command; class bytes on stdin, class name appended"),
                )
                .arg(
                    Arg::new("force")
                        .long("force")
                        .action(ArgAction::SetTrue)
                        .help("Enhance even if enhancement is disabled for the project"),
                )
                .arg(
                    Arg::new("classes")
                        .required(true)
                        .num_args(1..)
                        .value_parser(value_parser!(PathBuf))
                        .help("Freshly compiled class files"),
                ),
        )
        .subcommand(
            Command::new("enable")
                .about("Turn enhancement on for the project")
                .arg(project_arg())
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("disable")
                .about("Turn enhancement off for the project")
                .arg(project_arg())
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("status")
                .about("Show whether enhancement is on for the project")
                .arg(project_arg())
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("packages")
                .about("Print the packages manifests declare for enhancement")
                .arg(project_arg())
                .arg(config_arg()),
        )
}

/// Initialize tracing on stderr; stdout carries command output
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "tqe=info".into()),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn open_service(args: &ArgMatches, factory: CommandTransformerFactory) -> Result<EnhancementService> {
    let root = args
        .get_one::<PathBuf>("project")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."));
    let config = match args.get_one::<PathBuf>("config") {
        Some(path) => load_config(path)?,
        None => TqeConfig::load(&root)
            .with_context(|| format!("loading config for {}", root.display()))?,
    };
    let settings = JsonSettingsStore::new(config.settings_file(&root));
    EnhancementService::with_parts(root.clone(), config, Arc::new(factory), Box::new(settings))
        .with_context(|| format!("opening project {}", root.display()))
}

fn load_config(path: &Path) -> Result<TqeConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    TqeConfig::from_toml_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

fn print_messages(ctx: &LocalCompileContext) {
    for message in ctx.messages().messages() {
        println!("{message}");
    }
}

fn enhance(args: &ArgMatches) -> Result<ExitCode> {
    let factory = args
        .get_one::<String>("transformer")
        .map(|line| CommandTransformerFactory::parse(line))
        .unwrap_or_default();
    let service = open_service(args, factory)?;
    let files: Vec<&PathBuf> = args.get_many::<PathBuf>("classes").into_iter().flatten().collect();
    let compiled = compiled_set_from_files(files)?;
    let ctx = LocalCompileContext::new(service.build_project()?);

    let report = if args.get_flag("force") {
        Some(service.enhance(&ctx, &compiled))
    } else {
        service.compilation_finished(&ctx, &compiled)
    };
    print_messages(&ctx);

    let Some(report) = report else {
        println!(
            "enhancement is disabled for {}; run `tqe enable` or pass --force",
            service.root().display()
        );
        return Ok(ExitCode::SUCCESS);
    };
    print_summary(&report);
    Ok(if report.fatal.is_some() || !report.failed.is_empty() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

fn print_summary(report: &BatchReport) {
    println!(
        "{} transformed, {} unchanged, {} failed",
        report.transformed.len(),
        report.unchanged.len(),
        report.failed.len()
    );
}

fn set_enabled(args: &ArgMatches, enabled: bool) -> Result<ExitCode> {
    let service = open_service(args, CommandTransformerFactory::default())?;
    service.set_enabled(enabled)?;
    println!(
        "enhancement {} for {}",
        if enabled { "enabled" } else { "disabled" },
        service.root().display()
    );
    Ok(ExitCode::SUCCESS)
}

fn status(args: &ArgMatches) -> Result<ExitCode> {
    let service = open_service(args, CommandTransformerFactory::default())?;
    println!("{}", if service.is_enabled() { "enabled" } else { "disabled" });
    Ok(ExitCode::SUCCESS)
}

fn packages(args: &ArgMatches) -> Result<ExitCode> {
    let service = open_service(args, CommandTransformerFactory::default())?;
    let ctx = LocalCompileContext::new(service.build_project()?);
    let packages = service.packages(&ctx);
    print_messages(&ctx);
    tracing::debug!(modules = ctx.project().modules().len(), "packages discovered");
    println!("{packages}");
    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let matches = cli().get_matches();

    match matches.subcommand() {
        Some(("enhance", args)) => enhance(args),
        Some(("enable", args)) => set_enabled(args, true),
        Some(("disable", args)) => set_enabled(args, false),
        Some(("status", args)) => status(args),
        Some(("packages", args)) => packages(args),
        _ => Ok(ExitCode::FAILURE),
    }
}
