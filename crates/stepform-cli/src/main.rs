//! `stepform` command-line tool
//!
//! - `check`: load a wizard definition and synthesize its schema
//! - `walk`: replay step gating and submission over a value file
//! - `upload`: run an upload session over local files

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use std::process::ExitCode;
use stepform_core::{
    init_tracing, submit_fn, FormEngine, LogFormat, StepGateError, SubmitError, Wizard, WizardDefinition,
};
use stepform_schema::{FieldErrors, FormValueTree};
use stepform_upload::{format_file_size, parse_file_size, FileSource, PathFile, UploadConfig, UploadMode, UploadSession};

fn cli() -> Command {
    Command::new("stepform")
        .version(stepform_core::VERSION)
        .about("Check wizard definitions and run upload sessions")
        .subcommand_required(true)
        .arg(
            Arg::new("log-json")
                .long("log-json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines on stderr"),
        )
        .subcommand(
            Command::new("check")
                .about("Validate a definition and synthesize its schema")
                .arg(definition_arg()),
        )
        .subcommand(
            Command::new("walk")
                .about("Walk every step with the given values, then submit")
                .arg(definition_arg())
                .arg(
                    Arg::new("values")
                        .long("values")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("JSON file with field values, nested by path segment"),
                ),
        )
        .subcommand(
            Command::new("upload")
                .about("Validate and encode local files as an upload session would")
                .arg(
                    Arg::new("files")
                        .required(true)
                        .num_args(1..)
                        .value_parser(value_parser!(PathBuf))
                        .help("Files to select"),
                )
                .arg(
                    Arg::new("allow")
                        .long("allow")
                        .value_delimiter(',')
                        .help("Allowed extensions, comma separated (default: any)"),
                )
                .arg(
                    Arg::new("max-size")
                        .long("max-size")
                        .help("Size ceiling per file, e.g. 10MB"),
                )
                .arg(
                    Arg::new("single")
                        .long("single")
                        .action(ArgAction::SetTrue)
                        .help("Keep only the first file"),
                ),
        )
}

fn definition_arg() -> Arg {
    Arg::new("definition")
        .required(true)
        .value_parser(value_parser!(PathBuf))
        .help("Wizard definition (.toml, .yaml, .yml or .json)")
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let matches = cli().get_matches();
    let format = if matches.get_flag("log-json") {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_tracing(format)?;

    match matches.subcommand() {
        Some(("check", args)) => check(args),
        Some(("walk", args)) => walk(args).await,
        Some(("upload", args)) => upload(args).await,
        _ => bail!("unknown command"),
    }
}

fn required_path<'a>(args: &'a ArgMatches, name: &str) -> Result<&'a PathBuf> {
    args.get_one::<PathBuf>(name)
        .with_context(|| format!("missing argument <{name}>"))
}

fn load_wizard(definition: &PathBuf) -> Result<Wizard> {
    WizardDefinition::from_path(definition)
        .with_context(|| format!("failed to load {}", definition.display()))?
        .compile()
        .with_context(|| format!("invalid definition {}", definition.display()))
}

fn build_engine(wizard: Wizard, definition: &PathBuf) -> Result<FormEngine> {
    let handler = submit_fn(|data: FormValueTree| async move {
        let json = serde_json::to_string_pretty(&data.to_json())
            .map_err(|e| SubmitError::Transport(e.to_string()))?;
        println!("{json}");
        Ok(())
    });
    wizard
        .build_engine(handler)
        .with_context(|| format!("cannot build form from {}", definition.display()))
}

fn check(args: &ArgMatches) -> Result<ExitCode> {
    let definition = required_path(args, "definition")?;
    let wizard = load_wizard(definition)?;

    let title = wizard.title.clone().unwrap_or_else(|| definition.display().to_string());
    println!("{title}: {} step(s)", wizard.steps.len());
    for (index, step) in wizard.steps.iter().enumerate() {
        println!("  [{}] {}", index + 1, step.title);
        for field in &step.fields {
            let required = if field.required { " (required)" } else { "" };
            println!("      {} <{}> {}{required}", field.path, field.kind.name(), field.label);
        }
    }

    let engine = build_engine(wizard, definition)?;
    println!("schema ok, validation mode {:?}", engine.config().validation_mode);
    Ok(ExitCode::SUCCESS)
}

fn print_errors(heading: &str, errors: &FieldErrors) {
    println!("FAIL {heading}");
    for error in errors.iter() {
        println!("     {}: {}", error.path, error.message);
    }
}

async fn walk(args: &ArgMatches) -> Result<ExitCode> {
    let definition = required_path(args, "definition")?;
    let values_path = required_path(args, "values")?;
    let engine = build_engine(load_wizard(definition)?, definition)?;

    let raw = std::fs::read_to_string(values_path)
        .with_context(|| format!("failed to read {}", values_path.display()))?;
    let json: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("invalid JSON in {}", values_path.display()))?;
    let values = FormValueTree::from_json(&json).context("values must be an object of fields")?;
    for (path, value) in &values {
        engine
            .set_value(path, value.clone())
            .with_context(|| format!("cannot set {path}"))?;
    }

    while !engine.is_last_step() {
        let title = engine.current_step().title;
        match engine.next() {
            Ok(_) => println!("ok   {title}"),
            Err(StepGateError::Invalid { errors, .. }) => {
                print_errors(&title, &errors);
                return Ok(ExitCode::FAILURE);
            }
            Err(e) => return Err(e.into()),
        }
    }

    match engine.submit().await {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(SubmitError::Invalid(errors)) => {
            print_errors("submit", &errors);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e).context("submission failed"),
    }
}

async fn upload(args: &ArgMatches) -> Result<ExitCode> {
    let mut config = UploadConfig::new();
    if let Some(allowed) = args.get_many::<String>("allow") {
        config = config.with_allowed_extensions(allowed.cloned());
    }
    if let Some(limit) = args.get_one::<String>("max-size") {
        let bytes = parse_file_size(limit).with_context(|| format!("invalid --max-size {limit}"))?;
        config = config.with_max_size(bytes);
    }
    if args.get_flag("single") {
        config = config.with_mode(UploadMode::Single);
    }

    let mut sources: Vec<std::sync::Arc<dyn FileSource>> = Vec::new();
    for path in args.get_many::<PathBuf>("files").into_iter().flatten() {
        let file = PathFile::open(path)
            .await
            .with_context(|| format!("cannot open {}", path.display()))?;
        sources.push(std::sync::Arc::new(file));
    }

    let session = UploadSession::new(config);
    session.select_files(sources);
    session.wait_idle().await;

    let mut failed = false;
    for item in session.items() {
        let size = session.format_file_size(item.size);
        let status = item.status.to_string();
        match &item.error {
            Some(error) => {
                failed = true;
                println!("{status:<10} {:<30} {size:>10}  {error}", item.name);
            }
            None => {
                let encoded = item.payload.as_ref().map_or(0, String::len);
                let encoded = format_file_size(u64::try_from(encoded).unwrap_or(u64::MAX));
                println!("{status:<10} {:<30} {size:>10}  encoded {encoded}", item.name);
            }
        }
    }
    tracing::info!(files = session.items().len(), "upload session finished");
    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}
