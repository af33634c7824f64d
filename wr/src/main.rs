use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::io::Read;
use std::path::Path;

use wrangler::cli::{Cli, Command};
use wrangler::config::Config;
use wrangler::{Pipeline, PipelineContext, Row, Schema};

fn setup_logging() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();
    Ok(())
}

fn pipeline_context(config: &Config) -> PipelineContext {
    let mut ctx = PipelineContext::new(config.pipeline_name.clone());
    ctx.properties = config.properties.clone();
    ctx
}

fn read_script(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).context(format!("Failed to read script {}", path.display()))
}

fn read_rows(path: Option<&Path>) -> Result<Vec<Row>> {
    let content = match path {
        Some(p) => std::fs::read_to_string(p).context(format!("Failed to read input {}", p.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read rows from stdin")?;
            buf
        }
    };
    let rows: Vec<Row> = serde_json::from_str(&content).context("Input must be a JSON array of objects")?;
    Ok(rows)
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("wr starting");

    match cli.command {
        Command::Run {
            script,
            input,
            schema,
            stats,
        } => {
            let ctx = pipeline_context(&config);
            let mut pipeline = Pipeline::new();
            pipeline
                .configure(&read_script(&script)?, &ctx)
                .context("Failed to configure pipeline")?;

            let rows = read_rows(input.as_deref())?;

            let output = match schema.or(config.schema.clone()) {
                Some(schema_path) => {
                    let schema = Schema::load(&schema_path)?;
                    let records = pipeline.execute(rows, &schema)?;
                    serde_json::to_string_pretty(&records)?
                }
                None => {
                    let rows = pipeline.execute_rows(rows)?;
                    serde_json::to_string_pretty(&rows)?
                }
            };
            println!("{}", output);

            if stats {
                for (name, count) in pipeline.context().counters() {
                    eprintln!("{} {}", name.dimmed(), count);
                }
            }
        }
        Command::Check { script } => {
            let ctx = pipeline_context(&config);
            let mut pipeline = Pipeline::new();
            pipeline
                .configure(&read_script(&script)?, &ctx)
                .context("Script is invalid")?;
            println!(
                "{} {} directive(s) configured: {}",
                "✓".green(),
                pipeline.len(),
                pipeline.directives().join(", ").cyan()
            );
        }
        Command::List => {
            let ctx = pipeline_context(&config);
            for name in ctx.registry.names() {
                let description = ctx
                    .registry
                    .info(&name)
                    .map(|i| i.description.as_str())
                    .unwrap_or_default();
                println!("{:<20} {}", name.cyan(), description);
            }
        }
        Command::Usage { directive } => {
            let ctx = pipeline_context(&config);
            match ctx.registry.usage(&directive) {
                Some(usage) => println!("{}", usage.usage()),
                None => eyre::bail!("Unknown directive: {}", directive),
            }
        }
    }

    Ok(())
}
