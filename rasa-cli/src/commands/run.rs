use super::build_resolver;
use anyhow::{Context, Result};
use clap::Args;
use rasa::config::Settings;
use rasa::generation::TextGenerator;
use rasa::persona::PersonaCatalog;
use rasa::pipeline::Runner;
use rasa::state::{RunResponse, State};
use serde_json::{Map, Value};
use std::io::Write;
use std::sync::Arc;
use tracing::info;

/// Arguments of `rasa run`.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Persona name (folder under the apps directory). Run 'list' to see options
    #[arg(long)]
    pub persona: String,

    /// User input prompt or question
    #[arg(long)]
    pub input: String,

    /// Preference as key=value (repeatable, e.g. --preferences region=europe)
    #[arg(long = "preferences", value_name = "KEY=VALUE")]
    pub preferences: Vec<String>,

    /// Print the output word by word
    #[arg(long)]
    pub stream: bool,

    /// Print the full response (output, output_json, metadata) as JSON
    #[arg(long)]
    pub json: bool,

    /// Answer through the LLM configured by LLM_* environment variables
    #[arg(long)]
    pub llm: bool,
}

/// Parses `key=value` items; items without `=` are ignored.
pub fn parse_preferences(items: &[String]) -> Map<String, Value> {
    items
        .iter()
        .filter_map(|item| item.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), Value::String(value.trim().to_string())))
        .collect()
}

/// Runs a persona once and prints the result.
pub async fn run(
    catalog: &PersonaCatalog,
    args: &RunArgs,
    settings: &Settings,
    out: &mut impl Write,
) -> Result<()> {
    let persona = catalog
        .load(&args.persona)
        .with_context(|| format!("could not load persona '{}'", args.persona))?;

    let generator = if args.llm {
        Some(text_generator(settings)?)
    } else {
        None
    };

    let resolver = build_resolver(&persona, generator);
    let runner = Runner::new(persona, &resolver)?;

    let state = State::for_request(&args.input, parse_preferences(&args.preferences), Map::new());
    let response = RunResponse::from_state(&runner.run(state).await?);
    info!(persona = %args.persona, "Run finished");

    if args.json {
        serde_json::to_writer_pretty(&mut *out, &response)?;
        writeln!(out)?;
    } else if args.stream {
        for word in response.output.split_whitespace() {
            write!(out, "{word} ")?;
            out.flush()?;
        }
        writeln!(out)?;
    } else {
        writeln!(out, "\n{}", response.output)?;
    }
    Ok(())
}

#[cfg(feature = "http")]
fn text_generator(settings: &Settings) -> Result<Arc<dyn TextGenerator>> {
    let generator = rasa::generation::HttpTextGenerator::new(settings.llm.clone())?;
    info!(backend = %generator.info(), "Using LLM backend");
    Ok(Arc::new(generator))
}

#[cfg(not(feature = "http"))]
fn text_generator(_settings: &Settings) -> Result<Arc<dyn TextGenerator>> {
    anyhow::bail!("this build of rasa has no HTTP text generator (enable the `http` feature)")
}
