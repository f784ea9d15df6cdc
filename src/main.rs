use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use gramspec::data::Dataset;
use gramspec::parser::parse_config;
use gramspec::resolve::determine_eligible_chart_types;
use gramspec::schema::Schema;
use gramspec::{generate_chart_spec, ChartConfig, ChartRequest, SelectionState, Theme, ViewportOptions};
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum InputFormat {
    Json,
    Csv,
}

#[derive(Parser, Debug)]
#[command(name = "gramspec")]
#[command(about = "Compile tabular data and a column schema into a Vega-Lite or Vega chart spec", long_about = None)]
struct Args {
    /// Column schema as JSON (object keyed by column name, or array of columns)
    #[arg(long)]
    schema: PathBuf,

    /// Data file; read from stdin when omitted
    #[arg(long)]
    data: Option<PathBuf>,

    /// Data format
    #[arg(long, value_enum, default_value = "json")]
    format: InputFormat,

    /// Chart config, as shorthand (e.g. 'bar(x: region, y: revenue)') or JSON
    #[arg(long)]
    config: Option<String>,

    #[arg(long, default_value = "light")]
    theme: Theme,

    /// Lay out for a small touch screen
    #[arg(long)]
    mobile: bool,

    #[arg(long, default_value_t = 800)]
    width: u32,

    #[arg(long, default_value_t = 600)]
    height: u32,

    /// Chart title, shown when the config sets show_title
    #[arg(long)]
    title: Option<String>,

    /// Selection state as a JSON array of records
    #[arg(long)]
    selection: Option<String>,

    /// Print the chart kinds the schema supports and exit
    #[arg(long)]
    eligible: bool,

    /// Pretty-print the output JSON
    #[arg(long)]
    pretty: bool,
}

fn read_schema(path: &Path) -> Result<Schema> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read schema file {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text).context("Schema file is not valid JSON")?;
    Schema::from_json(&value)
}

fn read_data(args: &Args, schema: &Schema) -> Result<Dataset> {
    let mut raw = String::new();
    match &args.data {
        Some(path) => {
            raw = fs::read_to_string(path)
                .with_context(|| format!("Failed to read data file {}", path.display()))?;
        }
        None => {
            io::stdin()
                .read_to_string(&mut raw)
                .context("Failed to read data from stdin")?;
        }
    }

    match args.format {
        InputFormat::Csv => Dataset::from_csv(raw.as_bytes(), schema).context("Failed to parse CSV data"),
        InputFormat::Json => {
            let value: serde_json::Value = serde_json::from_str(&raw).context("Data is not valid JSON")?;
            Dataset::from_json(&value)
        }
    }
}

fn read_config(raw: &str) -> Result<ChartConfig> {
    if raw.trim_start().starts_with('{') {
        serde_json::from_str(raw).context("Failed to parse JSON chart config")
    } else {
        parse_config(raw)
    }
}

fn write_json(value: &impl serde::Serialize, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    writeln!(handle, "{}", text).context("Failed to write to stdout")?;
    handle.flush().context("Failed to flush stdout")?;
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let schema = read_schema(&args.schema)?;

    if args.eligible {
        let kinds: Vec<&str> = determine_eligible_chart_types(&schema)
            .into_iter()
            .map(|k| k.as_str())
            .collect();
        return write_json(&kinds, args.pretty);
    }

    let data = read_data(&args, &schema)?;
    debug!(rows = data.len(), columns = schema.len(), "loaded input");

    let config = match args.config.as_deref() {
        Some(raw) => read_config(raw)?,
        None => ChartConfig::default(),
    };
    let selection: SelectionState = match args.selection.as_deref() {
        Some(raw) => serde_json::from_str(raw).context("Selection must be a JSON array of objects")?,
        None => SelectionState::default(),
    };

    let viewport = ViewportOptions {
        width: args.width,
        height: args.height,
        mobile: args.mobile,
    };
    let mut request = ChartRequest::new(schema, data)
        .with_config(config)
        .with_selection(selection)
        .with_theme(args.theme)
        .with_viewport(viewport);
    if let Some(title) = args.title.clone() {
        request = request.with_title(title);
    }

    let spec = generate_chart_spec(&request).context("Failed to compile chart")?;
    write_json(&spec, args.pretty)
}
