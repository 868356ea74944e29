use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use quarry_filter::{
    CompilerConfig, FilterCompiler, FindOptions, LogicalOperator, QueryOptions, RawFilterMap,
    check_shape,
};

const ENV_LOG: &str = "QUARRY_LOG";

/// Compile querystring-style filters against a collection's JSON schema.
#[derive(Debug, Parser)]
#[command(name = "quarry")]
#[command(version, about, long_about = None)]
struct Args {
    /// JSON schema file, with or without the `$jsonSchema` wrapper
    #[arg(long, short = 's', env = "QUARRY_SCHEMA")]
    schema: PathBuf,

    /// Collection name used in error messages
    #[arg(long, short = 'c', env = "QUARRY_COLLECTION")]
    collection: String,

    /// Fail on fields the schema does not declare
    #[arg(long, env = "QUARRY_STRICT")]
    strict: bool,

    /// Logical operator grouping multi-operator fields
    #[arg(long, short = 'o', env = "QUARRY_OPERATOR", default_value_t = LogicalOperator::And)]
    operator: LogicalOperator,

    /// Sort keys, `-field` for descending
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    sort: Vec<String>,

    /// Projected fields, `-field` to exclude
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    fields: Vec<String>,

    /// Pagination entries: limit, offset, skip, page, size
    #[arg(long, value_parser = parse_page)]
    page: Vec<(String, i64)>,

    /// Filters as `field=tok1,tok2`; a repeated field appends its tokens
    #[arg(value_parser = parse_filter)]
    filters: Vec<(String, Vec<String>)>,
}

impl Args {
    fn raw_filter(&self) -> RawFilterMap {
        let mut raw = RawFilterMap::new();
        for (field, tokens) in &self.filters {
            raw.entry(field.clone())
                .or_default()
                .extend(tokens.iter().cloned());
        }
        raw
    }

    fn query_options(&self) -> QueryOptions {
        QueryOptions {
            page: self.page.iter().cloned().collect(),
            fields: self.fields.clone(),
            sort: self.sort.clone(),
        }
    }

    fn config(&self) -> CompilerConfig {
        CompilerConfig::new(&self.collection)
            .strict(self.strict)
            .logical_operator(self.operator)
    }
}

fn parse_filter(arg: &str) -> Result<(String, Vec<String>), String> {
    let (field, tokens) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected field=value, got {arg:?}"))?;
    if field.is_empty() {
        return Err(format!("missing field name in {arg:?}"));
    }
    Ok((
        field.to_string(),
        tokens.split(',').map(str::to_string).collect(),
    ))
}

fn parse_page(arg: &str) -> Result<(String, i64), String> {
    let (key, value) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected key=number, got {arg:?}"))?;
    let value = value
        .parse()
        .map_err(|e| format!("invalid number for {key}: {e}"))?;
    Ok((key.to_string(), value))
}

fn init_logging() {
    let filter = std::env::var(ENV_LOG)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".into());

    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .with_env_filter(filter)
        .init();
}

fn find_options_json(find: &FindOptions) -> Result<serde_json::Value> {
    Ok(serde_json::json!({
        "limit": find.limit,
        "skip": find.skip,
        "projection": serde_json::to_value(&find.projection)?,
        "sort": serde_json::to_value(&find.sort)?,
    }))
}

fn run(args: &Args) -> Result<()> {
    let schema = std::fs::read(&args.schema)
        .with_context(|| format!("failed to read schema {}", args.schema.display()))?;
    let compiler = FilterCompiler::from_config(args.config(), schema);
    if compiler.field_types().is_empty() {
        tracing::warn!(schema = %args.schema.display(), "schema declares no fields");
    }
    tracing::debug!(fields = compiler.field_types().len(), "resolved schema");

    let filter = compiler.compile(&args.raw_filter())?;
    if let Err(e) = check_shape(&filter) {
        bail!("compiled an invalid filter: {e}");
    }
    let find = compiler.find_options(&args.query_options())?;

    let output = serde_json::json!({
        "filter": serde_json::to_value(&filter)?,
        "options": find_options_json(&find)?,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging();
    run(&args)
}
