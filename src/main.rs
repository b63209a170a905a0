//! asynciter CLI
//!
//! Builds a helper pipeline over a list of numbers, drives the event loop
//! and prints the result.

use anyhow::{anyhow, bail, Context};
use asynciter::{AsyncIterator, EngineConfig, Promise, Runtime, Value};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "asynciter")]
#[command(author, version, about = "Async iterator helper pipelines", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a pipeline over a list of numbers
    Run {
        /// Comma-separated source values
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        values: Vec<f64>,

        /// Deliver each source value through a promise
        #[arg(long)]
        async_source: bool,

        /// Pipeline stage: map:double|square|negate|inc, filter:even|odd|positive,
        /// take:N, drop:N, flat:N, indexed
        #[arg(long = "stage", value_name = "STAGE")]
        stages: Vec<String>,

        /// Terminal step: to-array, sum, count, for-each, some:P, every:P, find:P
        #[arg(long, default_value = "to-array")]
        collect: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,

        /// Print event loop statistics after the run
        #[arg(long)]
        stats: bool,

        /// Engine configuration file (JSON)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Print the effective engine configuration
    Config {
        /// Engine configuration file (JSON)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    let result = match cli.command {
        Commands::Run {
            values,
            async_source,
            stages,
            collect,
            json,
            stats,
            config,
        } => run_pipeline(&values, async_source, &stages, &collect, json, stats, config.as_deref()),
        Commands::Config { config } => show_config(config.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn setup_logging(verbosity: u8) {
    let filter = match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Engine errors carry `Rc` values, so they are rendered into `anyhow` errors
fn engine_error(err: asynciter::Error) -> anyhow::Error {
    anyhow!("{}", err)
}

fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::from_file(path)
            .map_err(engine_error)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(EngineConfig::default()),
    }
}

fn show_config(path: Option<&Path>) -> anyhow::Result<()> {
    let config = load_config(path)?;
    println!("{}", config.to_json_string().map_err(engine_error)?);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_pipeline(
    values: &[f64],
    async_source: bool,
    stages: &[String],
    collect: &str,
    json: bool,
    stats: bool,
    config: Option<&Path>,
) -> anyhow::Result<()> {
    let config = load_config(config)?;
    let runtime = Runtime::with_config(config);

    let stages = stages
        .iter()
        .map(|s| s.parse::<Stage>())
        .collect::<anyhow::Result<Vec<_>>>()?;
    let collect = collect.parse::<Collect>()?;

    let source = Value::new_array(
        values
            .iter()
            .map(|&n| {
                if async_source {
                    runtime.promise_resolve(Value::Number(n)).to_value()
                } else {
                    Value::Number(n)
                }
            })
            .collect(),
    );

    let mut pipeline = runtime.from(&source).map_err(engine_error)?;
    for stage in &stages {
        pipeline = stage.apply(&pipeline).map_err(engine_error)?;
    }
    let promise = collect.apply(&pipeline).map_err(engine_error)?;
    let result = runtime.block_on(&promise).map_err(engine_error)?;

    if json {
        println!("{}", serde_json::to_string(&result.to_json())?);
    } else if !matches!(collect, Collect::ForEach) {
        println!("{:?}", result);
    }

    if stats {
        eprintln!("{}", serde_json::to_string_pretty(&runtime.stats())?);
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
enum MapFn {
    Double,
    Square,
    Negate,
    Inc,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Predicate {
    Even,
    Odd,
    Positive,
}

#[derive(Debug, Clone, PartialEq)]
enum Stage {
    Map(MapFn),
    Filter(Predicate),
    Take(f64),
    Drop(f64),
    Flat(usize),
    Indexed,
}

#[derive(Debug, Clone, PartialEq)]
enum Collect {
    ToArray,
    Sum,
    Count,
    ForEach,
    Some(Predicate),
    Every(Predicate),
    Find(Predicate),
}

impl FromStr for MapFn {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "double" => Ok(MapFn::Double),
            "square" => Ok(MapFn::Square),
            "negate" => Ok(MapFn::Negate),
            "inc" => Ok(MapFn::Inc),
            other => bail!("unknown map function '{}'", other),
        }
    }
}

impl FromStr for Predicate {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "even" => Ok(Predicate::Even),
            "odd" => Ok(Predicate::Odd),
            "positive" => Ok(Predicate::Positive),
            other => bail!("unknown predicate '{}'", other),
        }
    }
}

fn parse_count(arg: &str) -> anyhow::Result<f64> {
    if arg == "inf" || arg == "Infinity" {
        return Ok(f64::INFINITY);
    }
    arg.parse::<f64>()
        .with_context(|| format!("invalid count '{}'", arg))
}

impl FromStr for Stage {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let (name, arg) = match s.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (s, None),
        };
        let require = || arg.ok_or_else(|| anyhow!("stage '{}' needs an argument", name));
        match name {
            "map" => Ok(Stage::Map(require()?.parse()?)),
            "filter" => Ok(Stage::Filter(require()?.parse()?)),
            "take" => Ok(Stage::Take(parse_count(require()?)?)),
            "drop" => Ok(Stage::Drop(parse_count(require()?)?)),
            "flat" => Ok(Stage::Flat(
                require()?
                    .parse()
                    .with_context(|| format!("invalid repeat count in '{}'", s))?,
            )),
            "indexed" => Ok(Stage::Indexed),
            other => bail!("unknown stage '{}'", other),
        }
    }
}

impl FromStr for Collect {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let (name, arg) = match s.split_once(':') {
            Some((name, arg)) => (name, Some(arg)),
            None => (s, None),
        };
        let predicate = || -> anyhow::Result<Predicate> {
            arg.ok_or_else(|| anyhow!("'{}' needs a predicate", name))?.parse()
        };
        match name {
            "to-array" => Ok(Collect::ToArray),
            "sum" => Ok(Collect::Sum),
            "count" => Ok(Collect::Count),
            "for-each" => Ok(Collect::ForEach),
            "some" => Ok(Collect::Some(predicate()?)),
            "every" => Ok(Collect::Every(predicate()?)),
            "find" => Ok(Collect::Find(predicate()?)),
            other => bail!("unknown collector '{}'", other),
        }
    }
}

fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or(Value::Undefined)
}

fn number_arg(args: &[Value], index: usize) -> f64 {
    arg(args, index).to_number()
}

impl MapFn {
    fn to_value(self) -> Value {
        Value::native_function(format!("{:?}", self).to_lowercase(), move |args| {
            let n = number_arg(args, 0);
            Ok(Value::Number(match self {
                MapFn::Double => n * 2.0,
                MapFn::Square => n * n,
                MapFn::Negate => -n,
                MapFn::Inc => n + 1.0,
            }))
        })
    }
}

impl Predicate {
    fn to_value(self) -> Value {
        Value::native_function(format!("{:?}", self).to_lowercase(), move |args| {
            let n = number_arg(args, 0);
            Ok(Value::Boolean(match self {
                Predicate::Even => n % 2.0 == 0.0,
                Predicate::Odd => n.abs() % 2.0 == 1.0,
                Predicate::Positive => n > 0.0,
            }))
        })
    }
}

impl Stage {
    fn apply(&self, pipeline: &AsyncIterator) -> asynciter::Result<AsyncIterator> {
        match self {
            Stage::Map(f) => pipeline.map(&f.to_value()),
            Stage::Filter(p) => pipeline.filter(&p.to_value()),
            Stage::Take(n) => pipeline.take(&Value::Number(*n)),
            Stage::Drop(n) => pipeline.drop(&Value::Number(*n)),
            Stage::Flat(times) => {
                let times = *times;
                pipeline.flat_map(&Value::native_function("repeat", move |args| {
                    Ok(Value::new_array(vec![arg(args, 0); times]))
                }))
            }
            Stage::Indexed => pipeline.indexed(),
        }
    }
}

impl Collect {
    fn apply(&self, pipeline: &AsyncIterator) -> asynciter::Result<Promise> {
        match self {
            Collect::ToArray => pipeline.to_array(),
            Collect::Sum => pipeline.reduce(
                &Value::native_function("sum", |args| {
                    Ok(Value::Number(number_arg(args, 0) + number_arg(args, 1)))
                }),
                Some(Value::Number(0.0)),
            ),
            Collect::Count => pipeline.reduce(
                &Value::native_function("count", |args| Ok(Value::Number(number_arg(args, 0) + 1.0))),
                Some(Value::Number(0.0)),
            ),
            Collect::ForEach => pipeline.for_each(&Value::native_function("print", |args| {
                println!("{}: {:?}", number_arg(args, 1), arg(args, 0));
                Ok(Value::Undefined)
            })),
            Collect::Some(p) => pipeline.some(&p.to_value()),
            Collect::Every(p) => pipeline.every(&p.to_value()),
            Collect::Find(p) => pipeline.find(&p.to_value()),
        }
    }
}
