use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use json_tree::{parse_reader, IoBytes, JsonTokenizer, ParserOptions, TopLevel};
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Debug, ClapParser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The JSON file to parse. Reads stdin if omitted.
    input: Option<PathBuf>,

    /// Accept several concatenated top-level values and keep the last one.
    #[arg(long)]
    keep_last: bool,

    /// Maximum nesting depth of arrays and objects.
    #[arg(long, default_value_t = json_tree::DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Print the token stream instead of the parsed value.
    #[arg(long)]
    tokens: bool,

    /// Log more (-v for debug, -vv for trace). RUST_LOG overrides this.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn setup_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn open_input(path: Option<&PathBuf>) -> Result<Box<dyn Read>> {
    match path {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?;
            Ok(Box::new(file))
        }
        None => Ok(Box::new(io::stdin().lock())),
    }
}

fn print_tokens(reader: Box<dyn Read>) -> Result<()> {
    let mut bytes = IoBytes::new(reader);
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for token in JsonTokenizer::new(&mut bytes) {
        let token = token.context("failed to tokenize input")?;
        writeln!(out, "{}: {token}", token.location.byte_offset)?;
    }
    if let Some(err) = bytes.take_error() {
        return Err(err).context("failed to read input");
    }
    out.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);
    debug!(?args);

    let reader = open_input(args.input.as_ref())?;
    if args.tokens {
        return print_tokens(reader);
    }

    let top_level = if args.keep_last {
        TopLevel::KeepLast
    } else {
        TopLevel::Single
    };
    let options = ParserOptions::strict()
        .with_top_level(top_level)
        .with_max_depth(args.max_depth);

    let value = match parse_reader(reader, options) {
        Ok(value) => value,
        Err(e) => {
            error!(input = ?args.input, "failed to parse input");
            return Err(e).context("failed to parse JSON");
        }
    };

    println!("Parse result: {value}");
    Ok(())
}
