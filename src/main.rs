//! Command-line front end for the concatenation-to-interpolation engine.
//!
//! ```bash
//! concat-interp --var name=string '"Hello, " + name + "!"'
//! echo '"n=" + n' | concat-interp --dialect python --var n=int
//! ```

use std::io::{self, IsTerminal, Read};

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use concat_interp::{
    Conversion, ConvertOptions, Registry, Type, TypeEnv, convert_with_options, parse_expr,
};

#[derive(Parser)]
#[command(name = "concat-interp")]
#[command(about = "Convert string concatenation chains into interpolated strings", long_about = None)]
struct Cli {
    /// Expression to convert. Read from stdin when omitted.
    expression: Option<String>,

    /// Target template syntax
    #[arg(short, long, default_value = "csharp")]
    dialect: String,

    /// Declare a variable type, e.g. `--var count=int`
    #[arg(long = "var", value_name = "NAME=TYPE", value_parser = parse_binding)]
    vars: Vec<(String, Type)>,

    /// Declare a function return type, e.g. `--fn Describe=string`
    #[arg(long = "fn", value_name = "NAME=TYPE", value_parser = parse_binding)]
    functions: Vec<(String, Type)>,

    /// Byte offset of the node to start from (defaults to the whole expression)
    #[arg(long)]
    at: Option<usize>,

    /// Abort chains with more operands than this
    #[arg(long)]
    max_leaves: Option<u64>,

    /// Print the segment list instead of the rendered template
    #[arg(long)]
    segments: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn parse_binding(s: &str) -> Result<(String, Type), String> {
    let (name, ty) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=TYPE, got `{s}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing name in `{s}`"));
    }
    let ty = match ty.parse::<Type>() {
        Ok(ty) => ty,
        Err(never) => match never {},
    };
    Ok((name.to_string(), ty))
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "concat_interp=debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_expression(arg: Option<String>) -> Result<String> {
    if let Some(expr) = arg {
        return Ok(expr);
    }
    let stdin = io::stdin();
    if stdin.is_terminal() {
        bail!("no expression given; pass one as an argument or pipe it on stdin");
    }
    let mut buf = String::new();
    stdin
        .lock()
        .read_to_string(&mut buf)
        .context("failed to read expression from stdin")?;
    Ok(buf.trim_end().to_string())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let registry = Registry::with_builtins();
    let Some(dialect) = registry.get(&cli.dialect) else {
        let known = registry.names().collect::<Vec<_>>().join(", ");
        bail!("unknown dialect `{}` (known: {known})", cli.dialect);
    };

    let mut env = TypeEnv::new();
    for (name, ty) in cli.vars {
        env.declare(name, ty);
    }
    for (name, ty) in cli.functions {
        env.declare_function(name, ty);
    }

    let source = read_expression(cli.expression)?;
    let tree = match parse_expr(&source) {
        Ok(tree) => tree,
        Err(errors) => {
            for e in &errors {
                eprintln!("{}", e.format_with_source(&source, Some("<input>")));
            }
            bail!("failed to parse expression");
        }
    };
    debug!(nodes = tree.len(), "parsed expression");

    let node = match cli.at {
        Some(offset) => tree
            .node_at(offset)
            .with_context(|| format!("no expression at offset {offset}"))?,
        None => tree.root(),
    };

    let mut options = ConvertOptions::new();
    if let Some(max) = cli.max_leaves {
        options = options.max_leaves(max);
    }

    match convert_with_options(&tree, node, &env, dialect, options)? {
        Conversion::Offered(replacement) => {
            if cli.segments {
                for segment in replacement.interpolated.segments() {
                    println!("{segment}");
                }
            } else {
                println!("{}", replacement.apply(&source));
            }
        }
        Conversion::NotApplicable(reason) => {
            eprintln!("not applicable: {reason}");
            std::process::exit(1);
        }
    }

    Ok(())
}
