//! PDML command-line tool: parses one PDML file and prints its tree.
//!
//! Usage: pdml [OPTIONS] <FILE>
//!
//! Options:
//!   -h, --help             Print help
//!   -V, --version          Print version
//!
//! Every root and branch node is printed as `Node: <name>` and every text
//! leaf as `Text: <content>`, depth first in document order. Errors go to
//! stderr and set exit code 1.

use std::process;

use libpdml::{parse_file, Node, NodeKind, ParseError};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Help,
    Version,
    Parse(String),
    Usage,
}

/// Interpret the arguments that follow the program name.
fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Command {
    let mut paths: Vec<String> = Vec::new();
    for arg in args {
        match arg.as_str() {
            "-h" | "--help" => return Command::Help,
            "-V" | "--version" => return Command::Version,
            "--" => continue,
            _ => {}
        }
        paths.push(arg);
    }
    match <[String; 1]>::try_from(paths) {
        Ok([path]) => Command::Parse(path),
        Err(_) => Command::Usage,
    }
}

fn main() {
    init_logging();

    match parse_args(std::env::args().skip(1)) {
        Command::Help => print_help(),
        Command::Version => println!("pdml {}", env!("CARGO_PKG_VERSION")),
        Command::Parse(path) => process::exit(run(&path)),
        Command::Usage => {
            eprintln!("Expecting a PDML file path as CLI argument.");
            eprintln!("Usage: pdml <FILE>");
            process::exit(1);
        }
    }
}

/// Log to stderr, filtered by `RUST_LOG` (warnings only by default).
fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(path: &str) -> i32 {
    debug!(path, "parsing file");
    match parse_file(path) {
        Ok(document) => {
            print_tree(document.root());
            0
        }
        Err(err @ ParseError::Io { .. }) => {
            eprintln!("IO error: {}", err);
            1
        }
        Err(ParseError::Syntax(diagnostic)) => {
            eprintln!("Error : {}", diagnostic.kind);
            if let Some(resource) = &diagnostic.resource {
                eprintln!("Resource: {}", resource);
            }
            if let Some(line) = diagnostic.line {
                eprintln!("Line  : {}", line);
            }
            if let Some(column) = diagnostic.column {
                eprintln!("Column: {}", column);
            }
            1
        }
    }
}

fn print_tree(root: Node<'_>) {
    for node in root.descendants() {
        match node.kind() {
            NodeKind::Root { name } | NodeKind::Branch { name } => println!("Node: {}", name),
            NodeKind::Text { text } => println!("Text: <{}>", text),
        }
    }
}

fn print_help() {
    println!(
        "pdml - PDML command-line tool

USAGE:
    pdml [OPTIONS] <FILE>

ARGS:
    <FILE>    UTF-8 encoded PDML document to parse

OPTIONS:
    -h, --help       Print help

    -V, --version    Print version

OUTPUT:
    Each root and branch node is printed as 'Node: <name>', each text leaf
    as 'Text: <content>', depth first in document order.

    On a syntax error the message, resource, line and column are printed to
    stderr and the exit code is 1. I/O errors also exit with code 1.

ENVIRONMENT:
    RUST_LOG    Log filter for diagnostics on stderr (e.g. RUST_LOG=libpdml=trace)

EXAMPLES:
    # Print the tree of a document
    pdml config.pdml
"
    );
}
