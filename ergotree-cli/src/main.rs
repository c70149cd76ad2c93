use std::{
    io::{self, Read, Write},
    path::PathBuf,
    process::ExitCode,
};

use clap::{Parser, Subcommand};
use ergotree::{
    CodecConfig, Constant, DecodeError, ErgoTree, PrettyExpr,
    config::ConfigError,
    expr::pretty::terminal_width,
};
use log::{debug, info};
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

mod logger;

#[derive(Parser)]
#[command(version, about = "Inspect and edit serialized ErgoTree scripts")]
pub struct Arguments {
    /// Codec configuration file (TOML). Defaults to the per-user configuration if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Render width for expressions. Defaults to the terminal width.
    #[arg(long, global = true)]
    width: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the header, constant segment and root expression of a tree.
    Inspect {
        /// Base16 tree, or `-` to read it from stdin.
        tree: String,
        /// Substitute segregated constants into the printed root.
        #[arg(long)]
        inline: bool,
    },
    /// Print one constant of the segment.
    Get { tree: String, index: usize },
    /// Replace a constant with an `Int` value and print the new tree.
    SetInt {
        tree: String,
        index: usize,
        #[arg(allow_hyphen_values = true)]
        value: i32,
    },
    /// Print the root expression bytes, shared by trees that differ only in constants.
    Template { tree: String },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Constant index {index} is out of bounds (the tree has {len} constant(s))")]
    NoSuchConstant { index: usize, len: usize },
}

fn load_config(path: Option<&PathBuf>) -> Result<CodecConfig, ConfigError> {
    if let Some(path) = path {
        info!("loading codec configuration from {}", path.display());
        return CodecConfig::load_from_toml(path);
    }

    let path = CodecConfig::default_path();
    if path.is_file() {
        info!("loading codec configuration from {}", path.display());
        CodecConfig::load_from_toml(&path)
    } else {
        debug!("no configuration at {}, using defaults", path.display());
        Ok(CodecConfig::default())
    }
}

fn read_tree(input: &str, config: CodecConfig) -> Result<ErgoTree, CliError> {
    let text = if input == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        input.to_string()
    };

    let bytes = hex::decode(text.trim()).map_err(DecodeError::from)?;
    Ok(ErgoTree::from_bytes_with_config(&bytes, config)?)
}

fn heading(out: &mut StandardStream, text: &str) -> io::Result<()> {
    out.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
    write!(out, "{}", text)?;
    out.reset()
}

fn print_constant(out: &mut StandardStream, index: usize, constant: &Constant) -> io::Result<()> {
    write!(out, "  #{:<3} ", index)?;
    out.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
    write!(out, "{}", constant.tpe())?;
    out.reset()?;
    writeln!(out, " = {}", constant)
}

fn inspect(tree: &ErgoTree, inline: bool, width: usize) -> io::Result<()> {
    let mut out = StandardStream::stdout(ColorChoice::Auto);
    let header = tree.header();

    heading(&mut out, "header")?;
    writeln!(
        out,
        "    {:#04x} (version {}, size {}, constant segregation {})",
        header.to_byte(),
        header.version(),
        header.has_size(),
        header.is_constant_segregation()
    )?;

    heading(&mut out, "constants")?;
    writeln!(out, " {}", tree.constants_len())?;
    for (index, constant) in tree.constants().iter().enumerate() {
        print_constant(&mut out, index, constant)?;
    }

    heading(&mut out, "root")?;
    writeln!(out)?;
    let root = if inline {
        tree.inline_constants()
    } else {
        tree.root().clone()
    };
    root.pretty_render_to(width, &mut out)?;
    writeln!(out)
}

fn run(args: Arguments) -> Result<(), CliError> {
    let config = load_config(args.config.as_ref())?;
    debug!("codec configuration: {:?}", config);
    let width = args.width.unwrap_or_else(terminal_width);

    match args.command {
        Command::Inspect { tree, inline } => {
            let tree = read_tree(&tree, config)?;
            inspect(&tree, inline, width)?;
        }
        Command::Get { tree, index } => {
            let tree = read_tree(&tree, config)?;
            let constant = tree.get_constant(index).ok_or(CliError::NoSuchConstant {
                index,
                len: tree.constants_len(),
            })?;
            let mut out = StandardStream::stdout(ColorChoice::Auto);
            print_constant(&mut out, index, constant)?;
        }
        Command::SetInt { tree, index, value } => {
            let tree = read_tree(&tree, config)?;
            let updated = tree
                .set_constant(index, Constant::from_i32(value))
                .ok_or(CliError::NoSuchConstant {
                    index,
                    len: tree.constants_len(),
                })?;
            info!("replaced constant #{} with {}", index, value);
            println!("{}", updated.to_base16());
        }
        Command::Template { tree } => {
            let tree = read_tree(&tree, config)?;
            println!("{}", hex::encode(tree.template_bytes()));
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Arguments::parse();
    if let Err(e) = logger::init(args.verbose) {
        eprintln!("Failed to install logger: {}", e);
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {}", error);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "100204a00b08cd021dde34603426402615658f1d970cfa7c7bd92ac81a8b16eeebff264d59ce4604ea02d192a39a8cc7a70173007301";

    #[test]
    fn parses_subcommands() {
        let args =
            Arguments::try_parse_from(["ergotree", "-vv", "set-int", SAMPLE, "0", "-5"]).unwrap();
        assert_eq!(args.verbose, 2);
        assert!(matches!(
            args.command,
            Command::SetInt {
                index: 0,
                value: -5,
                ..
            }
        ));

        let args =
            Arguments::try_parse_from(["ergotree", "inspect", "--inline", "--width", "40", SAMPLE])
                .unwrap();
        assert_eq!(args.width, Some(40));
        assert!(matches!(args.command, Command::Inspect { inline: true, .. }));
    }

    #[test]
    fn reads_tree_with_limits() {
        let tree = read_tree(SAMPLE, CodecConfig::default()).unwrap();
        assert_eq!(tree.constants_len(), 2);

        let shallow = CodecConfig {
            max_expr_depth: 2,
            ..CodecConfig::default()
        };
        let err = read_tree(SAMPLE, shallow).unwrap_err();
        assert!(matches!(err, CliError::Decode(e) if e.source.is_expr_depth_exceeded()));
    }

    #[test]
    fn rejects_bad_hex() {
        let err = read_tree("10zz", CodecConfig::default()).unwrap_err();
        assert!(matches!(err, CliError::Decode(e) if e.position == 2));
    }
}
