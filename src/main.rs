//! # Garbled Replacer CLI - Lossy-by-substitution Charset Converter
//!
//! Command-line interface for encoding UTF-8 text into legacy charsets,
//! replacing unrepresentable characters with a placeholder.

#[cfg(feature = "cli")]
use std::fs::{self, File};
#[cfg(feature = "cli")]
use std::io::{self, BufWriter, Read, Write};
#[cfg(feature = "cli")]
use std::path::PathBuf;

#[cfg(feature = "cli")]
use anyhow::{Context, Result};
#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand, ValueEnum};
#[cfg(feature = "cli")]
use serde::Serialize;
#[cfg(feature = "cli")]
use tracing::{debug, info};
#[cfg(feature = "cli")]
use tracing_subscriber::EnvFilter;

#[cfg(feature = "cli")]
use garbled_replacer::{
    EncoderProbe, Encoding, Probe, ReplacerConfig, Strictness, TransformWriter, with_config,
};

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI features disabled. Enable with --features cli");
    std::process::exit(1);
}

/// Garbled Replacer: encode UTF-8 into legacy charsets without garbled text
#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "garbled-replacer")]
#[command(version, about, long_about = None)]
#[command(author = "Garbled Replacer Contributors")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Encode UTF-8 input into a target encoding
    Convert(ConvertArgs),

    /// Report characters the target encoding cannot represent
    Check(CheckArgs),

    /// List all supported target encodings
    List(ListArgs),

    /// Display detailed information about an encoding
    Info(InfoArgs),
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ConvertArgs {
    /// Target encoding
    #[arg(short = 't', long = "to")]
    to: Encoding,

    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Replacement character for unrepresentable characters (default: ?)
    #[arg(short, long)]
    replacement: Option<char>,

    /// Fail on malformed UTF-8 instead of skipping it
    #[arg(long)]
    strict: bool,

    /// JSON file with replacer settings; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Buffer size for streaming (KB)
    #[arg(long, default_value = "64")]
    buffer_size: usize,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct CheckArgs {
    /// Target encoding
    #[arg(short, long)]
    encoding: Encoding,

    /// Input file (stdin if not specified)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Show the byte position of every unrepresentable character
    #[arg(long)]
    show_positions: bool,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct ListArgs {
    /// Show only ASCII-compatible encodings
    #[arg(long)]
    ascii_compatible: bool,

    /// Show only multibyte encodings
    #[arg(long)]
    multibyte: bool,

    /// Show only encodings with shift state
    #[arg(long)]
    stateful: bool,

    /// Show encoding details
    #[arg(long)]
    details: bool,
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct InfoArgs {
    /// Encoding to describe
    encoding: Encoding,
}

#[cfg(feature = "cli")]
#[derive(Clone, Debug, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct ConversionResult {
    success: bool,
    encoding: &'static str,
    bytes_processed: u64,
    bytes_written: u64,
    replacements: u64,
    processing_time_ms: u64,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct Unrepresentable {
    character: char,
    code_point: String,
    position: usize,
}

#[cfg(feature = "cli")]
#[derive(Serialize)]
struct CheckResult {
    encoding: &'static str,
    representable: bool,
    unrepresentable: Vec<Unrepresentable>,
}

#[cfg(feature = "cli")]
fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Convert(ref args) => convert_command(args, &cli)?,
        Commands::Check(ref args) => check_command(args, &cli)?,
        Commands::List(ref args) => list_command(args, &cli)?,
        Commands::Info(ref args) => info_command(args, &cli)?,
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

#[cfg(feature = "cli")]
fn load_config(args: &ConvertArgs) -> Result<ReplacerConfig> {
    let mut config = match args.config {
        Some(ref path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Invalid config file: {}", path.display()))?
        }
        None => ReplacerConfig::default(),
    };

    if let Some(replacement) = args.replacement {
        config.replacement = replacement;
    }
    if args.strict {
        config.strictness = Strictness::Strict;
    }

    Ok(config)
}

#[cfg(feature = "cli")]
fn open_input(input: &Option<PathBuf>) -> Result<Box<dyn Read>> {
    match input {
        Some(path) => {
            debug!("Reading from: {}", path.display());
            let file = File::open(path)
                .with_context(|| format!("Failed to open input file: {}", path.display()))?;
            Ok(Box::new(file))
        }
        None => {
            debug!("Reading from stdin");
            Ok(Box::new(io::stdin().lock()))
        }
    }
}

#[cfg(feature = "cli")]
fn convert_command(args: &ConvertArgs, cli: &Cli) -> Result<()> {
    let start_time = std::time::Instant::now();
    let config = load_config(args)?;

    info!(
        encoding = args.to.name(),
        replacement = ?config.replacement,
        strictness = ?config.strictness,
        "Converting"
    );

    let transformer = with_config(args.to, config)
        .with_context(|| format!("Failed to create transformer for {}", args.to.name()))?;

    let sink: Box<dyn Write> = match args.output {
        Some(ref path) => Box::new(BufWriter::new(File::create(path).with_context(|| {
            format!("Failed to create output file: {}", path.display())
        })?)),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let buffer_size = args.buffer_size.max(1) * 1024;
    let mut writer = TransformWriter::with_buffer_size(sink, transformer, buffer_size);
    let mut reader = open_input(&args.input)?;

    io::copy(&mut reader, &mut writer).context("Conversion failed")?;
    let replacements = writer.transformer().first().replacements();
    let bytes_processed = writer.bytes_in();
    let bytes_written = writer.bytes_out();
    writer.finish().context("Failed to finish output stream")?;

    let processing_time = start_time.elapsed();
    debug!(
        "Processed {} bytes -> {} bytes ({} replaced) in {:?}",
        bytes_processed, bytes_written, replacements, processing_time
    );

    match cli.format {
        OutputFormat::Json => {
            let result = ConversionResult {
                success: true,
                encoding: args.to.name(),
                bytes_processed,
                bytes_written,
                replacements,
                processing_time_ms: processing_time.as_millis() as u64,
            };
            eprintln!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::Text => {
            if cli.verbose || args.output.is_some() {
                eprintln!(
                    "✓ Conversion completed ({} character(s) replaced)",
                    replacements
                );
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn check_command(args: &CheckArgs, cli: &Cli) -> Result<()> {
    let mut input_data = Vec::new();
    open_input(&args.input)?
        .read_to_end(&mut input_data)
        .context("Failed to read input")?;

    let text = std::str::from_utf8(&input_data).context("Input is not valid UTF-8")?;

    let mut probe = EncoderProbe::new(args.encoding);
    let unrepresentable: Vec<_> = text
        .char_indices()
        .filter(|&(_, ch)| !probe.can_encode(ch))
        .map(|(position, character)| Unrepresentable {
            character,
            code_point: format!("U+{:04X}", character as u32),
            position,
        })
        .collect();

    let result = CheckResult {
        encoding: args.encoding.name(),
        representable: unrepresentable.is_empty(),
        unrepresentable,
    };

    match cli.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
        OutputFormat::Text => {
            if result.representable {
                println!("✓ All characters are representable in {}", result.encoding);
            } else {
                println!(
                    "✗ {} character(s) not representable in {}",
                    result.unrepresentable.len(),
                    result.encoding
                );
                if args.show_positions {
                    for entry in &result.unrepresentable {
                        println!(
                            "  Position {}: '{}' ({})",
                            entry.position, entry.character, entry.code_point
                        );
                    }
                }
            }
        }
    }

    if !result.representable {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn list_command(args: &ListArgs, cli: &Cli) -> Result<()> {
    let filtered_encodings: Vec<_> = Encoding::ALL
        .into_iter()
        .filter(|encoding| {
            if args.ascii_compatible && !encoding.is_ascii_compatible() {
                return false;
            }

            if args.multibyte && !encoding.is_multibyte() {
                return false;
            }

            if args.stateful && !encoding.is_stateful() {
                return false;
            }

            true
        })
        .collect();

    match cli.format {
        OutputFormat::Json => {
            let encodings_info: Vec<_> = filtered_encodings
                .iter()
                .map(|encoding| encoding_json(*encoding))
                .collect();
            println!("{}", serde_json::to_string_pretty(&encodings_info)?);
        }
        OutputFormat::Text => {
            println!("Supported Encodings ({} total):", filtered_encodings.len());
            println!();

            for encoding in filtered_encodings {
                println!("{:15} {}", encoding.name(), get_encoding_description(encoding));

                if args.details {
                    print_details(encoding, "                ");
                    println!();
                }
            }
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn info_command(args: &InfoArgs, cli: &Cli) -> Result<()> {
    let encoding = args.encoding;

    match cli.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&encoding_json(encoding))?);
        }
        OutputFormat::Text => {
            println!("Encoding Information: {}", encoding.name());
            println!("Description: {}", get_encoding_description(encoding));
            print_details(encoding, "");
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn encoding_json(encoding: Encoding) -> serde_json::Value {
    serde_json::json!({
        "name": encoding.name(),
        "description": get_encoding_description(encoding),
        "ascii_compatible": encoding.is_ascii_compatible(),
        "multibyte": encoding.is_multibyte(),
        "stateful": encoding.is_stateful()
    })
}

#[cfg(feature = "cli")]
fn print_details(encoding: Encoding, indent: &str) {
    let yes_no = |flag: bool| if flag { "Yes" } else { "No" };
    println!(
        "{}ASCII Compatible: {}",
        indent,
        yes_no(encoding.is_ascii_compatible())
    );
    println!("{}Multibyte: {}", indent, yes_no(encoding.is_multibyte()));
    println!("{}Stateful: {}", indent, yes_no(encoding.is_stateful()));
}

#[cfg(feature = "cli")]
fn get_encoding_description(encoding: Encoding) -> &'static str {
    match encoding {
        Encoding::SHIFT_JIS => "Japanese, double-byte with single-byte ASCII and katakana",
        Encoding::EUC_JP => "Japanese, Extended Unix Code",
        Encoding::ISO_2022_JP => "Japanese, 7-bit with escape-sequence shift state",
        Encoding::BIG5 => "Traditional Chinese, double-byte",
        Encoding::GBK => "Simplified Chinese, double-byte",
        Encoding::GB18030 => "Simplified Chinese, covers all of Unicode",
        Encoding::EUC_KR => "Korean, Extended Unix Code",
        Encoding::WINDOWS_1250 => "Windows code page for Central and Eastern European languages",
        Encoding::WINDOWS_1251 => "Windows code page for Cyrillic scripts",
        Encoding::WINDOWS_1252 => "Windows code page for Western European languages",
        Encoding::KOI8_R => "Russian 8-bit encoding",
        Encoding::MAC_ROMAN => "Classic Macintosh Roman character encoding",
        Encoding::UTF8 => "Unicode Transformation Format 8-bit, nothing is replaced",
        _ => "Character encoding for specific language/regional support",
    }
}
