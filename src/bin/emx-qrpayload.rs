//! emx-qrpayload CLI
//!
//! Classify decoded QR text and build generator links.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use emx_qrpayload::{
    classify, ErrorCorrection, GeneratorConfig, GeneratorRequest, TotpRequest,
};
use emx_qrpayload::payload::UNSTRUCTURED_CODE;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{debug, Level};

#[derive(Parser, Debug)]
#[command(name = "emx-qrpayload")]
#[command(author = "nzinfo <li.monan@gmail.com>")]
#[command(version)]
#[command(about = "Decoded QR payload inspector")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Classify decoded QR text and print its fields
    #[command(name = "classify", visible_alias = "c")]
    Classify {
        /// Text to classify (default: read --input or stdin)
        text: Option<String>,

        /// File holding the decoded text
        #[arg(short = 'i', long, conflicts_with = "text")]
        input: Option<PathBuf>,

        /// Print the result as a JSON object
        #[arg(long)]
        json: bool,

        /// Also print the generator link for the raw text
        #[arg(long)]
        link: bool,

        /// Generator page path used by --link
        #[arg(long, default_value = "/")]
        base: String,
    },

    /// Print a generator link pre-filled with TEXT
    Link {
        text: String,

        /// Image size in pixels
        #[arg(long)]
        size: Option<u32>,

        /// Error correction level (L, M, Q, H)
        #[arg(long)]
        ec: Option<ErrorCorrection>,

        /// Generator page path
        #[arg(long, default_value = "/")]
        base: String,
    },

    /// Build an otpauth:// TOTP URI
    Totp {
        /// Issuer name
        #[arg(long)]
        name: String,

        /// Account name
        #[arg(long)]
        user: String,

        #[arg(long)]
        secret: String,

        /// Time step in seconds (default 30)
        #[arg(long)]
        period: Option<u32>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Classify { text, input, json, link, base } => {
            let raw = read_payload(text, input.as_deref())?;
            classify_payload(&raw, json, link.then(|| GeneratorConfig::with_base_path(base)))?;
        }
        Commands::Link { text, size, ec, base } => {
            print_link(&text, size, ec, GeneratorConfig::with_base_path(base))?;
        }
        Commands::Totp { name, user, secret, period } => {
            let mut request = TotpRequest::new(name, user, secret);
            request.period = period;
            println!("{}", request.to_uri()?);
        }
    }

    Ok(())
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

fn read_payload(text: Option<String>, input: Option<&Path>) -> Result<String> {
    if let Some(text) = text {
        return Ok(text);
    }

    let content = if let Some(input_path) = input {
        fs::read(input_path)
            .with_context(|| format!("Failed to read: {}", input_path.display()))?
    } else {
        let mut buffer = Vec::new();
        io::stdin()
            .read_to_end(&mut buffer)
            .context("Failed to read stdin")?;
        buffer
    };

    debug!(bytes = content.len(), "read payload");
    Ok(strip_trailing_newline(String::from_utf8_lossy(&content).into_owned()))
}

/// Drop one trailing `\n` or `\r\n` left by editors and `echo`
fn strip_trailing_newline(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}

fn classify_payload(raw: &str, json: bool, link: Option<GeneratorConfig>) -> Result<()> {
    let result = classify(raw);
    let link = link.map(|config| config.generator_link(raw));

    if json {
        let value = serde_json::json!({
            "raw": raw,
            "type": result.as_ref().map(|r| r.kind().code()).unwrap_or(UNSTRUCTURED_CODE),
            "fields": result,
            "link": link,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    match &result {
        Some(result) => {
            println!("{}", result.kind().code());
            print!("{}", result);
        }
        None => println!("{}", UNSTRUCTURED_CODE),
    }
    if let Some(link) = link {
        println!("Generator: {}", link);
    }

    Ok(())
}

fn print_link(
    text: &str,
    size: Option<u32>,
    ec: Option<ErrorCorrection>,
    config: GeneratorConfig,
) -> Result<()> {
    if size.is_none() && ec.is_none() {
        println!("{}", config.generator_link(text));
        return Ok(());
    }

    let request = GeneratorRequest::new(text)?
        .with_size(size.unwrap_or(config.default_size))
        .with_ec_level(ec.unwrap_or(config.default_ec_level));
    println!("{}", config.request_link(&request));
    Ok(())
}
