//! scantool - decode barcodes from image files, or render symbols to PNG.

use clap::{Args, Parser, Subcommand};
use rust_barcode::{
    Binarizer, DecodeOptions, DecodeResult, ECLevel, LumaImage, QrEncodeOptions, Symbology,
    decode_dynamic, encode_code128, encode_ean13, encode_qr, encode_upca, render_bars, render_grid,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "scantool", version, about = "Decode and render QR, Code 128 and EAN/UPC symbols")]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace); RUST_LOG overrides
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Decode every symbol in one or more images
    Decode(DecodeArgs),
    /// Render a symbol to a PNG file
    Encode(EncodeArgs),
}

#[derive(Debug, Args)]
struct DecodeArgs {
    /// Input images
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Symbologies to report (comma separated: qr,code128,ean13,upca)
    #[arg(long, value_delimiter = ',')]
    format: Vec<Symbology>,

    /// Scan every row and try more finder combinations
    #[arg(long)]
    try_harder: bool,

    /// Retry on the inverted image when nothing decodes
    #[arg(long)]
    try_invert: bool,

    /// auto, hybrid, otsu or a fixed level 0-255
    #[arg(long)]
    binarizer: Option<Binarizer>,

    /// Stop after this many symbols per image (0 = unlimited)
    #[arg(long)]
    max_symbols: Option<usize>,

    /// JSON file with decode options; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Args)]
struct EncodeArgs {
    /// Text or digits to encode
    text: String,

    /// qr, code128, ean13 or upca
    #[arg(long, default_value = "qr")]
    symbology: Symbology,

    /// QR error correction level
    #[arg(long, default_value = "M")]
    ec: ECLevel,

    /// Pixels per module
    #[arg(long, default_value = "4")]
    scale: usize,

    /// Quiet zone in modules
    #[arg(long, default_value = "4")]
    quiet: usize,

    /// Bar height in pixels for 1D symbols
    #[arg(long, default_value = "80")]
    height: usize,

    /// Output PNG path
    #[arg(short, long)]
    output: PathBuf,
}

#[derive(Serialize)]
struct ImageReport<'a> {
    image: &'a Path,
    results: &'a [DecodeResult],
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let outcome = match cli.command {
        Command::Decode(args) => run_decode(&args),
        Command::Encode(args) => run_encode(&args).map(|()| true),
    };
    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::from(2)
        }
    }
}

// ── decode ─────────────────────────────────────────────────────────────

fn decode_options(args: &DecodeArgs) -> CliResult<DecodeOptions> {
    let mut options = match &args.config {
        Some(path) => DecodeOptions::from_json_file(path)?,
        None => DecodeOptions::default(),
    };
    if !args.format.is_empty() {
        options = options.with_symbologies(args.format.iter().copied());
    }
    if args.try_harder {
        options = options.with_try_harder(true);
    }
    if args.try_invert {
        options = options.with_try_invert(true);
    }
    if let Some(binarizer) = args.binarizer {
        options = options.with_binarizer(binarizer);
    }
    if let Some(max) = args.max_symbols {
        options = options.with_max_symbols(max);
    }
    Ok(options)
}

/// `Ok(true)` when every image produced at least one symbol
fn run_decode(args: &DecodeArgs) -> CliResult<bool> {
    let options = decode_options(args)?;
    debug!(?options, "decode options");

    let mut all_found = true;
    let mut reports = Vec::new();
    for path in &args.images {
        let image = image::open(path).map_err(|e| format!("{}: {e}", path.display()))?;
        let results = decode_dynamic(&image, &options)?;
        info!(image = %path.display(), found = results.len(), "decoded");
        all_found &= !results.is_empty();

        if args.json {
            reports.push((path.clone(), results));
        } else {
            print_results(path, &results);
        }
    }

    if args.json {
        let reports: Vec<ImageReport<'_>> = reports
            .iter()
            .map(|(image, results)| ImageReport {
                image,
                results,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&reports)?);
    }
    Ok(all_found)
}

fn print_results(path: &Path, results: &[DecodeResult]) {
    println!("{}: {} symbol(s)", path.display(), results.len());
    for r in results {
        match &r.qr {
            Some(qr) => println!(
                "  {} v{} {} mask={} errors={}: {}",
                r.symbology,
                qr.version,
                qr.ec_level,
                qr.mask.bits(),
                r.error_count,
                r.text
            ),
            None => println!("  {}: {}", r.symbology, r.text),
        }
    }
}

// ── encode ─────────────────────────────────────────────────────────────

fn run_encode(args: &EncodeArgs) -> CliResult<()> {
    let options = DecodeOptions::default();
    let image: LumaImage<'static> = match args.symbology {
        Symbology::Qr => {
            let grid = encode_qr(&args.text, args.ec, &QrEncodeOptions::default(), &options)?;
            render_grid(&grid, args.scale, args.quiet)
        }
        Symbology::Code128 => render_bars(
            &encode_code128(&args.text, &options)?,
            args.scale,
            args.height,
            args.quiet.max(10),
        ),
        Symbology::Ean13 => render_bars(
            &encode_ean13(&args.text, &options)?,
            args.scale,
            args.height,
            args.quiet.max(9),
        ),
        Symbology::UpcA => render_bars(
            &encode_upca(&args.text, &options)?,
            args.scale,
            args.height,
            args.quiet.max(9),
        ),
    };

    let png = image::GrayImage::from_raw(
        image.width() as u32,
        image.height() as u32,
        image.pixels().to_vec(),
    )
    .ok_or("rendered image has inconsistent dimensions")?;
    png.save(&args.output)?;
    info!(output = %args.output.display(), width = image.width(), height = image.height(), "written");
    Ok(())
}
