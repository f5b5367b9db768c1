use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::debug;
use recosa::{EncodeOptions, QualityPreset};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "recosa")]
#[command(version)]
#[command(about = "cosa block-DCT audio converter", long_about = None)]
struct Cli {
    /// Log header details, per-block progress and compression ratios
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode a mono audio file to cosa
    Encode {
        /// Input audio file (wav, flac, mp3, ogg, ...)
        input: PathBuf,
        /// Output cosa file
        output: PathBuf,
        /// Quality preset (low, medium, high, veryhigh, transparent)
        #[arg(short, long)]
        quality: Option<String>,
        /// Samples per block
        #[arg(short, long)]
        block_size: Option<usize>,
        /// Share of DCT coefficients kept per block, in (0, 1]
        #[arg(short = 'f', long, conflicts_with = "coeffs")]
        keep_fraction: Option<f64>,
        /// Exact number of DCT coefficients kept per block
        #[arg(short, long)]
        coeffs: Option<usize>,
        /// Bits per quantized coefficient (4-16)
        #[arg(short = 'n', long)]
        quant_bits: Option<u8>,
    },
    /// Decode a cosa file to WAV
    Decode {
        /// Input cosa file
        input: PathBuf,
        /// Output WAV file
        output: PathBuf,
    },
    /// Show information about a cosa file
    Info {
        /// Input cosa file
        input: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Compare two mono audio files sample-by-sample
    Compare {
        /// Reference audio file
        original: PathBuf,
        /// Processed audio file
        processed: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate a cosa file
    Validate {
        /// Input cosa file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match cli.command {
        Commands::Encode {
            input,
            output,
            quality,
            block_size,
            keep_fraction,
            coeffs,
            quant_bits,
        } => {
            let mut options = match quality {
                Some(name) => EncodeOptions::preset(name.parse::<QualityPreset>()?),
                None => EncodeOptions::default(),
            };
            if let Some(n) = block_size {
                options = options.with_block_size(n);
            }
            if let Some(f) = keep_fraction {
                options = options.with_keep_fraction(f);
            }
            if let Some(n) = coeffs {
                options = options.with_coeffs(n);
            }
            if let Some(b) = quant_bits {
                options = options.with_quant_bits(b);
            }
            encode(&input, &output, options)?;
        }
        Commands::Decode { input, output } => {
            decode(&input, &output)?;
        }
        Commands::Info { input, json } => {
            info(&input, json)?;
        }
        Commands::Compare {
            original,
            processed,
            json,
        } => {
            compare(&original, &processed, json)?;
        }
        Commands::Validate { input } => {
            validate(&input)?;
        }
    }

    Ok(())
}

fn encode(input: &Path, output: &Path, options: EncodeOptions) -> Result<()> {
    println!("Reading {}...", input.display());

    let audio_bytes = fs::read(input).context("Failed to read input file")?;
    let audio = recosa::audio::read_mono_pcm(&audio_bytes).context("Failed to read audio file")?;

    println!("  Sample rate: {} Hz", audio.sample_rate);
    println!("  Frames:      {}", audio.frames());
    println!("  Duration:    {:.2}s", audio.duration_secs());

    let params = options.params()?;
    println!(
        "Encoding: block size {}, {} coefficients, {} bits...",
        params.block_size(),
        params.num_coeffs(),
        params.quant_bits()
    );
    debug!(
        "expected compression ratio {:.2}:1",
        params.expected_compression_ratio()
    );

    let (cosa_data, stats) =
        recosa::encode_from_samples(&audio.samples, audio.sample_rate, options)
            .context("Failed to encode audio")?;

    fs::write(output, &cosa_data).context("Failed to write output file")?;

    let pcm_size = audio.samples.len() * 2;
    let ratio = pcm_size as f64 / cosa_data.len() as f64;
    debug!("actual compression ratio {:.2}:1", ratio);

    println!("Done!");
    println!("  Output: {}", output.display());
    println!("  Blocks: {}", stats.blocks);
    println!(
        "  Size: {} bytes ({:.1}x compression)",
        cosa_data.len(),
        ratio
    );

    Ok(())
}

fn decode(input: &Path, output: &Path) -> Result<()> {
    println!("Reading {}...", input.display());

    let cosa_data = fs::read(input).context("Failed to read cosa file")?;
    let stream = recosa::get_stream_info(&cosa_data)?;

    println!("  Sample rate: {} Hz", stream.header.sample_rate);
    println!("  Duration:    {:.2}s", stream.duration_secs);
    if !stream.complete {
        bail!(
            "{} is truncated: {} of {} bytes",
            input.display(),
            stream.file_size,
            stream.expected_size
        );
    }

    println!("Decoding...");
    let wav_bytes = recosa::decode_to_wav(&cosa_data).context("Failed to decode cosa file")?;

    fs::write(output, wav_bytes).context("Failed to write WAV file")?;

    println!("Done!");
    println!("  Output: {}", output.display());

    Ok(())
}

fn info(input: &Path, json: bool) -> Result<()> {
    let cosa_data = fs::read(input).context("Failed to read cosa file")?;
    let stream = recosa::get_stream_info(&cosa_data)?;

    if json {
        let json_str =
            serde_json::to_string_pretty(&stream).context("Failed to serialize stream info")?;
        println!("{}", json_str);
        return Ok(());
    }

    let header = &stream.header;
    println!("cosa Audio File");
    println!("───────────────────────────────");
    println!("  Sample rate:  {} Hz", header.sample_rate);
    println!("  Frames:       {}", header.total_frames);
    println!("  Duration:     {:.2}s", stream.duration_secs);
    println!("  Block size:   {}", header.block_size);
    println!("  Coefficients: {}", header.num_coeffs);
    println!("  Quant bits:   {}", header.quant_bits);
    println!("  Blocks:       {}", stream.block_count);
    println!("  File size:    {} bytes", stream.file_size);
    println!("  Compression:  {:.1}x", stream.compression_ratio);
    println!(
        "  Complete:     {}",
        if stream.complete { "yes" } else { "no" }
    );

    Ok(())
}

fn compare(original: &Path, processed: &Path, json: bool) -> Result<()> {
    let original_bytes = fs::read(original).context("Failed to read original file")?;
    let processed_bytes = fs::read(processed).context("Failed to read processed file")?;

    let metrics = recosa::compare_audio(&original_bytes, &processed_bytes)?;

    if json {
        // an infinite snr (identical signals) comes out as null
        let json_str =
            serde_json::to_string_pretty(&metrics).context("Failed to serialize metrics")?;
        println!("{}", json_str);
        return Ok(());
    }

    println!("Samples:         {}", metrics.num_samples);
    println!("MSE:             {:.4}", metrics.mse);
    println!("Max abs error:   {}", metrics.max_abs_error);
    if metrics.snr_db.is_finite() {
        println!("SNR:             {:.2} dB", metrics.snr_db);
    } else {
        println!("SNR:             inf (identical)");
    }
    println!("Quality:         {}", metrics.quality_label());

    Ok(())
}

fn validate(input: &Path) -> Result<()> {
    let cosa_data = fs::read(input).context("Failed to read cosa file")?;

    let is_valid = recosa::validate_stream(&cosa_data).context("Validation failed")?;

    if is_valid {
        println!("✓ {} is a valid cosa file", input.display());
        Ok(())
    } else {
        bail!("✗ {} is truncated", input.display())
    }
}
