use std::{env, error::Error, path::PathBuf, sync::Arc, time::Duration};

use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use colored::Colorize;
use flipbook::{
    ConvertOptions, EncoderOptions, FfmpegLogLevel, FileSource, OperationType, ProgressCallback,
    ProgressInfo, VideoCodec, VideoEncoder, derive_output_path, normalize_separators,
    process_animation, resolve_input_path, write_animation,
};
use indicatif::{ProgressBar, ProgressStyle};
use log::LevelFilter;

const CLI_AFTER_HELP: &str = "Examples:\n  flipbook cat.webp\n  flipbook clips/cat.gif -o videos/cat.mp4 --timeout 120\n  flipbook cat.webp --codec h265 --workers 4 --progress\n  flipbook cat.webp --json\n  flipbook --completions zsh > _flipbook";

#[derive(Debug, Parser)]
#[command(
    name = "flipbook",
    version,
    about = "Convert animated GIF, WebP and APNG images into videos",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    /// Animated image to convert, relative to the working directory.
    #[arg(required_unless_present = "completions")]
    filename: Option<String>,

    /// Output file name. Default is the source file name with a .mp4 extension.
    #[arg(short, long)]
    outfile: Option<String>,

    /// Seconds to wait for each decode worker before giving up.
    #[arg(short, long, default_value = "30", value_parser = parse_timeout)]
    timeout: Duration,

    /// Number of decode workers (1-16). Defaults to the number of CPUs.
    #[arg(long)]
    workers: Option<usize>,

    /// Output codec (h264, h265, mpeg4).
    #[arg(long, default_value = "h264", value_parser = parse_codec)]
    codec: VideoCodec,

    /// Show a progress bar while decoding.
    #[arg(long)]
    progress: bool,

    /// Show debug logging output.
    #[arg(long)]
    verbose: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long)]
    log_level: Option<FfmpegLogLevel>,

    /// Print the conversion summary as JSON.
    #[arg(long)]
    json: bool,

    /// Print shell completions and exit.
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    let seconds: f64 = value
        .parse()
        .map_err(|_| format!("not a number of seconds: {value}"))?;
    if !seconds.is_finite() || seconds <= 0.0 {
        return Err(format!("timeout must be positive, got {value}"));
    }
    Ok(Duration::from_secs_f64(seconds))
}

fn parse_codec(value: &str) -> Result<VideoCodec, String> {
    match value.to_ascii_lowercase().as_str() {
        "h264" | "avc" | "x264" => Ok(VideoCodec::H264),
        "h265" | "hevc" | "x265" => Ok(VideoCodec::H265),
        "mpeg4" => Ok(VideoCodec::Mpeg4),
        other => Err(format!("unsupported codec: {other}")),
    }
}

fn init_logging(verbose: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn Error>> {
        let bar = ProgressBar::new(0);
        let style =
            ProgressStyle::with_template("{spinner:.green} {msg:>11} {bar:40.cyan/blue} {pos}/{len}")?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let label = match info.operation {
            OperationType::FrameDecoding => "decoding",
            OperationType::Compositing => "compositing",
            _ => "working",
        };
        self.bar.set_message(label);
        if let Some(total) = info.total {
            self.bar.set_length(total);
        }
        self.bar.set_position(info.current);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Some(shell) = cli.completions {
        let mut command = Cli::command();
        clap_complete::generate(shell, &mut command, "flipbook", &mut std::io::stdout());
        return Ok(());
    }

    let filename = cli.filename.as_deref().ok_or("missing input filename")?;

    if let Some(level) = cli.log_level {
        flipbook::set_ffmpeg_log_level(level);
    }

    let base_dir = env::current_dir()?;
    let input = resolve_input_path(filename, &base_dir)?;
    let outfile = match &cli.outfile {
        Some(outfile) => PathBuf::from(normalize_separators(outfile)),
        None => derive_output_path(filename, &base_dir),
    };
    let output = base_dir.join(outfile);

    let mut options = ConvertOptions::new().with_timeout(cli.timeout);
    if let Some(workers) = cli.workers {
        options = options.with_max_workers(workers);
    }

    let progress = if cli.progress {
        Some(Arc::new(TerminalProgress::new()?))
    } else {
        None
    };
    if let Some(progress) = &progress {
        options = options.with_progress(Arc::clone(progress) as Arc<dyn ProgressCallback>);
    }

    let encoder = VideoEncoder::new(
        EncoderOptions::new()
            .with_codec(cli.codec)
            .with_threads(options.max_workers()),
    );

    log::debug!("Converting {} -> {}", input.display(), output.display());
    let result = process_animation(Arc::new(FileSource::new(&input)), &options);
    if let Some(progress) = &progress {
        progress.bar.finish_and_clear();
    }
    let processed = result?;

    if !cli.json {
        println!(
            "Image processed in {:.2} seconds. Detected {:.2} fps",
            processed.elapsed.as_secs_f64(),
            processed.frames_per_second
        );
        if processed.timing.is_variable {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!(
                    "frame durations vary from {} to {} ms; the video plays at a constant {:.2} fps",
                    processed.timing.min_ms,
                    processed.timing.max_ms,
                    processed.frames_per_second
                )
                .yellow()
            );
        }
    }

    let summary = write_animation(processed, &output, &encoder)?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary.to_json())?);
        return Ok(());
    }

    println!(
        "{} {} ({} frames, {:.2}s)",
        "wrote".green().bold(),
        summary.output.display(),
        summary.frames,
        summary.encoding_time.as_secs_f64()
    );

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_codec_aliases() {
        assert_eq!(parse_codec("h264"), Ok(VideoCodec::H264));
        assert_eq!(parse_codec("HEVC"), Ok(VideoCodec::H265));
        assert_eq!(parse_codec("mpeg4"), Ok(VideoCodec::Mpeg4));
        assert!(parse_codec("vp9").is_err());
    }

    #[test]
    fn parse_timeout_values() {
        assert_eq!(parse_timeout("30"), Ok(Duration::from_secs(30)));
        assert_eq!(parse_timeout("0.5"), Ok(Duration::from_millis(500)));
        assert!(parse_timeout("0").is_err());
        assert!(parse_timeout("-3").is_err());
        assert!(parse_timeout("soon").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn default_flags_and_short_options() {
        let cli = Cli::try_parse_from(["flipbook", "cat.webp"]).unwrap();
        assert_eq!(cli.filename.as_deref(), Some("cat.webp"));
        assert_eq!(cli.timeout, Duration::from_secs(30));
        assert_eq!(cli.codec, VideoCodec::H264);
        assert!(cli.outfile.is_none());

        let cli = Cli::try_parse_from(["flipbook", "cat.webp", "-o", "out/cat.mp4", "-t", "5"])
            .unwrap();
        assert_eq!(cli.outfile.as_deref(), Some("out/cat.mp4"));
        assert_eq!(cli.timeout, Duration::from_secs(5));
    }

    #[test]
    fn filename_is_required_without_completions() {
        assert!(Cli::try_parse_from(["flipbook"]).is_err());
        assert!(Cli::try_parse_from(["flipbook", "--completions", "bash"]).is_ok());
    }
}
