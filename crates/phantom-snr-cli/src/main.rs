//! phantom-snr CLI: measure phantom SNR in grayscale images and write
//! annotated PNGs.

mod session;

use clap::{Args, Parser, Subcommand, ValueEnum};
use phantom_snr::{
    AnalysisConfig, AnalysisReport, Analyzer, Metadata, MetadataValue, PixelGrid, SnrAnchor,
    TrueTypeFont,
};
use std::path::{Path, PathBuf};

use session::Session;

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "phantom-snr")]
#[command(about = "Segment an imaging phantom and measure its signal-to-noise ratio")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one or more images and write annotated PNGs.
    Analyze(CliAnalyzeArgs),

    /// Print the default analysis configuration as JSON.
    DefaultConfig,
}

#[derive(Debug, Clone, Args)]
struct CliAnalyzeArgs {
    /// Input images (8- or 16-bit grayscale PNG/TIFF).
    #[arg(long = "image", required = true, num_args = 1..)]
    images: Vec<PathBuf>,

    /// Directory for the annotated `<stem>_snr.png` outputs.
    #[arg(long, default_value = ".")]
    out_dir: PathBuf,

    /// Write a JSON report covering every processed image.
    #[arg(long)]
    report: Option<PathBuf>,

    /// Analysis configuration (JSON). Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Normalized threshold; samples strictly above it are phantom.
    #[arg(long)]
    threshold: Option<u8>,

    /// Side of the square structuring element (odd).
    #[arg(long)]
    kernel_size: Option<u32>,

    /// Erosion/dilation iterations.
    #[arg(long)]
    iterations: Option<u32>,

    /// Significant bits per sample (e.g. 12 for 12-bit data in a 16-bit PNG).
    #[arg(long)]
    bit_depth: Option<u8>,

    /// Sequence name to annotate.
    #[arg(long)]
    sequence_name: Option<String>,

    /// Flip angle to annotate (number or free text).
    #[arg(long)]
    flip_angle: Option<String>,

    /// TrueType font for annotations (built-in bitmap font when omitted).
    #[arg(long)]
    font: Option<PathBuf>,

    /// Font size in pixels for --font.
    #[arg(long, default_value = "13.0")]
    font_size: f32,

    /// Horizontal anchoring of the SNR label.
    #[arg(long, value_enum)]
    snr_anchor: Option<SnrAnchorArg>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SnrAnchorArg {
    OwnWidth,
    LastNoiseLine,
}

impl SnrAnchorArg {
    fn to_core(self) -> SnrAnchor {
        match self {
            Self::OwnWidth => SnrAnchor::OwnWidth,
            Self::LastNoiseLine => SnrAnchor::LastNoiseLine,
        }
    }
}

impl CliAnalyzeArgs {
    fn to_config(&self) -> CliResult<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_json_file(path)?,
            None => AnalysisConfig::default(),
        };
        if let Some(t) = self.threshold {
            config.segment.threshold = t;
        }
        if let Some(k) = self.kernel_size {
            config.morphology.kernel_size = k;
        }
        if let Some(n) = self.iterations {
            config.morphology.iterations = n;
        }
        if let Some(anchor) = self.snr_anchor {
            config.render.snr_anchor = anchor.to_core();
        }
        config.validate()?;
        Ok(config)
    }

    fn to_metadata(&self) -> Metadata {
        Metadata {
            sequence_name: self.sequence_name.clone(),
            flip_angle: self.flip_angle.as_deref().map(MetadataValue::parse),
        }
    }

    fn to_analyzer(&self) -> CliResult<Analyzer> {
        let config = self.to_config()?;
        Ok(match &self.font {
            Some(path) => {
                let font = TrueTypeFont::from_file(path, self.font_size)?;
                Analyzer::with_glyphs(config, Box::new(font))
            }
            None => Analyzer::new(config),
        })
    }
}

fn main() -> CliResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze(args) => run_analyze(&args),
        Commands::DefaultConfig => run_default_config(),
    }
}

// ── default-config ─────────────────────────────────────────────────────

fn run_default_config() -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(&AnalysisConfig::default())?);
    Ok(())
}

// ── analyze ────────────────────────────────────────────────────────────

/// Decode an image file into a pixel grid.
///
/// 8-bit inputs keep their values; deeper inputs are read as 16-bit luma.
/// `bit_depth` overrides the maximum representable value.
fn load_grid(path: &Path, bit_depth: Option<u8>) -> CliResult<PixelGrid> {
    let img = image::open(path).map_err(|e| -> CliError {
        format!("Failed to open image {}: {}", path.display(), e).into()
    })?;
    let color = img.color();
    let bits = color.bits_per_pixel() / color.channel_count() as u16;

    let grid = if bits <= 8 {
        let gray8 = PixelGrid::from_gray8(&img.to_luma8());
        match bit_depth {
            Some(b) => PixelGrid::with_bit_depth(gray8.samples().clone(), b)?,
            None => gray8,
        }
    } else {
        PixelGrid::with_bit_depth(img.into_luma16(), bit_depth.unwrap_or(16))?
    };
    tracing::info!(
        "Loaded {} ({}x{}, max value {})",
        path.display(),
        grid.width(),
        grid.height(),
        grid.source_max()
    );
    Ok(grid)
}

fn output_path(input: &Path, out_dir: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    out_dir.join(format!("{}_snr.png", stem))
}

/// Analyze one file, save the annotated PNG and return its path and report.
fn process_one(
    path: &Path,
    analyzer: &Analyzer,
    metadata: &Metadata,
    args: &CliAnalyzeArgs,
) -> CliResult<(PathBuf, AnalysisReport)> {
    let grid = load_grid(path, args.bit_depth)?;
    let analysis = analyzer.analyze(&grid, metadata)?;

    std::fs::create_dir_all(&args.out_dir)?;
    let out = output_path(path, &args.out_dir);
    analysis.image.save(&out)?;
    tracing::info!("Result saved as {}", out.display());
    Ok((out, analysis.report))
}

fn run_analyze(args: &CliAnalyzeArgs) -> CliResult<()> {
    let analyzer = args.to_analyzer()?;
    let metadata = args.to_metadata();

    let mut session = Session::new();
    let mut reports = Vec::new();
    for path in &args.images {
        session.process_file(path, |p| {
            let (out, report) = process_one(p, &analyzer, &metadata, args)?;
            reports.push(serde_json::json!({
                "input": p.display().to_string(),
                "output": out.display().to_string(),
                "report": report,
            }));
            Ok(out)
        });
    }

    if let Some(report_path) = &args.report {
        let json = serde_json::to_string_pretty(&reports)?;
        std::fs::write(report_path, &json)?;
        tracing::info!("Report written to {}", report_path.display());
    }

    let n = session.finish()?;
    tracing::info!("Processed {} file(s)", n);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GrayImage, ImageBuffer, Luma};

    fn args_for(images: Vec<PathBuf>, out_dir: PathBuf) -> CliAnalyzeArgs {
        CliAnalyzeArgs {
            images,
            out_dir,
            report: None,
            config: None,
            threshold: None,
            kernel_size: None,
            iterations: None,
            bit_depth: None,
            sequence_name: Some("se".to_string()),
            flip_angle: Some("90".to_string()),
            font: None,
            font_size: 13.0,
            snr_anchor: None,
        }
    }

    #[test]
    fn cli_parses_analyze_flags() {
        let cli = Cli::try_parse_from([
            "phantom-snr",
            "analyze",
            "--image",
            "a.png",
            "b.png",
            "--threshold",
            "60",
            "--snr-anchor",
            "last-noise-line",
            "--flip-angle",
            "15",
        ])
        .unwrap();
        let Commands::Analyze(args) = cli.command else {
            panic!("expected analyze");
        };
        assert_eq!(args.images.len(), 2);
        let config = args.to_config().unwrap();
        assert_eq!(config.segment.threshold, 60);
        assert_eq!(config.render.snr_anchor, SnrAnchor::LastNoiseLine);
        assert_eq!(
            args.to_metadata().flip_angle,
            Some(MetadataValue::Number(15.0))
        );
    }

    #[test]
    fn even_kernel_flag_is_rejected() {
        let mut args = args_for(vec!["a.png".into()], ".".into());
        args.kernel_size = Some(4);
        assert!(args.to_config().is_err());
    }

    #[test]
    fn sixteen_bit_input_honors_bit_depth_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in16.png");
        let img: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::from_fn(4, 4, |x, _| Luma([x as u16 * 1000]));
        img.save(&path).unwrap();

        let grid = load_grid(&path, Some(12)).unwrap();
        assert_eq!(grid.source_max(), 4095);
        assert_eq!(grid.get(3, 0), 3000);

        let grid = load_grid(&path, None).unwrap();
        assert_eq!(grid.source_max(), u16::MAX);
    }

    #[test]
    fn eight_bit_input_keeps_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("in8.png");
        GrayImage::from_pixel(3, 3, Luma([200])).save(&path).unwrap();
        let grid = load_grid(&path, None).unwrap();
        assert_eq!(grid.source_max(), 255);
        assert_eq!(grid.get(1, 1), 200);
    }

    #[test]
    fn analyze_writes_png_and_report() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("phantom.png");
        GrayImage::from_fn(80, 80, |x, y| {
            let inside = (20..60).contains(&x) && (20..60).contains(&y);
            Luma([if inside { 200 } else { ((x + y) % 3) as u8 }])
        })
        .save(&input)
        .unwrap();

        let out_dir = dir.path().join("out");
        let mut args = args_for(vec![input.clone(), dir.path().join("nope.png")], out_dir);
        let report_path = dir.path().join("report.json");
        args.report = Some(report_path.clone());

        // The missing second file makes the run fail, but the first is written.
        assert!(run_analyze(&args).is_err());
        let out = dir.path().join("out").join("phantom_snr.png");
        let written = image::open(&out).unwrap().to_rgb8();
        assert_eq!(written.dimensions(), (80, 80));

        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
        let entries = report.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert!(entries[0]["report"]["snr"].is_number());
    }

    #[test]
    fn output_name_uses_input_stem() {
        assert_eq!(
            output_path(Path::new("/data/scan01.dcm.png"), Path::new("out")),
            PathBuf::from("out/scan01.dcm_snr.png")
        );
    }
}
