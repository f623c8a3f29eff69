use anyhow::{Context, Result, bail};
use camino::Utf8PathBuf;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mindcanvas::{Canvas, CanvasConfig, ContentMode, ExportFormat, Vec2, script};

#[derive(Parser, Debug)]
#[command(author, version, about = "Seed a study canvas from generated content and export it", long_about = None)]
struct Cli {
    /// Generated content JSON (mind-map or notes)
    #[arg(value_name = "CONTENT_FILE")]
    content_file: Utf8PathBuf,

    /// Mode used for the placeholder when the content is unusable
    #[arg(long, value_enum, default_value_t = ContentMode::MindMap)]
    mode: ContentMode,

    #[arg(long, value_enum, default_value_t = ExportFormat::Text)]
    format: ExportFormat,

    /// JSON file overriding canvas defaults
    #[arg(long, value_name = "FILE")]
    config: Option<Utf8PathBuf>,

    /// JSON array of pointer events and commands to replay before export
    #[arg(long, value_name = "FILE")]
    script: Option<Utf8PathBuf>,

    /// Write the export here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<Utf8PathBuf>,

    /// Canvas size used for the initial fit, e.g. 1200x800
    #[arg(long, value_name = "WxH", default_value = "1200x800", value_parser = parse_size)]
    canvas_size: Vec2,
}

fn parse_size(s: &str) -> Result<Vec2> {
    let Some((w, h)) = s.split_once(['x', 'X']) else {
        bail!("expected WIDTHxHEIGHT, got {s:?}");
    };
    let w: f32 = w.trim().parse().with_context(|| format!("Bad width in {s:?}"))?;
    let h: f32 = h.trim().parse().with_context(|| format!("Bad height in {s:?}"))?;
    if !(w > 0.0 && h > 0.0) {
        bail!("canvas size must be positive, got {s:?}");
    }
    Ok(Vec2::new(w, h))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => CanvasConfig::load(path)?,
        None => CanvasConfig::default(),
    };

    let raw = std::fs::read_to_string(&cli.content_file)
        .with_context(|| format!("Open {}", cli.content_file))?;

    let mut canvas = Canvas::new(cli.mode, config);
    canvas.set_canvas_size(cli.canvas_size);
    canvas.load_raw(&raw);
    info!(
        file = %cli.content_file,
        nodes = canvas.store().len(),
        placeholder = canvas.is_placeholder(),
        "canvas ready"
    );

    if let Some(path) = &cli.script {
        let steps = script::load(path)?;
        script::replay(&mut canvas, &steps);
        info!(steps = steps.len(), "script replayed");
    }

    match &cli.output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Create {}", path))?;
            canvas.export(cli.format, std::io::BufWriter::new(file))?;
        }
        None => canvas.export(cli.format, std::io::stdout().lock())?,
    }
    Ok(())
}
