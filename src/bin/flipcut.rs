use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "flipcut", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Process a source image into a background-keyed cutout PNG.
    Cutout(CutoutArgs),
    /// Render a single posed frame as a PNG.
    Frame(FrameArgs),
    /// Export the pose document as a video (requires `ffmpeg` on PATH).
    Render(RenderArgs),
    /// Write the 96x54 timeline thumbnails, one PNG per frame.
    Thumbs(ThumbsArgs),
}

#[derive(Parser, Debug)]
struct CutoutArgs {
    /// Source image (any format the `image` crate decodes).
    #[arg(long)]
    image: PathBuf,

    /// Output PNG path (keeps alpha).
    #[arg(long)]
    out: PathBuf,

    /// Background removal threshold (0-255).
    #[arg(long, default_value_t = 235)]
    threshold: u8,

    /// Hue rotation in degrees (-180..=180).
    #[arg(long, default_value_t = 0.0)]
    hue: f64,

    /// Saturation multiplier (0..=3).
    #[arg(long, default_value_t = 1.0)]
    saturation: f64,

    /// Brightness multiplier (0..=2).
    #[arg(long, default_value_t = 1.0)]
    brightness: f64,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Input pose document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Source image for the cutout.
    #[arg(long)]
    image: PathBuf,

    /// Frame index (0-based).
    #[arg(long)]
    frame: usize,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Ghost the previous frame at reduced opacity.
    #[arg(long)]
    onion: bool,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Input pose document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Source image for the cutout.
    #[arg(long)]
    image: PathBuf,

    /// Output video path (extension follows the codec actually used).
    #[arg(long)]
    out: PathBuf,

    /// Preferred codec; falls back to h264 if unavailable.
    #[arg(long, value_enum, default_value_t = CodecChoice::Vp9)]
    codec: CodecChoice,
}

#[derive(Parser, Debug)]
struct ThumbsArgs {
    /// Input pose document JSON.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Source image for the cutout.
    #[arg(long)]
    image: PathBuf,

    /// Output directory for thumb_NNN.png files.
    #[arg(long)]
    out_dir: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CodecChoice {
    Vp9,
    H264,
}

impl From<CodecChoice> for flipcut::VideoCodec {
    fn from(c: CodecChoice) -> Self {
        match c {
            CodecChoice::Vp9 => flipcut::VideoCodec::Vp9,
            CodecChoice::H264 => flipcut::VideoCodec::H264,
        }
    }
}

/// Command transport for the headless CLI: stage, tick rate, processing
/// settings, and one transform per frame. Not a session save format.
#[derive(Debug, serde::Deserialize)]
struct Document {
    stage: flipcut::Stage,
    #[serde(default = "default_fps")]
    fps: u32,
    #[serde(default)]
    processing: flipcut::ProcessingParameters,
    #[serde(default)]
    onion_skin: bool,
    frames: Vec<flipcut::PoseTransform>,
}

fn default_fps() -> u32 {
    8
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Cutout(args) => cmd_cutout(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
        Command::Thumbs(args) => cmd_thumbs(args),
    }
}

fn read_document(path: &Path) -> anyhow::Result<Document> {
    let f = File::open(path).with_context(|| format!("open document '{}'", path.display()))?;
    let doc: Document =
        serde_json::from_reader(BufReader::new(f)).context("parse pose document JSON")?;
    for (i, t) in doc.frames.iter().enumerate() {
        t.validate()
            .with_context(|| format!("frame {i} has an invalid transform"))?;
    }
    doc.processing.validate()?;
    Ok(doc)
}

fn read_image(path: &Path) -> anyhow::Result<flipcut::Surface> {
    let bytes =
        std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    Ok(flipcut::Surface::decode_bytes(&bytes)?)
}

fn build_session(doc: &Document, image: &Path) -> anyhow::Result<flipcut::EditorSession> {
    let mut session = flipcut::EditorSession::new(doc.stage);
    session.set_processing(doc.processing)?;
    session.set_source(read_image(image)?);
    for transform in &doc.frames {
        session.sequence.add_frame(doc.stage);
        session
            .sequence
            .active_frame_mut()
            .expect("frame just added")
            .transform = *transform;
    }
    Ok(session)
}

fn save_png(surface: &flipcut::Surface, out: &Path) -> anyhow::Result<()> {
    if let Some(parent) = out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    image::save_buffer_with_format(
        out,
        &surface.data,
        surface.width,
        surface.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", out.display()))
}

fn cmd_cutout(args: CutoutArgs) -> anyhow::Result<()> {
    let params = flipcut::ProcessingParameters {
        threshold: args.threshold,
        hue: args.hue,
        saturation: args.saturation,
        brightness: args.brightness,
    };
    params.validate()?;
    let source = read_image(&args.image)?;
    let cutout = flipcut::process(&source, &params);
    save_png(&cutout, &args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let doc = read_document(&args.in_path)?;
    let mut session = build_session(&doc, &args.image)?;
    if args.frame >= session.sequence.len() {
        anyhow::bail!(
            "frame index {} out of range (document has {} frames)",
            args.frame,
            session.sequence.len()
        );
    }
    session.sequence.set_active(args.frame);
    let onion = args.onion || doc.onion_skin;
    let frame = flipcut::render(session.stage, &session.sequence, session.cutout(), onion);
    save_png(&frame, &args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let doc = read_document(&args.in_path)?;
    let mut session = build_session(&doc, &args.image)?;
    let fps = flipcut::Fps::new(doc.fps)?;
    let written = flipcut::export_video(
        &mut session,
        fps,
        doc.onion_skin,
        args.codec.into(),
        &args.out,
    )?;
    eprintln!("wrote {}", written.display());
    Ok(())
}

fn cmd_thumbs(args: ThumbsArgs) -> anyhow::Result<()> {
    let doc = read_document(&args.in_path)?;
    let session = build_session(&doc, &args.image)?;
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;
    for (i, frame) in session.sequence.frames().iter().enumerate() {
        let thumb = flipcut::render_thumbnail(frame, session.cutout(), 96, 54);
        let out = args.out_dir.join(format!("thumb_{i:03}.png"));
        save_png(&thumb, &out)?;
    }
    eprintln!(
        "wrote {} thumbnails to {}",
        session.sequence.len(),
        args.out_dir.display()
    );
    Ok(())
}
