use std::{
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "capgif", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Burn a caption band into a GIF and re-export it.
    Caption(CaptionArgs),
}

#[derive(Parser, Debug)]
struct CaptionArgs {
    /// Input GIF.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output GIF path.
    #[arg(long)]
    out: PathBuf,

    /// Caption text. Wrapped automatically to the content width.
    #[arg(long)]
    caption: String,

    /// Regular TTF/OTF font.
    #[arg(long)]
    font: PathBuf,

    /// Bold face. When absent, bold styling is synthesized.
    #[arg(long)]
    font_bold: Option<PathBuf>,

    /// Caption style JSON file. Flags below override individual fields.
    #[arg(long)]
    style: Option<PathBuf>,

    #[arg(long)]
    bold: bool,

    #[arg(long)]
    condensed: bool,

    /// Text color as hex, RRGGBB or RRGGBBAA.
    #[arg(long)]
    color: Option<String>,

    /// Encoder speed/quality, 1 (best) ..= 30 (fastest).
    #[arg(long, default_value_t = 10)]
    quality: i32,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Caption(args) => cmd_caption(args),
    }
}

fn read_style_json(path: &Path) -> anyhow::Result<capgif::CaptionStyle> {
    let f = File::open(path).with_context(|| format!("open style '{}'", path.display()))?;
    let r = BufReader::new(f);
    let style: capgif::CaptionStyle =
        serde_json::from_reader(r).with_context(|| "parse style JSON")?;
    Ok(style)
}

fn cmd_caption(args: CaptionArgs) -> anyhow::Result<()> {
    let mut style = match &args.style {
        Some(path) => read_style_json(path)?,
        None => capgif::CaptionStyle::default(),
    };
    if args.bold {
        style.bold = true;
    }
    if args.condensed {
        style.condensed = true;
    }
    if let Some(hex) = &args.color {
        style.color = parse_hex_color(hex)?;
    }

    let regular = std::fs::read(&args.font)
        .with_context(|| format!("read font '{}'", args.font.display()))?;
    let bold = match &args.font_bold {
        Some(path) => Some(
            std::fs::read(path).with_context(|| format!("read font '{}'", path.display()))?,
        ),
        None => None,
    };
    let fonts = capgif::FontBank::from_bytes(&regular, bold.as_deref())?;

    let mut player = capgif::CaptionPlayer::with_style(capgif::SurfaceSlot::with_fonts(fonts), style);
    player.load_source(Box::new(capgif::GifDriver::open(&args.in_path)?))?;
    player.set_caption_text(&args.caption);

    let (width, height) = player.surface_size();
    let mut cfg = capgif::GifSinkConfig::new(width, height);
    cfg.speed = args.quality;
    let sink = capgif::GifSink::new(cfg)?;

    let bytes = player.export_to_sink(
        Box::new(sink),
        Some(Box::new(|p: capgif::ExportProgress| {
            eprint!("\rencoding frame {}/{}", p.captured, p.total);
            if p.captured == p.total {
                eprintln!();
            }
        })),
    )?;

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, &bytes)
        .with_context(|| format!("write gif '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn parse_hex_color(hex: &str) -> anyhow::Result<[u8; 4]> {
    let s = hex.trim_start_matches('#');
    // Byte-indexed slicing below; non-ASCII input would split a char.
    if !s.is_ascii() {
        anyhow::bail!("color '{hex}' must be RRGGBB or RRGGBBAA");
    }
    let byte = |i: usize| -> anyhow::Result<u8> {
        u8::from_str_radix(&s[i..i + 2], 16).with_context(|| format!("parse hex color '{hex}'"))
    };
    match s.len() {
        6 => Ok([byte(0)?, byte(2)?, byte(4)?, 255]),
        8 => Ok([byte(0)?, byte(2)?, byte(4)?, byte(6)?]),
        _ => anyhow::bail!("color '{hex}' must be RRGGBB or RRGGBBAA"),
    }
}
