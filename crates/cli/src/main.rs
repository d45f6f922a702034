use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use nesbridge::Instance;

/// Run a cartridge headless and dump what it produced.
#[derive(Parser)]
struct Args {
    /// iNES image to run
    rom: PathBuf,

    /// Number of frames to run
    #[arg(long, default_value_t = 60)]
    frames: u32,

    /// Controller 1 buttons held on every frame, as a byte
    #[arg(long, default_value_t = 0, value_parser = parse_byte)]
    pad: u8,

    /// Audio output rate in Hz
    #[arg(long, default_value_t = 44_100)]
    sample_rate: u32,

    /// Sprites per scanline: 0, 8 or 64
    #[arg(long, default_value_t = 8)]
    sprite_limit: i32,

    /// Battery RAM file, read before running if it exists and written afterwards
    #[arg(long)]
    battery: Option<PathBuf>,

    /// Save state to resume from
    #[arg(long)]
    load_state: Option<PathBuf>,

    /// Write a save state here when done
    #[arg(long)]
    save_state: Option<PathBuf>,

    /// Write the last frame here as PNG
    #[arg(long)]
    screenshot: Option<PathBuf>,

    /// Write all audio as raw signed 16 bit little endian mono
    #[arg(long)]
    audio: Option<PathBuf>,
}

fn parse_byte(s: &str) -> Result<u8, String> {
    let parsed = match s.strip_prefix("0x") {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| e.to_string())
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut nes = Instance::new();
    let rom = fs::read(&args.rom).with_context(|| format!("reading {}", args.rom.display()))?;
    nes.load_ines(&rom)?;
    nes.set_sample_rate(args.sample_rate)?;
    nes.set_sprite_mode(args.sprite_limit)?;

    if let Some(path) = args.battery.as_ref().filter(|p| p.exists()) {
        nes.load_battery_ram(&fs::read(path)?)?;
        log::info!("battery RAM loaded from {}", path.display());
    }
    if let Some(path) = &args.load_state {
        nes.load_state(&fs::read(path)?)?;
    }

    let mut pcm = Vec::new();
    let mut samples = vec![0i16; 4096];
    for _ in 0..args.frames {
        nes.emulate_frame(args.pad, 0)?;
        if args.audio.is_some() {
            let n = nes.read_samples(&mut samples);
            pcm.extend(samples[..n].iter().flat_map(|s| s.to_le_bytes()));
        }
    }
    log::info!("ran {} frames", args.frames);

    if let Some(path) = &args.audio {
        fs::write(path, &pcm)?;
    }

    if let Some(path) = &args.screenshot {
        let (w, h) = nes.dimensions();
        let mut bgra = vec![0; nes.blit_len()];
        nes.blit(&mut bgra);
        for px in bgra.chunks_exact_mut(4) {
            px.swap(0, 2);
        }
        image::save_buffer(path, &bgra, w as u32, h as u32, image::ExtendedColorType::Rgba8)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    if let Some(path) = &args.save_state {
        let mut state = vec![0; nes.state_size()?];
        nes.save_state(&mut state)?;
        fs::write(path, state)?;
    }

    if let Some(path) = &args.battery {
        if nes.has_battery_ram() {
            let mut ram = vec![0; nes.battery_ram_size()?];
            nes.save_battery_ram(&mut ram)?;
            fs::write(path, ram)?;
        }
    }

    Ok(())
}
