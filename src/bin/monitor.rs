use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use log::info;

use pulseframe::capture::SpectrumSource;
use pulseframe::{EngineConfig, FeatureEngine};

/// Live feature monitor: microphone in, one status line per frame out.
#[derive(Parser)]
#[command(name = "pulseframe-monitor")]
struct Args {
    /// FFT window size in samples.
    #[arg(long, default_value_t = 2048)]
    fft_size: usize,

    /// Load engine settings from a JSON config file.
    #[arg(long)]
    config: Option<String>,

    /// Print one line per frame instead of a rewriting status line.
    #[arg(long)]
    scroll: bool,
}

fn meter(value: f32, full_scale: f32) -> String {
    let steps = ((value / full_scale) * 8.0).clamp(0.0, 8.0) as usize;
    let mut bar = String::with_capacity(8);
    for i in 0..8 {
        bar.push(if i < steps { '#' } else { '.' });
    }
    bar
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig {
            fft_size: args.fft_size,
            ..EngineConfig::default()
        },
    };

    let fft_size = config.fft_size;
    let mut engine = FeatureEngine::new(config)?;
    let mut source = SpectrumSource::from_default_input(fft_size)?;

    info!(
        "Monitoring default input at {} Hz, fft size {}",
        source.sample_rate(),
        fft_size
    );

    let mut stdout = std::io::stdout();
    loop {
        let Some(frame) = source.poll_frame() else {
            std::thread::sleep(Duration::from_millis(5));
            continue;
        };

        let features = engine.process(&frame);
        let beat_mark = if features.is_beat { '*' } else { ' ' };
        let onset_mark = if features.is_onset { '^' } else { ' ' };
        let line = format!(
            "{:8.2}s [{}] bass {} mid {} high {} | {:3} BPM ({:.2}) {}{}",
            features.timestamp,
            meter(features.flux, 2.0),
            meter(features.bands.bass, 255.0),
            meter(features.bands.mid, 255.0),
            meter(features.bands.high, 255.0),
            features.tempo_bpm,
            features.tempo_confidence,
            beat_mark,
            onset_mark,
        );

        if args.scroll {
            writeln!(stdout, "{line}")?;
        } else {
            write!(stdout, "\r{line}")?;
            stdout.flush()?;
        }
    }
}
