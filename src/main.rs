use std::fs::File;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::filter::LevelFilter;

use track_resolver::fusion::{DegeneratePolicy, FrameRangePolicy};
use track_resolver::host::{RecordedKeyframes, resolve_camera_tracks};
use track_resolver::io::{CsvKeyframeWriter, Scene};

/// Reconstruct one 3D trajectory from motion tracks seen by several cameras.
#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Scene YAML describing cameras, clips and target objects.
    #[arg(long)]
    scene: PathBuf,

    /// Objects to fuse. Defaults to every object in the scene.
    #[arg(long = "select", value_name = "OBJECT")]
    select: Vec<String>,

    /// Keyframe CSV to write. Defaults to stdout.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Also evaluate the last frame of the latest-ending track.
    #[arg(long)]
    inclusive_end: bool,

    /// Skip parallel camera pairs instead of failing.
    #[arg(long)]
    skip_degenerate: bool,

    /// Never pair two tracks that share a camera.
    #[arg(long)]
    skip_same_camera_pairs: bool,

    /// Evaluate frames in parallel (needs the `rayon` feature).
    #[arg(long)]
    parallel: bool,

    /// Log level (off, trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

/// Write `keys` as CSV into `out`, flushing before returning.
fn write_keyframes<W: Write>(keys: &RecordedKeyframes, out: W) -> Result<()> {
    let mut writer = CsvKeyframeWriter::new(out)?;
    keys.replay_into(&mut writer)?;
    drop(writer.finish()?);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_max_level(args.log_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let scene = Scene::load(&args.scene)?;

    let mut config = scene.fusion;
    if args.inclusive_end {
        config.frame_range = FrameRangePolicy::Inclusive;
    }
    if args.skip_degenerate {
        config.on_degenerate = DegeneratePolicy::SkipPair;
    }
    if args.skip_same_camera_pairs {
        config.include_same_camera_pairs = false;
    }
    if args.parallel {
        config.parallel = true;
    }

    let selection = if args.select.is_empty() {
        scene.object_names()
    } else {
        args.select.clone()
    };
    info!("Loaded {:?}, fusing {} objects", args.scene, selection.len());

    // Resolve fully before creating any output.
    let mut keys = RecordedKeyframes::new();
    let summary = resolve_camera_tracks(&scene, &selection, &config, &mut keys)?;

    match &args.output {
        Some(path) => {
            let file =
                File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
            write_keyframes(&keys, file)?;
            info!("Wrote {} keyframes to {:?}", summary.frames_keyed, path);
        }
        None => write_keyframes(&keys, std::io::stdout().lock())?,
    }

    Ok(())
}
