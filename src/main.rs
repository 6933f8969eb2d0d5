use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use rowcal::api::{RowingProfile, PRESET_NAMES};
use rowcal::args::{Cli, Commands, ProfileAction, ProfileArgs};
use rowcal::replay::{replay_in_background, CalibrationTotals, ReplayRequest};
use rowcal::util;
use std::path::PathBuf;
use std::process;

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        log::error!("Error: {:#}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Replay { file, profile, json } => {
            let profile = resolve_profile(&profile)?;
            let delta_times = util::load_delta_times(&file)?;
            let request = ReplayRequest::new(delta_times, profile)?;

            let runtime = tokio::runtime::Runtime::new().context("Failed to start runtime")?;
            let report = runtime.block_on(replay_in_background(request))?;

            if json {
                let output = serde_json::to_string_pretty(&report)
                    .context("Failed to serialize calibration report")?;
                println!("{}", output);
                return Ok(());
            }

            let totals = CalibrationTotals::from_report(&report);
            println!("Strokes:            {}", totals.stroke_count);
            println!("Distance:           {:.2} m", totals.distance);
            println!("Last stroke time:   {:.3} s", totals.last_stroke_time / 1e6);
            println!("Avg drag factor:    {:.2}", totals.drag_coefficient * 1e6);
            println!("Avg drive:          {:.3} s", totals.drive_duration / 1e6);
            println!("Avg recovery:       {:.3} s", totals.recovery_duration / 1e6);
            println!("Avg power:          {:.1} W", totals.avg_stroke_power);
            if let (Some(shortest), Some(longest)) =
                (totals.shortest_force_curve, totals.longest_force_curve)
            {
                println!(
                    "Force curve:        {} samples (stroke {}) to {} samples (stroke {})",
                    shortest.len,
                    shortest.stroke_index + 1,
                    longest.len,
                    longest.stroke_index + 1
                );
            }
            println!("Margin detections:  {}", report.margin_detect_count);
            if let Some(min) = report.min_delta_time {
                println!("Min delta-time:     {} µs", min);
            }
        }
        Commands::Profile { action } => match action {
            ProfileAction::Show { profile } => {
                print!("{}", resolve_profile(&profile)?.to_kdl());
            }
            ProfileAction::Presets => {
                for name in PRESET_NAMES {
                    println!("{}", name);
                }
            }
            ProfileAction::Path => {
                println!("{}", user_profile_path()?.display());
            }
        },
    }

    Ok(())
}

fn user_profile_path() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("com", "rowcal", "rowcal")
        .context("Could not determine project directories")?;
    Ok(proj_dirs.config_dir().join("profile.kdl"))
}

fn resolve_profile(args: &ProfileArgs) -> Result<RowingProfile> {
    if let Some(path) = &args.profile {
        return RowingProfile::load(path);
    }

    if let Some(name) = &args.preset {
        return RowingProfile::preset(name)
            .with_context(|| format!("Unknown preset: {}", name));
    }

    let user_profile = user_profile_path()?;
    if user_profile.exists() {
        return RowingProfile::load(&user_profile);
    }

    log::debug!("No user profile at {}, using defaults", user_profile.display());
    Ok(RowingProfile::default())
}
