use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;

use lane_flow::display;
use lane_flow::simulation::{
    flow_density_sweep, speed_histogram, GapMetric, LaneChangePolicy, RunSummary, SimParams,
    Stepper, TrafficMetrics, UpdateScheme,
};

#[derive(Parser)]
#[command(name = "lane_flow")]
#[command(about = "Two-lane cellular-automaton traffic simulation, headless")]
struct Cli {
    /// JSON file with simulation parameters; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of simulation ticks to run
    #[arg(long, default_value = "120")]
    ticks: u64,

    /// Road length in cells
    #[arg(long, allow_negative_numbers = true)]
    width: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    height: Option<i64>,

    /// Number of vehicles
    #[arg(long, allow_negative_numbers = true)]
    vehicles: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    road_half_width: Option<i64>,

    /// Top speed in cells per tick
    #[arg(long, allow_negative_numbers = true)]
    max_speed: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    slowdown_prob: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    lane_change_prob: Option<f64>,

    #[arg(long, allow_negative_numbers = true)]
    safe_distance: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    lane_change_trigger: Option<i64>,

    /// Run without traffic signals
    #[arg(long)]
    no_signals: bool,

    /// Ticks each signal phase lasts
    #[arg(long, allow_negative_numbers = true)]
    signal_cycle: Option<i64>,

    #[arg(long, value_enum)]
    gap_metric: Option<GapMetricArg>,

    #[arg(long, value_enum)]
    update_scheme: Option<UpdateSchemeArg>,

    #[arg(long, value_enum)]
    lane_change_policy: Option<LaneChangePolicyArg>,

    #[arg(long)]
    seed: Option<u64>,

    /// Write every snapshot as one JSON line to this file
    #[arg(long)]
    snapshots: Option<PathBuf>,

    /// Print the road map every N ticks (0 = only first and last)
    #[arg(long, default_value = "0")]
    map_every: u64,

    /// Log metrics every N ticks (0 = never)
    #[arg(long, default_value = "10")]
    metrics_every: u64,

    /// Run a flow-density sweep over these vehicle counts instead
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    sweep: Option<Vec<i64>>,

    /// Ticks discarded before measuring each sweep point
    #[arg(long, default_value = "50")]
    warmup: u64,

    /// Sleep this many milliseconds between ticks
    #[arg(long, default_value = "0")]
    pace_ms: u64,
}

#[derive(Clone, Copy, ValueEnum)]
enum GapMetricArg {
    Wrapped,
    Linear,
}

#[derive(Clone, Copy, ValueEnum)]
enum UpdateSchemeArg {
    Synchronous,
    Sequential,
}

#[derive(Clone, Copy, ValueEnum)]
enum LaneChangePolicyArg {
    KeepDirection,
    FollowLane,
}

impl Cli {
    /// Defaults, then the config file, then flags
    fn params(&self) -> Result<SimParams> {
        let mut params = match &self.config {
            Some(path) => load_params(path)?,
            None => SimParams::default(),
        };
        let set = |slot: &mut i64, value: Option<i64>| {
            if let Some(v) = value {
                *slot = v;
            }
        };
        set(&mut params.width, self.width);
        set(&mut params.height, self.height);
        set(&mut params.vehicle_count, self.vehicles);
        set(&mut params.road_half_width, self.road_half_width);
        set(&mut params.max_speed, self.max_speed);
        set(&mut params.safe_distance, self.safe_distance);
        set(&mut params.lane_change_trigger_distance, self.lane_change_trigger);
        set(&mut params.signal_cycle_length, self.signal_cycle);
        if let Some(p) = self.slowdown_prob {
            params.slowdown_prob = p;
        }
        if let Some(p) = self.lane_change_prob {
            params.lane_change_prob = p;
        }
        if self.no_signals {
            params.signals_enabled = false;
        }
        if let Some(metric) = self.gap_metric {
            params.gap_metric = match metric {
                GapMetricArg::Wrapped => GapMetric::Wrapped,
                GapMetricArg::Linear => GapMetric::Linear,
            };
        }
        if let Some(scheme) = self.update_scheme {
            params.update_scheme = match scheme {
                UpdateSchemeArg::Synchronous => UpdateScheme::Synchronous,
                UpdateSchemeArg::Sequential => UpdateScheme::Sequential,
            };
        }
        if let Some(policy) = self.lane_change_policy {
            params.lane_change_policy = match policy {
                LaneChangePolicyArg::KeepDirection => LaneChangePolicy::KeepDirection,
                LaneChangePolicyArg::FollowLane => LaneChangePolicy::FollowLane,
            };
        }
        if let Some(seed) = self.seed {
            params.seed = seed;
        }
        Ok(params)
    }
}

fn load_params(path: &Path) -> Result<SimParams> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open config file {}", path.display()))?;
    serde_json::from_reader(file)
        .with_context(|| format!("Failed to parse config file {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let params = cli.params()?;

    match &cli.sweep {
        Some(counts) => run_sweep(&params, counts, cli.warmup, cli.ticks),
        None => run_headless(&cli, params),
    }
}

/// Run the simulation in headless mode (no graphics)
fn run_headless(cli: &Cli, params: SimParams) -> Result<()> {
    let config = params.validate().context("Invalid simulation parameters")?;
    info!(
        "Running lane flow simulation: {} ticks, {} vehicles, seed {}",
        cli.ticks, config.vehicle_count, config.seed
    );

    let mut snapshot_out = match &cli.snapshots {
        Some(path) => Some(BufWriter::new(File::create(path).with_context(|| {
            format!("Failed to create snapshot file {}", path.display())
        })?)),
        None => None,
    };

    let mut stepper = Stepper::new(config.clone());
    let initial = stepper.world().snapshot();
    println!("Initial state:");
    stepper.world().print_summary();
    println!("{}", display::draw_road(&initial, &config));

    let mut summary = RunSummary::default();
    let mut last = initial;
    for snapshot in stepper.run(cli.ticks) {
        let metrics = TrafficMetrics::measure(&snapshot, &config);
        summary.record(&metrics);

        if cli.metrics_every > 0 && snapshot.tick % cli.metrics_every == 0 {
            info!("{}", display::format_metrics(&metrics));
        }
        if cli.map_every > 0 && snapshot.tick % cli.map_every == 0 {
            println!("{}", display::draw_road(&snapshot, &config));
        }
        if let Some(out) = snapshot_out.as_mut() {
            serde_json::to_writer(&mut *out, &snapshot).context("Failed to write snapshot")?;
            out.write_all(b"\n").context("Failed to write snapshot")?;
        }
        if cli.pace_ms > 0 {
            std::thread::sleep(std::time::Duration::from_millis(cli.pace_ms));
        }
        last = snapshot;
    }

    if let Some(mut out) = snapshot_out {
        out.flush().context("Failed to flush snapshot file")?;
    }

    println!("=== Final State ===");
    stepper.world().print_summary();
    println!("{}", display::draw_road(&last, &config));
    println!("{}", display::draw_speed_histogram(&speed_histogram(&last, &config)));

    info!("=== SIMULATION COMPLETE ===");
    info!("Ticks run: {}", summary.ticks);
    info!("Vehicles: {}", config.vehicle_count);
    info!("Density: {:.4}", summary.density);
    info!("Mean speed: {:.2}", summary.mean_speed());
    info!("Mean flow: {:.4}", summary.mean_flow());
    info!("Peak stopped: {}", summary.peak_stopped);
    Ok(())
}

fn run_sweep(params: &SimParams, counts: &[i64], warmup: u64, measure: u64) -> Result<()> {
    info!(
        "Running flow-density sweep over {} vehicle counts ({} warm-up, {} measured ticks)",
        counts.len(),
        warmup,
        measure
    );
    let points = flow_density_sweep(params, counts, warmup, measure)
        .context("Invalid simulation parameters")?;
    println!("vehicles,density,mean_speed,flow");
    for p in &points {
        println!(
            "{},{:.6},{:.4},{:.6}",
            p.vehicle_count, p.density, p.mean_speed, p.flow
        );
    }
    info!("=== SWEEP COMPLETE ===");
    Ok(())
}
