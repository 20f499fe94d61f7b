use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde::Serialize;

use cc_scheduler::algorithms::scheduling::continuous_casting::{objectives, Scheduler};
use cc_scheduler::io::csv::{write_to_file, HeaderMode, WriteMode};
use cc_scheduler::io::tables::load_instance;

#[derive(Parser, Debug)]
#[command(about = "Run the continuous-casting charge scheduler against an instance directory.")]
#[command(next_line_help = true)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load an instance and run the scheduler once.
    Run {
        /// Directory holding Cast_plan.csv, nonCC_Processing_Time.csv, CC_Processing_Time.csv,
        /// Earliest_available_time.csv, Stage.csv and Transport_Time.csv.
        #[arg(short, long)]
        instance_dir: PathBuf,

        /// Seed for the scheduler's PRNG.
        #[arg(short, long, default_value_t = 0)]
        seed: u64,

        /// Optional path to write the per-charge allocation table to, as CSV.
        #[arg(short = 'g', long)]
        write_gantt: Option<PathBuf>,
    },
}

#[derive(Debug, Serialize)]
struct GanttRow {
    #[serde(rename = "Task")]
    task: String,
    #[serde(rename = "Start")]
    start: i64,
    #[serde(rename = "End")]
    end: i64,
}

fn main() {
    simple_logger::init_with_level(log::Level::Info).unwrap();

    let cli = Args::parse();

    match cli.command {
        Commands::Run {
            instance_dir,
            seed,
            write_gantt,
        } => {
            let instance = load_instance(&instance_dir).unwrap_or_else(|why| {
                log::error!("failed to load instance from {}: {why}", instance_dir.display());
                std::process::exit(1);
            });

            let result = Scheduler::new(seed).run(&instance).unwrap_or_else(|why| {
                log::error!("scheduling failed: {why}");
                std::process::exit(1);
            });

            let penalties = objectives::compute(&instance, &result, objectives::Weights::default());
            log::info!(
                "z1 (makespan) = {:.1}, z2 (waiting) = {:.1}, z3 (deviation) = {:.1}",
                penalties.z1,
                penalties.z2,
                penalties.z3
            );

            if let Some(path) = write_gantt {
                let rows: Vec<GanttRow> = result
                    .charges
                    .iter()
                    .flat_map(|charge| {
                        charge.allocations.iter().map(|a| GanttRow {
                            task: format!("charge-{} @ machine-{}", a.charge, a.machine),
                            start: a.start.0,
                            end: a.end.0,
                        })
                    })
                    .collect();

                write_to_file(&path, &rows, WriteMode::Replace, HeaderMode::Auto).unwrap_or_else(
                    |why| {
                        log::error!("failed to write gantt table to {}: {why}", path.display());
                        std::process::exit(1);
                    },
                );
            }
        }
    }
}
