//! PoseNet evaluation tool
//!
//! Evaluates recorded image+beacon pose predictions against a labeled dataset
//! and writes localization results, error statistics and an error histogram.
//!
//! Usage:
//! ```bash
//! cargo run --release -- \
//!   data/test.txt data/beacon_setting.txt models/predictions.txt results/ -f
//!
//! cargo run --release -- --config samples/evaluation.yaml
//! ```

use clap::Parser;
use flexi_logger::{colored_detailed_format, detailed_format, Duplicate, FileSpec, Logger};
use log::info;
use posenet_eval::{evaluate, EvaluationConfig};
use std::path::PathBuf;

/// Pose regression evaluation tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Labeled dataset file (Cambridge Visual Landmark layout with a beacon column)
    #[arg(required_unless_present = "config")]
    input_txt_file: Option<PathBuf>,

    /// Beacon setting file
    #[arg(required_unless_present = "config")]
    input_beacon_setting_file: Option<PathBuf>,

    /// Model file; recorded predictions for replayed runs
    #[arg(required_unless_present = "config")]
    input_model_file: Option<PathBuf>,

    /// Directory where localization result files are saved
    #[arg(required_unless_present = "config")]
    result_log_dir: Option<PathBuf>,

    /// Use fixed input mean and std
    #[arg(short = 'f', long)]
    use_fixed_input_mean_std: bool,

    /// Load the whole configuration from a YAML file instead
    #[arg(short = 'c', long, conflicts_with_all = ["input_txt_file", "input_beacon_setting_file", "input_model_file", "result_log_dir"])]
    config: Option<PathBuf>,
}

impl Cli {
    fn into_config(self) -> Result<EvaluationConfig, Box<dyn std::error::Error>> {
        if let Some(path) = self.config {
            let mut config = EvaluationConfig::load_from_yaml(&path)?;
            config.use_fixed_input_mean_std |= self.use_fixed_input_mean_std;
            return Ok(config);
        }
        match (
            self.input_txt_file,
            self.input_beacon_setting_file,
            self.input_model_file,
            self.result_log_dir,
        ) {
            (Some(dataset_path), Some(beacon_setting_path), Some(model_path), Some(output_dir)) => {
                Ok(EvaluationConfig {
                    dataset_path,
                    beacon_setting_path,
                    model_path,
                    output_dir,
                    use_fixed_input_mean_std: self.use_fixed_input_mean_std,
                })
            }
            _ => Err("Missing positional arguments".into()),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger with info level filter
    Logger::try_with_str("info")?
        .log_to_file(
            FileSpec::default()
                .directory("logs")
                .suppress_timestamp()
                .suffix("log"),
        )
        .duplicate_to_stdout(Duplicate::All)
        .format_for_files(detailed_format)
        .format_for_stdout(colored_detailed_format)
        // error;warn;info;debug;trace
        .set_palette("196;208;76;39;178".to_string())
        .start()?;

    let config = Cli::parse().into_config()?;
    info!("Evaluation config: {:?}", config);

    let (outcome, paths) = evaluate(&config)?;
    let report = &outcome.report;

    println!("\n📊 Evaluation Summary");
    println!("=====================");
    println!("Number of test images: {}", report.sample_count);
    println!(
        "Mean error {:.4} m and {:.4} degrees",
        report.position.mean, report.rotation.mean
    );
    println!(
        "Median error {:.4} m and {:.4} degrees",
        report.position.median, report.rotation.median
    );
    println!(
        "95 percentile error {:.4} m and {:.4} degrees",
        report.position.percentile_95, report.rotation.percentile_95
    );
    println!(
        "Total loc err larger than {} meters: {}",
        report.histogram.max_edge(),
        report.histogram.exceeding()
    );
    if let Some(timing) = &report.timing {
        println!("Mean time {:.6} s", timing.mean);
    }
    println!("📄 Summary written to: {}", paths.summary.display());

    Ok(())
}
