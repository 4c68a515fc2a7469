//! Bearing Health CLI
//!
//! Frequency-band vibration analysis for bearing fault detection.

use bearing_health::{
    analyze_source,
    config::Config,
    core::AnalysisParams,
    error::{Error, SourceError},
    report::ReportBuilder,
    source::{write_parquet_columns, SampleSource},
    VERSION,
};
use clap::{Args, Parser, Subcommand};
use serde_json::json;
use std::f64::consts::PI;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "bearing-health")]
#[command(version = VERSION)]
#[command(about = "Frequency-band vibration analysis for bearing health", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one recording and print a JSON report
    Analyze {
        /// Local path, file:// or webhdfs://host:port/path of a .parquet or .csv file
        path: String,

        /// Vibration column name
        #[arg(long)]
        column: Option<String>,

        #[command(flatten)]
        params: ParamArgs,

        /// Include the unrounded energy in the report
        #[arg(long)]
        raw: bool,
    },

    /// Run the HTTP tool server
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to
        #[arg(long)]
        port: Option<u16>,
    },

    /// Write a synthetic vibration recording
    Generate {
        /// Output file (.parquet or .csv)
        #[arg(long, short)]
        output: PathBuf,

        /// Recording length in seconds
        #[arg(long, default_value = "10")]
        duration: f64,

        /// Sampling rate in Hz
        #[arg(long, default_value = "2000")]
        fs: f64,

        /// Shaft rotation frequency in Hz
        #[arg(long, default_value = "30")]
        shaft_freq: f64,

        /// Fault tone frequency in Hz
        #[arg(long, default_value = "120")]
        fault_freq: f64,

        /// Fault tone amplitude (0 for a healthy bearing)
        #[arg(long, default_value = "0.2")]
        fault_amplitude: f64,

        /// Vibration column name
        #[arg(long)]
        column: Option<String>,
    },

    /// Show configuration
    Config {
        /// Write the current configuration to the config file
        #[arg(long)]
        init: bool,
    },
}

/// Analysis parameter flags; unset flags fall back to the config file.
#[derive(Args, Debug, Clone, Default)]
struct ParamArgs {
    /// Sampling rate in Hz
    #[arg(long)]
    fs: Option<f64>,

    /// Fault frequency at the band center, in Hz
    #[arg(long)]
    target_freq: Option<f64>,

    /// Band width in Hz
    #[arg(long)]
    bandwidth: Option<f64>,

    /// RMS threshold for an anomaly
    #[arg(long)]
    threshold: Option<f64>,

    /// Butterworth prototype order (1 to 16)
    #[arg(long)]
    order: Option<usize>,
}

impl ParamArgs {
    fn resolve(&self, defaults: &AnalysisParams) -> AnalysisParams {
        AnalysisParams {
            fs: self.fs.unwrap_or(defaults.fs),
            target_freq: self.target_freq.unwrap_or(defaults.target_freq),
            bandwidth: self.bandwidth.unwrap_or(defaults.bandwidth),
            threshold: self.threshold.unwrap_or(defaults.threshold),
            order: self.order.unwrap_or(defaults.order),
        }
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bearing_health=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            path,
            column,
            params,
            raw,
        } => {
            cmd_analyze(&path, column, &params, raw);
        }
        Commands::Serve { host, port } => {
            cmd_serve(host, port);
        }
        Commands::Generate {
            output,
            duration,
            fs,
            shaft_freq,
            fault_freq,
            fault_amplitude,
            column,
        } => {
            let signal = SyntheticSignal {
                duration,
                fs,
                shaft_freq,
                fault_freq,
                fault_amplitude,
            };
            cmd_generate(&output, &signal, column);
        }
        Commands::Config { init } => {
            cmd_config(init);
        }
    }
}

fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        tracing::warn!("Could not load config ({e}), using defaults");
        Config::default()
    })
}

/// Process exit code for a failed analysis.
fn exit_code(err: &Error) -> i32 {
    match err {
        Error::Analysis(_) => 2,
        Error::Source(SourceError::ColumnNotFound { .. }) => 3,
        Error::Source(
            SourceError::NotFound(_)
            | SourceError::Io { .. }
            | SourceError::Network(_)
            | SourceError::Remote { .. },
        ) => 4,
        Error::Source(_) => 1,
    }
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("Error: could not serialize output: {e}");
            std::process::exit(1);
        }
    }
}

fn cmd_analyze(path: &str, column: Option<String>, args: &ParamArgs, raw: bool) {
    let config = load_config();
    let params = args.resolve(&config.analysis);
    let column = column.unwrap_or(config.source.column);

    let result = SampleSource::parse(path)
        .map_err(Error::from)
        .and_then(|source| analyze_source(&source, &column, &params));

    match result {
        Ok((verdict, recording)) => {
            let report = ReportBuilder::new()
                .with_raw_energy(raw)
                .build(&verdict, &params, &recording);
            tracing::info!(
                energy = report.energy,
                status = %report.status,
                "analyzed {}",
                path
            );
            print_json(&report);
        }
        Err(err) => {
            let mut body = json!({
                "error": err.to_string(),
                "code": err.code(),
            });
            if let Error::Source(SourceError::ColumnNotFound { available, .. }) = &err {
                body["details"] = json!({ "available": available });
            }
            print_json(&body);
            std::process::exit(exit_code(&err));
        }
    }
}

#[cfg(feature = "server")]
fn cmd_serve(host: Option<String>, port: Option<u16>) {
    use bearing_health::server::{run_with_log, ServerConfig};
    use bearing_health::stats::create_shared_log;

    let config = load_config();
    let mut server_config = ServerConfig::from_config(&config);
    if let Some(host) = host {
        server_config.host = host;
    }
    if let Some(port) = port {
        server_config.port = port;
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error creating runtime: {e}");
            std::process::exit(1);
        }
    };

    let log = create_shared_log();
    let result: anyhow::Result<()> = runtime.block_on(async {
        let (addr, shutdown_tx) = run_with_log(server_config, log.clone()).await?;
        println!("Bearing health server listening on http://{addr}");
        println!("Press Ctrl+C to stop.");

        tokio::signal::ctrl_c().await?;
        tracing::info!("Shutting down...");
        let _ = shutdown_tx.send(());
        Ok(())
    });

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }

    println!();
    println!("{}", log.summary());
}

#[cfg(not(feature = "server"))]
fn cmd_serve(_host: Option<String>, _port: Option<u16>) {
    eprintln!("Error: this build does not include the HTTP server (enable the `server` feature)");
    std::process::exit(1);
}

/// Timestamp column written next to the vibration column.
const TIME_COLUMN: &str = "time";

/// Shaft harmonics plus a bearing fault tone.
struct SyntheticSignal {
    duration: f64,
    fs: f64,
    shaft_freq: f64,
    fault_freq: f64,
    fault_amplitude: f64,
}

impl SyntheticSignal {
    fn samples(&self) -> (Vec<f64>, Vec<f64>) {
        let len = (self.duration * self.fs).round().max(0.0) as usize;
        let time: Vec<f64> = (0..len).map(|n| n as f64 / self.fs).collect();
        let vibration = time
            .iter()
            .map(|&t| {
                (2.0 * PI * self.shaft_freq * t).sin()
                    + 0.3 * (2.0 * PI * 2.0 * self.shaft_freq * t).sin()
                    + self.fault_amplitude * (2.0 * PI * self.fault_freq * t).sin()
            })
            .collect();
        (time, vibration)
    }
}

fn cmd_generate(output: &Path, signal: &SyntheticSignal, column: Option<String>) {
    let positive = |v: f64| v.is_finite() && v > 0.0;
    if !positive(signal.fs) || !positive(signal.duration) {
        eprintln!("Error: --fs and --duration must be positive");
        std::process::exit(1);
    }

    let column = column.unwrap_or_else(|| load_config().source.column);
    if column == TIME_COLUMN {
        eprintln!("Error: --column cannot be '{TIME_COLUMN}', which holds the timestamps");
        std::process::exit(1);
    }
    let (time, vibration) = signal.samples();

    let is_csv = output
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));

    let result = if is_csv {
        write_csv(output, &column, &time, &vibration)
    } else {
        let columns = [(TIME_COLUMN, time.as_slice()), (column.as_str(), vibration.as_slice())];
        write_parquet_columns(output, &columns).map_err(anyhow::Error::from)
    };

    match result {
        Ok(()) => {
            println!(
                "Wrote {} samples to {}",
                vibration.len(),
                output.display()
            );
        }
        Err(e) => {
            eprintln!("Error writing {}: {e:#}", output.display());
            std::process::exit(4);
        }
    }
}

fn write_csv(output: &Path, column: &str, time: &[f64], vibration: &[f64]) -> anyhow::Result<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(output)?;
    writer.write_record([TIME_COLUMN, column])?;
    for (t, v) in time.iter().zip(vibration) {
        writer.write_record([t.to_string(), v.to_string()])?;
    }
    writer.flush()?;
    Ok(())
}

fn cmd_config(init: bool) {
    let config = load_config();

    if init {
        if let Err(e) = config.save() {
            eprintln!("Error saving config: {e}");
            std::process::exit(1);
        }
        println!("Wrote {}", Config::config_path().display());
        return;
    }

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}
