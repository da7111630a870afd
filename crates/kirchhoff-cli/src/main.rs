//! Kirchhoff command-line interface.
//!
//! Reads circuits from files (or stdin), runs the analysis pipeline and
//! prints one JSON result per circuit on stdout.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, ensure};
use clap::{Parser, ValueEnum};
use kirchhoff::{
    Circuit, InputFormat, Pipeline, PipelineConfig, Plot, ReferenceNode, Report, SampleWindow,
    demo_circuit, parse_circuit,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kirchhoff")]
#[command(about = "Cut-set/tie-set circuit analysis in the Laplace domain", long_about = None)]
#[command(version)]
struct Cli {
    /// Circuit files (JSON or netlist); reads stdin when none are given.
    /// Empty input runs the built-in series RC demo.
    #[arg(value_name = "FILE")]
    inputs: Vec<PathBuf>,

    /// Input format
    #[arg(long, value_enum, default_value_t = FormatArg::Auto)]
    format: FormatArg,

    /// Reference node (default: '0', else the last declared node)
    #[arg(long, value_name = "NODE")]
    reference: Option<String>,

    /// Start of the sampling window (s)
    #[arg(long, default_value_t = 0.0)]
    t_start: f64,

    /// End of the sampling window (s)
    #[arg(long, default_value_t = 10.0)]
    t_end: f64,

    /// Number of samples, both ends included
    #[arg(long, default_value_t = 100)]
    points: usize,

    /// Skip plot rendering
    #[arg(long)]
    no_plots: bool,

    /// Write each plot to DIR/<variable>.svg instead of embedding it
    #[arg(long, value_name = "DIR")]
    plot_dir: Option<PathBuf>,

    /// Print the tree, matrices and equations, then stop
    #[arg(long)]
    assemble_only: bool,

    /// Pretty-print JSON
    #[arg(long)]
    pretty: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Auto,
    Json,
    Netlist,
}

impl FormatArg {
    fn input_format(self) -> Option<InputFormat> {
        match self {
            FormatArg::Auto => None,
            FormatArg::Json => Some(InputFormat::Json),
            FormatArg::Netlist => Some(InputFormat::Netlist),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Log records go to stderr; `RUST_LOG` overrides the level.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
    {
        eprintln!("Warning: logging disabled: {e}");
    }
}

/// Returns whether every circuit was analyzed successfully.
fn run(cli: &Cli) -> Result<bool> {
    ensure!(
        cli.t_end > cli.t_start,
        "--t-end ({}) must be greater than --t-start ({})",
        cli.t_end,
        cli.t_start
    );
    ensure!(cli.points > 0, "--points must be at least 1");

    let reference = match &cli.reference {
        Some(node) => ReferenceNode::Named(node.clone()),
        None => ReferenceNode::Auto,
    };
    let config = PipelineConfig::default()
        .with_reference(reference)
        .with_window(SampleWindow::new(cli.t_start, cli.t_end, cli.points))
        .with_render(!cli.no_plots);
    let pipeline = Pipeline::default().with_config(config);

    let parsed = read_inputs(cli)?
        .into_iter()
        .map(|(label, text)| (label, load_circuit(&text, cli.format.input_format())))
        .collect::<Vec<_>>();

    if cli.assemble_only {
        return Ok(assemble_only(&pipeline, &parsed));
    }

    let circuits: Vec<Circuit> = parsed
        .iter()
        .filter_map(|(_, circuit)| circuit.as_ref().ok().cloned())
        .collect();
    let mut solved = pipeline.report_batch(&circuits).into_iter();

    let mut all_ok = true;
    for (label, circuit) in &parsed {
        let report = match circuit {
            Ok(_) => solved
                .next()
                .context("missing report for a parsed circuit")?,
            Err(message) => Report::error(message.clone()),
        };
        if let Report::Error { message } = &report {
            log::error!("{label}: {message}");
            all_ok = false;
        }
        let report = match &cli.plot_dir {
            Some(dir) => write_plots(report, dir)?,
            None => report,
        };
        println!(
            "{}",
            report.to_json(cli.pretty).context("failed to serialize result")?
        );
    }
    Ok(all_ok)
}

/// `(label, text)` for every input; stdin when no files were named.
fn read_inputs(cli: &Cli) -> Result<Vec<(String, String)>> {
    if cli.inputs.is_empty() {
        let mut text = String::new();
        io::stdin()
            .read_to_string(&mut text)
            .context("failed to read stdin")?;
        return Ok(vec![("<stdin>".to_string(), text)]);
    }
    cli.inputs
        .iter()
        .map(|path| {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read circuit: {}", path.display()))?;
            Ok((path.display().to_string(), text))
        })
        .collect()
}

fn load_circuit(text: &str, format: Option<InputFormat>) -> std::result::Result<Circuit, String> {
    if text.trim().is_empty() {
        log::info!("empty input, running the series RC demo circuit");
        return demo_circuit().map_err(|e| e.to_string());
    }
    parse_circuit(text, format).map_err(|e| e.to_string())
}

fn assemble_only(
    pipeline: &Pipeline,
    parsed: &[(String, std::result::Result<Circuit, String>)],
) -> bool {
    let mut all_ok = true;
    for (label, circuit) in parsed {
        if parsed.len() > 1 {
            println!("== {label}");
        }
        let result = circuit
            .as_ref()
            .map_err(Clone::clone)
            .and_then(|c| pipeline.assemble(c).map(|a| (c, a)).map_err(|e| e.to_string()));
        match result {
            Ok((circuit, assembly)) => print!("{}", assembly.display(circuit)),
            Err(message) => {
                eprintln!("Error: {label}: {message}");
                all_ok = false;
            }
        }
    }
    all_ok
}

/// Move rendered images to files, leaving their paths in the report.
fn write_plots(report: Report, dir: &Path) -> Result<Report> {
    let Report::Success {
        equations,
        time_domain,
        plots,
    } = report
    else {
        return Ok(report);
    };
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create plot directory: {}", dir.display()))?;

    // A plot that cannot be written fails on its own, like a render failure.
    let plots = plots
        .into_iter()
        .map(|plot| match plot {
            Plot::Image {
                name,
                format,
                image,
            } => {
                let path = dir.join(format!("{}.{format}", file_stem(&name)));
                match fs::write(&path, &image) {
                    Ok(()) => Plot::Image {
                        name,
                        format,
                        image: path.display().to_string(),
                    },
                    Err(e) => {
                        log::warn!("failed to write plot {}: {e}", path.display());
                        Plot::Failed {
                            error: format!("failed to write plot {}: {e}", path.display()),
                            name,
                        }
                    }
                }
            }
            failed => failed,
        })
        .collect();

    Ok(Report::Success {
        equations,
        time_domain,
        plots,
    })
}

/// File-name-safe form of a variable name; branch ids may contain separators.
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
