//! drana CLI

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use dr_analysis::accumulators::suffix;
use dr_analysis::{AnalysisRanges, FinalizedAccumulators, RunConfig};
use dr_event::EventSource;
use dr_hist::FinalizedHistogram1D;
use dr_inference::{GaussianFit, ResolutionFitter};
use dr_viz::{Hist1dStyle, hist1d_artifact, hist2d_artifact};
use dr_viz_render::config::{VizConfig, resolve_config};

/// Samples drawn along the fitted curve on the energy plot.
const FIT_CURVE_POINTS: usize = 200;

#[derive(Parser)]
#[command(name = "drana")]
#[command(about = "drana - dual-readout calorimeter event analysis")]
#[command(version, allow_negative_numbers = true)]
struct Cli {
    /// Event file (JSON Lines; a `.json` file holds an array of events)
    input: PathBuf,

    /// Lower edge of the energy window (GeV)
    low: f64,

    /// Nominal beam energy (GeV)
    truth: f64,

    /// Upper edge of the energy window (GeV)
    high: f64,

    /// Output files are written as `{prefix}_{name}.{format}`
    output_prefix: String,

    /// Log verbosity level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: tracing::Level,

    /// Run configuration (YAML): calibration, geometry, fit budget
    #[arg(long)]
    config: Option<PathBuf>,

    /// Plot configuration (YAML): theme and style overrides
    #[arg(long)]
    viz_config: Option<PathBuf>,

    /// Stop after this many events
    #[arg(long)]
    max_events: Option<usize>,

    /// Output file for the run summary (pretty JSON). Defaults to stdout.
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Image format
    #[arg(long, default_value = "png", value_parser = ["png", "svg"])]
    format: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let ranges = AnalysisRanges::new(cli.low, cli.truth, cli.high)
        .context("invalid energy thresholds")?;
    let run_config = load_run_config(cli.config.as_deref())?;
    let mut viz_config = load_viz_config(cli.viz_config.as_deref())?;
    if viz_config.experiment.label.is_empty() {
        viz_config.experiment.label = format!("E = {} GeV", cli.truth);
    }

    let mut source = dr_event::open_source(&cli.input)
        .with_context(|| format!("failed to open event source {}", cli.input.display()))?;
    tracing::info!("opened {} ({} events)", cli.input.display(), source.entries());

    let outcome = dr_analysis::run(source.as_mut(), &ranges, &run_config, cli.max_events)
        .with_context(|| format!("failed to read events from {}", cli.input.display()))?;

    let fit = fit_energy(&outcome.histograms.energy, &ranges, &run_config);
    let report = render_all(&outcome.histograms, fit.as_ref(), &cli, &viz_config);
    if !report.failed.is_empty() {
        tracing::warn!("{} of {} plots failed", report.failed.len(), report.attempted());
    }

    let fit_json = fit.as_ref().map(|f| {
        let (amplitude, d_amplitude) = f.amplitude();
        let (mean, d_mean) = f.mean();
        let (sigma, d_sigma) = f.sigma();
        let (resolution, d_resolution) = f.resolution();
        serde_json::json!({
            "amplitude": [amplitude, d_amplitude],
            "mean": [mean, d_mean],
            "sigma": [sigma, d_sigma],
            "resolution": [resolution, d_resolution],
            "chi2": f.result.chi2,
            "ndf": f.result.ndf,
            "p_value": f.p_value,
            "converged": f.result.converged,
            "window": [f.window.0, f.window.1],
        })
    });
    let summary = serde_json::json!({
        "tool": "drana",
        "version": dr_core::VERSION,
        "input": cli.input.display().to_string(),
        "ranges": ranges,
        "run": outcome.summary,
        "fit": fit_json,
        "outputs": report.written,
        "failed": report.failed,
    });
    write_json(cli.summary.as_ref(), summary)
}

fn load_run_config(path: Option<&Path>) -> Result<RunConfig> {
    let text = match path {
        Some(p) => Some(
            std::fs::read_to_string(p)
                .with_context(|| format!("failed to read run config {}", p.display()))?,
        ),
        None => None,
    };
    RunConfig::resolve(text.as_deref()).context("invalid run config")
}

fn load_viz_config(path: Option<&Path>) -> Result<VizConfig> {
    let text = match path {
        Some(p) => Some(
            std::fs::read_to_string(p)
                .with_context(|| format!("failed to read plot config {}", p.display()))?,
        ),
        None => None,
    };
    resolve_config(text.as_deref()).context("invalid plot config")
}

/// Fit the reconstructed energy over the analysis window. Failure leaves the
/// plot without a curve.
fn fit_energy(
    hist: &FinalizedHistogram1D,
    ranges: &AnalysisRanges,
    config: &RunConfig,
) -> Option<GaussianFit> {
    match ResolutionFitter::new(config.fit.into()).fit(hist, ranges.low, ranges.high) {
        Ok(fit) => {
            let (mean, d_mean) = fit.mean();
            let (sigma, d_sigma) = fit.sigma();
            let (res, d_res) = fit.resolution();
            tracing::info!(
                "energy fit: mean = {mean:.4} \u{00B1} {d_mean:.4} GeV, sigma = {sigma:.4} \u{00B1} {d_sigma:.4} GeV, sigma/mean = {res:.4} \u{00B1} {d_res:.4}"
            );
            Some(fit)
        }
        Err(e) => {
            tracing::warn!("energy fit failed, plotting {} without it: {e}", suffix::ENERGY);
            None
        }
    }
}

#[derive(Default)]
struct RenderReport {
    written: Vec<String>,
    failed: Vec<String>,
}

impl RenderReport {
    fn attempted(&self) -> usize {
        self.written.len() + self.failed.len()
    }
}

/// Render every accumulator to its own file. A failed plot is logged and the
/// rest still render.
fn render_all(
    hists: &FinalizedAccumulators,
    fit: Option<&GaussianFit>,
    cli: &Cli,
    config: &VizConfig,
) -> RenderReport {
    let mut report = RenderReport::default();
    for (name, kind, json) in artifacts(hists, fit) {
        let path = PathBuf::from(format!("{}_{name}.{}", cli.output_prefix, cli.format));
        let result = json
            .map_err(dr_viz_render::RenderError::from)
            .and_then(|json| dr_viz_render::render_to_file(&json, kind, &path, config));
        match result {
            Ok(()) => {
                tracing::info!("wrote {}", path.display());
                report.written.push(path.display().to_string());
            }
            Err(e) => {
                tracing::error!("failed to render {}: {e}", path.display());
                report.failed.push(path.display().to_string());
            }
        }
    }
    report
}

/// Serialized artifacts in output order, keyed by file suffix and kind.
fn artifacts(
    hists: &FinalizedAccumulators,
    fit: Option<&GaussianFit>,
) -> Vec<(&'static str, &'static str, serde_json::Result<String>)> {
    let mut out = Vec::with_capacity(9);
    for (name, hist) in hists.histograms_1d() {
        let is_energy = name == suffix::ENERGY;
        let style = if is_energy { Hist1dStyle::Markers } else { Hist1dStyle::Step };
        let log_y = name == suffix::LEAK || name == suffix::LEAK_NU;
        let mut art = hist1d_artifact(hist, style, log_y);
        if is_energy && let Some(fit) = fit {
            art = art.with_gaussian_fit(fit, FIT_CURVE_POINTS);
        }
        out.push((name, "hist1d", serde_json::to_string(&art)));
        if is_energy {
            let map = hist2d_artifact(&hists.hit_map);
            out.push((suffix::HIT_MAP, "hist2d", serde_json::to_string(&map)));
        }
    }
    out
}

fn write_json(output: Option<&PathBuf>, value: serde_json::Value) -> Result<()> {
    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&value)?)
            .with_context(|| format!("failed to write {}", path.display()))?;
    } else {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn negative_low_threshold_parses() {
        let cli = Cli::try_parse_from(["drana", "ev.jsonl", "-5", "20", "30", "out"]).unwrap();
        assert_eq!(cli.low, -5.0);
        assert_eq!(cli.format, "png");
        assert_eq!(cli.log_level, tracing::Level::INFO);
    }

    #[test]
    fn format_is_restricted() {
        assert!(
            Cli::try_parse_from(["drana", "ev.jsonl", "10", "20", "30", "out", "--format", "pdf"])
                .is_err()
        );
    }
}
