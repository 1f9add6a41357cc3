//! grid: grow a bike network over a synthetic grid city.
//!
//! Usage:
//!
//! ```text
//! grid [CONFIG.json] [OUT_DIR]
//! ```
//!
//! Without a config every prune measure is run with `prune_factor = 0.5`
//! and `route_factor = 0.3`.  A config file (a serialized `GrowthConfig`)
//! runs just that configuration.  With `OUT_DIR`, each run's final network
//! is written as CSV under `OUT_DIR/<measure>/`.

mod network;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};

use bg_core::{GrowthConfig, PruneMeasure};
use bg_growth::{
    Expansion, FinalNetwork, GrowthObserver, GrowthPipeline, PruneReport, write_final_dir,
};

use network::{SIDE, build_city};

const PRUNE_FACTOR: f64 = 0.5;
const ROUTE_FACTOR: f64 = 0.3;

// ── Observer ──────────────────────────────────────────────────────────────────

/// Prints one line per stage with the elapsed time since the last stage.
struct StageTimer {
    last: Instant,
}

impl StageTimer {
    fn new() -> Self {
        Self { last: Instant::now() }
    }

    fn lap(&mut self) -> f64 {
        let now = Instant::now();
        let ms = now.duration_since(self.last).as_secs_f64() * 1e3;
        self.last = now;
        ms
    }
}

impl GrowthObserver for StageTimer {
    fn on_pairs(&mut self, pairs: &[bg_growth::CandidatePair]) {
        let ms = self.lap();
        println!("    pairs        {:>6}   ({ms:.1} ms)", pairs.len());
    }

    fn on_triangulated(&mut self, gt: &bg_growth::TriangulationGraph) {
        let ms = self.lap();
        println!("    triangulated {:>6}   ({ms:.1} ms)", gt.edge_count());
    }

    fn on_pruned(&mut self, _gt: &bg_growth::TriangulationGraph, report: &PruneReport) {
        let ms = self.lap();
        let note = if report.exhausted { "  [only protected edges left]" } else { "" };
        println!("    pruned       {:>6}   ({ms:.1} ms){note}", report.edges_after);
    }

    fn on_expanded(&mut self, expansion: &Expansion, network: &FinalNetwork) {
        let ms = self.lap();
        println!(
            "    expanded     {:>6}   ({ms:.1} ms, {} shared path nodes)",
            network.edge_count(),
            expansion.shared_nodes()
        );
    }
}

// ── main ──────────────────────────────────────────────────────────────────────

fn load_config(path: &Path) -> Result<GrowthConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: GrowthConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

fn default_configs() -> Vec<GrowthConfig> {
    [
        PruneMeasure::Betweenness,
        PruneMeasure::Closeness,
        PruneMeasure::IterativeBetweenness,
        PruneMeasure::Hybrid,
    ]
    .into_iter()
    .map(|prune_measure| GrowthConfig {
        route_factor: ROUTE_FACTOR,
        prune_factor: PRUNE_FACTOR,
        prune_measure,
        ..GrowthConfig::default()
    })
    .collect()
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let configs = match args.next() {
        Some(path) if path != "-" => vec![load_config(Path::new(&path))?],
        _ => default_configs(),
    };
    let out_dir = args.next().map(PathBuf::from);

    println!("=== grid: bike network growth ===");
    let (network, pois) = build_city()?;
    println!(
        "Street grid {SIDE}×{SIDE}: {} nodes, {} edges ({} existing), {} POIs",
        network.node_count(),
        network.edge_count(),
        network.existing_edge_count(),
        pois.len()
    );
    println!();

    for config in configs {
        println!(
            "── {} (prune {:.2}, route {:.2})",
            config.prune_measure, config.prune_factor, config.route_factor
        );
        let out = GrowthPipeline::new(config.clone()).run(&network, &pois, &mut StageTimer::new())?;

        let result = &out.network;
        println!(
            "    result: {} nodes, {} edges ({} generated, {} existing), {:.0} m new",
            result.node_count(),
            result.edge_count(),
            result.generated_edges().count(),
            result.existing_edges().count(),
            result.new_length()
        );

        if let Some(dir) = &out_dir {
            let dir = dir.join(config.prune_measure.as_str());
            fs::create_dir_all(&dir)
                .with_context(|| format!("creating {}", dir.display()))?;
            write_final_dir(&dir, &network, result)?;
            println!("    written to {}", dir.display());
        }
        println!();
    }

    Ok(())
}
