use clap::Parser;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::info;
use rayon::prelude::*;
use std::fs;
use std::path::PathBuf;

use spikewire::config_loader;
use spikewire::network::{Network, NetworkSummary};
use spikewire::node::NodeKind;
use spikewire::routing::{CountingSink, SpikeEvent};

/// Build a spiking network from a YAML description and report its layout
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the network configuration YAML file
    #[arg(short, long)]
    config: PathBuf,

    /// Rank of this process (overrides the configuration)
    #[arg(long)]
    rank: Option<usize>,

    /// Worker threads per rank (overrides the configuration)
    #[arg(short = 'j', long)]
    threads: Option<usize>,

    /// Write a JSON summary of the built network to this file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Send one spike from every local neuron through the device routing tables
    #[arg(long)]
    probe_spikes: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    color_eyre::install()?;
    let args = Args::parse();

    env_logger::Builder::from_env(Env::default().default_filter_or(&args.log_level)).init();

    info!("Configuration file: {:?}", args.config);
    let mut config = config_loader::load_config(&args.config)?;
    config_loader::apply_cli_overrides(&mut config, args.rank, args.threads)?;

    rayon::ThreadPoolBuilder::new()
        .num_threads(config.general.threads)
        .build_global()
        .wrap_err("Failed to configure thread pool")?;

    info!(
        "Building rank {} of {} with {} threads, {} nodes in {} populations",
        config.general.rank,
        config.general.ranks,
        config.general.threads,
        config.total_nodes(),
        config.populations.len()
    );
    let mut network: Network = Network::from_config(&config).wrap_err("Failed to build network")?;
    network.prepare()?;

    if args.probe_spikes {
        let delivered = probe_spikes(&network)?;
        info!("Probe spikes reached {} device targets", delivered);
    }

    let summary = network.summary();
    log_summary(&summary);

    if let Some(output) = &args.output {
        let json = serde_json::to_string_pretty(&summary).wrap_err("Failed to serialize network summary")?;
        fs::write(output, json).wrap_err_with(|| format!("Failed to write summary to '{}'", output.display()))?;
        info!("Wrote network summary to {:?}", output);
    }

    Ok(())
}

/// Route one spike from every local neuron on its own thread, all threads
/// in parallel. Returns the number of deliveries.
fn probe_spikes(network: &Network) -> Result<usize> {
    let layout = *network.layout();
    let neurons: Vec<_> = network
        .registry()
        .iter()
        .filter(|entry| entry.node().kind() == NodeKind::Neuron)
        .map(|entry| entry.node().clone())
        .collect();

    let per_thread = (0..layout.threads_per_rank())
        .into_par_iter()
        .map(|tid| {
            let mut sink = CountingSink::default();
            for node in neurons.iter().filter(|n| n.thread() == Some(tid)) {
                network.send_to_devices(tid, node.gid(), &SpikeEvent::at(0.0), &mut sink)?;
            }
            Ok(sink.delivered)
        })
        .collect::<Result<Vec<usize>, spikewire::network::NetworkError>>()?;
    Ok(per_thread.into_iter().sum())
}

fn log_summary(summary: &NetworkSummary) {
    info!(
        "Rank {}/{}: {} local nodes ({} devices), max GID {}",
        summary.rank, summary.ranks, summary.local_nodes, summary.local_devices, summary.max_gid
    );
    info!(
        "{} local connections, per thread: {:?}",
        summary.connections, summary.connections_per_thread
    );
    info!(
        "Timing: create {:.3}s, connect {:.3}s, prepare {:.3}s",
        summary.timing.create, summary.timing.connect, summary.timing.prepare
    );
}
