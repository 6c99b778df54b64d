//! # Spikewire - node addressing and connection construction for distributed network simulations
//!
//! This library provides the parts of a thread-parallel, rank-distributed
//! network simulator that decide which process owns which node, how source
//! populations are wired to target populations, and how events travel
//! between neurons and devices.
//!
//! ## Key Features
//!
//! - **Sparse node registry**: GID lookup on each rank by interpolation plus a rightward scan
//! - **Pluggable connection rules**: `one_to_one`, `all_to_all`, degree- and probability-based rules, selected by name
//! - **Tripartite connections**: third-factor nodes attached to primary connections from per-target pools
//! - **Parallel generation**: every thread builds only its own connections; results do not depend on the thread count
//! - **Device routing**: lock-free, per-thread delivery between neurons and replicated devices
//!
//! ## Architecture
//!
//! - `node`: node types, round-robin placement and the sparse node registry
//! - `connection`: rule registry, builders, per-thread storage and connect calls
//! - `model`: synapse model catalogue, replicated per thread
//! - `routing`: device routing tables and event delivery
//! - `timing`: stopwatches for phase timing
//! - `network`: construction and routing on one rank
//! - `config`: YAML network description
//! - `config_loader`: configuration file loading
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use spikewire::connection::{ConnSpec, SynSpec};
//! use spikewire::network::Network;
//! use spikewire::node::{NodeKind, VpLayout};
//! use spikewire::routing::{Delivery, SpikeEvent};
//!
//! let mut network: Network = Network::new(VpLayout::single_rank(4), 42);
//! let exc = network.create("iaf_psc_alpha", 800, NodeKind::Neuron)?;
//! let recorder = network.create("spike_recorder", 1, NodeKind::Device)?;
//!
//! let conn = ConnSpec::new("fixed_indegree").with("indegree", 80).with("allow_autapses", false);
//! network.connect(&exc, &exc, &conn, &SynSpec::default().with_weight(0.1))?;
//! network.connect(&exc, &recorder, &ConnSpec::new("all_to_all"), &SynSpec::default())?;
//! network.prepare()?;
//!
//! let mut deliveries: Vec<Delivery<SpikeEvent>> = Vec::new();
//! network.send_to_devices(0, exc[0].gid, &SpikeEvent::at(1.0), &mut deliveries)?;
//! # Ok::<(), spikewire::network::NetworkError>(())
//! ```
//!
//! ## Configuration Format
//!
//! ```yaml
//! general:
//!   ranks: 1
//!   threads: 4
//!   seed: 42
//!
//! populations:
//!   - { name: exc, model: iaf_psc_alpha, size: 800 }
//!   - { name: recorder, model: spike_recorder, size: 1, kind: device }
//!
//! projections:
//!   - source: exc
//!     target: exc
//!     conn: { rule: fixed_indegree, indegree: 80, allow_autapses: false }
//!     syn: { weight: 0.1, delay: 1.5 }
//! ```
//!
//! ## Error Handling
//!
//! Library modules return typed errors (`thiserror`); the binary and the
//! configuration loader use `color_eyre` for reporting with context.

pub mod config;
pub mod config_loader;
pub mod connection;
pub mod model;
pub mod network;
pub mod node;
pub mod routing;
pub mod timing;
