//! Delivery of events between neurons and devices.
//!
//! Devices exist on every thread, so a connection touching a device is
//! stored on the thread of its neuron end. The router turns each thread's
//! connection storage into a [`DeviceTargetTable`] once per network
//! construction. Routing afterwards only reads the tables, and every thread
//! only reads its own, so delivery needs no locking.

use std::collections::HashMap;

use rayon::prelude::*;

use super::event::{Delivery, EventSink};
use super::table::DeviceTargetTable;
use crate::connection::{Connection, ConnectionStore};
use crate::model::{ConnectionModels, SynapseModelId};
use crate::node::{Gid, NodeInfo, NodeKind, NodeRegistry, VpLayout};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoutingError {
    #[error("Thread {tid} out of range ({threads} threads)")]
    UnknownThread { tid: usize, threads: usize },

    #[error("Local device index {ldid} out of range ({devices} devices)")]
    UnknownDevice { ldid: usize, devices: usize },

    #[error("Synapse model {model} is not known on thread {tid}")]
    UnknownSynapseModel { tid: usize, model: SynapseModelId },
}

#[derive(Debug, Clone, Default)]
pub struct DeviceEventRouter {
    /// Device GIDs in local index order
    devices: Vec<Gid>,
    device_index: HashMap<Gid, usize>,
    tables: Vec<DeviceTargetTable>,
}

impl DeviceEventRouter {
    /// Build the routing tables of all threads.
    ///
    /// Local device indices follow GID order and are the same on every
    /// thread.
    pub fn build(layout: &VpLayout, registry: &NodeRegistry, store: &ConnectionStore) -> Self {
        let devices: Vec<Gid> = registry
            .iter()
            .filter(|entry| entry.node().kind() == NodeKind::Device)
            .map(|entry| entry.gid())
            .collect();
        let device_index: HashMap<Gid, usize> = devices.iter().enumerate().map(|(i, &gid)| (gid, i)).collect();

        let tables = store
            .threads()
            .par_iter()
            .enumerate()
            .map(|(tid, thread)| {
                let mut table = DeviceTargetTable::new(devices.len());
                for connection in thread.iter() {
                    if let Some(&ldid) = device_index.get(&connection.source) {
                        table.add_from_device(ldid, *connection);
                    } else if device_index.contains_key(&connection.target) {
                        debug_assert_eq!(layout.local_thread(NodeInfo::neuron(connection.source)), Some(tid));
                        table.add_to_device(*connection);
                    }
                }
                table
            })
            .collect::<Vec<_>>();

        let router = Self {
            devices,
            device_index,
            tables,
        };
        log::debug!(
            "Device routing tables: {} devices, {} connections over {} threads",
            router.num_devices(),
            router.tables.iter().map(DeviceTargetTable::len).sum::<usize>(),
            router.num_threads()
        );
        router
    }

    pub fn num_threads(&self) -> usize {
        self.tables.len()
    }

    pub fn num_devices(&self) -> usize {
        self.devices.len()
    }

    pub fn local_device_index(&self, gid: Gid) -> Option<usize> {
        self.device_index.get(&gid).copied()
    }

    pub fn device_gid(&self, ldid: usize) -> Option<Gid> {
        self.devices.get(ldid).copied()
    }

    pub fn table(&self, tid: usize) -> Result<&DeviceTargetTable, RoutingError> {
        self.tables.get(tid).ok_or(RoutingError::UnknownThread {
            tid,
            threads: self.tables.len(),
        })
    }

    /// Deliver `event` from neuron `source` to every device subscribed to it
    /// on thread `tid`. Returns the number of deliveries.
    pub fn route_outgoing<E, M, S>(
        &self,
        tid: usize,
        source: Gid,
        event: &E,
        models: &M,
        sink: &mut S,
    ) -> Result<usize, RoutingError>
    where
        E: Clone,
        M: ConnectionModels + ?Sized,
        S: EventSink<E> + ?Sized,
    {
        let connections = self.table(tid)?.to_devices(source);
        deliver_all(tid, connections, event, models, sink)
    }

    /// Deliver `event` from local device `ldid` to its targets on thread
    /// `tid`. Returns the number of deliveries.
    pub fn route_incoming<E, M, S>(
        &self,
        tid: usize,
        ldid: usize,
        event: &E,
        models: &M,
        sink: &mut S,
    ) -> Result<usize, RoutingError>
    where
        E: Clone,
        M: ConnectionModels + ?Sized,
        S: EventSink<E> + ?Sized,
    {
        let connections = self.table(tid)?.from_device(ldid).ok_or(RoutingError::UnknownDevice {
            ldid,
            devices: self.devices.len(),
        })?;
        deliver_all(tid, connections, event, models, sink)
    }
}

fn deliver_all<E, M, S>(
    tid: usize,
    connections: &[Connection],
    event: &E,
    models: &M,
    sink: &mut S,
) -> Result<usize, RoutingError>
where
    E: Clone,
    M: ConnectionModels + ?Sized,
    S: EventSink<E> + ?Sized,
{
    for connection in connections {
        let model = models
            .model(tid, connection.synapse)
            .ok_or(RoutingError::UnknownSynapseModel {
                tid,
                model: connection.synapse,
            })?;
        sink.deliver(Delivery {
            tid,
            sender: connection.source,
            receiver: connection.target,
            weight: connection.weight.unwrap_or(model.default_weight),
            delay: connection.delay.unwrap_or(model.default_delay),
            event: event.clone(),
        });
    }
    Ok(connections.len())
}
