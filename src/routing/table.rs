//! Per-thread device routing tables.

use std::collections::HashMap;

use crate::connection::Connection;
use crate::node::Gid;

/// Device connections of one thread.
///
/// Only references neurons owned by the thread and the thread's instances
/// of the devices.
#[derive(Debug, Clone, Default)]
pub struct DeviceTargetTable {
    /// Neuron source -> connections onto devices
    to_devices: HashMap<Gid, Vec<Connection>>,
    /// Local device index -> connections leaving that device
    from_devices: Vec<Vec<Connection>>,
}

impl DeviceTargetTable {
    pub fn new(num_devices: usize) -> Self {
        Self {
            to_devices: HashMap::new(),
            from_devices: vec![Vec::new(); num_devices],
        }
    }

    pub(crate) fn add_to_device(&mut self, connection: Connection) {
        self.to_devices.entry(connection.source).or_default().push(connection);
    }

    pub(crate) fn add_from_device(&mut self, ldid: usize, connection: Connection) {
        self.from_devices[ldid].push(connection);
    }

    /// Connections from `source` onto devices, empty if there are none
    pub fn to_devices(&self, source: Gid) -> &[Connection] {
        self.to_devices.get(&source).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Connections leaving local device `ldid`, `None` for an unknown index
    pub fn from_device(&self, ldid: usize) -> Option<&[Connection]> {
        self.from_devices.get(ldid).map(Vec::as_slice)
    }

    pub fn num_devices(&self) -> usize {
        self.from_devices.len()
    }

    /// Neuron sources with at least one device subscribed
    pub fn sources(&self) -> impl Iterator<Item = Gid> + '_ {
        self.to_devices.keys().copied()
    }

    /// Total number of connections in this table
    pub fn len(&self) -> usize {
        self.to_devices.values().map(Vec::len).sum::<usize>() + self.from_devices.iter().map(Vec::len).sum::<usize>()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::SynapseParams;

    #[test]
    fn test_table_lookups() {
        let syn = SynapseParams::new(0);
        let mut table = DeviceTargetTable::new(2);
        table.add_to_device(Connection::new(3, 10, &syn));
        table.add_to_device(Connection::new(3, 11, &syn));
        table.add_from_device(1, Connection::new(11, 5, &syn));

        assert_eq!(table.to_devices(3).len(), 2);
        assert!(table.to_devices(4).is_empty());
        assert_eq!(table.from_device(0), Some(&[][..]));
        assert_eq!(table.from_device(1).map(<[Connection]>::len), Some(1));
        assert!(table.from_device(2).is_none());
        assert_eq!(table.len(), 3);
        assert_eq!(table.sources().collect::<Vec<_>>(), vec![3]);
    }
}
