//! Event routing between neurons and devices.

pub mod event;
pub mod router;
pub mod table;

pub use event::{CountingSink, Delivery, EventSink, SpikeEvent};
pub use router::{DeviceEventRouter, RoutingError};
pub use table::DeviceTargetTable;
