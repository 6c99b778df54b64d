//! Events and delivery targets.

use serde::{Deserialize, Serialize};

use crate::node::Gid;

/// An event materialised for one connection
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery<E> {
    /// Thread the delivery happened on
    pub tid: usize,
    pub sender: Gid,
    pub receiver: Gid,
    pub weight: f64,
    /// Delay in ms
    pub delay: f64,
    pub event: E,
}

/// Input buffer side of event delivery
pub trait EventSink<E> {
    fn deliver(&mut self, delivery: Delivery<E>);
}

impl<E> EventSink<E> for Vec<Delivery<E>> {
    fn deliver(&mut self, delivery: Delivery<E>) {
        self.push(delivery);
    }
}

/// Spike emitted by a node
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpikeEvent {
    /// Emission time in ms
    pub stamp: f64,
    pub multiplicity: u32,
}

impl SpikeEvent {
    pub fn at(stamp: f64) -> Self {
        Self { stamp, multiplicity: 1 }
    }
}

/// Counts deliveries without keeping them
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountingSink {
    pub delivered: usize,
}

impl<E> EventSink<E> for CountingSink {
    fn deliver(&mut self, _delivery: Delivery<E>) {
        self.delivered += 1;
    }
}
