// src/model/queues.rs

use crate::model::orders::{ContainerOrder, PendingArrival};
use std::collections::VecDeque;

/// Containers ordered but not yet unloaded, in order of placement.
#[derive(Debug, Clone)]
pub struct PendingContainers {
    buffer: VecDeque<ContainerOrder>,
    max_open: usize,
}

impl PendingContainers {
    pub fn new(max_open: usize) -> Self {
        Self {
            buffer: VecDeque::with_capacity(max_open),
            max_open,
        }
    }

    /// Step 1: containers that have landed by `tick` leave the pipeline.
    /// Call this at the START of the month.
    pub fn pop_arrivals(&mut self, tick: u32) -> Vec<ContainerOrder> {
        let (arrived, in_transit): (Vec<_>, Vec<_>) = self
            .buffer
            .drain(..)
            .partition(|order| order.arrival_tick() <= tick);
        self.buffer = in_transit.into();
        arrived
    }

    /// Step 2: a newly placed container enters the pipeline.
    /// Refused when the open-container ceiling is reached.
    pub fn push_departure(&mut self, order: ContainerOrder) -> bool {
        if !self.has_capacity() {
            return false;
        }
        self.buffer.push_back(order);
        true
    }

    pub fn has_capacity(&self) -> bool {
        self.buffer.len() < self.max_open
    }

    /// Whether some container lands within `window` months of `instant`.
    /// Landing is the tick the container is unloaded on.
    pub fn lands_near(&self, instant: f64, window: f64) -> bool {
        self.buffer
            .iter()
            .any(|order| (order.arrival_tick() as f64 - instant).abs() <= window)
    }

    /// In-transit springs expressed relative to `now`.
    pub fn arrivals_from(&self, now: u32) -> Vec<PendingArrival> {
        self.buffer
            .iter()
            .map(|order| PendingArrival {
                arrival_index: order.arrival_tick() as f64 - now as f64,
                springs: order.spring_order.springs.clone(),
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContainerOrder> {
        self.buffer.iter()
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}
