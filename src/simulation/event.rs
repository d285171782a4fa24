//! Plant events and the time-ordered event queue
//!
//! Each event kind carries only the payload it needs. The queue is a binary
//! heap ordered by time; events with equal times are dispatched in the order
//! they were scheduled.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use serde::Serialize;

use crate::batch::{Batch, Lot};
use crate::simulation::ArrivalRecord;
use crate::types::{BatchId, ModuleRef, ShellLineId, SortLineId, UnloadLineId};

/// Something that happens in the plant at a point in time
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// Start of a calendar day
    NextDay,
    /// A truck reaches the plant gate
    TruckArrival {
        /// What the truck carries
        record: ArrivalRecord,
    },
    /// Patience timeout of a queued batch
    QueueTimeout {
        /// Batch whose patience ran out
        batch: BatchId,
    },
    /// An unloading line finished its batch
    UnloadFinished {
        /// Batch unloaded
        batch: BatchId,
        /// Line that unloaded it
        line: UnloadLineId,
        /// Cleaning time included in the job (hours)
        cleaning: f64,
    },
    /// An unloaded batch is handed to sorting
    SortingReady {
        /// The batch
        batch: Batch,
    },
    /// A sorting line finished its batch
    SortingFinished {
        /// Batch sorted
        batch: BatchId,
        /// Line that sorted it
        line: SortLineId,
    },
    /// A sorted batch goes to the dryers
    FillModule {
        /// The batch
        batch: Batch,
    },
    /// Loading window of a dryer module expires
    CloseModule {
        /// Module to close
        module: ModuleRef,
    },
    /// A dryer module reached the target humidity
    DryingFinished {
        /// Module that finished drying
        module: ModuleRef,
    },
    /// A shelling line finished a dried lot
    ShellingFinished {
        /// Line that shelled it
        line: ShellLineId,
        /// Module the lot came from
        module: ModuleRef,
        /// Cleaning time included in the job (hours)
        cleaning: f64,
    },
}

impl Event {
    /// Short name of the event kind
    pub fn kind(&self) -> &'static str {
        match self {
            Event::NextDay => "next_day",
            Event::TruckArrival { .. } => "truck_arrival",
            Event::QueueTimeout { .. } => "queue_timeout",
            Event::UnloadFinished { .. } => "unload_finished",
            Event::SortingReady { .. } => "sorting_ready",
            Event::SortingFinished { .. } => "sorting_finished",
            Event::FillModule { .. } => "fill_module",
            Event::CloseModule { .. } => "close_module",
            Event::DryingFinished { .. } => "drying_finished",
            Event::ShellingFinished { .. } => "shelling_finished",
        }
    }

    /// Load of a batch travelling inside this event, if any
    pub fn carried_load(&self) -> f64 {
        match self {
            Event::SortingReady { batch } | Event::FillModule { batch } => batch.load(),
            _ => 0.0,
        }
    }
}

/// An event with its dispatch time and scheduling sequence
#[derive(Debug, Clone, Serialize)]
pub struct ScheduledEvent {
    time: f64,
    sequence: u64,
    #[serde(flatten)]
    event: Event,
}

impl ScheduledEvent {
    /// Create a scheduled event
    pub fn new(time: f64, sequence: u64, event: Event) -> Self {
        Self { time, sequence, event }
    }

    /// Dispatch time (hours)
    pub fn time(&self) -> f64 {
        self.time
    }

    /// Position in scheduling order
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// The event
    pub fn event(&self) -> &Event {
        &self.event
    }

    /// Consume into the event
    pub fn into_event(self) -> Event {
        self.event
    }
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max heap: reverse both keys so the earliest time,
        // then the earliest sequence, comes out first
        other.time.total_cmp(&self.time).then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Priority queue of pending events
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<ScheduledEvent>,
    next_sequence: u64,
}

impl EventQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an event; returns its sequence number
    pub fn push(&mut self, time: f64, event: Event) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        self.heap.push(ScheduledEvent::new(time, sequence, event));
        sequence
    }

    /// Remove the earliest event
    pub fn pop(&mut self) -> Option<ScheduledEvent> {
        self.heap.pop()
    }

    /// Time of the earliest event
    pub fn peek_time(&self) -> Option<f64> {
        self.heap.peek().map(ScheduledEvent::time)
    }

    /// Pending events in no particular order
    pub fn iter(&self) -> impl Iterator<Item = &ScheduledEvent> {
        self.heap.iter()
    }

    /// Number of pending events
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether nothing is pending
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DryerId, GmoClass, HybridType, ModuleId};

    fn close(dryer: usize) -> Event {
        Event::CloseModule { module: ModuleRef::new(DryerId(dryer), ModuleId(0)) }
    }

    #[test]
    fn test_pops_in_time_order() {
        let mut queue = EventQueue::new();
        queue.push(5.0, close(0));
        queue.push(1.0, close(1));
        queue.push(3.0, close(2));

        let times: Vec<f64> = std::iter::from_fn(|| queue.pop()).map(|e| e.time()).collect();
        assert_eq!(times, vec![1.0, 3.0, 5.0]);
    }

    #[test]
    fn test_equal_times_are_fifo() {
        let mut queue = EventQueue::new();
        for dryer in 0..5 {
            queue.push(2.0, close(dryer));
        }
        queue.push(1.0, Event::NextDay);

        assert_eq!(queue.peek_time(), Some(1.0));
        assert_eq!(queue.pop().unwrap().into_event(), Event::NextDay);
        for dryer in 0..5 {
            assert_eq!(queue.pop().unwrap().into_event(), close(dryer));
        }
        assert!(queue.is_empty());
    }

    #[test]
    fn test_carried_load() {
        let batch = Batch::new(BatchId(1), HybridType(2), GmoClass::Gmo, 0.3, 12.5, 0.0);
        assert_eq!(Event::FillModule { batch: batch.clone() }.carried_load(), 12.5);
        assert_eq!(Event::SortingReady { batch }.carried_load(), 12.5);
        assert_eq!(Event::NextDay.carried_load(), 0.0);
    }

    #[test]
    fn test_serializes_with_kind_tag() {
        let scheduled = ScheduledEvent::new(
            4.5,
            9,
            Event::QueueTimeout { batch: BatchId(12) },
        );
        let json = serde_json::to_value(&scheduled).unwrap();

        assert_eq!(json["kind"], "queue_timeout");
        assert_eq!(json["time"], 4.5);
        assert_eq!(json["batch"], 12);
        assert_eq!(json["sequence"], 9);
    }
}
