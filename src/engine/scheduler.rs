use crate::io::midi::TimedEvent;

/// Per-block event timeline.
///
/// Holds at most `capacity` events in time order. Storage is reserved up
/// front, so scheduling never allocates on the render thread. Events with
/// equal offsets keep their arrival order.
pub struct Scheduler {
    events: Vec<TimedEvent>,
    capacity: usize,
}

impl Scheduler {
    pub fn new(capacity: usize) -> Self {
        Self {
            events: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert an event at its offset. Returns false (and drops the event)
    /// when the timeline is full.
    pub fn enqueue(&mut self, event: TimedEvent) -> bool {
        if self.events.len() >= self.capacity {
            return false;
        }
        // Upper bound keeps arrival order among equal offsets
        let index = self.events.partition_point(|e| e.offset <= event.offset);
        self.events.insert(index, event);
        true
    }

    /// Events for the current block, ordered by offset.
    pub fn events(&self) -> &[TimedEvent] {
        &self.events
    }

    /// Forget the current block's events. Keeps the reserved storage.
    pub fn clear(&mut self) {
        self.events.clear();
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
