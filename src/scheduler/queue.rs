use std::cmp::Ordering;
use std::collections::BinaryHeap;

use super::{ScheduledItem, Timestamp};

struct Entry {
    item: ScheduledItem,
    seq: u64,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    // Reversed: BinaryHeap is a max-heap, the queue pops the earliest item.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .item
            .duetime()
            .cmp(&self.item.duetime())
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-queue of scheduled items ordered by due time; ties leave in FIFO order.
#[derive(Default)]
pub struct PriorityQueue {
    heap: BinaryHeap<Entry>,
    next_seq: u64,
}

impl PriorityQueue {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, item: ScheduledItem) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.heap.push(Entry { item, seq });
    }

    pub fn dequeue(&mut self) -> Option<ScheduledItem> {
        self.heap.pop().map(|e| e.item)
    }

    #[must_use]
    pub fn peek(&self) -> Option<&ScheduledItem> {
        self.heap.peek().map(|e| &e.item)
    }

    #[must_use]
    pub fn peek_duetime(&self) -> Option<Timestamp> {
        self.peek().map(ScheduledItem::duetime)
    }

    /// Takes cancelled items out of the queue and hands them back, so the
    /// caller can drop them outside its lock.
    pub fn purge_cancelled(&mut self) -> Vec<ScheduledItem> {
        let (cancelled, live): (Vec<Entry>, Vec<Entry>) = std::mem::take(&mut self.heap)
            .into_vec()
            .into_iter()
            .partition(|e| e.item.is_cancelled());
        self.heap = BinaryHeap::from(live);
        cancelled.into_iter().map(|e| e.item).collect()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn item(secs: u64) -> ScheduledItem {
        ScheduledItem::new(
            Timestamp::from_duration(Duration::from_secs(secs)),
            Box::new(|_| Ok(None)),
        )
    }

    #[test]
    fn test_orders_by_duetime_then_fifo() {
        let mut q = PriorityQueue::new();
        let first_at_ten = item(10);
        let marker = first_at_ten.disposable();
        q.enqueue(first_at_ten);
        q.enqueue(item(5));
        q.enqueue(item(10));

        assert_eq!(q.len(), 3);
        assert_eq!(q.dequeue().map(|i| i.duetime().as_secs_f64()), Some(5.0));
        let next = q.dequeue().expect("second item");
        assert!(
            crate::disposables::same(&next.disposable(), &marker),
            "equal due times must leave in submission order"
        );
        assert_eq!(q.peek_duetime().map(|t| t.as_secs_f64()), Some(10.0));
    }

    #[test]
    fn test_purge_cancelled() {
        let mut q = PriorityQueue::new();
        let a = item(1);
        a.cancel();
        q.enqueue(a);
        q.enqueue(item(2));
        assert_eq!(q.purge_cancelled().len(), 1);
        assert_eq!(q.len(), 1);
        assert_eq!(q.peek_duetime().map(|t| t.as_secs_f64()), Some(2.0));
    }
}
