//! Uniform replay buffer for off-policy value learning.
//!
//! - **Ring buffer** semantics: once full, each insert evicts the oldest
//!   transition (FIFO).
//! - **Uniform sampling** with replacement over the stored transitions.
//! - **Single owner**: the trainer pushes and samples from the same thread, so
//!   no interior locking is needed.

use crate::core::Transition;

/// Ring buffer with O(1) insert and random access.
#[derive(Debug, Clone)]
struct RingBuffer<T> {
    buffer: Vec<T>,
    capacity: usize,
    /// Next position to write (circular). When full this is also the oldest item.
    write_pos: usize,
}

impl<T> RingBuffer<T> {
    fn new(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity.min(1 << 16)),
            capacity,
            write_pos: 0,
        }
    }

    /// Push an item, returning the evicted one if the buffer was full.
    fn push(&mut self, item: T) -> Option<T> {
        let evicted = if self.buffer.len() < self.capacity {
            self.buffer.push(item);
            None
        } else {
            Some(std::mem::replace(&mut self.buffer[self.write_pos], item))
        };
        self.write_pos = (self.write_pos + 1) % self.capacity;
        evicted
    }

    #[inline]
    fn get(&self, idx: usize) -> &T {
        &self.buffer[idx]
    }

    #[inline]
    fn len(&self) -> usize {
        self.buffer.len()
    }

    fn clear(&mut self) {
        self.buffer.clear();
        self.write_pos = 0;
    }

    /// Items from oldest to newest.
    fn iter_ordered(&self) -> impl Iterator<Item = &T> {
        let split = if self.buffer.len() < self.capacity {
            0
        } else {
            self.write_pos
        };
        self.buffer[split..].iter().chain(self.buffer[..split].iter())
    }
}

/// Bounded FIFO store of transitions.
#[derive(Debug, Clone)]
pub struct ReplayBuffer {
    storage: RingBuffer<Transition>,
    total_pushed: u64,
}

impl ReplayBuffer {
    /// Create a buffer holding at most `capacity` transitions.
    ///
    /// # Panics
    /// If `capacity` is zero. Configuration validation rejects that earlier.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "replay buffer capacity must be positive");
        Self {
            storage: RingBuffer::new(capacity),
            total_pushed: 0,
        }
    }

    /// Store a transition, evicting the oldest when full.
    pub fn push(&mut self, transition: Transition) -> Option<Transition> {
        self.total_pushed += 1;
        self.storage.push(transition)
    }

    /// Draw `batch_size` transitions uniformly with replacement.
    ///
    /// Returns `None` while fewer than `batch_size` transitions are stored.
    pub fn sample(&self, batch_size: usize, rng: &mut fastrand::Rng) -> Option<Vec<Transition>> {
        let len = self.storage.len();
        if batch_size == 0 || len < batch_size {
            return None;
        }
        Some(
            (0..batch_size)
                .map(|_| self.storage.get(rng.usize(..len)).clone())
                .collect(),
        )
    }

    pub fn len(&self) -> usize {
        self.storage.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.storage.len() == self.storage.capacity
    }

    pub fn capacity(&self) -> usize {
        self.storage.capacity
    }

    /// Transitions ever pushed, including evicted ones.
    pub fn total_pushed(&self) -> u64 {
        self.total_pushed
    }

    /// Stored transitions from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Transition> {
        self.storage.iter_ordered()
    }

    pub fn clear(&mut self) {
        self.storage.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ChannelOrder, Image, ImageShape};

    fn transition(tag: u8) -> Transition {
        let shape = ImageShape::new(1, 1, 1);
        Transition::new(
            Image::new(shape, ChannelOrder::First, vec![tag]).unwrap(),
            tag as usize,
            tag as f32,
            Image::new(shape, ChannelOrder::First, vec![tag.wrapping_add(1)]).unwrap(),
            false,
            false,
        )
    }

    #[test]
    fn test_fifo_eviction_at_capacity() {
        let capacity = 5;
        let mut buffer = ReplayBuffer::new(capacity);
        for tag in 0..capacity as u8 {
            assert!(buffer.push(transition(tag)).is_none());
        }
        assert!(buffer.is_full());

        let evicted = buffer.push(transition(capacity as u8)).unwrap();
        assert_eq!(evicted.action, 0, "oldest transition goes first");
        assert_eq!(buffer.len(), capacity);

        let order: Vec<usize> = buffer.iter().map(|t| t.action).collect();
        assert_eq!(order, vec![1, 2, 3, 4, 5]);
        assert_eq!(buffer.total_pushed(), 6);
    }

    #[test]
    fn test_sample_requires_enough_transitions() {
        let mut rng = fastrand::Rng::with_seed(7);
        let mut buffer = ReplayBuffer::new(100);
        for tag in 0..31 {
            buffer.push(transition(tag));
        }
        assert!(buffer.sample(32, &mut rng).is_none());

        buffer.push(transition(31));
        let batch = buffer.sample(32, &mut rng).unwrap();
        assert_eq!(batch.len(), 32);
        assert!(batch.iter().all(|t| t.action < 32));
    }

    #[test]
    fn test_sample_covers_buffer() {
        let mut rng = fastrand::Rng::with_seed(11);
        let mut buffer = ReplayBuffer::new(4);
        for tag in 0..10 {
            buffer.push(transition(tag));
        }
        let mut seen = [false; 10];
        for _ in 0..50 {
            for t in buffer.sample(4, &mut rng).unwrap() {
                seen[t.action] = true;
            }
        }
        // Only the four newest survive.
        assert_eq!(seen, [false, false, false, false, false, false, true, true, true, true]);
    }

    #[test]
    fn test_clear() {
        let mut buffer = ReplayBuffer::new(3);
        buffer.push(transition(1));
        buffer.clear();
        assert!(buffer.is_empty());
        assert!(buffer.sample(1, &mut fastrand::Rng::with_seed(0)).is_none());
    }
}
