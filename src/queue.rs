//! Single-producer, single-consumer pulse queue.
//!
//! A linked list shared between a [`QueueProducer`] and a [`QueueConsumer`].
//! The consumer never removes the last node, so the producer can always link
//! behind its tail without touching anything the consumer frees.
//!
//! ## Memory Ordering
//!
//! - Producer: writes the node, Release store on the `next` link, Release
//!   increment of the counter
//! - Consumer: Acquire load of the counter before following any link

use std::{
    marker::PhantomData,
    ptr,
    sync::{
        atomic::{AtomicPtr, AtomicUsize, Ordering},
        Arc,
    },
};

use crate::{
    error::{RadarError, RadarResult},
    pulse::PulseData,
};

struct Node<T> {
    data: T,
    next: AtomicPtr<Node<T>>,
}

impl<T> Node<T> {
    fn alloc(data: T) -> *mut Node<T> {
        Box::into_raw(Box::new(Node {
            data,
            next: AtomicPtr::new(ptr::null_mut()),
        }))
    }
}

struct Shared<T> {
    head: AtomicPtr<Node<T>>,
    // Nodes linked so far, including the one pop never takes
    len: AtomicUsize,
    _owns: PhantomData<Box<Node<T>>>,
}

impl<T> Shared<T> {
    // Only called with exclusive access to both ends.
    fn free_all(&self) {
        let mut node = self.head.swap(ptr::null_mut(), Ordering::Acquire);
        while !node.is_null() {
            // SAFETY: every linked node came from `Node::alloc` and is freed once here.
            let boxed = unsafe { Box::from_raw(node) };
            node = boxed.next.load(Ordering::Acquire);
        }
        self.len.store(0, Ordering::Release);
    }
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        self.free_all();
    }
}

/// Creates an empty queue and returns its two ends.
pub fn queue<T: Send>() -> (QueueProducer<T>, QueueConsumer<T>) {
    let shared = Arc::new(Shared {
        head: AtomicPtr::new(ptr::null_mut()),
        len: AtomicUsize::new(0),
        _owns: PhantomData,
    });
    (
        QueueProducer {
            shared: shared.clone(),
            tail: ptr::null_mut(),
        },
        QueueConsumer { shared, observed: 0 },
    )
}

/// Writing end. Only the radar worker holds it.
pub struct QueueProducer<T = PulseData> {
    shared: Arc<Shared<T>>,
    // Last linked node, null until initialized
    tail: *mut Node<T>,
}

// SAFETY: the producer only dereferences `tail`, which the consumer never frees.
unsafe impl<T: Send> Send for QueueProducer<T> {}

impl<T: Send> QueueProducer<T> {
    /// Stores the first item. Must happen exactly once before any [`push`](Self::push).
    pub fn push_initial(&mut self, data: T) -> RadarResult<()> {
        if self.is_initialized() {
            return Err(RadarError::QueueAlreadyInitialized);
        }
        let node = Node::alloc(data);
        self.shared.head.store(node, Ordering::Release);
        self.tail = node;
        self.shared.len.fetch_add(1, Ordering::Release);
        Ok(())
    }

    pub fn push(&mut self, data: T) -> RadarResult<()> {
        if !self.is_initialized() {
            return Err(RadarError::QueueNotInitialized);
        }
        let node = Node::alloc(data);
        // SAFETY: `tail` is the last node and stays alive until the consumer sees a successor.
        unsafe { (*self.tail).next.store(node, Ordering::Release) };
        self.tail = node;
        self.shared.len.fetch_add(1, Ordering::Release);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        !self.tail.is_null()
    }
}

/// Reading end.
pub struct QueueConsumer<T = PulseData> {
    shared: Arc<Shared<T>>,
    // Last count read from the shared counter. Never above the real count.
    observed: usize,
}

impl<T: Send> QueueConsumer<T> {
    /// Refreshes and returns the number of nodes. Items may arrive right after.
    pub fn len(&mut self) -> usize {
        self.observed = self.shared.len.load(Ordering::Acquire);
        self.observed
    }

    /// Count as of the last [`len`](Self::len) or [`pop`](Self::pop).
    pub fn observed(&self) -> usize {
        self.observed
    }

    pub fn is_empty(&self) -> bool {
        self.shared.head.load(Ordering::Acquire).is_null()
    }

    /// Removes the oldest item. Needs a cached count above one.
    pub fn pop(&mut self) -> RadarResult<T> {
        if self.observed <= 1 {
            return Err(RadarError::QueueExhausted(self.observed));
        }
        let head = self.shared.head.load(Ordering::Acquire);
        // SAFETY: the Acquire load of the counter that produced `observed > 1`
        // makes the head node and its successor link visible.
        let node = unsafe { Box::from_raw(head) };
        let next = node.next.load(Ordering::Acquire);
        self.shared.head.store(next, Ordering::Release);
        self.shared.len.fetch_sub(1, Ordering::Release);
        self.observed -= 1;
        Ok(node.data)
    }

    /// Drops every item and returns the queue to its uninitialized state.
    pub fn clear(&mut self, producer: &mut QueueProducer<T>) -> RadarResult<()> {
        if !Arc::ptr_eq(&self.shared, &producer.shared) {
            return Err(RadarError::QueueMismatch);
        }
        self.shared.free_all();
        producer.tail = ptr::null_mut();
        self.observed = 0;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::thread;

    use super::queue;
    use crate::error::RadarError;

    #[test]
    fn fifo_order() {
        let (mut producer, mut consumer) = queue::<u32>();
        assert!(consumer.is_empty());
        producer.push_initial(0).unwrap();
        for i in 1..5 {
            producer.push(i).unwrap();
        }
        assert!(!consumer.is_empty());
        assert_eq!(consumer.len(), 5);

        let popped = (0..4).map(|_| consumer.pop().unwrap()).collect::<Vec<_>>();
        assert_eq!(popped, vec![0, 1, 2, 3]);
        // Last node stays
        assert!(matches!(consumer.pop(), Err(RadarError::QueueExhausted(1))));
        assert_eq!(consumer.len(), 1);

        producer.push(5).unwrap();
        assert_eq!(consumer.len(), 2);
        assert_eq!(consumer.pop().unwrap(), 4);
    }

    #[test]
    fn pop_needs_refresh() {
        let (mut producer, mut consumer) = queue::<u32>();
        producer.push_initial(0).unwrap();
        producer.push(1).unwrap();
        assert!(matches!(consumer.pop(), Err(RadarError::QueueExhausted(0))));
        consumer.len();
        assert_eq!(consumer.pop().unwrap(), 0);
    }

    #[test]
    fn protocol_faults() {
        let (mut producer, mut consumer) = queue::<u32>();
        assert!(matches!(producer.push(1), Err(RadarError::QueueNotInitialized)));
        producer.push_initial(0).unwrap();
        assert!(matches!(
            producer.push_initial(0),
            Err(RadarError::QueueAlreadyInitialized)
        ));

        let (mut other, _) = queue::<u32>();
        assert!(matches!(consumer.clear(&mut other), Err(RadarError::QueueMismatch)));
    }

    #[test]
    fn clear_resets() {
        let (mut producer, mut consumer) = queue::<String>();
        producer.push_initial("a".to_owned()).unwrap();
        producer.push("b".to_owned()).unwrap();
        consumer.clear(&mut producer).unwrap();

        assert!(consumer.is_empty());
        assert!(!producer.is_initialized());
        assert_eq!(consumer.len(), 0);

        producer.push_initial("c".to_owned()).unwrap();
        producer.push("d".to_owned()).unwrap();
        consumer.len();
        assert_eq!(consumer.pop().unwrap(), "c");
    }

    #[test]
    fn across_threads() {
        const COUNT: usize = 10_000;
        let (mut producer, mut consumer) = queue::<usize>();

        let writer = thread::spawn(move || {
            producer.push_initial(0).unwrap();
            for i in 1..COUNT {
                producer.push(i).unwrap();
            }
            producer
        });

        let mut received = Vec::with_capacity(COUNT);
        while received.len() < COUNT - 1 {
            if consumer.observed() <= 1 {
                consumer.len();
                thread::yield_now();
                continue;
            }
            received.push(consumer.pop().unwrap());
        }
        let _producer = writer.join().unwrap();

        assert!(received.iter().enumerate().all(|(i, x)| i == *x));
        assert_eq!(consumer.len(), 1);
    }
}
