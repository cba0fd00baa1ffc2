//! Bounded worker-thread pool bridging the physics engine's parallel-for
//! requests.
//!
//! The physics world never spawns threads of its own. Whenever a step wants
//! to fan work out, it hands the scheduler a [`RangeTask`] describing a
//! half-open item range; [`TaskScheduler::enqueue`] splits the range into
//! chunks and posts them to a fixed set of long-lived workers, and
//! [`TaskScheduler::finish`] blocks the caller until every chunk of that
//! task has run.
//!
//! The slot pool is a hard bound ([`MAX_TASKS`] in-flight tasks per step).
//! Running out of slots is not an error: the task is executed inline on the
//! calling thread instead, trading parallelism for guaranteed forward
//! progress.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;

use arrayvec::ArrayVec;
use crossbeam_channel::{Receiver, Sender};

/// Upper bound on in-flight tasks per step cycle.
pub const MAX_TASKS: usize = 128;

/// A unit of parallel work over a half-open item range.
///
/// `execute_range` is called once per chunk, possibly concurrently from
/// several workers, and must be safe to run on any subrange of
/// `[0, item_count)`. `worker_index` identifies the executing thread
/// (`0..worker_count`); inline fallback runs with index 0.
pub trait RangeTask: Send + Sync {
    fn execute_range(&self, start: u32, end: u32, worker_index: u32);
}

enum Job {
    Range {
        task: Arc<dyn RangeTask>,
        start: u32,
        end: u32,
        slot: Arc<TaskSlot>,
    },
    Shutdown,
}

/// Completion state for one enqueued task, reused across step cycles.
struct TaskSlot {
    remaining: Mutex<u32>,
    done: Condvar,
}

impl TaskSlot {
    fn new() -> Self {
        Self {
            remaining: Mutex::new(0),
            done: Condvar::new(),
        }
    }
}

/// Handle returned by [`TaskScheduler::enqueue`].
///
/// Consumed by [`TaskScheduler::finish`]; taking it by value makes waiting
/// twice on the same task unrepresentable. An inline-executed task yields a
/// handle whose `finish` returns immediately.
#[must_use]
pub struct TaskHandle(Option<usize>);

/// Fixed-size worker pool with a bounded, reusable task-slot pool.
///
/// Worker count is fixed at construction and the pool lives as long as the
/// scheduler. The physics world holds the scheduler behind an `Arc`, so the
/// pool always outlives every world that can still enqueue onto it.
pub struct TaskScheduler {
    sender: Sender<Job>,
    slots: ArrayVec<Arc<TaskSlot>, MAX_TASKS>,
    cursor: AtomicUsize,
    worker_count: usize,
    workers: Vec<JoinHandle<()>>,
}

impl TaskScheduler {
    pub fn new(worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (sender, receiver) = crossbeam_channel::unbounded::<Job>();
        let workers = (0..worker_count)
            .map(|index| {
                let receiver = receiver.clone();
                std::thread::Builder::new()
                    .name(format!("ledgecore-worker-{index}"))
                    .spawn(move || worker_loop(&receiver, index as u32))
                    .expect("failed to spawn worker thread")
            })
            .collect();

        let mut slots = ArrayVec::new();
        for _ in 0..MAX_TASKS {
            slots.push(Arc::new(TaskSlot::new()));
        }

        Self {
            sender,
            slots,
            cursor: AtomicUsize::new(0),
            worker_count,
            workers,
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Reset the slot cursor for a new step cycle.
    ///
    /// Every handle from the previous cycle must have been finished before
    /// this is called; the stepping pipeline guarantees that by finishing
    /// each task inside the step that enqueued it.
    pub fn begin_cycle(&self) {
        self.cursor.store(0, Ordering::Relaxed);
    }

    /// Split `[0, item_count)` into chunks of at least `min_range` items and
    /// post them to the workers.
    ///
    /// When the slot pool is exhausted the whole range runs inline on the
    /// calling thread before `enqueue` returns.
    pub fn enqueue(&self, task: Arc<dyn RangeTask>, item_count: u32, min_range: u32) -> TaskHandle {
        if item_count == 0 {
            return TaskHandle(None);
        }

        let index = self.cursor.fetch_add(1, Ordering::Relaxed);
        if index >= MAX_TASKS {
            log::trace!("task slot pool exhausted, running {item_count} items inline");
            task.execute_range(0, item_count, 0);
            return TaskHandle(None);
        }

        let slot = &self.slots[index];
        let min_range = min_range.max(1);
        let chunk = item_count
            .div_ceil(self.worker_count as u32)
            .max(min_range);
        let chunk_count = item_count.div_ceil(chunk);

        *slot.remaining.lock().expect("task slot mutex poisoned") = chunk_count;

        let mut start = 0;
        while start < item_count {
            let end = (start + chunk).min(item_count);
            self.sender
                .send(Job::Range {
                    task: Arc::clone(&task),
                    start,
                    end,
                    slot: Arc::clone(slot),
                })
                .expect("worker pool channel closed");
            start = end;
        }

        TaskHandle(Some(index))
    }

    /// Block until every chunk of the given task has executed.
    pub fn finish(&self, handle: TaskHandle) {
        let Some(index) = handle.0 else {
            return;
        };
        let slot = &self.slots[index];
        let mut remaining = slot.remaining.lock().expect("task slot mutex poisoned");
        while *remaining > 0 {
            remaining = slot
                .done
                .wait(remaining)
                .expect("task slot mutex poisoned");
        }
    }
}

impl Drop for TaskScheduler {
    fn drop(&mut self) {
        for _ in 0..self.workers.len() {
            let _ = self.sender.send(Job::Shutdown);
        }
        for worker in self.workers.drain(..) {
            let _ = worker.join();
        }
    }
}

fn worker_loop(receiver: &Receiver<Job>, worker_index: u32) {
    while let Ok(job) = receiver.recv() {
        match job {
            Job::Range {
                task,
                start,
                end,
                slot,
            } => {
                task.execute_range(start, end, worker_index);
                let mut remaining = slot.remaining.lock().expect("task slot mutex poisoned");
                *remaining -= 1;
                if *remaining == 0 {
                    slot.done.notify_all();
                }
            }
            Job::Shutdown => break,
        }
    }
}
