//! Fixed-size worker pool with a FIFO task queue
//!
//! Submission never blocks: it enqueues the task and returns a
//! [`TaskHandle`] at once. Tasks are dequeued in submission order, but with
//! several workers their completion order is not guaranteed.
//!
//! Shutdown is two-phase. New submissions are rejected first; queued tasks
//! still run, then workers exit and are joined. In-flight work is never
//! interrupted.

use crate::batch::panic_message;
use crate::config::{Operation, PoolConfig, PreprocessConfig, ProcessorConfig};
use crate::error::PoolError;
use crate::processor::FrameProcessor;
use crate::result::ProcessedResult;
use crate::stats::StatsSnapshot;
use crossbeam::channel::{self, Receiver, TryRecvError};
use ow_frame::{FrameError, PixelBuffer, Result};
use ow_jpeg::EncodeConfig;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

type Task = Box<dyn FnOnce() + Send + 'static>;

/// Pool lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PoolState {
    /// Accepting and executing tasks
    Running,
    /// Draining queued tasks; submissions rejected
    ShuttingDown,
    /// All workers joined
    Stopped,
}

struct Queue {
    tasks: VecDeque<Task>,
    state: PoolState,
}

struct Shared {
    queue: Mutex<Queue>,
    available: Condvar,
    capacity: Option<usize>,
}

/// Worker pool running frame batches and arbitrary closures
pub struct ProcessorPool {
    shared: Arc<Shared>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    processor: Arc<FrameProcessor>,
    num_threads: usize,
}

impl ProcessorPool {
    /// Start the workers.
    ///
    /// Batches submitted here run sequentially inside their task, so the
    /// pool workers are the only parallel layer.
    pub fn new(config: PoolConfig) -> Result<Self> {
        if config.queue_capacity == Some(0) {
            return Err(FrameError::Configuration(
                "queue capacity must be positive".to_string(),
            ));
        }

        let num_threads = config.resolved_threads();
        let processor = Arc::new(FrameProcessor::new(ProcessorConfig {
            num_threads: 1,
            encoder_pool_capacity: num_threads,
        })?);

        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue {
                tasks: VecDeque::new(),
                state: PoolState::Running,
            }),
            available: Condvar::new(),
            capacity: config.queue_capacity,
        });

        let mut workers = Vec::with_capacity(num_threads);
        for index in 0..num_threads {
            let worker_shared = Arc::clone(&shared);
            let spawned = thread::Builder::new()
                .name(format!("ow-pool-{}", index))
                .spawn(move || worker_loop(&worker_shared, index));

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    stop_workers(&shared, workers);
                    return Err(FrameError::ResourceInit(format!(
                        "cannot spawn pool worker {}: {}",
                        index, e
                    )));
                }
            }
        }

        log::info!(
            "Processor pool started: {} worker(s), queue bound {:?}",
            num_threads,
            config.queue_capacity
        );

        Ok(Self {
            shared,
            workers: Mutex::new(workers),
            processor,
            num_threads,
        })
    }

    /// Queue an arbitrary closure
    pub fn submit<T, F>(&self, f: F) -> std::result::Result<TaskHandle<T>, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = channel::bounded(1);

        let task: Task = Box::new(move || {
            let outcome = panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
                let message = panic_message(payload.as_ref());
                log::warn!("Pool task panicked: {}", message);
                PoolError::TaskPanicked(message)
            });
            // Handle may already be dropped
            let _ = tx.send(outcome);
        });

        self.enqueue(task)?;
        Ok(TaskHandle { receiver: rx })
    }

    /// Queue a batch for `operation`; the handle yields one result per frame
    pub fn submit_operation(
        &self,
        frames: Vec<PixelBuffer>,
        operation: Operation,
    ) -> std::result::Result<TaskHandle<Vec<ProcessedResult>>, PoolError> {
        let processor = Arc::clone(&self.processor);
        self.submit(move || processor.batch(&frames, &operation))
    }

    /// Queue a preprocessing batch
    pub fn submit_batch(
        &self,
        frames: Vec<PixelBuffer>,
        config: PreprocessConfig,
    ) -> std::result::Result<TaskHandle<Vec<ProcessedResult>>, PoolError> {
        self.submit_operation(frames, Operation::Preprocess(config))
    }

    /// Queue an encode batch
    pub fn submit_encode_batch(
        &self,
        frames: Vec<PixelBuffer>,
        config: EncodeConfig,
    ) -> std::result::Result<TaskHandle<Vec<ProcessedResult>>, PoolError> {
        self.submit_operation(frames, Operation::Encode(config))
    }

    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    pub fn state(&self) -> PoolState {
        self.shared.queue.lock().state
    }

    /// Tasks waiting for a worker
    pub fn queued(&self) -> usize {
        self.shared.queue.lock().tasks.len()
    }

    /// Statistics of batches run by this pool
    pub fn stats(&self) -> StatsSnapshot {
        self.processor.stats()
    }

    pub fn reset_stats(&self) {
        self.processor.reset_stats();
    }

    /// Stop accepting tasks, drain the queue and join the workers.
    ///
    /// Idempotent. Called from a pool task, the calling worker is not joined.
    pub fn shutdown(&self) {
        // Closed before the handles are taken, so a concurrent call that
        // finds no handles still returns with submissions rejected
        begin_shutdown(&self.shared);

        let handles = std::mem::take(&mut *self.workers.lock());
        if handles.is_empty() {
            return;
        }

        stop_workers(&self.shared, handles);
        log::info!("Processor pool stopped");
    }

    fn enqueue(&self, task: Task) -> std::result::Result<(), PoolError> {
        let mut queue = self.shared.queue.lock();

        if queue.state != PoolState::Running {
            log::debug!("Submission rejected: pool is {:?}", queue.state);
            return Err(PoolError::ShuttingDown);
        }

        if let Some(capacity) = self.shared.capacity {
            if queue.tasks.len() >= capacity {
                log::debug!("Submission rejected: {} task(s) queued", capacity);
                return Err(PoolError::QueueFull);
            }
        }

        queue.tasks.push_back(task);
        drop(queue);

        self.shared.available.notify_one();
        Ok(())
    }
}

impl Drop for ProcessorPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn begin_shutdown(shared: &Shared) {
    {
        let mut queue = shared.queue.lock();
        if queue.state == PoolState::Running {
            queue.state = PoolState::ShuttingDown;
        }
    }
    shared.available.notify_all();
}

fn stop_workers(shared: &Shared, handles: Vec<JoinHandle<()>>) {
    begin_shutdown(shared);

    let current = thread::current().id();
    for handle in handles {
        if handle.thread().id() != current {
            handle.join().ok();
        }
    }

    shared.queue.lock().state = PoolState::Stopped;
}

fn worker_loop(shared: &Shared, index: usize) {
    while let Some(task) = next_task(shared) {
        task();
    }

    log::debug!("Pool worker {} exiting", index);
}

/// Block until a task is queued. `None` once the pool is shutting down and
/// the queue is drained.
fn next_task(shared: &Shared) -> Option<Task> {
    let mut queue = shared.queue.lock();
    loop {
        if let Some(task) = queue.tasks.pop_front() {
            return Some(task);
        }
        if queue.state != PoolState::Running {
            return None;
        }
        shared.available.wait(&mut queue);
    }
}

/// Completion handle for one submitted task
pub struct TaskHandle<T> {
    receiver: Receiver<std::result::Result<T, PoolError>>,
}

impl<T> TaskHandle<T> {
    /// Block until the task finishes
    pub fn wait(self) -> std::result::Result<T, PoolError> {
        self.receiver.recv().map_err(|_| PoolError::Disconnected)?
    }

    /// Take the result if the task has finished
    pub fn try_wait(&self) -> Option<std::result::Result<T, PoolError>> {
        match self.receiver.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(PoolError::Disconnected)),
        }
    }

    pub fn is_ready(&self) -> bool {
        !self.receiver.is_empty()
    }
}
