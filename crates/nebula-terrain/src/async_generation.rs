//! Asynchronous chunk generation with a configurable thread pool.
//!
//! Offloads terrain generation to background threads, supports
//! cancel-before-start, and delivers completed chunks via bounded channels.
//! Every accepted submission produces exactly one [`CompletedChunk`], with no
//! payload if it was cancelled, so the store's Generating marker always clears.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, bounded};
use dashmap::DashMap;
use nebula_chunk::{ChunkCoord, ChunkExecutor, ChunkSource, CompletedChunk};
use tracing::{debug, trace};

use crate::error::TerrainError;

/// A queued generation request plus its cancellation flag.
struct GenerationTask {
    coord: ChunkCoord,
    cancelled: Arc<AtomicBool>,
}

/// Sizing for [`AsyncChunkGenerator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerPoolConfig {
    /// Worker threads; zero derives the count from the CPU count.
    pub threads: usize,
    /// Maximum submitted-but-undrained chunks. Excess submissions are rejected.
    pub max_in_flight: usize,
    /// Bounded channel capacity for completed chunks.
    pub result_capacity: usize,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            threads: 0,
            max_in_flight: 64,
            result_capacity: 128,
        }
    }
}

/// Worker count for a requested value, leaving headroom for the main thread.
pub fn worker_thread_count(requested: usize) -> usize {
    if requested > 0 {
        return requested;
    }
    let cpus = num_cpus::get().max(2);
    (cpus - 2).max(1)
}

/// Manages asynchronous chunk generation across a thread pool.
pub struct AsyncChunkGenerator {
    /// Sender for submitting generation tasks; `None` once shutting down.
    task_sender: Option<Sender<GenerationTask>>,
    /// Receiver for collecting completed chunks on the main thread.
    result_receiver: Receiver<CompletedChunk>,
    /// Cancellation flag per outstanding coordinate.
    active_tasks: Arc<DashMap<ChunkCoord, Arc<AtomicBool>>>,
    /// Submitted chunks not yet drained.
    in_flight: Arc<AtomicUsize>,
    max_in_flight: usize,
    workers: Vec<JoinHandle<()>>,
}

impl AsyncChunkGenerator {
    /// Spawns the worker pool over a shared chunk source.
    ///
    /// # Errors
    ///
    /// [`TerrainError::WorkerSpawn`] if a worker thread cannot be started.
    pub fn new<S>(source: Arc<S>, config: WorkerPoolConfig) -> Result<Self, TerrainError>
    where
        S: ChunkSource + Send + Sync + 'static,
    {
        let max_in_flight = config.max_in_flight.max(1);
        let (task_sender, task_receiver) = bounded::<GenerationTask>(max_in_flight);
        let (result_sender, result_receiver) = bounded::<CompletedChunk>(config.result_capacity.max(1));
        let thread_count = worker_thread_count(config.threads);

        let mut workers = Vec::with_capacity(thread_count);
        for i in 0..thread_count {
            let receiver = task_receiver.clone();
            let sender = result_sender.clone();
            let source = Arc::clone(&source);

            let handle = std::thread::Builder::new()
                .name(format!("chunk-gen-{i}"))
                .spawn(move || worker_loop(&*source, &receiver, &sender))
                .map_err(TerrainError::WorkerSpawn)?;
            workers.push(handle);
        }
        debug!(threads = thread_count, max_in_flight, "chunk generation workers started");

        Ok(Self {
            task_sender: Some(task_sender),
            result_receiver,
            active_tasks: Arc::new(DashMap::new()),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight,
            workers,
        })
    }

    /// Number of worker threads.
    pub fn thread_count(&self) -> usize {
        self.workers.len()
    }
}

fn worker_loop<S>(source: &S, tasks: &Receiver<GenerationTask>, results: &Sender<CompletedChunk>)
where
    S: ChunkSource + ?Sized,
{
    while let Ok(task) = tasks.recv() {
        if task.cancelled.load(Ordering::Relaxed) {
            if results.send(cancelled(task.coord)).is_err() {
                return;
            }
            continue;
        }

        let start = std::time::Instant::now();
        let payload = source.generate(task.coord);
        let elapsed = start.elapsed().as_micros() as u64;

        // Cancelled while generating: report without the payload.
        let done = if task.cancelled.load(Ordering::Relaxed) {
            cancelled(task.coord)
        } else {
            CompletedChunk {
                coord: task.coord,
                payload: Some(payload),
                generation_time_us: elapsed,
            }
        };
        if results.send(done).is_err() {
            return;
        }
    }
}

fn cancelled(coord: ChunkCoord) -> CompletedChunk {
    CompletedChunk {
        coord,
        payload: None,
        generation_time_us: 0,
    }
}

impl ChunkExecutor for AsyncChunkGenerator {
    fn submit(&self, coord: ChunkCoord) -> Result<(), ChunkCoord> {
        let Some(sender) = &self.task_sender else {
            return Err(coord);
        };
        if self.in_flight.load(Ordering::Relaxed) >= self.max_in_flight {
            return Err(coord);
        }

        let cancelled = Arc::new(AtomicBool::new(false));
        self.active_tasks.insert(coord, Arc::clone(&cancelled));
        self.in_flight.fetch_add(1, Ordering::Relaxed);

        sender.try_send(GenerationTask { coord, cancelled }).map_err(|e| {
            self.in_flight.fetch_sub(1, Ordering::Relaxed);
            let coord = e.into_inner().coord;
            self.active_tasks.remove(&coord);
            coord
        })
    }

    fn cancel(&self, coord: ChunkCoord) {
        if let Some(flag) = self.active_tasks.get(&coord) {
            flag.store(true, Ordering::Relaxed);
            trace!(%coord, "generation cancelled");
        }
    }

    fn drain_completed(&self) -> Vec<CompletedChunk> {
        let mut results = Vec::new();
        while let Ok(done) = self.result_receiver.try_recv() {
            self.active_tasks.remove(&done.coord);
            self.in_flight.fetch_sub(1, Ordering::Relaxed);
            results.push(done);
        }
        results
    }

    fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }
}

impl Drop for AsyncChunkGenerator {
    fn drop(&mut self) {
        // Closing the task channel ends every worker loop.
        self.task_sender = None;
        while self.result_receiver.try_recv().is_ok() {}
        for handle in self.workers.drain(..) {
            // Workers blocked on a full result channel wake once it drains.
            while !handle.is_finished() {
                while self.result_receiver.try_recv().is_ok() {}
                std::thread::yield_now();
            }
            let _ = handle.join();
        }
    }
}

impl std::fmt::Debug for AsyncChunkGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncChunkGenerator")
            .field("threads", &self.thread_count())
            .field("in_flight", &self.in_flight())
            .field("max_in_flight", &self.max_in_flight)
            .finish()
    }
}
