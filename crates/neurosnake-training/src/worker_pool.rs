//! Fixed-size thread pool for simulation and crossover jobs.
//!
//! Jobs wait in one FIFO queue guarded by a mutex and a condition variable.
//! [`WorkerPool::submit`] returns a [`JobHandle`] that yields the job result;
//! joining every handle of a phase is how the trainer waits for the phase to
//! finish. A panicking job is caught and reported through its handle.

use std::{
    any::Any,
    collections::VecDeque,
    io,
    panic::{self, AssertUnwindSafe},
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, mpsc},
    thread::{self, JoinHandle},
};

type Job = Box<dyn FnOnce() + Send + 'static>;

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum PoolError {
    #[display("failed to spawn worker thread")]
    Spawn { source: io::Error },
    #[display("worker pool is shut down")]
    ShutDown,
    #[display("job panicked: {message}")]
    JobPanicked { message: String },
    #[display("job was dropped before it completed")]
    JobLost,
}

#[derive(Default)]
struct Queue {
    jobs: VecDeque<Job>,
    running: usize,
    shutdown: bool,
}

#[derive(Default)]
struct Shared {
    queue: Mutex<Queue>,
    available: Condvar,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Queue> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Result of one submitted job.
#[derive(Debug)]
pub struct JobHandle<T> {
    receiver: mpsc::Receiver<thread::Result<T>>,
}

impl<T> JobHandle<T> {
    /// Blocks until the job has run.
    pub fn join(self) -> Result<T, PoolError> {
        match self.receiver.recv() {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(payload)) => Err(PoolError::JobPanicked {
                message: panic_message(payload.as_ref()),
            }),
            Err(mpsc::RecvError) => Err(PoolError::JobLost),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}

pub struct WorkerPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("workers", &self.workers.len())
            .finish_non_exhaustive()
    }
}

impl WorkerPool {
    /// Starts `size` worker threads (at least one).
    pub fn new(size: usize) -> Result<Self, PoolError> {
        let shared = Arc::new(Shared::default());
        let mut pool = Self {
            shared,
            workers: Vec::with_capacity(size.max(1)),
        };
        for i in 0..size.max(1) {
            let shared = Arc::clone(&pool.shared);
            let worker = thread::Builder::new()
                .name(format!("neurosnake-worker-{i}"))
                .spawn(move || worker_loop(&shared))
                .map_err(|source| PoolError::Spawn { source })?;
            pool.workers.push(worker);
        }
        log::debug!("started {} worker threads", pool.workers.len());
        Ok(pool)
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Queues a job and wakes one idle worker.
    pub fn submit<F, T>(&self, job: F) -> Result<JobHandle<T>, PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let (sender, receiver) = mpsc::sync_channel(1);
        let job: Job = Box::new(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(job));
            // The handle may have been dropped; nobody wants the result then.
            let _ = sender.send(result);
        });

        let mut queue = self.shared.lock();
        if queue.shutdown {
            return Err(PoolError::ShutDown);
        }
        queue.jobs.push_back(job);
        drop(queue);
        self.shared.available.notify_one();
        Ok(JobHandle { receiver })
    }

    /// Returns `true` while a job is queued or running.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        let queue = self.shared.lock();
        !queue.jobs.is_empty() || queue.running > 0
    }

    /// Stops accepting jobs, lets the workers drain the queue and joins them.
    pub fn shutdown(&mut self) {
        self.shared.lock().shutdown = true;
        self.shared.available.notify_all();
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::error!("worker thread exited with a panic");
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn worker_loop(shared: &Shared) {
    loop {
        let job = {
            let mut queue = shared.lock();
            loop {
                if let Some(job) = queue.jobs.pop_front() {
                    queue.running += 1;
                    break job;
                }
                if queue.shutdown {
                    return;
                }
                queue = shared
                    .available
                    .wait(queue)
                    .unwrap_or_else(PoisonError::into_inner);
            }
        };
        job();
        shared.lock().running -= 1;
    }
}

#[cfg(test)]
mod tests {
    use std::{
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    use super::*;

    #[test]
    fn test_jobs_return_values_in_submit_order() {
        let pool = WorkerPool::new(4).unwrap();
        let handles: Vec<_> = (0..100)
            .map(|i| pool.submit(move || i * 2).unwrap())
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(results, (0..100).map(|i| i * 2).collect::<Vec<_>>());
    }

    #[test]
    fn test_zero_size_starts_one_worker() {
        let pool = WorkerPool::new(0).unwrap();
        assert_eq!(pool.size(), 1);
        assert_eq!(pool.submit(|| 7).unwrap().join().unwrap(), 7);
    }

    #[test]
    fn test_panic_is_reported() {
        let pool = WorkerPool::new(2).unwrap();
        let handle = pool.submit(|| -> usize { panic!("boom") }).unwrap();
        match handle.join() {
            Err(PoolError::JobPanicked { message }) => assert_eq!(message, "boom"),
            other => panic!("unexpected result: {other:?}"),
        }
        // the worker survives the panic
        assert_eq!(pool.submit(|| 1).unwrap().join().unwrap(), 1);
    }

    #[test]
    fn test_shutdown_drains_queue() {
        let counter = Arc::new(AtomicUsize::new(0));
        let mut pool = WorkerPool::new(2).unwrap();
        for _ in 0..50 {
            let counter = Arc::clone(&counter);
            let _handle = pool
                .submit(move || {
                    thread::sleep(Duration::from_millis(1));
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
        }
        pool.shutdown();
        assert_eq!(counter.load(Ordering::SeqCst), 50);
        assert!(!pool.is_busy());
        assert!(matches!(pool.submit(|| ()), Err(PoolError::ShutDown)));
    }

    #[test]
    fn test_is_busy_while_running() {
        let pool = WorkerPool::new(1).unwrap();
        let (release, wait) = mpsc::channel::<()>();
        let handle = pool
            .submit(move || {
                let _ = wait.recv();
            })
            .unwrap();
        assert!(pool.is_busy());
        release.send(()).unwrap();
        handle.join().unwrap();
        // running is decremented after the result is sent
        for _ in 0..1000 {
            if !pool.is_busy() {
                return;
            }
            thread::sleep(Duration::from_millis(1));
        }
        panic!("pool stayed busy");
    }
}
