//! Execution of asynchronous reads off the caller's thread.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, unbounded, Receiver, RecvTimeoutError, Sender};
use once_cell::sync::Lazy;
use tracing::{trace, warn};

use crate::error::{Error, Result};

/// The values read for the elements of a path, in index order.
pub type ValueSequence = Vec<u64>;

/// Completion of an asynchronous read.
///
/// Invoked exactly once with the values and `None`, or with an error status. On error
/// the sequence holds whatever could be read, usually nothing.
pub trait AsyncIo: Send + 'static {
    fn complete(self: Box<Self>, values: ValueSequence, status: Option<Error>);
}

impl<F> AsyncIo for F
where
    F: FnOnce(ValueSequence, Option<Error>) + Send + 'static,
{
    fn complete(self: Box<Self>, values: ValueSequence, status: Option<Error>) {
        (*self)(values, status)
    }
}

pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// How long a worker without work stays around.
const IDLE_TIMEOUT: Duration = Duration::from_secs(5);

/// A pool of worker threads running posted jobs.
///
/// A job is handed to an idle worker, or to a worker started for it if all are busy.
/// Jobs therefore never wait for each other: a slow transport only holds up its own
/// reads, and a callback may start another read and wait for it. Workers exit after
/// idling for a while, and once every handle on the dispatcher is gone.
#[derive(Debug, Clone)]
pub struct AsyncDispatcher {
    jobs: Sender<Job>,
    queue: Receiver<Job>,
    // Workers waiting for a job that no posted job has been promised to yet.
    idle: Arc<AtomicUsize>,
}

static GLOBAL: Lazy<AsyncDispatcher> = Lazy::new(AsyncDispatcher::new);

impl AsyncDispatcher {
    pub fn new() -> Self {
        let (jobs, queue) = unbounded::<Job>();
        Self {
            jobs,
            queue,
            idle: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// The process-wide dispatcher used by
    /// [`ValueAccessor::get_val_async`](super::ValueAccessor::get_val_async).
    pub fn global() -> &'static AsyncDispatcher {
        &GLOBAL
    }

    fn claim_idle(idle: &AtomicUsize) -> bool {
        idle.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1))
            .is_ok()
    }

    fn run(queue: Receiver<Job>, idle: Arc<AtomicUsize>) {
        loop {
            match queue.recv_timeout(IDLE_TIMEOUT) {
                Ok(job) => {
                    job();
                    idle.fetch_add(1, Ordering::AcqRel);
                }
                // Every idle worker is promised to a job on its way; keep waiting.
                Err(RecvTimeoutError::Timeout) if !Self::claim_idle(&idle) => {}
                Err(_) => break,
            }
        }
        trace!("async worker done");
    }

    /// Run `job` on a worker thread.
    ///
    /// `job` is never run on the calling thread. An error means no worker could be
    /// started and `job` was dropped unrun.
    pub(crate) fn post(&self, job: Job) -> Result<()> {
        if !Self::claim_idle(&self.idle) {
            let queue = self.queue.clone();
            let idle = Arc::clone(&self.idle);
            thread::Builder::new()
                .name("regpath-async".to_string())
                .spawn(move || Self::run(queue, idle))
                .map_err(|e| {
                    warn!(error = %e, "could not start async worker");
                    Error::Io(format!("cannot schedule read: {}", e))
                })?;
        }
        self.jobs
            .send(job)
            .map_err(|_| Error::Io("async queue closed".into()))
    }
}

impl Default for AsyncDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Sending half of a [`completion`] pair; pass it as the callback of an async read.
#[derive(Debug)]
pub struct Completer {
    slot: Sender<(ValueSequence, Option<Error>)>,
}

impl AsyncIo for Completer {
    fn complete(self: Box<Self>, values: ValueSequence, status: Option<Error>) {
        // The waiter may have given up; nothing to report then.
        let _ = self.slot.send((values, status));
    }
}

/// Receiving half of a [`completion`] pair.
#[derive(Debug)]
pub struct Completion {
    slot: Receiver<(ValueSequence, Option<Error>)>,
}

impl Completion {
    /// Block until the read has completed.
    pub fn wait(self) -> (ValueSequence, Option<Error>) {
        self.slot.recv().unwrap_or_else(|_| Self::abandoned())
    }

    /// Like [`Completion::wait`] but gives up after `timeout`, handing the completion
    /// back.
    pub fn wait_timeout(
        self,
        timeout: Duration,
    ) -> core::result::Result<(ValueSequence, Option<Error>), Completion> {
        match self.slot.recv_timeout(timeout) {
            Ok(done) => Ok(done),
            Err(e) if e.is_timeout() => Err(self),
            Err(_) => Ok(Self::abandoned()),
        }
    }

    /// Block until the read has completed and fold the status into a `Result`.
    pub fn wait_result(self) -> Result<ValueSequence> {
        match self.wait() {
            (values, None) => Ok(values),
            (_, Some(e)) => Err(e),
        }
    }

    fn abandoned() -> (ValueSequence, Option<Error>) {
        (
            ValueSequence::new(),
            Some(Error::Io("read dropped before completion".into())),
        )
    }
}

/// A single-slot rendezvous between an async read and a waiting thread.
pub fn completion() -> (Completer, Completion) {
    let (slot, rx) = bounded(1);
    (Completer { slot }, Completion { slot: rx })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jobs_run_off_the_caller_thread() {
        let dispatcher = AsyncDispatcher::new();
        let caller = thread::current().id();
        let (tx, rx) = bounded(1);
        dispatcher
            .post(Box::new(move || {
                tx.send(thread::current().id() != caller).unwrap();
            }))
            .unwrap();
        assert!(rx.recv().unwrap());
    }

    #[test]
    fn jobs_do_not_wait_for_each_other() {
        let dispatcher = AsyncDispatcher::new();
        let (release, gate) = bounded::<()>(0);
        dispatcher
            .post(Box::new(move || {
                let _ = gate.recv();
            }))
            .unwrap();

        let (tx, rx) = bounded(1);
        dispatcher
            .post(Box::new(move || tx.send(()).unwrap()))
            .unwrap();
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
        drop(release);
    }

    #[test]
    fn nested_jobs_complete() {
        let dispatcher = AsyncDispatcher::new();
        let inner = dispatcher.clone();
        let (tx, rx) = bounded(1);
        dispatcher
            .post(Box::new(move || {
                let (itx, irx) = bounded(1);
                inner.post(Box::new(move || itx.send(7).unwrap())).unwrap();
                tx.send(irx.recv_timeout(Duration::from_secs(5)).ok()).unwrap();
            }))
            .unwrap();
        assert_eq!(rx.recv().unwrap(), Some(7));
    }

    #[test]
    fn idle_workers_are_reused() {
        let dispatcher = AsyncDispatcher::new();
        let (tx, rx) = unbounded();
        let mut workers = Vec::new();
        for _ in 0..3 {
            let tx = tx.clone();
            dispatcher
                .post(Box::new(move || tx.send(thread::current().id()).unwrap()))
                .unwrap();
            workers.push(rx.recv().unwrap());
            // Let the worker report itself idle before the next post.
            thread::sleep(Duration::from_millis(50));
        }
        assert!(workers.iter().all(|w| *w == workers[0]));
        assert_eq!(dispatcher.idle.load(Ordering::Acquire), 1);
    }

    #[test]
    fn completion_carries_status() {
        let (done, waiter) = completion();
        Box::new(done).complete(vec![1, 2], Some(Error::Io("gone".into())));
        let (values, status) = waiter.wait();
        assert_eq!(values, [1, 2]);
        assert_eq!(status, Some(Error::Io("gone".into())));
    }

    #[test]
    fn dropped_completer_unblocks_waiter() {
        let (done, waiter) = completion();
        drop(done);
        assert!(waiter.wait_result().unwrap_err().is_io());

        let (_done, waiter) = completion();
        assert!(waiter.wait_timeout(Duration::from_millis(10)).is_err());
    }

    #[test]
    fn closures_are_callbacks() {
        let calls = Arc::new(AtomicUsize::new(0));
        let c = calls.clone();
        let cb: Box<dyn AsyncIo> = Box::new(move |v: ValueSequence, s: Option<Error>| {
            assert_eq!(v.len(), 3);
            assert!(s.is_none());
            c.fetch_add(1, Ordering::SeqCst);
        });
        cb.complete(vec![0; 3], None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
