use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;

use tokio::sync::oneshot;

use crate::config::ExecutorOptions;
use crate::error::RemoteError;

/// A unit of work run on the main thread with exclusive access to the state.
pub type Task<S> = Box<dyn FnOnce(&mut S) + Send + 'static>;

/// Owns the application state and runs queued tasks on the thread that drives it.
///
/// Other threads never touch the state; they send tasks through an
/// [`ExecutorHandle`]. Tasks run in submission order, and a task that panics is
/// logged and does not affect the tasks after it.
///
/// # Example
///
/// ```
/// use bat_remote::MainThreadExecutor;
///
/// let mut executor = MainThreadExecutor::new(0i64);
/// let handle = executor.handle();
///
/// handle.submit(|frame| *frame = 5).unwrap();
/// handle.submit(|frame| *frame += 1).unwrap();
/// assert_eq!(executor.tick(), 2);
/// assert_eq!(*executor.state(), 6);
/// ```
pub struct MainThreadExecutor<S> {
    state: S,
    sender: mpsc::Sender<Task<S>>,
    receiver: mpsc::Receiver<Task<S>>,
}

impl<S> MainThreadExecutor<S> {
    /// Take ownership of the state.
    pub fn new(state: S) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            state,
            sender,
            receiver,
        }
    }

    /// Create a handle that submits tasks to this executor.
    pub fn handle(&self) -> ExecutorHandle<S> {
        ExecutorHandle {
            sender: self.sender.clone(),
        }
    }

    /// The application state.
    pub fn state(&self) -> &S {
        &self.state
    }

    /// The application state, for changes made by the main thread itself.
    pub fn state_mut(&mut self) -> &mut S {
        &mut self.state
    }

    /// Give back the application state.
    pub fn into_state(self) -> S {
        self.state
    }

    /// Run the tasks queued before the tick started.
    ///
    /// Tasks submitted while the tick runs wait for the next one.
    ///
    /// # Returns
    ///
    /// The number of tasks that ran, including the ones that panicked.
    pub fn tick(&mut self) -> usize {
        let tasks = self.receiver.try_iter().collect::<Vec<_>>();
        let count = tasks.len();
        for task in tasks {
            let state = &mut self.state;
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(move || task(state))) {
                log::error!("main thread task failed: {}", panic_message(&*payload));
            }
        }
        count
    }

    /// Tick periodically until `shutdown` is set.
    pub fn run(&mut self, options: &ExecutorOptions, shutdown: &AtomicBool) {
        log::info!("main thread executor running every {:?}", options.tick);
        while !shutdown.load(Ordering::SeqCst) {
            let count = self.tick();
            if count > 0 {
                log::debug!("ran {count} main thread tasks");
            }
            std::thread::sleep(options.tick);
        }
        // finish what was queued before the shutdown
        self.tick();
        log::info!("main thread executor stopped");
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}

/// Sends tasks to a [`MainThreadExecutor`] from any thread.
pub struct ExecutorHandle<S> {
    sender: mpsc::Sender<Task<S>>,
}

impl<S> Clone for ExecutorHandle<S> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<S> ExecutorHandle<S> {
    /// Queue a task without waiting for it.
    ///
    /// # Errors
    ///
    /// If the executor was dropped.
    pub fn submit(&self, task: impl FnOnce(&mut S) + Send + 'static) -> Result<(), RemoteError> {
        self.sender
            .send(Box::new(task))
            .map_err(|_| RemoteError::ExecutorClosed)
    }

    /// Queue a task and get a receiver for its result.
    ///
    /// Every call gets its own result slot, so a late answer to one request can
    /// never be read by another.
    ///
    /// # Errors
    ///
    /// If the executor was dropped.
    pub fn request<R: Send + 'static>(
        &self,
        task: impl FnOnce(&mut S) -> R + Send + 'static,
    ) -> Result<oneshot::Receiver<R>, RemoteError> {
        let (tx, rx) = oneshot::channel();
        self.submit(move |state| {
            // the requester may have given up already
            let _ = tx.send(task(state));
        })?;
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn test_tasks_run_in_order() -> Result<(), RemoteError> {
        let mut executor = MainThreadExecutor::new(Vec::new());
        let handle = executor.handle();
        for i in 0..5 {
            handle.submit(move |v: &mut Vec<i32>| v.push(i))?;
        }
        assert!(executor.state().is_empty());
        assert_eq!(executor.tick(), 5);
        assert_eq!(executor.state(), &vec![0, 1, 2, 3, 4]);
        assert_eq!(executor.tick(), 0);
        Ok(())
    }

    #[test]
    fn test_tasks_queued_during_tick_wait() -> Result<(), RemoteError> {
        let mut executor = MainThreadExecutor::new(Vec::new());
        let handle = executor.handle();

        // a task that queues the next one keeps the queue busy forever
        fn requeue(handle: ExecutorHandle<Vec<usize>>, v: &mut Vec<usize>) {
            v.push(v.len());
            let next = handle.clone();
            if let Err(e) = handle.submit(move |v| requeue(next, v)) {
                panic!("{e}");
            }
        }
        let first = handle.clone();
        handle.submit(move |v| requeue(first, v))?;

        assert_eq!(executor.tick(), 1);
        assert_eq!(executor.state(), &vec![0]);
        assert_eq!(executor.tick(), 1);
        assert_eq!(executor.state(), &vec![0, 1]);
        Ok(())
    }

    #[test]
    fn test_panicking_task_does_not_block_queue() -> Result<(), RemoteError> {
        let mut executor = MainThreadExecutor::new(0);
        let handle = executor.handle();
        handle.submit(|v| *v += 1)?;
        handle.submit(|_| panic!("boom"))?;
        handle.submit(|v| *v += 10)?;

        assert_eq!(executor.tick(), 3);
        assert_eq!(*executor.state(), 11);
        Ok(())
    }

    #[test]
    fn test_request_from_other_thread() -> Result<(), Box<dyn std::error::Error>> {
        let mut executor = MainThreadExecutor::new(String::from("scene"));
        let handle = executor.handle();

        let requester = std::thread::spawn(move || {
            let rx = handle.request(|s: &mut String| s.len())?;
            rx.blocking_recv().map_err(|_| RemoteError::TaskDropped)
        });

        while !requester.is_finished() {
            executor.tick();
            std::thread::sleep(Duration::from_millis(1));
        }
        let len = requester.join().map_err(|_| "requester panicked")??;
        assert_eq!(len, 5);
        Ok(())
    }

    #[test]
    fn test_dropped_request_is_discarded() -> Result<(), RemoteError> {
        let mut executor = MainThreadExecutor::new(1);
        let rx = executor.handle().request(|v: &mut i32| *v * 2)?;
        drop(rx);
        assert_eq!(executor.tick(), 1);
        Ok(())
    }

    #[test]
    fn test_run_until_shutdown() -> Result<(), RemoteError> {
        let mut executor = MainThreadExecutor::new(0);
        let handle = executor.handle();
        let shutdown = Arc::new(AtomicBool::new(false));

        let stopper = {
            let shutdown = shutdown.clone();
            std::thread::spawn(move || {
                handle.submit(|v: &mut i32| *v = 7)?;
                handle.submit(move |_: &mut i32| shutdown.store(true, Ordering::SeqCst))
            })
        };

        let options = ExecutorOptions {
            tick: Duration::from_millis(1),
        };
        executor.run(&options, &shutdown);
        assert!(matches!(stopper.join(), Ok(Ok(()))));
        assert_eq!(executor.into_state(), 7);
        Ok(())
    }

    #[test]
    fn test_submit_after_drop() {
        let executor = MainThreadExecutor::new(0);
        let handle = executor.handle();
        drop(executor);
        assert!(matches!(
            handle.submit(|v| *v += 1),
            Err(RemoteError::ExecutorClosed)
        ));
    }
}
