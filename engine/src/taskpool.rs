use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

/// Spawns the controller's background work: network requests (bounded by a
/// semaphore) and cancellable timers.
///
/// Dropping the pool cancels everything it spawned.
pub struct TaskPool {
    semaphore: Arc<Semaphore>,
    cancel_token: CancellationToken,
}

impl TaskPool {
    pub fn new(n_tasks: usize) -> TaskPool {
        let semaphore = Arc::new(Semaphore::new(n_tasks));
        let cancel_token = CancellationToken::new();

        TaskPool {
            semaphore,
            cancel_token,
        }
    }

    /// Runs `func` once a permit is available.
    pub fn execute<F, T>(&self, func: F)
    where
        F: Future<Output = T> + Send + 'static,
        T: Send,
    {
        let semaphore = self.semaphore.clone();
        let token = self.cancel_token.clone();
        tokio::spawn(async move {
            let main = async {
                let Ok(_permit) = semaphore.acquire().await else {
                    return;
                };
                func.await;
            };

            tokio::select! {
                () = main => {},
                () = token.cancelled() => {}
            }
        });
    }

    /// Runs `func` after `delay` unless the returned token is cancelled first.
    ///
    /// Timers do not take a permit.
    pub fn schedule<F>(&self, delay: Duration, func: F) -> CancellationToken
    where
        F: FnOnce() + Send + 'static,
    {
        let token = self.cancel_token.child_token();
        let timer_token = token.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(delay) => func(),
                () = timer_token.cancelled() => {}
            }
        });
        token
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        self.semaphore.close();
        self.cancel_token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_schedule_fires_after_delay() {
        let pool = TaskPool::new(2);
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let _token = pool.schedule(Duration::from_secs(20), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(19)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let pool = TaskPool::new(2);
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let token = pool.schedule(Duration::from_secs(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        token.cancel();

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_pending_work() {
        let pool = TaskPool::new(2);
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        let _token = pool.schedule(Duration::from_secs(1), move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = fired.clone();
        pool.execute(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            counter.fetch_add(1, Ordering::SeqCst);
        });
        drop(pool);

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
