use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use tokio_util::sync::CancellationToken;

use crate::job::Job;
use crate::metrics::Metrics;
use crate::routes;

/// Runs a [`Job`] on a fixed interval next to the metrics HTTP server.
pub struct Monitor {
    job: Arc<dyn Job>,
    metrics: Arc<Metrics>,
    interval: Duration,
    listen: SocketAddr,
}

impl Monitor {
    pub fn new(
        job: Arc<dyn Job>,
        metrics: Arc<Metrics>,
        interval: Duration,
        listen: SocketAddr,
    ) -> Self {
        Self {
            job,
            metrics,
            interval,
            listen,
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Serves metrics and polls until `cancel` fires, then stops the server
    /// gracefully. Must run on the actix system runtime.
    pub async fn run(self, cancel: CancellationToken) -> std::io::Result<()> {
        let data = web::Data::from(Arc::clone(&self.metrics));
        let server = HttpServer::new(move || {
            App::new()
                .app_data(data.clone())
                .configure(routes::configure)
        })
        .disable_signals()
        .bind(self.listen)?
        .run();
        let handle = server.handle();
        let server_task = actix_web::rt::spawn(server);
        tracing::info!(address = %self.listen, "metrics server listening");

        self.poll(&cancel).await;

        handle.stop(true).await;
        match server_task.await {
            Ok(res) => res,
            Err(e) => Err(std::io::Error::other(e)),
        }
    }

    /// The scrape loop. Both the running iteration and the sleep race
    /// cancellation, so a hung RPC doesn't hold up shutdown.
    pub async fn poll(&self, cancel: &CancellationToken) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = self.job.process() => {}
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
        tracing::info!("context closed, monitor stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::ChainMode;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        runs: AtomicUsize,
        cancel_after: usize,
        cancel: CancellationToken,
    }

    #[async_trait]
    impl Job for Counting {
        async fn process(&self) {
            if self.runs.fetch_add(1, Ordering::SeqCst) + 1 == self.cancel_after {
                self.cancel.cancel();
            }
        }
    }

    struct Hung;

    #[async_trait]
    impl Job for Hung {
        async fn process(&self) {
            std::future::pending::<()>().await;
        }
    }

    fn monitor(job: Arc<dyn Job>, interval: Duration) -> Monitor {
        let metrics = Arc::new(Metrics::new(ChainMode::FsChain).unwrap());
        Monitor::new(job, metrics, interval, "127.0.0.1:0".parse().unwrap())
    }

    #[tokio::test]
    async fn test_poll_repeats_until_cancelled() {
        let cancel = CancellationToken::new();
        let job = Arc::new(Counting {
            runs: AtomicUsize::new(0),
            cancel_after: 3,
            cancel: cancel.clone(),
        });
        let m = monitor(job.clone(), Duration::from_millis(1));

        tokio::time::timeout(Duration::from_secs(5), m.poll(&cancel))
            .await
            .unwrap();
        assert_eq!(job.runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_sleep() {
        let cancel = CancellationToken::new();
        let job = Arc::new(Counting {
            runs: AtomicUsize::new(0),
            cancel_after: usize::MAX,
            cancel: cancel.clone(),
        });
        let m = monitor(job.clone(), Duration::from_secs(3600));

        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            stopper.cancel();
        });
        tokio::time::timeout(Duration::from_secs(5), m.poll(&cancel))
            .await
            .unwrap();
        assert_eq!(job.runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_hung_iteration() {
        let cancel = CancellationToken::new();
        let m = monitor(Arc::new(Hung), Duration::from_millis(1));

        let stopper = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            stopper.cancel();
        });
        tokio::time::timeout(Duration::from_secs(5), m.poll(&cancel))
            .await
            .unwrap();
    }

    #[actix_rt::test]
    async fn test_run_stops_server_on_cancel() {
        let cancel = CancellationToken::new();
        let job = Arc::new(Counting {
            runs: AtomicUsize::new(0),
            cancel_after: 1,
            cancel: cancel.clone(),
        });
        let m = monitor(job, Duration::from_millis(1));

        tokio::time::timeout(Duration::from_secs(10), m.run(cancel))
            .await
            .unwrap()
            .unwrap();
    }
}
