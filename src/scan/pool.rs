// src/scan/pool.rs
// =============================================================================
// This module runs the scan: one reader feeding a fixed pool of workers.
//
// How it works:
// 1. The dispatcher creates a bounded channel (the job queue)
// 2. It spawns N workers that all pull from the same receiver
// 3. It reads the input line by line, skipping blanks and # comments,
//    and pushes each target onto the queue
// 4. When input runs out it drops the sender, which closes the queue
// 5. Workers drain what's left, see the closed queue, and stop
// 6. The dispatcher waits for every worker before returning
//
// Each worker handles one target at a time:
//   receive -> fetch -> extract -> emit -> sleep -> receive ...
//
// Rust concepts:
// - Arc: Shares the ScanContext and the receiver between tasks
// - tokio::sync::mpsc: Async channel; bounded, so reading pauses when full
// - tokio::sync::Mutex: mpsc has one receiver, so workers take turns on it
// =============================================================================

use futures::future::join_all;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, trace, warn};

use super::fetch::Fetcher;
use super::sink::OutputSink;
use super::{ScanConfig, ScanStats};
use crate::csp::{extract_domains, DomainRegistry};

// Everything a worker needs, owned in one place and shared by Arc
//
// The registry and the sink are the only state workers write to, and both
// lock internally.
pub struct ScanContext {
    pub config: ScanConfig,
    pub fetcher: Fetcher,
    pub registry: DomainRegistry,
    pub sink: OutputSink,
    pub stats: ScanStats,
}

impl ScanContext {
    pub fn new(config: ScanConfig, sink: OutputSink) -> anyhow::Result<Self> {
        let fetcher = Fetcher::new(&config)?;
        Ok(Self {
            config,
            fetcher,
            registry: DomainRegistry::new(),
            sink,
            stats: ScanStats::default(),
        })
    }
}

// Returns the target on an input line, or None for blank and # lines
pub fn target_line(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        None
    } else {
        Some(line)
    }
}

// Fetch -> extract -> emit for one target
//
// Failures are logged at debug level and otherwise ignored: the target is
// simply skipped. Returns how many new domains were printed.
pub async fn scan_target(ctx: &ScanContext, target: &str) -> usize {
    ctx.stats.record_target();

    let header = match ctx.fetcher.fetch_csp(target).await {
        Ok(Some(header)) => header,
        Ok(None) => {
            debug!(url = %target, "no Content-Security-Policy header");
            return 0;
        }
        Err(err) => {
            ctx.stats.record_failure();
            debug!(url = %target, error = %err, "fetch failed");
            return 0;
        }
    };
    ctx.stats.record_csp();

    let domains = extract_domains(&header, &ctx.registry, ctx.config.strip_wildcard);
    trace!(url = %target, new = domains.len(), "extracted domains");

    let mut emitted = 0;
    for domain in &domains {
        match ctx.sink.emit(domain) {
            Ok(()) => emitted += 1,
            Err(err) => warn!(domain = %domain, error = %err, "failed to write domain"),
        }
    }
    ctx.stats.record_emitted(emitted);

    emitted
}

// Dispatcher: feeds every target in `input` to the worker pool
//
// Returns once the input is exhausted AND every worker has stopped.
// Returns the number of targets queued.
pub async fn run_workers<R>(ctx: Arc<ScanContext>, input: R) -> usize
where
    R: AsyncBufRead + Unpin,
{
    let (jobs_tx, jobs_rx) = mpsc::channel::<String>(ctx.config.queue_capacity.max(1));
    let jobs_rx = Arc::new(Mutex::new(jobs_rx));

    let workers: Vec<_> = (0..ctx.config.workers.max(1))
        .map(|id| tokio::spawn(worker(id, Arc::clone(&ctx), Arc::clone(&jobs_rx))))
        .collect();
    debug!(workers = workers.len(), "started workers");

    let mut queued = 0;
    let mut line_no = 0;
    // Split on raw bytes so one line of bad UTF-8 can't end the whole read
    let mut lines = input.split(b'\n');
    loop {
        let bytes = match lines.next_segment().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => break,
            Err(err) => {
                warn!(error = %err, "error reading input, stopping early");
                break;
            }
        };
        line_no += 1;

        let line = match String::from_utf8(bytes) {
            Ok(line) => line,
            Err(err) => {
                warn!(line = line_no, error = %err, "skipping input line that isn't UTF-8");
                continue;
            }
        };
        let Some(target) = target_line(&line) else {
            continue;
        };

        // Only fails if every worker is gone
        if jobs_tx.send(target.to_string()).await.is_err() {
            warn!("all workers stopped early, dropping remaining input");
            break;
        }
        queued += 1;
    }

    // Closing the queue is the workers' signal to finish
    drop(jobs_tx);

    for result in join_all(workers).await {
        if let Err(err) = result {
            warn!(error = %err, "worker task failed");
        }
    }

    queued
}

async fn worker(id: usize, ctx: Arc<ScanContext>, jobs: Arc<Mutex<mpsc::Receiver<String>>>) {
    loop {
        // The lock guard is a temporary, so it is released before scanning
        let next = jobs.lock().await.recv().await;
        let Some(target) = next else {
            break;
        };

        trace!(worker = id, url = %target, "picked up target");
        scan_target(&ctx, &target).await;

        if !ctx.config.delay.is_zero() {
            tokio::time::sleep(ctx.config.delay).await;
        }
    }

    debug!(worker = id, "queue closed, worker stopped");
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why wrap the receiver in a Mutex?
//    - tokio's mpsc channel is multi-producer, SINGLE-consumer
//    - recv() needs &mut self, so only one task can call it at a time
//    - The Mutex makes workers take turns; whoever holds it gets the next job
//
// 2. How do workers know to stop?
//    - recv() returns None once every sender is dropped AND the queue is empty
//    - The dispatcher owns the only sender, so drop(jobs_tx) ends the run
//
// 3. What does join_all do?
//    - Waits for a whole Vec of futures (here: JoinHandles) to finish
//    - A JoinHandle resolves to Err if the task panicked
//
// 4. What is let-else?
//    - let Some(x) = value else { ... };
//    - Binds x if the pattern matches, otherwise runs the else block,
//      which must leave the scope (break, continue, return)
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::sink::SharedBuffer;
    use std::collections::HashSet;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn context(workers: usize, strip_wildcard: bool) -> (Arc<ScanContext>, SharedBuffer) {
        let config = ScanConfig {
            workers,
            queue_capacity: workers,
            delay: Duration::ZERO,
            strip_wildcard,
            ..ScanConfig::default()
        };
        let buffer = SharedBuffer::default();
        let sink = OutputSink::with_writer(Box::new(buffer.clone()), None);
        (Arc::new(ScanContext::new(config, sink).unwrap()), buffer)
    }

    async fn mount_csp(server: &MockServer, route: &str, csp: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).insert_header("Content-Security-Policy", csp))
            .mount(server)
            .await;
    }

    #[test]
    fn test_target_line() {
        assert_eq!(target_line("  https://a.test  "), Some("https://a.test"));
        assert_eq!(target_line(""), None);
        assert_eq!(target_line("   "), None);
        assert_eq!(target_line("# comment"), None);
        assert_eq!(target_line("   # indented comment"), None);
    }

    #[tokio::test]
    async fn test_scan_target_emits_new_domains() {
        let server = MockServer::start().await;
        mount_csp(
            &server,
            "/",
            "default-src 'self'; script-src *.example.com https://cdn.test:8443/js; img-src example.com",
        )
        .await;

        let (ctx, buffer) = context(1, false);
        let emitted = scan_target(&ctx, &server.uri()).await;

        assert_eq!(emitted, 2);
        assert_eq!(buffer.lines(), vec!["*.example.com", "cdn.test"]);
    }

    #[tokio::test]
    async fn test_scan_target_without_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let (ctx, buffer) = context(1, false);
        assert_eq!(scan_target(&ctx, &server.uri()).await, 0);
        assert!(buffer.lines().is_empty());

        let summary = ctx.stats.summary();
        assert_eq!(summary.targets, 1);
        assert_eq!(summary.with_csp, 0);
        assert_eq!(summary.failed, 0);
    }

    #[tokio::test]
    async fn test_scan_target_skips_unreachable() {
        let (ctx, buffer) = context(1, false);
        assert_eq!(scan_target(&ctx, "definitely not a url").await, 0);
        assert!(buffer.lines().is_empty());
        assert_eq!(ctx.stats.summary().failed, 1);
    }

    #[tokio::test]
    async fn test_run_workers_end_to_end() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/site1"))
            .respond_with(ResponseTemplate::new(200).insert_header(
                "Content-Security-Policy",
                "default-src 'self'; script-src https://a.example.com *.b.example.com; img-src b.example.com",
            ))
            .expect(2)
            .mount(&server)
            .await;

        let url = format!("{}/site1", server.uri());
        let input = format!("# comment\n \n{}\n{}\n", url, url);

        let (ctx, buffer) = context(2, true);
        let queued = run_workers(Arc::clone(&ctx), input.as_bytes()).await;

        assert_eq!(queued, 2);
        let mut lines = buffer.lines();
        lines.sort();
        assert_eq!(lines, vec!["a.example.com", "b.example.com"]);

        let summary = ctx.stats.summary();
        assert_eq!(summary.targets, 2);
        assert_eq!(summary.with_csp, 2);
        assert_eq!(summary.emitted, 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_shared_domain_emitted_once_across_workers() {
        let server = MockServer::start().await;
        let mut input = String::new();
        for i in 0..16 {
            let route = format!("/page{}", i);
            mount_csp(
                &server,
                &route,
                &format!("script-src shared.example.com page{}.example.com", i),
            )
            .await;
            input.push_str(&format!("{}{}\n", server.uri(), route));
        }

        let (ctx, buffer) = context(4, false);
        run_workers(Arc::clone(&ctx), input.as_bytes()).await;

        let lines = buffer.lines();
        let unique: HashSet<_> = lines.iter().collect();
        assert_eq!(lines.len(), unique.len(), "no domain printed twice");
        assert_eq!(lines.len(), 17);
        assert_eq!(
            lines.iter().filter(|line| *line == "shared.example.com").count(),
            1
        );
    }

    #[tokio::test]
    async fn test_run_workers_with_empty_input() {
        let (ctx, buffer) = context(3, false);
        let queued = run_workers(Arc::clone(&ctx), "# only comments\n\n".as_bytes()).await;

        assert_eq!(queued, 0);
        assert!(buffer.lines().is_empty());
        assert_eq!(ctx.stats.summary().targets, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_workers_sleep_between_targets() {
        let config = ScanConfig {
            workers: 1,
            queue_capacity: 1,
            delay: Duration::from_secs(5),
            ..ScanConfig::default()
        };
        let buffer = SharedBuffer::default();
        let sink = OutputSink::with_writer(Box::new(buffer.clone()), None);
        let ctx = Arc::new(ScanContext::new(config, sink).unwrap());

        let started = tokio::time::Instant::now();
        run_workers(Arc::clone(&ctx), "not-a-url-1\nnot-a-url-2\n".as_bytes()).await;

        // One worker, two targets, one sleep after each
        assert!(started.elapsed() >= Duration::from_secs(10));
        assert_eq!(ctx.stats.summary().failed, 2);
    }

    #[tokio::test]
    async fn test_bad_utf8_line_is_skipped_not_fatal() {
        let (ctx, buffer) = context(1, false);
        let input: &[u8] = b"not-a-url-1\nhttp://bad\xff.test\nnot-a-url-2\r\nnot-a-url-3";

        let queued = run_workers(Arc::clone(&ctx), input).await;

        assert_eq!(queued, 3);
        assert_eq!(ctx.stats.summary().targets, 3);
        assert!(buffer.lines().is_empty());
    }
}
