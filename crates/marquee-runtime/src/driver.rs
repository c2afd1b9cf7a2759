//! The two ways sessions reach a [`Worker`]: polling a source on a timer, or
//! draining pushed activity events. Both feed the same engine.

use std::future::Future;
use std::io::BufRead;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use marquee_core::select::without_streaming;
use marquee_core::{
    ChannelSink, Clock, CycleOutcome, PresenceSink, RawSessionRecord, SessionSource,
};

use crate::activity::ActivityEvent;
use crate::error::RuntimeError;
use crate::queue::EventQueue;
use crate::worker::Worker;

/// Event mode retries a failed cycle after this long if nothing new arrives.
pub const RETRY_INTERVAL: Duration = Duration::from_secs(30);

/// Poll `source` every `interval` until `shutdown` resolves.
///
/// Returns the number of cycles run.
pub async fn run_poll<S, C, P, K>(
    source: &S,
    worker: &mut Worker<C, P, K>,
    interval: Duration,
    shutdown: impl Future<Output = ()>,
) -> u64
where
    S: SessionSource,
    C: ChannelSink,
    P: PresenceSink,
    K: Clock,
{
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut cycles = 0;
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = ticker.tick() => {
                let batch = source.list_active_sessions().await;
                worker.process(batch).await;
                cycles += 1;
            }
        }
    }
    info!(cycles, "Poll loop stopped");
    cycles
}

/// Drain `queue` into `worker` until it closes or `shutdown` resolves.
///
/// Screen-share entries are removed before selection, so an identity that is
/// only streaming counts as idle. A cycle that leaves a rename pending is
/// replayed once the cooldown runs out (or after [`RETRY_INTERVAL`] for sink
/// failures) unless a newer event arrives first.
pub async fn run_events<C, P, K>(
    queue: &EventQueue<ActivityEvent>,
    worker: &mut Worker<C, P, K>,
    shutdown: impl Future<Output = ()>,
) -> u64
where
    C: ChannelSink,
    P: PresenceSink,
    K: Clock,
{
    tokio::pin!(shutdown);

    let mut pending: Option<(Vec<RawSessionRecord>, Instant)> = None;
    let mut cycles = 0;
    loop {
        let retry_at = pending.as_ref().map(|(_, at)| *at);
        let records = tokio::select! {
            _ = &mut shutdown => break,
            event = queue.pop() => match event {
                Some(event) => without_streaming(event.into_records()),
                None => {
                    debug!("Event queue closed");
                    break;
                }
            },
            _ = tokio::time::sleep_until(retry_at.unwrap_or_else(Instant::now)), if retry_at.is_some() => {
                match pending.take() {
                    Some((records, _)) => {
                        debug!("Retrying pending reconciliation");
                        records
                    }
                    None => continue,
                }
            }
        };

        let outcome = worker.process(Ok(records.clone())).await;
        cycles += 1;
        pending = retry_delay(&outcome).map(|delay| (records, Instant::now() + delay));
    }
    info!(cycles, "Event loop stopped");
    cycles
}

/// How long to wait before replaying a batch whose cycle left work undone.
fn retry_delay(outcome: &CycleOutcome) -> Option<Duration> {
    match outcome {
        CycleOutcome::Renamed { .. } | CycleOutcome::Unchanged { .. } => None,
        CycleOutcome::CoolingDown { remaining, .. } => {
            Some(remaining.to_std().unwrap_or(Duration::ZERO))
        }
        CycleOutcome::Skipped(_)
        | CycleOutcome::PresenceFailed(_)
        | CycleOutcome::RenameFailed { .. } => Some(RETRY_INTERVAL),
    }
}

/// Read newline-delimited [`ActivityEvent`]s and queue those for `watched`.
///
/// Blocking; meant for a dedicated reader thread. Closes the queue at end of
/// input. Malformed lines are logged and skipped.
pub fn feed_lines<R: BufRead>(
    reader: R,
    watched: &str,
    queue: &EventQueue<ActivityEvent>,
) -> Result<(), RuntimeError> {
    let result = read_events(reader, watched, queue);
    queue.close();
    result
}

fn read_events<R: BufRead>(
    reader: R,
    watched: &str,
    queue: &EventQueue<ActivityEvent>,
) -> Result<(), RuntimeError> {
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match ActivityEvent::parse(line) {
            Ok(event) if event.user == watched => {
                if queue.push(event) {
                    debug!(dropped = queue.dropped(), "Event queue full; dropped oldest");
                }
            }
            Ok(event) => debug!(user = %event.user, "Ignoring event for other user"),
            Err(e) => warn!(error = %e, "Skipping malformed activity event"),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::worker::tests::{config, MemoryChannel, MemoryPresence};
    use chrono::{DateTime, Utc};
    use marquee_core::{ChannelError, SourceError};

    struct FixedSource(Vec<RawSessionRecord>);

    impl SessionSource for FixedSource {
        async fn list_active_sessions(&self) -> Result<Vec<RawSessionRecord>, SourceError> {
            Ok(self.0.clone())
        }
    }

    /// Wall clock driven by tokio's timer, so paused tests see cooldowns pass.
    struct TokioClock {
        origin: Instant,
        base: DateTime<Utc>,
    }

    impl TokioClock {
        fn start() -> Self {
            Self {
                origin: Instant::now(),
                base: DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
            }
        }
    }

    impl Clock for TokioClock {
        fn now(&self) -> DateTime<Utc> {
            self.base + chrono::Duration::from_std(self.origin.elapsed()).unwrap()
        }
    }

    struct DownSource;

    impl SessionSource for DownSource {
        async fn list_active_sessions(&self) -> Result<Vec<RawSessionRecord>, SourceError> {
            Err(SourceError("connection refused".into()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_ticks_until_shutdown() {
        let channel = MemoryChannel::named(" Cinema");
        let presence = MemoryPresence::default();
        let mut worker = Worker::new(&config(300), None, channel.clone(), presence.clone());
        let source = FixedSource(vec![RawSessionRecord::movie("Dune", Some(2021))]);

        // Ticks at 0s, 30s and 60s fall before the 75s shutdown.
        let shutdown = tokio::time::sleep(Duration::from_secs(75));
        let cycles = run_poll(&source, &mut worker, Duration::from_secs(30), shutdown).await;

        assert_eq!(cycles, 3);
        assert_eq!(channel.renames(), vec![" Cinema – Dune (2021)".to_string()]);
        assert_eq!(presence.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_source_failure_goes_idle() {
        let channel = MemoryChannel::named(" Cinema – Alien");
        let presence = MemoryPresence::default();
        let mut worker = Worker::new(&config(0), None, channel.clone(), presence.clone());

        let shutdown = tokio::time::sleep(Duration::from_secs(1));
        run_poll(&DownSource, &mut worker, Duration::from_secs(30), shutdown).await;

        assert_eq!(channel.renames(), vec![" Cinema".to_string()]);
        assert_eq!(*presence.calls.lock().unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn test_feed_and_drain_events() {
        let input = concat!(
            r#"{"user": "alice", "activities": [{"type": "movie", "title": "Dune", "year": 2021}]}"#,
            "\n",
            "garbage\n",
            r#"{"user": "bob", "activities": [{"type": "movie", "title": "Alien"}]}"#,
            "\n",
            "\n",
            r#"{"user": "alice", "activities": [{"type": "streaming", "name": "Go Live"}]}"#,
            "\n",
        );
        let queue = EventQueue::new(16);
        feed_lines(input.as_bytes(), "alice", &queue).unwrap();
        assert_eq!(queue.len(), 2);

        let channel = MemoryChannel::named(" Cinema");
        let presence = MemoryPresence::default();
        let mut worker = Worker::new(
            &config(0),
            Some("alice".into()),
            channel.clone(),
            presence.clone(),
        );

        let cycles = run_events(&queue, &mut worker, std::future::pending()).await;
        assert_eq!(cycles, 2);
        assert_eq!(
            channel.renames(),
            vec![" Cinema – Dune (2021)".to_string(), " Cinema".to_string()]
        );
        assert_eq!(
            *presence.calls.lock().unwrap(),
            vec![Some("Dune (2021)".to_string()), None]
        );
    }

    #[tokio::test]
    async fn test_events_stop_on_shutdown() {
        let queue = Arc::new(EventQueue::<ActivityEvent>::new(4));
        let mut worker = Worker::new(
            &config(0),
            Some("alice".into()),
            MemoryChannel::named(" Cinema"),
            MemoryPresence::default(),
        );
        let cycles = run_events(&queue, &mut worker, async {}).await;
        assert_eq!(cycles, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_replays_last_event() {
        let queue = EventQueue::new(16);
        for line in [
            r#"{"user": "alice", "activities": [{"type": "movie", "title": "Dune"}]}"#,
            r#"{"user": "alice", "activities": []}"#,
        ] {
            queue.push(ActivityEvent::parse(line).unwrap());
        }

        let channel = MemoryChannel::named(" Cinema");
        let mut worker = Worker::with_clock(
            &config(30),
            Some("alice".into()),
            channel.clone(),
            MemoryPresence::default(),
            TokioClock::start(),
        );

        // The queue stays open; only the cooldown timer can trigger the third cycle.
        let shutdown = tokio::time::sleep(Duration::from_secs(600));
        let cycles = run_events(&queue, &mut worker, shutdown).await;

        assert_eq!(cycles, 3);
        assert_eq!(
            channel.renames(),
            vec![" Cinema – Dune".to_string(), " Cinema".to_string()]
        );
        assert_eq!(*channel.name.lock().unwrap(), " Cinema");
    }

    #[test]
    fn test_retry_delay() {
        let renamed = CycleOutcome::Renamed { name: " Cinema".into() };
        assert_eq!(retry_delay(&renamed), None);

        let cooling = CycleOutcome::CoolingDown {
            pending: " Cinema".into(),
            remaining: chrono::Duration::seconds(12),
        };
        assert_eq!(retry_delay(&cooling), Some(Duration::from_secs(12)));

        let failed = CycleOutcome::RenameFailed {
            name: " Cinema".into(),
            error: ChannelError::RenameFailed("429".into()),
        };
        assert_eq!(retry_delay(&failed), Some(RETRY_INTERVAL));
        assert_eq!(
            retry_delay(&CycleOutcome::Skipped(ChannelError::NotFound(1))),
            Some(RETRY_INTERVAL)
        );
    }
}
