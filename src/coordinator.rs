//! The refresh coordinator: decides *when* workspace state is re-queried
//! and *whether* the result is shown.
//!
//! [`Coordinator`] owns all mutable refresh state and is driven by
//! [`Event`]s drained from a single `mpsc` queue on one thread.  The
//! debounce window is a deadline on that same loop: the queue is read with
//! `recv_timeout` until the deadline, and the fetch starts when it passes.
//! Fetches run on worker threads and report back by sending an `Event`
//! into the queue, so state transitions never run concurrently.
//!
//! # Phases
//!
//! ```text
//!            trigger                    deadline passes
//!   Idle ──────────────▶ DebouncePending ───────────▶ Fetching
//!    ▲                    │    ▲                          │
//!    │                    └────┘ trigger (new deadline)   │
//!    └────────────────────────────────────────────────────┘
//!                         result (any outcome)
//! ```
//!
//! A trigger that arrives while a fetch is in flight is **dropped**, not
//! queued.  Changes that happen mid-fetch therefore stay invisible until the
//! next trigger or the backup timer.
//!
//! # Supersession
//!
//! Every fetch is stamped with a generation number.  Starting a fetch
//! cancels the previous one's token, and a `FetchCompleted` is applied only
//! if its generation is still the in-flight one.

use crate::aerospace::AerospaceError;
use crate::cancel::CancelToken;
use crate::command::{Command, RefreshTrigger, TriggerReason};
use crate::config::{LabelConfig, RefreshConfig};
use crate::presentation::{render_label, ErrorDisplayKind};
use crate::traits::{PresentationSink, WorkspaceSource};
use crate::workspace::WorkspaceSnapshot;
use log::{debug, info, warn};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How long [`Coordinator::run`] waits for an in-flight fetch after a quit.
/// Covers one `aerospace` query running into its default timeout.
const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_millis(2500);

/// A message on the coordinator's queue.
#[derive(Debug)]
pub enum Event {
    /// A request from a [`TriggerSource`](crate::traits::TriggerSource).
    Command(Command),
    /// A fetch worker finished.
    FetchCompleted {
        generation: u64,
        result: Result<WorkspaceSnapshot, AerospaceError>,
    },
    /// Stop the coordinator.
    Shutdown,
}

impl From<Command> for Event {
    fn from(cmd: Command) -> Self {
        Event::Command(cmd)
    }
}

/// Where the coordinator currently is in its refresh cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    DebouncePending,
    Fetching,
}

/// Whether the event loop should keep running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

struct PendingDebounce {
    reason: TriggerReason,
    deadline: Instant,
}

struct InFlight {
    generation: u64,
    token: CancelToken,
    worker: JoinHandle<()>,
}

/// Owns the refresh state machine.
///
/// Generic over the [`WorkspaceSource`] (shared with worker threads) and
/// the [`PresentationSink`] (used only on the coordinator's thread).
pub struct Coordinator<S: WorkspaceSource + 'static, P: PresentationSink> {
    source: Arc<S>,
    sink: P,
    refresh: RefreshConfig,
    labels: LabelConfig,
    queue: mpsc::Sender<Event>,
    shutdown_grace: Duration,

    last_snapshot: Option<WorkspaceSnapshot>,
    shown_error: Option<ErrorDisplayKind>,
    pending: Option<PendingDebounce>,
    in_flight: Option<InFlight>,
    /// Worker of the fetch that was in flight at shutdown.
    retiring: Option<JoinHandle<()>>,
    generation: u64,
}

impl<S: WorkspaceSource + 'static, P: PresentationSink> Coordinator<S, P> {
    /// Create an idle coordinator.
    ///
    /// `queue` must feed the receiver that is later passed to
    /// [`run`](Self::run) or [`poll`](Self::poll); fetch workers report
    /// through it.
    pub fn new(
        source: Arc<S>,
        sink: P,
        refresh: RefreshConfig,
        labels: LabelConfig,
        queue: mpsc::Sender<Event>,
    ) -> Self {
        Self {
            source,
            sink,
            refresh,
            labels,
            queue,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
            last_snapshot: None,
            shown_error: None,
            pending: None,
            in_flight: None,
            retiring: None,
            generation: 0,
        }
    }

    /// Bound how long [`run`](Self::run) waits for an in-flight fetch to
    /// finish after it was told to stop.
    pub fn with_shutdown_grace(mut self, grace: Duration) -> Self {
        self.shutdown_grace = grace;
        self
    }

    pub fn phase(&self) -> Phase {
        if self.in_flight.is_some() {
            Phase::Fetching
        } else if self.pending.is_some() {
            Phase::DebouncePending
        } else {
            Phase::Idle
        }
    }

    pub fn sink(&self) -> &P {
        &self.sink
    }

    /// The last snapshot that was rendered.
    pub fn last_snapshot(&self) -> Option<&WorkspaceSnapshot> {
        self.last_snapshot.as_ref()
    }

    /// Issue the unconditional startup fetch, bypassing debounce.
    pub fn start(&mut self) {
        info!("initial workspace fetch");
        self.start_fetch();
    }

    /// Run the startup fetch, then process events until told to stop.
    ///
    /// Before returning, waits up to the shutdown grace for a fetch that
    /// was still in flight, so its `aerospace` child is reaped.
    pub fn run(mut self, events: mpsc::Receiver<Event>) {
        self.start();
        loop {
            match self.poll(&events, None) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Exit) => break,
                Err(_) => {
                    self.shutdown();
                    break;
                }
            }
        }
        self.await_worker();
    }

    /// Wait for the next event or for the debounce deadline, whichever
    /// comes first, and apply it.
    ///
    /// Without a pending debounce the wait is bounded by `idle`, or
    /// unbounded when `idle` is `None`.  Fails with `Timeout` if nothing
    /// happened and with `Disconnected` once every sender is gone.
    pub fn poll(
        &mut self,
        events: &mpsc::Receiver<Event>,
        idle: Option<Duration>,
    ) -> Result<Flow, RecvTimeoutError> {
        let deadline = self.pending.as_ref().map(|p| p.deadline);
        let event = match (deadline, idle) {
            (Some(deadline), _) => {
                let now = Instant::now();
                if now >= deadline {
                    self.on_debounce_elapsed();
                    return Ok(Flow::Continue);
                }
                match events.recv_timeout(deadline - now) {
                    Ok(event) => event,
                    Err(RecvTimeoutError::Timeout) => {
                        self.on_debounce_elapsed();
                        return Ok(Flow::Continue);
                    }
                    Err(e) => return Err(e),
                }
            }
            (None, Some(idle)) => events.recv_timeout(idle)?,
            (None, None) => events.recv().map_err(|_| RecvTimeoutError::Disconnected)?,
        };
        Ok(self.handle(event))
    }

    /// Apply one event.
    pub fn handle(&mut self, event: Event) -> Flow {
        match event {
            Event::Command(cmd) => match cmd.trigger_reason() {
                Some(reason) => {
                    let trigger = self.refresh.trigger(reason);
                    self.on_trigger(trigger);
                }
                None => {
                    self.shutdown();
                    return Flow::Exit;
                }
            },
            Event::FetchCompleted { generation, result } => {
                self.on_fetch_completed(generation, result)
            }
            Event::Shutdown => {
                self.shutdown();
                return Flow::Exit;
            }
        }
        Flow::Continue
    }

    /// Drop the pending debounce and cancel the in-flight fetch.
    pub fn shutdown(&mut self) {
        self.pending = None;
        if let Some(fetch) = self.in_flight.take() {
            fetch.token.cancel();
            self.retiring = Some(fetch.worker);
        }
        info!("coordinator stopped");
    }

    //  Transitions

    fn on_trigger(&mut self, trigger: RefreshTrigger) {
        if self.in_flight.is_some() {
            debug!("fetch in flight, dropping {} trigger", trigger.reason);
            return;
        }
        let next = PendingDebounce {
            reason: trigger.reason,
            deadline: Instant::now() + trigger.requested_delay,
        };
        if let Some(previous) = self.pending.replace(next) {
            debug!("{} trigger replaces pending {} refresh", trigger.reason, previous.reason);
        }
        debug!(
            "{} trigger, refreshing in {:?}",
            trigger.reason, trigger.requested_delay
        );
    }

    fn on_debounce_elapsed(&mut self) {
        if let Some(pending) = self.pending.take() {
            debug!("debounce for {} trigger elapsed", pending.reason);
            self.start_fetch();
        }
    }

    fn start_fetch(&mut self) {
        if let Some(previous) = self.in_flight.take() {
            debug!("superseding fetch #{}", previous.generation);
            previous.token.cancel();
        }

        self.generation += 1;
        let generation = self.generation;
        let token = CancelToken::new();

        let source = Arc::clone(&self.source);
        let worker_token = token.clone();
        let queue = self.queue.clone();
        let spawned = thread::Builder::new()
            .name("aerobar-fetch".into())
            .spawn(move || {
                let result = source.fetch_snapshot(&worker_token);
                let _ = queue.send(Event::FetchCompleted { generation, result });
            });

        match spawned {
            Ok(worker) => {
                debug!("fetch #{} started", generation);
                self.in_flight = Some(InFlight {
                    generation,
                    token,
                    worker,
                });
            }
            Err(e) => warn!("could not start fetch worker: {}", e),
        }
    }

    fn on_fetch_completed(
        &mut self,
        generation: u64,
        result: Result<WorkspaceSnapshot, AerospaceError>,
    ) {
        match &self.in_flight {
            Some(fetch) if fetch.generation == generation => self.in_flight = None,
            _ => {
                debug!("discarding result of superseded fetch #{}", generation);
                return;
            }
        }

        match result {
            Ok(snapshot) => self.apply_snapshot(snapshot),
            Err(AerospaceError::Cancelled) => debug!("fetch #{} cancelled", generation),
            Err(AerospaceError::Timeout) => warn!("aerospace timed out, keeping previous label"),
            Err(AerospaceError::BinaryNotFound) => self.show_error(ErrorDisplayKind::ToolNotFound),
            Err(e) => {
                warn!("fetch failed: {}", e);
                self.show_error(ErrorDisplayKind::Generic);
            }
        }
    }

    fn await_worker(&mut self) {
        let Some(worker) = self.retiring.take() else {
            return;
        };
        let deadline = Instant::now() + self.shutdown_grace;
        while !worker.is_finished() {
            if Instant::now() >= deadline {
                warn!("fetch still running after {:?}, not waiting", self.shutdown_grace);
                return;
            }
            thread::sleep(Duration::from_millis(10));
        }
        let _ = worker.join();
    }

    //  Presentation

    fn apply_snapshot(&mut self, snapshot: WorkspaceSnapshot) {
        let (focus_changed, list_changed) = match &self.last_snapshot {
            Some(last) => (
                last.focused() != snapshot.focused(),
                last.all_workspaces() != snapshot.all_workspaces(),
            ),
            None => (true, true),
        };

        if !focus_changed && !list_changed && self.shown_error.is_none() {
            debug!("no change detected, skipping redraw");
            return;
        }
        if focus_changed {
            let previous = self.last_snapshot.as_ref().map(|s| s.focused().as_str());
            info!("workspace changed: {} -> {}", previous.unwrap_or("?"), snapshot.focused());
        }
        if list_changed {
            info!("workspace list changed: {:?}", snapshot.all_workspaces());
        }

        let label = render_label(&snapshot, &self.labels);
        self.sink.render(&label);
        self.last_snapshot = Some(snapshot);
        self.shown_error = None;
    }

    fn show_error(&mut self, kind: ErrorDisplayKind) {
        if self.shown_error == Some(kind) {
            debug!("{:?} indicator already shown", kind);
            return;
        }
        self.sink.render_error(kind);
        self.shown_error = Some(kind);
    }
}
