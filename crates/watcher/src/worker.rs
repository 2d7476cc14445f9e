//! The single worker loop
//!
//! One thread owns the watch set, the pending batch and the subscriber
//! list. It waits on whichever fires first: a raw event, a command from a
//! `Watcher` handle, or the debounce timer. All mutation happens here, so
//! none of that state needs a lock.

use crate::debounce::Debouncer;
use crate::error::Result;
use crate::registry::{Subscriber, SubscriberRegistry};
use crate::source::{EventSource, SourceEvent};
use crate::watchset::WatchSet;
use crossbeam_channel::{after, never, select, Receiver, Sender};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, trace, warn};

/// Requests sent from `Watcher` handles to the loop
pub(crate) enum Command {
    AddRoot {
        path: PathBuf,
        reply: Sender<Result<usize>>,
    },
    Unwatch {
        path: PathBuf,
        reply: Sender<Result<usize>>,
    },
    Subscribe {
        subscriber: Arc<dyn Subscriber>,
        reply: Sender<()>,
    },
    Watched {
        reply: Sender<Vec<PathBuf>>,
    },
    Stop,
}

enum Flow {
    Continue,
    Stop,
}

pub(crate) struct Worker<S: EventSource> {
    watch_set: WatchSet<S>,
    debouncer: Debouncer,
    registry: SubscriberRegistry,
}

impl<S: EventSource> Worker<S> {
    pub(crate) fn new(source: S, window: Duration) -> Self {
        Self {
            watch_set: WatchSet::new(source),
            debouncer: Debouncer::new(window),
            registry: SubscriberRegistry::new(),
        }
    }

    /// Run until stopped, the handles are gone, or a fatal error occurs
    ///
    /// Undelivered events are dropped on exit. Returning drops the event
    /// source, which ends the platform subscription.
    pub(crate) fn run(
        mut self,
        events: Receiver<SourceEvent>,
        commands: Receiver<Command>,
    ) -> Result<()> {
        info!("Watcher loop started (debounce: {:?})", self.debouncer.window());

        let result = self.run_loop(&events, &commands);
        match &result {
            Ok(()) => info!(
                "Watcher loop stopped ({} pending events dropped)",
                self.debouncer.pending_len()
            ),
            Err(e) => error!("Watcher loop terminated: {}", e),
        }
        result
    }

    fn run_loop(
        &mut self,
        events: &Receiver<SourceEvent>,
        commands: &Receiver<Command>,
    ) -> Result<()> {
        loop {
            let timer = match self.debouncer.remaining(Instant::now()) {
                Some(wait) => after(wait),
                None => never(),
            };

            select! {
                recv(commands) -> msg => match msg {
                    Ok(command) => {
                        if let Flow::Stop = self.handle_command(command) {
                            return Ok(());
                        }
                    }
                    Err(_) => {
                        debug!("All watcher handles dropped");
                        return Ok(());
                    }
                },
                recv(events) -> msg => match msg {
                    Ok(item) => self.handle_event(item)?,
                    Err(_) => {
                        debug!("Event source closed");
                        return Ok(());
                    }
                },
                recv(timer) -> _ => {
                    // Events already queued arrived before the expiry was noticed
                    if events.is_empty() {
                        // Subscriptions acknowledged before this point see the batch
                        while let Ok(command) = commands.try_recv() {
                            if let Flow::Stop = self.handle_command(command) {
                                return Ok(());
                            }
                        }
                        self.flush();
                    }
                },
            }
        }
    }

    fn handle_command(&mut self, command: Command) -> Flow {
        match command {
            Command::AddRoot { path, reply } => {
                let result = self.watch_set.add_root(&path);
                if let Err(e) = &result {
                    warn!("Failed to watch {}: {}", path.display(), e);
                }
                let _ = reply.send(result);
            }
            Command::Unwatch { path, reply } => {
                let _ = reply.send(self.watch_set.unwatch(&path));
            }
            Command::Subscribe { subscriber, reply } => {
                self.registry.register(subscriber);
                debug!("Subscriber registered ({} total)", self.registry.len());
                let _ = reply.send(());
            }
            Command::Watched { reply } => {
                let _ = reply.send(self.watch_set.watched());
            }
            Command::Stop => return Flow::Stop,
        }
        Flow::Continue
    }

    fn handle_event(&mut self, item: SourceEvent) -> Result<()> {
        let event = match item {
            Ok(event) => event,
            Err(e) if e.is_not_found() => {
                debug!("Ignoring source error for vanished path: {}", e);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        trace!("{}", event);
        self.watch_set.observe(&event)?;
        self.debouncer.push(event, Instant::now());
        Ok(())
    }

    fn flush(&mut self) {
        if let Some(batch) = self.debouncer.take() {
            debug!(
                "Flushing {} events to {} subscribers",
                batch.len(),
                self.registry.len()
            );
            self.registry.deliver(batch);
        }
    }
}
