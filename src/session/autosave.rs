//! Debounced auto-save for an open diagram.
//!
//! Every local edit signals the saver. Once a full quiet window passes
//! with no further edit, the current graph is snapshotted and written out
//! in a detached task. An edit inside the window restarts it and the
//! superseded write simply never happens; a write already dispatched runs
//! to completion no matter what the session does afterwards.

use std::sync::{Arc, Mutex};

use tokio::sync::{Notify, watch};
use tokio::task::JoinHandle;
use tokio::time::{Duration, sleep};
use tracing::{debug, warn};

use crate::auth::AuthState;
use crate::models::Diagram;
use crate::notify::Notifier;
use crate::permissions::Capabilities;
use crate::storage::DiagramStore;

/// Quiet period after the last local change before a write is issued.
pub const AUTO_SAVE_DELAY: Duration = Duration::from_millis(1000);

pub(crate) struct Autosaver {
    edits: Arc<Notify>,
    worker: JoinHandle<()>,
}

impl Autosaver {
    pub(crate) fn spawn(
        diagram: Arc<Mutex<Diagram>>,
        auth: watch::Receiver<AuthState>,
        store: Arc<dyn DiagramStore>,
        notifier: Notifier,
        delay: Duration,
    ) -> Self {
        let edits = Arc::new(Notify::new());
        let signal = edits.clone();

        let worker = tokio::spawn(async move {
            let diagram_id = diagram.lock().expect("diagram lock").id.clone();
            loop {
                signal.notified().await;
                debug!("autosave: window opened for {}", diagram_id);

                loop {
                    tokio::select! {
                        _ = sleep(delay) => {
                            break;
                        }
                        _ = signal.notified() => {
                            debug!("autosave: window reset for {}", diagram_id);
                            continue;
                        }
                    }
                }

                // Quiet window elapsed. Snapshot graph and capability
                // together so the gate sees the same state it writes.
                let (snapshot, editor) = {
                    let diagram = diagram.lock().expect("diagram lock");
                    let state = auth.borrow();
                    let caps = Capabilities::resolve(state.user(), Some(&diagram));
                    (diagram.clone(), caps.is_editor)
                };
                if !editor {
                    debug!("autosave: skipped for {}, no editor capability", diagram_id);
                    continue;
                }

                // Detached so closing the session cannot cancel it mid-write.
                let store = store.clone();
                let notifier = notifier.clone();
                tokio::spawn(async move {
                    let result = store
                        .save_diagram(
                            &snapshot.id,
                            &snapshot.owner_id,
                            &snapshot.nodes,
                            &snapshot.edges,
                        )
                        .await;
                    match result {
                        Ok(()) => debug!("autosave: wrote {}", snapshot.id),
                        Err(err) => {
                            warn!("autosave: write failed for {}: {}", snapshot.id, err);
                            notifier.error(err.to_string());
                        }
                    }
                });
            }
        });

        Self { edits, worker }
    }

    /// Mark the local graph dirty. Starts the quiet window, or restarts it
    /// if one is already running. Uses the permit form of notify so an edit
    /// landing between windows is never lost.
    pub(crate) fn touch(&self) {
        self.edits.notify_one();
    }

    /// Stop the loop. A pending, not-yet-dispatched write is discarded.
    pub(crate) fn shutdown(&self) {
        self.worker.abort();
    }
}

impl Drop for Autosaver {
    fn drop(&mut self) {
        self.worker.abort();
    }
}
