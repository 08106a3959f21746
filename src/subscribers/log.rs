//! # LogWriter — simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for test or demo.
//!
//! ## Example output
//! ```text
//! [switch-requested] supervisor="level-1"
//! [unloading] supervisor="menu"
//! [loading] supervisor="level-1"
//! [active] supervisor="level-1"
//! [pushed] state="playing" depth=1
//! [depth-warning] state="pause" depth=8
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::SwitchRequested => {
                println!("[switch-requested] supervisor={:?}", e.supervisor);
            }
            EventKind::SupervisorUnloading => {
                println!("[unloading] supervisor={:?}", e.supervisor);
            }
            EventKind::SupervisorLoading => {
                println!("[loading] supervisor={:?}", e.supervisor);
            }
            EventKind::SupervisorActive => {
                println!("[active] supervisor={:?}", e.supervisor);
            }
            EventKind::StateEntered => {
                println!("[entered] state={:?} depth={:?}", e.state, e.depth);
            }
            EventKind::StateExited => {
                println!("[exited] state={:?}", e.state);
            }
            EventKind::StatePushed => {
                println!("[pushed] state={:?} depth={:?}", e.state, e.depth);
            }
            EventKind::StateReplaced => {
                println!("[replaced] state={:?} depth={:?}", e.state, e.depth);
            }
            EventKind::StatePopped => {
                println!(
                    "[popped] exposed={:?} count={:?} depth={:?}",
                    e.state, e.count, e.depth
                );
            }
            EventKind::StackCleared => {
                println!("[cleared] count={:?}", e.count);
            }
            EventKind::DepthWarning => {
                println!("[depth-warning] state={:?} depth={:?}", e.state, e.depth);
            }
            EventKind::PopOutOfRange => {
                println!("[pop-out-of-range] count={:?} depth={:?}", e.count, e.depth);
            }
            EventKind::RequestIgnored => {
                println!("[ignored] reason={:?}", e.reason);
            }
            EventKind::TransitionFailed => {
                println!("[failed] state={:?} reason={:?}", e.state, e.reason);
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
