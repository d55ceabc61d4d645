//! Process-wide distress and congestion flags.
//!
//! Both flags start `false` and are shared by every request handler through
//! a cloneable `FlagStore`. The greeting handler mutates them from the `name`
//! query parameter; the probes only read them.
//!
//! In the default [`FlagMode::Atomic`] mode each transition is a single atomic
//! operation, so concurrent toggles never lose updates and the snapshot handed
//! back to a request is the value that request wrote. [`FlagMode::Racy`] keeps
//! the load and store separate, which loses toggles under concurrent load the
//! same way an unsynchronized read-modify-write does.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Deserialize;

/// How flag read-modify-write operations are performed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagMode {
    /// Compare-and-swap / fetch-xor; no lost updates.
    #[default]
    Atomic,
    /// Separate load then store; concurrent toggles may be lost.
    Racy,
}

/// Flag values as observed by a single request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagSnapshot {
    pub distress: bool,
    pub congestion: bool,
}

#[derive(Debug, Default)]
struct Flags {
    distress: AtomicBool,
    congestion: AtomicBool,
}

/// Shared handle to the distress and congestion flags.
///
/// Clones share the same underlying flags.
#[derive(Debug, Clone)]
pub struct FlagStore {
    flags: Arc<Flags>,
    mode: FlagMode,
}

impl FlagStore {
    /// Create a store with both flags cleared.
    pub fn new(mode: FlagMode) -> Self {
        Self {
            flags: Arc::new(Flags::default()),
            mode,
        }
    }

    /// Current distress flag (drives `/health`).
    pub fn distress(&self) -> bool {
        self.flags.distress.load(Ordering::SeqCst)
    }

    /// Current congestion flag (drives `/readiness`).
    pub fn congestion(&self) -> bool {
        self.flags.congestion.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> FlagSnapshot {
        FlagSnapshot {
            distress: self.distress(),
            congestion: self.congestion(),
        }
    }

    /// Apply the greeting rules for `name` and return the resulting flags.
    ///
    /// Comparison is case-insensitive. `"sad"` raises distress only while it
    /// is clear, `"happy"` clears it only while it is raised. Any name
    /// containing `"busy"` toggles congestion. Both checks run on every call,
    /// distress first.
    pub fn apply_name(&self, name: &str) -> FlagSnapshot {
        let lowered = name.to_lowercase();

        let distress = match lowered.as_str() {
            "sad" => self.transition_distress(false, true),
            "happy" => self.transition_distress(true, false),
            _ => self.distress(),
        };

        let congestion = if lowered.contains("busy") {
            self.toggle_congestion()
        } else {
            self.congestion()
        };

        match self.mode {
            FlagMode::Atomic => FlagSnapshot {
                distress,
                congestion,
            },
            // Re-read after writing; another request may have moved the
            // flags in between.
            FlagMode::Racy => self.snapshot(),
        }
    }

    /// Move distress from `from` to `to` if it currently equals `from`.
    ///
    /// The two values are opposites, so a failed swap means the flag already
    /// holds `to`: the request observes `to` either way.
    fn transition_distress(&self, from: bool, to: bool) -> bool {
        let flag = &self.flags.distress;
        let swapped = match self.mode {
            FlagMode::Atomic => flag
                .compare_exchange(from, to, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok(),
            FlagMode::Racy => {
                let swapped = flag.load(Ordering::SeqCst) == from;
                if swapped {
                    flag.store(to, Ordering::SeqCst);
                }
                swapped
            }
        };

        if swapped {
            tracing::debug!(distress = to, "Distress flag transitioned");
        }
        to
    }

    /// Flip congestion and return the new value.
    fn toggle_congestion(&self) -> bool {
        let flag = &self.flags.congestion;
        let value = match self.mode {
            FlagMode::Atomic => !flag.fetch_xor(true, Ordering::SeqCst),
            FlagMode::Racy => {
                let value = !flag.load(Ordering::SeqCst);
                flag.store(value, Ordering::SeqCst);
                value
            }
        };

        tracing::debug!(congestion = value, "Congestion flag toggled");
        value
    }
}

impl Default for FlagStore {
    fn default() -> Self {
        Self::new(FlagMode::default())
    }
}
