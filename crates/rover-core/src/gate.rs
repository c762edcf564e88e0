//! Disable-state for the search submit control.
//!
//! Submitting is blocked while manifests load and, separately, while a search is
//! in flight. Each gate is held through a [`GateGuard`] that reopens it when
//! dropped, so every exit path of the owning operation releases it.

use std::cell::Cell;
use std::fmt;

use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    ManifestLoading,
    SearchInFlight,
}

impl fmt::Display for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gate::ManifestLoading => write!(f, "manifest loading"),
            Gate::SearchInFlight => write!(f, "search in flight"),
        }
    }
}

#[derive(Debug, Default)]
pub struct SubmitControl {
    manifest_loading: Cell<bool>,
    search_in_flight: Cell<bool>,
}

impl SubmitControl {
    pub fn new() -> Self {
        Self::default()
    }

    fn flag(&self, gate: Gate) -> &Cell<bool> {
        match gate {
            Gate::ManifestLoading => &self.manifest_loading,
            Gate::SearchInFlight => &self.search_in_flight,
        }
    }

    pub fn is_held(&self, gate: Gate) -> bool {
        self.flag(gate).get()
    }

    /// Submit is enabled only when neither gate is held.
    pub fn is_enabled(&self) -> bool {
        !self.is_held(Gate::ManifestLoading) && !self.is_held(Gate::SearchInFlight)
    }

    /// Closes `gate` until the returned guard is dropped. Returns `None` when the
    /// gate is already held by another operation.
    pub fn acquire(&self, gate: Gate) -> Option<GateGuard<'_>> {
        let flag = self.flag(gate);
        if flag.replace(true) {
            return None;
        }
        debug!("submit disabled: {gate}");
        Some(GateGuard { flag, gate })
    }
}

#[must_use = "the gate reopens as soon as the guard is dropped"]
pub struct GateGuard<'a> {
    flag: &'a Cell<bool>,
    gate: Gate,
}

impl Drop for GateGuard<'_> {
    fn drop(&mut self) {
        self.flag.set(false);
        debug!("submit released: {}", self.gate);
    }
}
