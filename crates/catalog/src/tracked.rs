//! Node lifecycle: `Unexpanded -> Expanded -> Stale -> Unexpanded`.
//!
//! A [`TrackedNode`] pairs a node with its state and, when the node is
//! [`Watchable`](crate::Watchable), a [`ChangeMonitor`]. The monitor holds
//! only a weak reference to the state and does nothing but store `Stale`
//! into it, so a notification can land at any point, including in the
//! middle of an expansion.

use crate::Catalog;
use crate::capability::{Expandable, NodeStream, Watchable};
use crate::monitor::{ChangeMonitor, existing_directories};
use crate::node::CatalogNode;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NodeState {
    Unexpanded = 0,
    Expanded = 1,
    Stale = 2,
}
impl NodeState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Expanded,
            2 => Self::Stale,
            _ => Self::Unexpanded,
        }
    }
}

/// Atomically updated [`NodeState`].
#[derive(Debug, Default)]
pub struct StateCell(AtomicU8);
impl StateCell {
    pub fn load(&self) -> NodeState {
        NodeState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub fn store(&self, state: NodeState) {
        self.0.store(state as u8, Ordering::Release);
    }

    pub fn mark_stale(&self) {
        self.store(NodeState::Stale);
    }
}

pub struct TrackedNode {
    node: CatalogNode,
    catalog: Catalog,
    state: Arc<StateCell>,
    monitor: Option<ChangeMonitor>,
    /// No monitor covers this node although its listing depends on the
    /// filesystem: treat every expanded listing as out of date.
    unmonitored: bool,
}
impl std::fmt::Debug for TrackedNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedNode")
            .field("node", &self.node.key())
            .field("state", &self.state.load())
            .field("monitor", &self.monitor)
            .field("unmonitored", &self.unmonitored)
            .finish()
    }
}
impl TrackedNode {
    pub(crate) fn new(
        node: CatalogNode,
        catalog: Catalog,
        state: Arc<StateCell>,
        monitor: Option<ChangeMonitor>,
        unmonitored: bool,
    ) -> Self {
        Self { node, catalog, state, monitor, unmonitored }
    }

    pub fn node(&self) -> &CatalogNode {
        &self.node
    }

    pub fn state(&self) -> NodeState {
        self.state.load()
    }

    pub fn monitor(&self) -> Option<&ChangeMonitor> {
        self.monitor.as_ref()
    }

    /// List the children afresh and mark the node expanded.
    pub fn expand(&self) -> NodeStream {
        self.state.store(NodeState::Expanded);
        self.node.expand(&self.catalog)
    }

    /// Whether the last listing may be out of date.
    pub fn needs_refresh(&self) -> bool {
        match self.state.load() {
            NodeState::Stale => true,
            NodeState::Expanded => self.unmonitored,
            NodeState::Unexpanded => false,
        }
    }

    /// Reset an out-of-date node to `Unexpanded`. Returns whether it was out
    /// of date.
    ///
    /// The watch scope is looked at again too: a library discovered since
    /// the node was tracked gets watched from now on.
    pub fn refresh(&mut self) -> bool {
        let refresh = self.needs_refresh();
        if refresh {
            self.state.store(NodeState::Unexpanded);
            self.rewatch();
        }
        refresh
    }

    fn rewatch(&mut self) {
        let Some(scope) = self.node.watch_scope(&self.catalog) else {
            return;
        };
        let watched = self.monitor.as_ref().map(ChangeMonitor::directories).unwrap_or_default();
        if existing_directories(scope.directories) == watched {
            return;
        }
        debug!(node = %self.node.name(), "watch scope changed");
        let (monitor, unmonitored) = self.catalog.monitor(&self.node, &self.state);
        self.monitor = monitor;
        self.unmonitored = unmonitored;
    }
}
