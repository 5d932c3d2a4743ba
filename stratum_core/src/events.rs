// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Change notifications for selection, highlight, and annotations.
//!
//! A [`LayerSession`](crate::session::LayerSession) publishes a [`LayerEvent`]
//! after each state change it performs. Observers are registered with
//! [`Observers::subscribe`] and receive events synchronously, in
//! registration order.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;

use crate::layer::TechniqueKey;

/// A change to a layer made through a session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayerEvent {
    /// The selection set changed.
    SelectionChanged {
        /// Number of selected pairs after the change.
        selected: usize,
    },
    /// The highlighted pair changed.
    HighlightChanged {
        /// The new highlighted pair, if any.
        highlighted: Option<TechniqueKey>,
    },
    /// An annotation was created or updated.
    AnnotationChanged {
        /// The annotated pair.
        key: TechniqueKey,
    },
}

/// Receives [`LayerEvent`]s.
pub trait LayerObserver {
    /// Called after each change.
    fn on_event(&mut self, event: &LayerEvent);
}

/// Handle returned by [`Observers::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u32);

/// An ordered registry of observers.
#[derive(Default)]
pub struct Observers {
    next_id: u32,
    entries: Vec<(ObserverId, Box<dyn LayerObserver>)>,
}

impl fmt::Debug for Observers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observers")
            .field("len", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl Observers {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `observer` and returns its handle.
    pub fn subscribe(&mut self, observer: Box<dyn LayerObserver>) -> ObserverId {
        let id = ObserverId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.entries.push((id, observer));
        id
    }

    /// Removes and returns the observer registered as `id`.
    pub fn unsubscribe(&mut self, id: ObserverId) -> Option<Box<dyn LayerObserver>> {
        let index = self.entries.iter().position(|(entry, _)| *entry == id)?;
        Some(self.entries.remove(index).1)
    }

    /// Delivers `event` to every observer.
    pub fn notify(&mut self, event: &LayerEvent) {
        for (_, observer) in &mut self.entries {
            observer.on_event(event);
        }
    }

    /// Returns the number of registered observers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no observer is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
