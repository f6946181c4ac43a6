//! Registry of live events and the per-tick flush.

use tracing::{debug, warn};

use tf_core::{BehaviorConfig, ElementId, TimeParam};
use tf_spatial::GeometryService;

use crate::catalog::EventViewer;
use crate::event::{Event, EventKind};
use crate::handler::HandlerRegistry;

/// All events of a scene, bucketed by kind.
///
/// Flush order is [`EventKind::ALL`] and, within a kind, registration
/// order.  Replays with the same registrations are therefore identical
/// regardless of the order in which kinds were registered.
pub struct EventDispatcher {
    events:   [Vec<Event>; EventKind::ALL.len()],
    behavior: BehaviorConfig,
}

impl EventDispatcher {
    pub fn new(behavior: &BehaviorConfig) -> Self {
        Self { events: Default::default(), behavior: behavior.clone() }
    }

    /// Build an event from `viewer` and bind it to `handler`.
    ///
    /// Returns `false` (and registers nothing) when the viewer is not
    /// initialized or `handler` is `ElementId::INVALID`.
    pub fn register(&mut self, viewer: &EventViewer, handler: ElementId) -> bool {
        if !viewer.initialized {
            warn!(kind = %viewer.kind, %handler, "rejecting uninitialized event viewer");
            return false;
        }
        if !handler.is_valid() {
            warn!(kind = %viewer.kind, "rejecting event without a handler");
            return false;
        }
        let mut event = viewer.build_event(&self.behavior);
        event.bind_handler(handler);
        debug!(kind = %viewer.kind, %handler, rows = event.rows().len(), "event registered");
        self.events[viewer.kind.index()].push(event);
        true
    }

    /// Evaluate every live event once.  Returns the number of handler
    /// invocations.
    pub fn flush(
        &mut self,
        time:     &TimeParam,
        registry: &mut dyn HandlerRegistry,
        geometry: &dyn GeometryService,
    ) -> usize {
        let mut invoked = 0;
        for kind in EventKind::ALL {
            for event in self.events[kind.index()].iter_mut().filter(|e| e.is_alive()) {
                invoked += event.evaluate(time, registry, geometry);
            }
        }
        if invoked > 0 {
            debug!(tick = %time.tick, invoked, "event flush");
        }
        invoked
    }

    /// Events of `kind` bound to `element`.  Linear scan; intended for
    /// diagnostics and tests.
    pub fn find_events_for_element(&self, kind: EventKind, element: ElementId) -> Vec<&Event> {
        self.events[kind.index()]
            .iter()
            .filter(|e| e.handler() == Some(element))
            .collect()
    }

    pub fn events(&self, kind: EventKind) -> &[Event] {
        &self.events[kind.index()]
    }

    pub fn events_mut(&mut self, kind: EventKind) -> &mut [Event] {
        &mut self.events[kind.index()]
    }

    /// Total number of registered events, dead ones included.
    pub fn len(&self) -> usize {
        self.events.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.events.iter().all(Vec::is_empty)
    }

    /// Rows still waiting to fire across all live events.
    pub fn pending_rows(&self) -> usize {
        self.events
            .iter()
            .flatten()
            .filter(|e| e.is_alive())
            .map(|e| e.rows().len())
            .sum()
    }
}
