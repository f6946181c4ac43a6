//! `tf-event`: event-triggered behavior injection.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                   |
//! |----------------|------------------------------------------------------------|
//! | [`condition`]  | `TriggerCondition`, `EdgeState`, `EndCondition`            |
//! | [`trigger`]    | Pure trigger predicates: time, TTC, ego distance           |
//! | [`handler`]    | `HitUtilInfo`, `EventHandler`, `HandlerRegistry`           |
//! | [`event`]      | `EventKind`, `EventPayload`, `Event`, `FiredEvent`         |
//! | [`catalog`]    | `EventViewer` (scene-side description of one event)        |
//! | [`dispatcher`] | `EventDispatcher`: registration and the per-tick flush     |
//! | [`loader`]     | `load_viewers_csv`, `load_viewers_reader`                  |
//! | [`error`]      | `EventError`, `EventResult<T>`                             |
//!
//! # Tick model (summary)
//!
//! ```text
//! for kind in EventKind::ALL:              // fixed order
//!     for event in events[kind]:           // registration order
//!         if event.alive: event.trigger_event(time, registry, geometry)
//! ```
//!
//! Each pending row of an event is evaluated once per tick.  A fired row
//! invokes the event's single bound handler.  Time rows are removed when
//! they fire; condition rows are removed only when the handler accepts.

pub mod catalog;
pub mod condition;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod handler;
pub mod loader;
pub mod trigger;


pub use catalog::{EventViewer, PayloadSpec, RowSpec, TriggerSpec};
pub use condition::{
    DistanceProjection, EdgeState, EndCondition, EndConditionKind, TriggerCondition, TriggerKind,
};
pub use dispatcher::EventDispatcher;
pub use error::{EventError, EventResult};
pub use event::{Event, EventKind, EventPayload, FiredEvent, TriggerRow};
pub use handler::{EventHandler, HandlerRegistry, HitInfoSource, HitUtilInfo};
pub use loader::{load_viewers_csv, load_viewers_reader};
