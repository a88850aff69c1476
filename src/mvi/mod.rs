//! Model-View-Intent primitives for the notification store.
//!
//! # Architecture
//!
//! ```text
//! Intent ──→ Reducer ──→ State ──→ Observers
//!    ↑                                │
//!    └────────────────────────────────┘
//! ```
//!
//! - **State**: complete snapshot of what consumers render
//! - **Intent**: a user action, timer tick or adapter event
//! - **Reducer**: pure function that transforms state based on intents
//!
//! Anything impure (ids, clocks, randomness) is resolved before the intent
//! is built, so reducers stay deterministic and easy to test.

mod intent;
mod reducer;
mod state;

pub use intent::Intent;
pub use reducer::Reducer;
pub use state::State;
