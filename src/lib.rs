//! Local notification store with snapshot persistence, platform delivery
//! reconciliation and simulated server notifications.

pub mod config;
pub mod delivery;
pub mod logging;
pub mod mvi;
pub mod notification;
pub mod persistence;
pub mod store;
