//! Client-side state core for the waste-bin monitoring dashboard: a polling
//! feed of bin fill levels, threshold-crossing alerts, and the backend client
//! behind them.

pub mod api;
pub mod config;
pub mod model;
pub mod notify;
pub mod poller;
pub mod session;
pub mod threshold;
