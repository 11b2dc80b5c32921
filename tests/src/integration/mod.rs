//! # Integration Flows
//!
//! Every flow drives the public call contract (`CommandBridge::invoke`) and
//! plays the worker side by hand, so reply order, noise and timing are under
//! the test's control.

pub mod bridge_flows;
pub mod sidecar_flows;
