//! # Engine Test Suite
//!
//! Cross-crate flows that no single crate can exercise on its own.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── bridge_flows.rs   # CommandBridge + OutputEventBus + scripted worker
//!     └── sidecar_flows.rs  # CommandBridge + Sidecar over in-memory stdio
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p engine-tests
//! cargo test -p engine-tests integration::sidecar_flows
//! ```

pub mod integration;
