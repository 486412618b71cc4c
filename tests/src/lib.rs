//! # Quantum-Sentinel Test Suite
//!
//! Unified test crate containing:
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Pipeline wiring and test adapters
//! └── integration/      # Cross-subsystem behaviour
//!     ├── scenarios.rs  # Reference targets end to end
//!     ├── lifecycle.rs  # State machine, duplicates, cancellation
//!     ├── pipeline.rs   # Knowledge base + calibration feed into dispatch
//!     └── concurrency.rs# Per-target ordering under load
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p qs-tests
//!
//! # By category
//! cargo test -p qs-tests integration::concurrency::
//!
//! # Benchmarks
//! cargo bench -p qs-tests
//! ```

pub mod fixtures;
