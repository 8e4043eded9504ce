//! Layer 1: Primitives
//!
//! Core building blocks and types.
//!
//! This layer provides the primitive data structures shared by every other
//! layer. It has zero internal dependencies within the crate.
//!
//! # Module Organization
//!
//! - **errors**: Shared error type (`ScalingError`)
//! - **sample**: Immutable multivariate time series
//! - **ladder**: Monotone length-scale ladders
//! - **signal**: Cooperative stop signal
//!
//! # Architecture
//!
//! ```text
//! Layer 7: API
//!   ↓
//! Layer 6: Adapters
//!   ↓
//! Layer 5: Engine (validator, scheduler, executor, output)
//!   ↓
//! Layer 4: Estimators (pair count, fixed mass, box occupation)
//!   ↓
//! Layer 3: Algorithms (embedding, grid, selection)
//!   ↓
//! Layer 2: Math (metric, normalize, slope)
//!   ↓
//! Layer 1: Primitives ← You are here
//! ```

/// Shared error types.
///
/// Provides:
/// - Unified `ScalingError` enum
/// - Field-naming configuration errors
/// - Per-dimension failure variants
pub mod errors;

/// Time series container.
///
/// Provides:
/// - Row-major storage of fixed-width observations
/// - Column access and finite-value checks
pub mod sample;

/// Length-scale ladders.
///
/// Provides:
/// - Logarithmic spacing between two radii
/// - Validation of user-supplied scale lists
/// - Fast "first scale containing a distance" lookup
pub mod ladder;

/// Cancellation.
///
/// Provides:
/// - A cloneable stop flag honored at reference-point boundaries
pub mod signal;
