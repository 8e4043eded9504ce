//! Layer 2: Math
//!
//! Pure numerical helpers with no knowledge of embeddings or grids.
//!
//! # Module Organization
//!
//! - **metric**: Euclidean and maximum-norm distances with early exit
//! - **normalize**: Per-component rescaling to the unit interval
//! - **slope**: Log-log slopes of scaling curves
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
//! Layer 2: Math ← You are here
//!   ↓
//! Layer 1: Primitives (errors, sample, ladder, signal)
//! ```

/// Distance functions.
///
/// Provides:
/// - Euclidean and maximum (Chebyshev) norms
/// - Cutoff-aware evaluation that abandons far pairs early
pub mod metric;

/// Rescaling.
///
/// Provides:
/// - Min/max rescaling of every column to [0, 1]
/// - Detection of constant (zero-interval) columns
pub mod normalize;

/// Scaling-curve slopes.
///
/// Provides:
/// - Local slopes d ln S / d ln r
/// - Least-squares slope over a scale range
pub mod slope;
