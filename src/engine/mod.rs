//! Layer 5: Engine
//!
//! Core execution logic for dimension scans.
//!
//! This layer drives the estimators: it validates configuration, runs the
//! per-dimension reference loop with checkpoints and cancellation, fans
//! dimensions out over threads and renders accumulator state for reporters.
//!
//! # Module Organization
//!
//! - **validator**: Input and configuration validation rules
//! - **scheduler**: Per-dimension state machine (scan, drain, done)
//! - **executor**: Embedding schedule loop and failure isolation
//! - **output**: Scaling tables, status lines and reporters
//!
//! # Architecture
//!
//! ```text
//! Layer 7: API
//!   ↓
//! Layer 6: Adapters
//!   ↓
//! Layer 5: Engine ← You are here
//!   ↓
//! Layer 4: Estimators (pair count, fixed mass, box occupation)
//!   ↓
//! Layer 3: Algorithms (embedding, grid, selection)
//!   ↓
//! Layer 2: Math (metric, normalize, slope)
//!   ↓
//! Layer 1: Primitives (errors, sample, ladder, signal)
//! ```

/// Validation utilities.
///
/// Provides:
/// - Range checks for every scan option
/// - Errors naming the offending field and value
pub mod validator;

/// Scale scheduler.
///
/// Provides:
/// - Batched reference loop with ordered absorption
/// - Time-based checkpoints and cooperative cancellation
pub mod scheduler;

/// Dimension executor.
///
/// Provides:
/// - Embedding, indexing and scanning of every scheduled dimension
/// - Per-dimension error isolation
pub mod executor;

/// Output types.
///
/// Provides:
/// - The `ScalingTable` snapshot and `StatusLine`
/// - The `Reporter` trait with in-memory and file implementations
pub mod output;
