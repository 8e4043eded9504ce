//! Layer 3: Algorithms
//!
//! Phase-space reconstruction and spatial indexing.
//!
//! # Module Organization
//!
//! - **embedding**: Delay / mixed embeddings and the dimension schedule
//! - **grid**: Sparse box grid for neighbor candidates
//! - **selection**: Seeded reference-point subsets
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
//! Layer 3: Algorithms ← You are here
//!   ↓
//! Layer 2: Math (metric, normalize, slope)
//!   ↓
//! Layer 1: Primitives (errors, sample, ladder, signal)
//! ```

/// Embedder.
///
/// Provides:
/// - Embedding specs (components, lags, delay, columns)
/// - Point sets of embedded vectors
/// - Monotone schedules over embedding dimensions
pub mod embedding;

/// Spatial index.
///
/// Provides:
/// - Box grid with cell side equal to the largest scale
/// - Neighbor-cell and ring queries
/// - Automatic coarsening under a cell budget
pub mod grid;

/// Reference-point selection.
///
/// Provides:
/// - All points or a seeded random subset
pub mod selection;
