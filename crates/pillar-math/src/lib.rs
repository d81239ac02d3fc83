//! # Pillar Math
//!
//! Numerical building blocks for the Pillar curve engine.
//!
//! This crate provides:
//!
//! - **Solvers**: Brent's bracketing root finder
//! - **Interpolation**: linear, log-linear, cubic family, monotone convex, quadratic
//! - **Linear Algebra**: tridiagonal and dense linear systems
//! - **Optimization**: Nelder-Mead simplex and Levenberg-Marquardt
//! - **Sequences**: Halton low-discrepancy points for multi-start fitting
//!
//! ## Design Philosophy
//!
//! - **Deterministic**: identical inputs give bit-identical outputs, random
//!   starts included (they are seeded)
//! - **Extrapolating**: interpolators extend their boundary piece, leaving
//!   range policy to the curve that owns them
//! - **`f64` throughout**

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::similar_names)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::needless_range_loop)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::float_cmp)]

pub mod error;
pub mod interpolation;
pub mod linear_algebra;
pub mod optimization;
pub mod sequences;
pub mod solvers;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{MathError, MathResult};
    pub use crate::interpolation::{
        CubicBoundary, CubicInterpolator, CubicScheme, Interpolator, LinearInterpolator,
        LogLinearInterpolator, LogQuadraticInterpolator, MonotoneConvex, QuadraticInterpolator,
    };
    pub use crate::optimization::{
        levenberg_marquardt, nelder_mead, OptimizationConfig, OptimizationResult,
    };
    pub use crate::sequences::{HaltonSequence, LowDiscrepancySequence};
    pub use crate::solvers::{brent, SolverConfig, SolverResult};
}

pub use error::{MathError, MathResult};
