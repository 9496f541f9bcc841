//! Utility functions.
//!
//! Sorting and reduction helpers shared by the operators.

pub mod numerics;
