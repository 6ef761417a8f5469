//! Timeseries utilities.
//!
//! Modules include:
//! - `infer`: step estimation and regularity checks
//! - `reshape`: tall-to-wide reshaping and timestamp/resolution parsing
//! - `cluster`: clustering of candidate periods
//! - `tsam`: typical-period aggregation
/// Clustering of feature vectors.
pub mod cluster;
/// Step inference helpers.
pub mod infer;
/// Tall-to-wide reshaping.
pub mod reshape;
/// Typical-period aggregation.
pub mod tsam;
