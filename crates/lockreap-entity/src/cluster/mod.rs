//! Cluster membership entities.

pub mod model;

pub use model::ClusterNode;
