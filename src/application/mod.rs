//! Application services: the publish pipeline and its collaborators.

pub mod error;
pub mod ids;
pub mod listing;
pub mod publish;
pub mod render;
pub mod repos;
