//! Command handlers grouped by concern.

pub(crate) mod lifecycle;
pub(crate) mod plan;
