// Feedback: append-only history plus the saturating score/weight rule.

pub mod handlers;
pub mod scoring;
