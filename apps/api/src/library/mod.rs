//! The user's keyword and melody libraries: plain per-user CRUD whose rows
//! can be referenced from generated lyrics.

pub mod keywords;
pub mod melodies;
