pub mod handlers;
pub mod playback;
