pub mod feedback;
pub mod keyword;
pub mod lyric;
pub mod melody;
pub mod preference;
pub mod user;
