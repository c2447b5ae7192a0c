// Lyric generation: keyword expansion → prompt assembly → structured LLM call
// → optional translation. All LLM calls go through the `ChatModel` seam.

pub mod generator;
pub mod handlers;
pub mod keywords;
pub mod languages;
pub mod prompts;
pub mod translation;
