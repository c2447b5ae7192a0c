// All LLM prompt constants for lyric generation.
// Templates carry `{placeholder}` markers filled by `fill_template`.

/// System instruction for keyword expansion.
pub const KEYWORD_EXPANSION_SYSTEM: &str =
    "You are a helpful assistant that expands keywords with relevant context and \
    associations for lyric writing. Provide a brief, creative expansion of the keyword \
    in 2-3 sentences.";

/// Replace `{keyword}` before sending.
pub const KEYWORD_EXPANSION_PROMPT_TEMPLATE: &str = "Expand this keyword for songwriting: {keyword}";

/// System prompt for the main lyric generation call.
pub const LYRICIST_SYSTEM: &str =
    "You are a professional lyricist and songwriter. You create emotional, poetic, and \
    memorable song lyrics that resonate with listeners. You understand rhythm, rhyme, and \
    how to match lyrics to melody descriptions.";

pub const MIXED_LANGUAGE_TEMPLATE: &str = "Create lyrics mixing these languages: {languages}. \
    Feel free to switch between languages naturally.";

pub const COHESIVE_LANGUAGE_TEMPLATE: &str = "Create lyrics primarily in {languages}. \
    You may use one or more of these languages, but keep it cohesive.";

/// Lyric generation prompt. Replace `{keyword_context}`, `{melody_description}`
/// and `{language_instruction}` before sending.
pub const LYRICS_PROMPT_TEMPLATE: &str = r#"Create song lyrics with the following requirements:

**Keywords and Themes:**
{keyword_context}

**Melody Description:**
{melody_description}

**Language Requirements:**
{language_instruction}

**Instructions:**
1. Create a complete song with verses, chorus, and bridge
2. Match the rhythm and mood of the melody description
3. Incorporate the keywords naturally and creatively
4. Use poetic language and vivid imagery
5. Ensure the lyrics flow well and are singable
6. If mixing languages, do so in a way that feels natural and artistic

Please provide:
1. A title for the song
2. The complete lyrics with clear structure (mark verses, chorus, bridge)
3. Timing information for each line: one entry per lyric line, in order, with a start time
   in milliseconds and a duration in milliseconds. Each line starts where the previous one
   ends; lines never overlap.

Format your response as JSON:
{
  "title": "Song Title",
  "lyrics": "Full lyrics with \n for line breaks",
  "timingData": [
    {"line": "First line", "startTime": 0, "duration": 3000},
    {"line": "Second line", "startTime": 3000, "duration": 3000}
  ]
}"#;

/// Name of the structured-output schema sent with the generation call.
pub const LYRICS_SCHEMA_NAME: &str = "lyric_generation";

/// System prompt for lyric translation.
pub const TRANSLATOR_SYSTEM: &str =
    "You are a professional translator specializing in song lyrics. Translate lyrics while \
    preserving their poetic meaning, emotion, and artistic intent.";

/// Replace `{language}` and `{lyrics}` before sending.
pub const TRANSLATION_PROMPT_TEMPLATE: &str =
    "Translate the following song lyrics to {language}. Preserve the structure and line breaks:\n\n{lyrics}";

/// Fills `{name}` markers in one left-to-right pass. Inserted values are never
/// rescanned, so model output containing a marker stays literal. Unknown
/// markers are left as written.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_template_replaces_every_marker() {
        let filled = fill_template("{a} and {b}, {a}", &[("a", "x"), ("b", "y")]);
        assert_eq!(filled, "x and y, x");
    }

    #[test]
    fn test_fill_template_does_not_rescan_inserted_values() {
        let filled = fill_template(
            LYRICS_PROMPT_TEMPLATE,
            &[
                ("keyword_context", "- rain: {melody_description} {language_instruction}"),
                ("melody_description", "slow ballad"),
                ("language_instruction", "Sing in English."),
            ],
        );
        assert!(filled.contains("- rain: {melody_description} {language_instruction}"));
        assert_eq!(filled.matches("slow ballad").count(), 1);
    }

    #[test]
    fn test_fill_template_keeps_unknown_markers_and_stray_braces() {
        let filled = fill_template("{\"json\": 1} {missing} {a", &[("a", "x")]);
        assert_eq!(filled, "{\"json\": 1} {missing} {a");
    }
}
