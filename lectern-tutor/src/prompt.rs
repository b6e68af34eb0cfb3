//! Lecture prompt construction

use chrono::{Local, Timelike};

use crate::providers::GenerationRequest;

/// Salutation for the local hour (0-23)
pub fn greeting_for_hour(hour: u32) -> &'static str {
    match hour {
        5..=11 => "Good morning",
        12..=16 => "Good afternoon",
        _ => "Good evening",
    }
}

pub fn current_greeting() -> &'static str {
    greeting_for_hour(Local::now().hour())
}

/// Instruction prompt asking a language model for a spoken lecture script
///
/// The model is told to use `[PAUSE]`, `[SHORT PAUSE]` and `[EMPHASIS]`
/// markers, which `script::clean_for_display` strips again for the UI.
pub fn lecture_prompt(request: &GenerationRequest) -> String {
    let context = if request.context.trim().is_empty() {
        "(no textbook excerpt available; teach from general knowledge)".to_string()
    } else {
        request.context.clone()
    };

    format!(
        "You are a warm, experienced professor giving lesson {unit} of {total} in a \
live classroom. Today's topic is \"{title}\".\n\n\
Textbook excerpts:\n{context}\n\n\
Write the exact words you will speak, as a lecture script of 600 to 900 words.\n\
- Open with \"{greeting}, class!\" and say what the lesson covers.\n\
- Explain the key ideas in plain language, one at a time, with an everyday example for each.\n\
- Ask the class one or two rhetorical questions to keep them thinking.\n\
- Close with a short recap of the main points.\n\
- Mark natural breaks with [PAUSE], brief breaths with [SHORT PAUSE], and stress \
important terms by putting [EMPHASIS] before them.\n\
- Do not use headings, bullet lists, markdown or stage directions other than these markers.\n",
        unit = request.unit_index,
        total = request.total_units,
        title = request.unit_title,
        context = context,
        greeting = request.greeting,
    )
}
