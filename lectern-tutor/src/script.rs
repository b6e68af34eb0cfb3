//! Lesson script processing
//!
//! Generated scripts carry a `Lesson N` header and speech markers such as
//! `[PAUSE]`. The helpers here produce the display text and the sentence
//! list used for per-sentence highlighting, plus the scripted messages
//! delivered when a unit cannot be generated.

/// Header prepended to every lesson text
pub fn lesson_header(unit_index: usize) -> String {
    format!("Lesson {}\n\n", unit_index)
}

/// Remove a leading `Lesson N` line, if present
pub fn strip_header(text: &str) -> &str {
    let trimmed = text.trim_start();
    let Some(rest) = trimmed.strip_prefix("Lesson") else {
        return text;
    };
    let digits = rest.trim_start_matches([' ', '\t']);
    let number_len = digits.chars().take_while(|c| c.is_ascii_digit()).count();
    if number_len == 0 {
        return text;
    }
    let after = &digits[number_len..];
    match after.find('\n') {
        Some(pos) if after[..pos].trim().is_empty() => after[pos + 1..].trim_start(),
        None if after.trim().is_empty() => "",
        _ => text,
    }
}

/// Display text: header removed, bracketed markers removed, whitespace collapsed
pub fn clean_for_display(text: &str) -> String {
    let body = strip_header(text);

    let mut stripped = String::with_capacity(body.len());
    let mut rest = body;
    while let Some(open) = rest.find('[') {
        match rest[open..].find(']') {
            Some(close) => {
                stripped.push_str(&rest[..open]);
                stripped.push(' ');
                rest = &rest[open + close + 1..];
            }
            None => break,
        }
    }
    stripped.push_str(rest);

    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");

    // Markers removed before punctuation leave "word ." behind
    let mut cleaned = String::with_capacity(collapsed.len());
    for c in collapsed.chars() {
        if matches!(c, '.' | ',' | '!' | '?' | ';' | ':') && cleaned.ends_with(' ') {
            cleaned.pop();
        }
        cleaned.push(c);
    }
    cleaned
}

/// Split display text into sentences at `.`, `!` or `?` followed by whitespace
pub fn split_sentences(text: &str) -> Vec<String> {
    let cleaned = clean_for_display(text);
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = cleaned.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            if let Some(&(next, n)) = chars.peek() {
                if n.is_whitespace() {
                    push_sentence(&mut sentences, &cleaned[start..next]);
                    start = next;
                }
            } else {
                push_sentence(&mut sentences, &cleaned[start..i + c.len_utf8()]);
                start = cleaned.len();
            }
        }
    }
    push_sentence(&mut sentences, &cleaned[start..]);
    sentences
}

fn push_sentence(sentences: &mut Vec<String>, candidate: &str) {
    let candidate = candidate.trim();
    if !candidate.is_empty() {
        sentences.push(candidate.to_string());
    }
}

/// Apology delivered when every generation attempt for a unit failed
pub fn fallback_message(unit_index: usize, unit_title: &str) -> String {
    format!(
        "{}I'm having some difficulty preparing this particular lesson on \"{}\". \
[PAUSE] Let's move forward to the next topic, and we'll come back to this later.",
        lesson_header(unit_index),
        unit_title
    )
}

/// Message delivered when the document has nothing on the unit's topic
pub fn no_content_message(unit_index: usize, unit_title: &str) -> String {
    format!(
        "{}I could not find sufficient content in the textbook about \"{}\". \
[PAUSE] Let's move on to the next lesson.",
        lesson_header(unit_index),
        unit_title
    )
}
