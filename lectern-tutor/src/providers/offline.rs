//! Offline lecture template
//!
//! Last provider before the apology message. Builds a short lecture from
//! the retrieved excerpts alone, so it can only teach units the document
//! actually covers.

use super::{Capability, GenerationRequest, LectureGenerator};
use crate::error::GenerationError;
use crate::retrieval::CHUNK_SEPARATOR;
use crate::script;
use async_trait::async_trait;

/// Key sentences quoted from the excerpts
const MAX_POINTS: usize = 3;

pub struct OfflineGenerator;

impl OfflineGenerator {
    fn key_points(context: &str) -> Vec<String> {
        context
            .split(CHUNK_SEPARATOR)
            .filter_map(|excerpt| script::split_sentences(excerpt).into_iter().next())
            .take(MAX_POINTS)
            .collect()
    }
}

#[async_trait]
impl LectureGenerator for OfflineGenerator {
    fn provider_id(&self) -> &'static str {
        "offline"
    }

    fn capability(&self) -> Capability {
        Capability::Offline
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        if !request.has_context() {
            return Err(GenerationError::Unavailable(
                "offline template needs textbook context".into(),
            ));
        }

        let title = &request.unit_title;
        let mut text = format!(
            "{}, class! [SHORT PAUSE] Today we are studying {}. [PAUSE]\n\n\
Let's look at what our textbook tells us. [SHORT PAUSE]\n\n",
            request.greeting, title
        );

        let points = Self::key_points(&request.context);
        for (i, point) in points.iter().enumerate() {
            let lead = match i {
                0 => "First,",
                _ if i + 1 == points.len() => "Finally,",
                _ => "Next,",
            };
            text.push_str(&format!("{} [EMPHASIS] {} [PAUSE]\n\n", lead, point));
        }

        text.push_str(&format!(
            "Take a moment to think about how these ideas connect. [PAUSE] \
That brings us to the end of our lesson on {}.",
            title
        ));
        Ok(text)
    }
}
