//! Offline study assistant
//!
//! Returns canned answers so the study-guide flow works without a hosted model.

use async_trait::async_trait;

use crate::domain::{AssistantError, StudyAssistant, StudyGuide};

const LOVE_REPLY: &str = "Love is central to the Christian faith. The Bible describes love (agape) \
not merely as an emotion, but as an act of will and sacrifice. In 1 Corinthians 13, Paul describes \
love as patient and kind.";

const DEFAULT_REPLY: &str = "That is a profound question. The Bible offers wisdom on many aspects \
of life. As we seek understanding, we can look to Scripture for guidance.";

#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineStudyAssistant;

impl OfflineStudyAssistant {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StudyAssistant for OfflineStudyAssistant {
    async fn study_guide(
        &self,
        reference: &str,
        context: &str,
    ) -> Result<StudyGuide, AssistantError> {
        let verse_count = context.lines().filter(|line| !line.trim().is_empty()).count();
        Ok(StudyGuide {
            summary: format!(
                "{} ({} verses) contains powerful truths for our lives today.",
                reference, verse_count
            ),
            key_themes: vec![
                "Context & background".to_string(),
                "Redemption".to_string(),
                "God's faithfulness".to_string(),
            ],
            questions: vec![
                format!("What stood out to you most in {}?", reference),
                "How does this passage challenge your current understanding?".to_string(),
            ],
        })
    }

    async fn reply(&self, prompt: &str, context: Option<String>) -> Result<String, AssistantError> {
        if prompt.trim().is_empty() {
            return Err(AssistantError::EmptyPrompt);
        }
        let lowered = prompt.to_lowercase();
        let answer = if lowered.contains("love") || lowered.contains("charity") {
            LOVE_REPLY
        } else {
            DEFAULT_REPLY
        };
        Ok(match context {
            Some(reference) => format!("[{}] {}", reference, answer),
            None => answer.to_string(),
        })
    }
}
