//! UseCase: 箇所の学習ガイド生成と AI アシスタントへの質問

use std::sync::Arc;

use crate::domain::{AssistantError, PassageProvider, Passage, StudyAssistant, StudyGuide, Verse};

pub struct StudyGuideUseCase {
    passages: Arc<dyn PassageProvider>,
    assistant: Arc<dyn StudyAssistant>,
}

impl StudyGuideUseCase {
    pub fn new(passages: Arc<dyn PassageProvider>, assistant: Arc<dyn StudyAssistant>) -> Self {
        Self {
            passages,
            assistant,
        }
    }

    /// 箇所の本文を取得し、それを文脈として学習ガイドを生成する
    ///
    /// 箇所の範囲に該当する節が1つもなければ章全体を文脈にする。
    pub async fn generate(&self, passage: &Passage) -> Result<StudyGuide, AssistantError> {
        let verses = self
            .passages
            .chapter(&passage.book, passage.chapter)
            .await?;

        let selected: Vec<&Verse> = verses
            .iter()
            .filter(|verse| passage.contains_verse(verse.number))
            .collect();
        let context = if selected.is_empty() {
            render_context(verses.iter())
        } else {
            render_context(selected.into_iter())
        };

        tracing::debug!("Requesting study guide for {}", passage);
        self.assistant
            .study_guide(&passage.to_string(), &context)
            .await
    }

    /// 質問をアシスタントに転送する（箇所があれば文脈として渡す）
    pub async fn ask(
        &self,
        prompt: &str,
        passage: Option<&Passage>,
    ) -> Result<String, AssistantError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(AssistantError::EmptyPrompt);
        }
        self.assistant
            .reply(prompt, passage.map(|passage| passage.to_string()))
            .await
    }
}

/// 節番号付きの英語本文を1行ずつ並べる
fn render_context<'a>(verses: impl Iterator<Item = &'a Verse>) -> String {
    verses
        .map(|verse| format!("{} {}", verse.number, verse.english_text))
        .collect::<Vec<_>>()
        .join("\n")
}
