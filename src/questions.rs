//! The external question asset collaborator.
//!
//! The coordinator only needs "the list of available question
//! references" at round start; content serving stays outside this crate.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::QuestionError;
use crate::types::Question;

pub type QuestionResult<T> = Result<T, QuestionError>;

/// Read-only source of question references, queried at round start
#[async_trait]
pub trait QuestionProvider: Send + Sync {
    async fn available(&self) -> QuestionResult<Vec<Question>>;
}

/// Scans a content root laid out as `prompts/<stem>.<ext>` and
/// `answers/<stem>.<ext>`; a question exists for every stem present in
/// both directories. Refs are paths relative to the root, kept opaque.
pub struct DirQuestionProvider {
    root: PathBuf,
}

impl DirQuestionProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn stems_of(dir: &Path) -> QuestionResult<BTreeMap<String, String>> {
        let mut stems = BTreeMap::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let path = entry.path();
            if let (Some(stem), Some(name)) = (
                path.file_stem().and_then(|s| s.to_str()),
                path.file_name().and_then(|s| s.to_str()),
            ) {
                stems.insert(stem.to_string(), name.to_string());
            }
        }
        Ok(stems)
    }
}

#[async_trait]
impl QuestionProvider for DirQuestionProvider {
    async fn available(&self) -> QuestionResult<Vec<Question>> {
        let prompts = Self::stems_of(&self.root.join("prompts")).await?;
        let answers = Self::stems_of(&self.root.join("answers")).await?;

        // BTreeMap keeps the listing deterministic across scans
        let questions: Vec<Question> = prompts
            .into_iter()
            .filter_map(|(stem, prompt_file)| {
                answers.get(&stem).map(|answer_file| Question {
                    id: stem,
                    prompt_ref: format!("prompts/{}", prompt_file),
                    answer_ref: format!("answers/{}", answer_file),
                })
            })
            .collect();

        if questions.is_empty() {
            return Err(QuestionError::Empty(self.root.display().to_string()));
        }
        Ok(questions)
    }
}

/// Fixed in-memory set, used by tests and as a fallback when no content
/// root is mounted.
pub struct FixedQuestionProvider {
    questions: Vec<Question>,
}

impl FixedQuestionProvider {
    pub fn new(questions: Vec<Question>) -> Self {
        Self { questions }
    }

    /// A numbered placeholder set
    pub fn sample(count: usize) -> Self {
        let questions = (1..=count)
            .map(|n| Question {
                id: format!("q{}", n),
                prompt_ref: format!("prompts/q{}.png", n),
                answer_ref: format!("answers/q{}.png", n),
            })
            .collect();
        Self::new(questions)
    }
}

#[async_trait]
impl QuestionProvider for FixedQuestionProvider {
    async fn available(&self) -> QuestionResult<Vec<Question>> {
        if self.questions.is_empty() {
            return Err(QuestionError::Empty("<fixed>".to_string()));
        }
        Ok(self.questions.clone())
    }
}
