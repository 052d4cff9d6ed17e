//! Multiple-choice questions for the trivia game. Sources are pluggable;
//! whatever a source returns is validated here and replaced by a built-in
//! set when it is unusable, so the game always has something to ask.

use std::{
    collections::HashMap,
    fs,
    path::PathBuf,
    sync::{
        mpsc::{self, Receiver, TryRecvError},
        Arc,
    },
    thread,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::TriviaConfig;

/// Number of questions in one round.
pub const ROUND_SIZE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriviaQuestion {
    pub question: String,
    pub options: [String; 4],
    pub correct_answer_index: usize,
}

impl TriviaQuestion {
    pub fn new(question: impl Into<String>, options: [&str; 4], correct_answer_index: usize) -> Self {
        Self {
            question: question.into(),
            options: options.map(str::to_string),
            correct_answer_index,
        }
    }

    pub fn is_well_formed(&self) -> bool {
        !self.question.trim().is_empty() && self.correct_answer_index < self.options.len()
    }

    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_answer_index.min(3)]
    }
}

#[derive(Debug, Error)]
pub enum TriviaError {
    #[error("no question source is configured")]
    MissingCredential,
    #[error("question source returned no usable questions")]
    Empty,
    #[error("question source failed: {0}")]
    Source(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Anything that can produce questions for a topic.
pub trait TriviaSource: Send + Sync {
    fn fetch(&self, topic: &str) -> Result<Vec<TriviaQuestion>, TriviaError>;
}

/// Stand-in used when no source has been set up.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredSource;

impl TriviaSource for UnconfiguredSource {
    fn fetch(&self, _topic: &str) -> Result<Vec<TriviaQuestion>, TriviaError> {
        Err(TriviaError::MissingCredential)
    }
}

/// Returns the same questions for every topic.
#[derive(Debug, Default, Clone)]
pub struct StaticTriviaSource {
    questions: Vec<TriviaQuestion>,
}

impl StaticTriviaSource {
    pub fn new(questions: Vec<TriviaQuestion>) -> Self {
        Self { questions }
    }
}

impl TriviaSource for StaticTriviaSource {
    fn fetch(&self, _topic: &str) -> Result<Vec<TriviaQuestion>, TriviaError> {
        Ok(self.questions.clone())
    }
}

/// Loose shape of a question on disk; validated before use.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawQuestion {
    question: String,
    options: Vec<String>,
    correct_answer_index: i64,
}

impl RawQuestion {
    fn into_question(self) -> Option<TriviaQuestion> {
        let options: [String; 4] = self.options.try_into().ok()?;
        let correct_answer_index = usize::try_from(self.correct_answer_index).ok()?;
        let question = TriviaQuestion {
            question: self.question,
            options,
            correct_answer_index,
        };
        question.is_well_formed().then_some(question)
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum QuestionFile {
    Flat(Vec<RawQuestion>),
    ByTopic(HashMap<String, Vec<RawQuestion>>),
}

/// Reads questions from a JSON file: either a plain list, or an object
/// mapping topics to lists.
#[derive(Debug, Clone)]
pub struct FileTriviaSource {
    path: PathBuf,
}

impl FileTriviaSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TriviaSource for FileTriviaSource {
    fn fetch(&self, topic: &str) -> Result<Vec<TriviaQuestion>, TriviaError> {
        let contents = fs::read_to_string(&self.path)?;
        let raw = match serde_json::from_str(&contents)? {
            QuestionFile::Flat(questions) => questions,
            QuestionFile::ByTopic(mut topics) => topics
                .remove(topic)
                .ok_or_else(|| TriviaError::Source(format!("no questions for topic `{topic}`")))?,
        };
        Ok(raw.into_iter().filter_map(RawQuestion::into_question).collect())
    }
}

pub fn source_from_config(config: &TriviaConfig) -> Arc<dyn TriviaSource> {
    match &config.question_file {
        Some(path) => Arc::new(FileTriviaSource::new(path)),
        None => Arc::new(UnconfiguredSource),
    }
}

/// Shown when no source is configured.
pub fn offline_questions() -> Vec<TriviaQuestion> {
    vec![
        TriviaQuestion::new(
            "No question source configured. What represents water?",
            ["H2O", "CO2", "O2", "NaCl"],
            0,
        ),
        TriviaQuestion::new("What is 2+2?", ["3", "4", "5", "6"], 1),
    ]
}

/// Shown when a configured source fails.
pub fn fallback_questions() -> Vec<TriviaQuestion> {
    vec![TriviaQuestion::new(
        "Could not load questions. What is the capital of Iran?",
        ["Shiraz", "Isfahan", "Tehran", "Tabriz"],
        2,
    )]
}

/// Fetches a round of questions. Never fails and never returns an empty or
/// malformed list.
pub fn load_questions(source: &dyn TriviaSource, topic: &str) -> Vec<TriviaQuestion> {
    let result = source.fetch(topic).and_then(|questions| {
        let usable: Vec<_> = questions
            .into_iter()
            .filter(TriviaQuestion::is_well_formed)
            .take(ROUND_SIZE)
            .collect();
        if usable.is_empty() {
            Err(TriviaError::Empty)
        } else {
            Ok(usable)
        }
    });

    match result {
        Ok(questions) => {
            tracing::debug!(topic, count = questions.len(), "trivia questions loaded");
            questions
        }
        Err(TriviaError::MissingCredential) => {
            tracing::warn!("no trivia source configured, using offline questions");
            offline_questions()
        }
        Err(err) => {
            tracing::warn!(%err, topic, "trivia source failed, using fallback question");
            fallback_questions()
        }
    }
}

/// Questions being fetched on a background thread.
#[derive(Debug)]
pub struct PendingQuestions {
    receiver: Option<Receiver<Vec<TriviaQuestion>>>,
    ready: Option<Vec<TriviaQuestion>>,
}

impl PendingQuestions {
    /// Already resolved; no thread involved.
    pub fn ready(questions: Vec<TriviaQuestion>) -> Self {
        Self {
            receiver: None,
            ready: Some(questions),
        }
    }

    /// Returns the questions once they have arrived, without blocking.
    pub fn poll(&mut self) -> Option<&[TriviaQuestion]> {
        if self.ready.is_none() {
            let receiver = self.receiver.as_ref()?;
            match receiver.try_recv() {
                Ok(questions) => self.ready = Some(questions),
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => {
                    tracing::warn!("trivia loader exited without questions");
                    self.ready = Some(fallback_questions());
                }
            }
            self.receiver = None;
        }
        self.ready.as_deref()
    }

    /// Blocks until the questions are available.
    pub fn wait(mut self) -> Vec<TriviaQuestion> {
        if let Some(questions) = self.ready.take() {
            return questions;
        }
        self.receiver
            .and_then(|receiver| receiver.recv().ok())
            .unwrap_or_else(fallback_questions)
    }
}

pub fn spawn_load(source: Arc<dyn TriviaSource>, topic: impl Into<String>) -> PendingQuestions {
    let topic = topic.into();
    let (sender, receiver) = mpsc::channel();
    let worker_source = source.clone();
    let worker_topic = topic.clone();
    let spawned = thread::Builder::new()
        .name("trivia-loader".into())
        .spawn(move || {
            let questions = load_questions(worker_source.as_ref(), &worker_topic);
            // The game may already be gone; nothing to do then.
            let _ = sender.send(questions);
        });

    match spawned {
        Ok(_) => PendingQuestions {
            receiver: Some(receiver),
            ready: None,
        },
        Err(err) => {
            tracing::warn!(%err, "could not start trivia loader, loading inline");
            PendingQuestions::ready(load_questions(source.as_ref(), &topic))
        }
    }
}
