//! Guided answers and the voice note, flattened into one description.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use thiserror::Error;

/// Hard cap on a voice note.
pub const MAX_RECORDING: Duration = Duration::from_secs(60);

/// Stands in for a transcript until speech-to-text exists.
pub const TRANSCRIPT_PLACEHOLDER: &str =
    "Voice note recorded. Transcription is not available yet; the photo and your answers will be used.";

/// Guided questions, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Question {
    About,
    Material,
    Condition,
    Age,
    Brand,
}

impl Question {
    pub const ALL: [Question; 5] = [
        Question::About,
        Question::Material,
        Question::Condition,
        Question::Age,
        Question::Brand,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Question::About => "about",
            Question::Material => "material",
            Question::Condition => "condition",
            Question::Age => "age",
            Question::Brand => "brand",
        }
    }

    pub fn prompt(&self) -> &'static str {
        match self {
            Question::About => "Tell me about this item",
            Question::Material => "What material is it made of?",
            Question::Condition => "What condition is it in?",
            Question::Age => "How old is it?",
            Question::Brand => "Does it have a brand or maker?",
        }
    }

    pub fn from_key(key: &str) -> Option<Question> {
        Question::ALL
            .into_iter()
            .find(|q| q.key().eq_ignore_ascii_case(key.trim()))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CaptureError {
    #[error("a voice note is already being recorded")]
    AlreadyRecording,

    #[error("no voice note is being recorded")]
    NotRecording,
}

/// A finished voice note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recording {
    pub duration: Duration,
    pub transcript: String,
}

impl Recording {
    /// One-line summary shown in place of audio playback.
    pub fn summary(&self) -> String {
        format!("Voice note ({}s): {}", self.duration.as_secs(), self.transcript)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum Recorder {
    #[default]
    Idle,
    Recording {
        started: Instant,
    },
    Done(Recording),
}

/// Collects guided answers and an optional voice note.
///
/// Time is passed in by the caller so the 60 second cap can be exercised
/// without waiting.
#[derive(Debug, Clone, Default)]
pub struct DescriptionCollector {
    answers: HashMap<Question, String>,
    recorder: Recorder,
}

impl DescriptionCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_answer(&mut self, question: Question, answer: impl Into<String>) {
        let answer = answer.into();
        if answer.trim().is_empty() {
            self.answers.remove(&question);
        } else {
            self.answers.insert(question, answer);
        }
    }

    pub fn answer(&self, question: Question) -> &str {
        self.answers.get(&question).map(String::as_str).unwrap_or("")
    }

    pub fn has_answers(&self) -> bool {
        self.answers.values().any(|a| !a.trim().is_empty())
    }

    /// Start a voice note. Starting again replaces a finished one.
    pub fn start_recording(&mut self, now: Instant) -> Result<(), CaptureError> {
        if self.is_recording() {
            return Err(CaptureError::AlreadyRecording);
        }
        self.recorder = Recorder::Recording { started: now };
        Ok(())
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.recorder, Recorder::Recording { .. })
    }

    /// Time recorded so far, capped at `MAX_RECORDING`.
    pub fn elapsed(&self, now: Instant) -> Option<Duration> {
        match self.recorder {
            Recorder::Recording { started } => {
                Some(now.saturating_duration_since(started).min(MAX_RECORDING))
            }
            _ => None,
        }
    }

    /// Timer tick. Stops the recording once the cap is reached; returns true
    /// when it did.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.recorder {
            Recorder::Recording { started }
                if now.saturating_duration_since(started) >= MAX_RECORDING =>
            {
                self.finish(MAX_RECORDING);
                true
            }
            _ => false,
        }
    }

    pub fn stop_recording(&mut self, now: Instant) -> Result<&Recording, CaptureError> {
        let duration = self.elapsed(now).ok_or(CaptureError::NotRecording)?;
        self.finish(duration);
        self.recording().ok_or(CaptureError::NotRecording)
    }

    fn finish(&mut self, duration: Duration) {
        self.recorder = Recorder::Done(Recording {
            duration,
            transcript: TRANSCRIPT_PLACEHOLDER.to_string(),
        });
    }

    pub fn recording(&self) -> Option<&Recording> {
        match &self.recorder {
            Recorder::Done(recording) => Some(recording),
            _ => None,
        }
    }

    /// Drop the voice note, finished or in progress.
    pub fn discard_recording(&mut self) {
        self.recorder = Recorder::Idle;
    }

    /// A finished voice note or at least one non-empty answer.
    pub fn has_content(&self) -> bool {
        self.recording().is_some() || self.has_answers()
    }

    /// `"{question}: {answer}"` lines in question order, then the transcript.
    pub fn describe(&self) -> String {
        let mut lines: Vec<String> = Question::ALL
            .iter()
            .filter_map(|q| {
                let answer = self.answer(*q).trim();
                (!answer.is_empty()).then(|| format!("{}: {}", q.prompt(), answer))
            })
            .collect();

        if let Some(recording) = self.recording() {
            lines.push(recording.transcript.clone());
        }

        lines.join("\n")
    }
}
