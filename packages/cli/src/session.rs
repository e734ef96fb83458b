//! The listing session: upload → record → processing → results.
//!
//! Steps only move forward. `reset` is the one way back to the start, and a
//! failed request returns to `Record` with the photo and answers intact.

use listing_types::ListingAnalysis;
use thiserror::Error;

use crate::collector::DescriptionCollector;
use crate::image_prep::PreparedImage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Upload,
    Record,
    Processing,
    Results,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("select a photo first")]
    NoPhoto,

    #[error("answer a question or record a voice note first")]
    NoDescription,

    #[error("cannot {action} during the {step:?} step")]
    WrongStep { step: Step, action: &'static str },
}

/// What gets sent to `/api/analyze`.
#[derive(Debug, Clone)]
pub struct Submission {
    pub image: PreparedImage,
    pub description: String,
}

#[derive(Debug)]
pub struct ListingSession {
    step: Step,
    photo: Option<PreparedImage>,
    collector: DescriptionCollector,
    result: Option<ListingAnalysis>,
    last_error: Option<String>,
}

impl Default for ListingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ListingSession {
    pub fn new() -> Self {
        Self {
            step: Step::Upload,
            photo: None,
            collector: DescriptionCollector::new(),
            result: None,
            last_error: None,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn photo(&self) -> Option<&PreparedImage> {
        self.photo.as_ref()
    }

    pub fn collector(&self) -> &DescriptionCollector {
        &self.collector
    }

    pub fn collector_mut(&mut self) -> &mut DescriptionCollector {
        &mut self.collector
    }

    pub fn result(&self) -> Option<&ListingAnalysis> {
        self.result.as_ref()
    }

    /// Message from the last failed request, if any.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Set or replace the photo. The first photo moves `Upload` to `Record`.
    pub fn select_photo(&mut self, photo: PreparedImage) -> Result<(), SessionError> {
        self.expect_step(&[Step::Upload, Step::Record], "select a photo")?;
        self.photo = Some(photo);
        self.step = Step::Record;
        Ok(())
    }

    /// Remove the photo. Generation stays disabled until a new one is chosen.
    pub fn clear_photo(&mut self) -> Result<(), SessionError> {
        self.expect_step(&[Step::Upload, Step::Record], "clear the photo")?;
        self.photo = None;
        Ok(())
    }

    /// A photo is present and there is something to describe it with.
    pub fn can_generate(&self) -> bool {
        self.step == Step::Record
            && self.photo.is_some()
            && self.collector.has_content()
            && !self.collector.is_recording()
    }

    /// Move to `Processing` and hand back what to send.
    pub fn begin_processing(&mut self) -> Result<Submission, SessionError> {
        self.start_processing(true)
    }

    /// Like `begin_processing`, but an empty description is allowed. Used by
    /// the one-shot command, where the photo alone is a valid request.
    pub fn begin_processing_photo_only(&mut self) -> Result<Submission, SessionError> {
        self.start_processing(false)
    }

    fn start_processing(&mut self, require_description: bool) -> Result<Submission, SessionError> {
        self.expect_step(&[Step::Record], "generate listings")?;
        let image = self.photo.clone().ok_or(SessionError::NoPhoto)?;
        if self.collector.is_recording()
            || (require_description && !self.collector.has_content())
        {
            return Err(SessionError::NoDescription);
        }

        self.last_error = None;
        self.step = Step::Processing;

        Ok(Submission {
            image,
            description: self.collector.describe(),
        })
    }

    /// The request finished (generated or fallback listing).
    pub fn complete(&mut self, analysis: ListingAnalysis) -> Result<(), SessionError> {
        self.expect_step(&[Step::Processing], "show results")?;
        self.result = Some(analysis);
        self.step = Step::Results;
        Ok(())
    }

    /// The request failed. Back to `Record`, inputs kept.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<(), SessionError> {
        self.expect_step(&[Step::Processing], "report a failure")?;
        self.last_error = Some(message.into());
        self.step = Step::Record;
        Ok(())
    }

    /// "Try another item": everything back to its initial state.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    fn expect_step(&self, allowed: &[Step], action: &'static str) -> Result<(), SessionError> {
        if allowed.contains(&self.step) {
            Ok(())
        } else {
            Err(SessionError::WrongStep {
                step: self.step,
                action,
            })
        }
    }
}
