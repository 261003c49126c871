//! Per-session plain-text transcript.
//!
//! One file per session, opened in append mode and flushed after every line
//! so a crash loses at most the line being written.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};

use crate::error::TranscriptError;
use crate::survey::participant::Participant;

/// Transcript file name for a session started at `started`.
pub fn file_name(participant_id: &str, started: DateTime<Local>) -> String {
    format!("{} ID-{}.txt", started.format("%Y-%m-%d %H-%M-%S"), participant_id)
}

pub struct Transcript {
    path: PathBuf,
    out: BufWriter<std::fs::File>,
}

impl Transcript {
    /// Open the session transcript in `dir` and write the header.
    pub fn create(
        dir: &Path,
        participant: &Participant,
        started: DateTime<Local>,
    ) -> Result<Self, TranscriptError> {
        let path = dir.join(file_name(&participant.id, started));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| TranscriptError::Open {
                path: path.clone(),
                source,
            })?;

        let mut transcript = Self {
            path,
            out: BufWriter::new(file),
        };
        transcript.line(&format!(
            "Participant ID: {}   Group: {}",
            participant.id, participant.group
        ))?;
        transcript.line(&format!(
            "\nSurvey start time: {} [Unix epoch, in sec.]",
            started.timestamp()
        ))?;
        transcript.line(
            "\nUser Data (For Tabular Items)\n\
             Page   Button            Time (sec) since page started \n\
             ------------------------------------------------------",
        )?;
        tracing::info!(path = %transcript.path.display(), "Transcript opened");
        Ok(transcript)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// One timed event row: page, action, seconds since the page started.
    pub fn record(
        &mut self,
        page: usize,
        action: &str,
        elapsed: Duration,
    ) -> Result<(), TranscriptError> {
        self.line(&format!(
            "pg {page:<4}{action:<19}{:.2} s",
            elapsed.as_secs_f64()
        ))
    }

    /// Free-form line (profiles, orders, errors, summaries).
    pub fn note(&mut self, text: &str) -> Result<(), TranscriptError> {
        self.line(text)
    }

    #[cfg(test)]
    pub(crate) fn redirect(&mut self, file: std::fs::File) {
        self.out = BufWriter::new(file);
    }

    fn line(&mut self, text: &str) -> Result<(), TranscriptError> {
        writeln!(self.out, "{text}")?;
        self.out.flush()?;
        Ok(())
    }
}
