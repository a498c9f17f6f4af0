use crate::domain::StudySession;
use crate::infra::{CsvError, column_indices, encode_record, parse_records};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const SESSIONS_HEADER: [&str; 4] = ["Subject", "Date", "Duration", "Notes"];

#[derive(Debug, Error)]
pub enum LoadSessionsError {
    #[error("failed to read sessions file: {0}")]
    Read(#[from] io::Error),

    #[error("failed to parse sessions file: {0}")]
    Csv(#[from] CsvError),

    #[error("invalid duration on line {line}: {value:?}")]
    InvalidDuration { line: usize, value: String },

    #[error("record on line {line} has no {column} field")]
    MissingColumn { line: usize, column: &'static str },
}

#[derive(Debug, Error)]
pub enum AppendSessionError {
    #[error("failed to append session: {0}")]
    Write(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum RewriteSessionsError {
    #[error("failed to rewrite sessions file: {0}")]
    Write(#[from] io::Error),
}

#[derive(Clone, Debug)]
pub struct SessionStore {
    path: PathBuf,
    sessions: Vec<StudySession>,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sessions: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sessions(&self) -> &[StudySession] {
        &self.sessions
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// A missing file loads as zero sessions. On error the sequence is left
    /// empty.
    pub fn load(&mut self) -> Result<&[StudySession], LoadSessionsError> {
        self.sessions.clear();

        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "sessions file missing; starting empty");
                return Ok(&self.sessions);
            }
            Err(error) => return Err(error.into()),
        };

        let sessions = parse_sessions(&raw)?;
        debug!(path = %self.path.display(), count = sessions.len(), "loaded sessions");
        self.sessions = sessions;
        Ok(&self.sessions)
    }

    pub fn append(&mut self, session: StudySession) -> Result<(), AppendSessionError> {
        let file_exists = self.path.exists();
        let mut text = String::new();
        if !file_exists {
            ensure_parent_dir(&self.path)?;
            text.push_str(&encode_record(&SESSIONS_HEADER));
        }
        text.push_str(&encode_session(&session));

        self.sessions.push(session);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(text.as_bytes())?;
        debug!(
            path = %self.path.display(),
            index = self.sessions.len() - 1,
            created = !file_exists,
            "appended session"
        );
        Ok(())
    }

    /// An out-of-range index leaves both the sequence and the file untouched
    /// and returns `Ok(false)`.
    pub fn replace(
        &mut self,
        index: usize,
        session: StudySession,
    ) -> Result<bool, RewriteSessionsError> {
        if index >= self.sessions.len() {
            warn!(index, len = self.sessions.len(), "replace ignored: index out of range");
            return Ok(false);
        }
        self.sessions[index] = session;
        self.rewrite()?;
        Ok(true)
    }

    pub fn filter_by_date(&self, date: &str) -> Vec<&StudySession> {
        self.sessions
            .iter()
            .filter(|session| session.date == date)
            .collect()
    }

    fn rewrite(&self) -> Result<(), RewriteSessionsError> {
        ensure_parent_dir(&self.path)?;

        let mut text = encode_record(&SESSIONS_HEADER);
        for session in &self.sessions {
            text.push_str(&encode_session(session));
        }
        fs::write(&self.path, text)?;
        debug!(
            path = %self.path.display(),
            count = self.sessions.len(),
            "rewrote sessions file"
        );
        Ok(())
    }
}

fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

fn encode_session(session: &StudySession) -> String {
    let duration = session.duration.to_string();
    encode_record(&[
        session.subject.as_str(),
        session.date.as_str(),
        duration.as_str(),
        session.notes.as_str(),
    ])
}

fn parse_sessions(raw: &str) -> Result<Vec<StudySession>, LoadSessionsError> {
    let records = parse_records(raw)?;
    let mut records = records.into_iter();
    let Some(header) = records.next() else {
        return Ok(Vec::new());
    };
    let [subject, date, duration, notes] = column_indices(&header.fields, SESSIONS_HEADER)?;

    let mut sessions = Vec::new();
    for record in records {
        let field = |idx: usize, column: &'static str| {
            record
                .fields
                .get(idx)
                .ok_or(LoadSessionsError::MissingColumn {
                    line: record.line,
                    column,
                })
        };

        let raw_duration = field(duration, SESSIONS_HEADER[2])?;
        let parsed_duration = raw_duration.trim().parse::<i64>().map_err(|_| {
            LoadSessionsError::InvalidDuration {
                line: record.line,
                value: raw_duration.clone(),
            }
        })?;

        sessions.push(StudySession {
            subject: field(subject, SESSIONS_HEADER[0])?.clone(),
            date: field(date, SESSIONS_HEADER[1])?.clone(),
            duration: parsed_duration,
            notes: field(notes, SESSIONS_HEADER[3])?.clone(),
        });
    }
    Ok(sessions)
}
