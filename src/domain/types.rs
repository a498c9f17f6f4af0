use serde::Serialize;

/// Identity is positional: the index in the store's sequence.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct StudySession {
    pub subject: String,
    pub date: String,
    pub duration: i64,
    pub notes: String,
}

impl StudySession {
    pub fn new(
        subject: impl Into<String>,
        date: impl Into<String>,
        duration: i64,
        notes: impl Into<String>,
    ) -> Self {
        Self {
            subject: subject.into(),
            date: date.into(),
            duration,
            notes: notes.into(),
        }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SessionPatch {
    pub subject: Option<String>,
    pub date: Option<String>,
    pub duration: Option<i64>,
    pub notes: Option<String>,
}

impl SessionPatch {
    pub fn is_empty(&self) -> bool {
        self.subject.is_none()
            && self.date.is_none()
            && self.duration.is_none()
            && self.notes.is_none()
    }

    pub fn apply_to(&self, session: &StudySession) -> StudySession {
        StudySession {
            subject: self
                .subject
                .clone()
                .unwrap_or_else(|| session.subject.clone()),
            date: self.date.clone().unwrap_or_else(|| session.date.clone()),
            duration: self.duration.unwrap_or(session.duration),
            notes: self.notes.clone().unwrap_or_else(|| session.notes.clone()),
        }
    }
}
