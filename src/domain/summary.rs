use crate::domain::StudySession;

/// Date-ordered view of the sessions, each paired with its store index.
///
/// The sort is stable, so sessions on the same date keep insertion order.
pub fn sorted_by_date(sessions: &[StudySession]) -> Vec<(usize, &StudySession)> {
    let mut view: Vec<(usize, &StudySession)> = sessions.iter().enumerate().collect();
    view.sort_by(|(_, a), (_, b)| a.date.cmp(&b.date));
    view
}

pub fn format_day_details(date: &str, sessions: &[&StudySession]) -> String {
    if sessions.is_empty() {
        return format!("No sessions on {date}.");
    }

    let mut details = format!("Sessions on {date}:\n");
    for session in sessions {
        details.push_str(&format!(
            "- {} ({} min)\n",
            session.subject, session.duration
        ));
    }
    details
}

pub fn total_minutes<'a>(sessions: impl IntoIterator<Item = &'a StudySession>) -> i64 {
    sessions
        .into_iter()
        .fold(0i64, |total, session| total.saturating_add(session.duration))
}
