use crate::domain::{
    FieldError, SessionPatch, StudySession, format_day_details, normalize_date, sorted_by_date,
    today, total_minutes, validate_session_input,
};
use crate::infra::{LoadSessionsError, SessionStore};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

const NOTES_WIDTH: usize = 60;

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliInvocation {
    PrintHelp,
    PrintVersion,
    Command {
        file: Option<PathBuf>,
        command: CliCommand,
    },
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CliCommand {
    List {
        json: bool,
    },
    Add {
        subject: String,
        date: Option<String>,
        duration: i64,
        notes: String,
    },
    Edit {
        index: usize,
        patch: SessionPatch,
    },
    Day {
        date: String,
    },
}

#[derive(Debug, Error)]
pub enum CliParseError {
    #[error("unknown subcommand: {0}")]
    UnknownSubcommand(String),

    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    #[error("missing value for flag: {0}")]
    MissingFlagValue(String),

    #[error("invalid value for {flag}: {value}")]
    InvalidFlagValue { flag: String, value: String },

    #[error("unexpected argument: {0}")]
    UnexpectedArgument(String),

    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("nothing to edit: pass at least one of --subject, --date, --duration, --notes")]
    NothingToEdit,
}

#[derive(Debug, Error)]
pub enum CliRunError {
    #[error(transparent)]
    Load(#[from] LoadSessionsError),

    #[error(transparent)]
    Append(#[from] crate::infra::AppendSessionError),

    #[error(transparent)]
    Rewrite(#[from] crate::infra::RewriteSessionsError),

    #[error(transparent)]
    Date(#[from] crate::domain::DateError),

    #[error("{}", format_field_errors(.0))]
    InvalidInput(Vec<FieldError>),

    #[error("no session at index {index} (have {len})")]
    NoSessionAtIndex { index: usize, len: usize },

    #[error(transparent)]
    WriteOutput(#[from] io::Error),
}

fn format_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|error| error.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn parse_invocation(args: &[String]) -> Result<CliInvocation, CliParseError> {
    if args.iter().any(|arg| arg == "--help" || arg == "-h") {
        return Ok(CliInvocation::PrintHelp);
    }
    if args.iter().any(|arg| arg == "--version" || arg == "-V") {
        return Ok(CliInvocation::PrintVersion);
    }

    let mut iter = args.iter().skip(1).peekable();
    let mut file: Option<PathBuf> = None;
    while let Some(arg) = iter.peek() {
        match arg.as_str() {
            "--file" | "-f" => {
                let _ = iter.next();
                let value = iter
                    .next()
                    .ok_or_else(|| CliParseError::MissingFlagValue("--file".to_string()))?;
                file = Some(PathBuf::from(value));
            }
            "--" => {
                let _ = iter.next();
                break;
            }
            _ => break,
        }
    }

    let Some(subcommand) = iter.next() else {
        return Ok(CliInvocation::Command {
            file,
            command: CliCommand::List { json: false },
        });
    };

    let command = match subcommand.as_str() {
        "list" | "ls" => {
            let mut json = false;
            for arg in iter {
                match arg.as_str() {
                    "--json" => json = true,
                    _ if arg.starts_with('-') => {
                        return Err(CliParseError::UnknownFlag(arg.to_string()));
                    }
                    _ => return Err(CliParseError::UnexpectedArgument(arg.to_string())),
                }
            }
            CliCommand::List { json }
        }
        "add" => {
            let mut subject = String::new();
            let mut date: Option<String> = None;
            let mut duration = 0i64;
            let mut notes = String::new();

            let mut args = iter.peekable();
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--subject" | "-s" => {
                        subject = flag_value(&mut args, "--subject")?.to_string();
                    }
                    "--date" | "-d" => {
                        date = Some(flag_value(&mut args, "--date")?.to_string());
                    }
                    "--duration" | "-m" => {
                        let value = flag_value(&mut args, "--duration")?;
                        duration = parse_i64_flag("--duration", value)?;
                    }
                    "--notes" | "-n" => {
                        notes = flag_value(&mut args, "--notes")?.to_string();
                    }
                    _ if arg.starts_with('-') => {
                        return Err(CliParseError::UnknownFlag(arg.to_string()));
                    }
                    _ => return Err(CliParseError::UnexpectedArgument(arg.to_string())),
                }
            }

            CliCommand::Add {
                subject,
                date,
                duration,
                notes,
            }
        }
        "edit" => {
            let mut index: Option<usize> = None;
            let mut patch = SessionPatch::default();

            let mut args = iter.peekable();
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--subject" | "-s" => {
                        patch.subject = Some(flag_value(&mut args, "--subject")?.to_string());
                    }
                    "--date" | "-d" => {
                        patch.date = Some(flag_value(&mut args, "--date")?.to_string());
                    }
                    "--duration" | "-m" => {
                        let value = flag_value(&mut args, "--duration")?;
                        patch.duration = Some(parse_i64_flag("--duration", value)?);
                    }
                    "--notes" | "-n" => {
                        patch.notes = Some(flag_value(&mut args, "--notes")?.to_string());
                    }
                    _ if arg.starts_with('-') && arg.parse::<i64>().is_err() => {
                        return Err(CliParseError::UnknownFlag(arg.to_string()));
                    }
                    _ => {
                        if index.is_some() {
                            return Err(CliParseError::UnexpectedArgument(arg.to_string()));
                        }
                        index = Some(parse_usize_flag("<index>", arg)?);
                    }
                }
            }

            let index = index.ok_or(CliParseError::MissingArgument("<index>"))?;
            if patch.is_empty() {
                return Err(CliParseError::NothingToEdit);
            }
            CliCommand::Edit { index, patch }
        }
        "day" => {
            let mut date: Option<String> = None;
            for arg in iter {
                if arg.starts_with('-') {
                    return Err(CliParseError::UnknownFlag(arg.to_string()));
                }
                if date.is_some() {
                    return Err(CliParseError::UnexpectedArgument(arg.to_string()));
                }
                date = Some(arg.to_string());
            }
            CliCommand::Day {
                date: date.ok_or(CliParseError::MissingArgument("<date>"))?,
            }
        }
        other => return Err(CliParseError::UnknownSubcommand(other.to_string())),
    };

    Ok(CliInvocation::Command { file, command })
}

pub fn run(command: CliCommand, sessions_file: &Path) -> Result<(), CliRunError> {
    let stdout = io::stdout();
    let mut out = io::BufWriter::new(stdout.lock());
    let stderr = io::stderr();
    let mut err = io::BufWriter::new(stderr.lock());

    let mut store = SessionStore::new(sessions_file);
    run_with_store(command, &mut store, &mut out, &mut err)?;
    let _ = flush_output(&mut out)?;
    let _ = flush_output(&mut err)?;
    Ok(())
}

fn run_with_store(
    command: CliCommand,
    store: &mut SessionStore,
    out: &mut impl Write,
    err: &mut impl Write,
) -> Result<(), CliRunError> {
    store.load()?;

    match command {
        CliCommand::List { json } => {
            let view = sorted_by_date(store.sessions());
            if json {
                let payload = build_list_json_payload(&view);
                let rendered = serde_json::to_string_pretty(&payload)
                    .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;
                let _ = write_line(out, &rendered)?;
                return Ok(());
            }
            if store.is_empty() {
                let _ = write_line(err, &format!("no sessions in {}", store.path().display()))?;
                return Ok(());
            }

            for (index, session) in &view {
                if !write_line(out, &format_list_line(*index, session))? {
                    return Ok(());
                }
            }
            if !flush_output(out)? {
                return Ok(());
            }
            let footer = format!(
                "total:\t{} sessions\t{} min",
                view.len(),
                total_minutes(store.sessions())
            );
            let _ = write_line(err, &footer)?;
            Ok(())
        }
        CliCommand::Add {
            subject,
            date,
            duration,
            notes,
        } => {
            validate_session_input(&subject, duration).map_err(CliRunError::InvalidInput)?;
            let date = match date {
                Some(date) => normalize_date(&date)?,
                None => today(),
            };

            store.append(StudySession::new(subject, date, duration, notes))?;
            let index = store.len() - 1;
            info!(index, "session added");
            let _ = write_line(out, &format!("added:\t{index}"))?;
            Ok(())
        }
        CliCommand::Edit { index, mut patch } => {
            let Some(existing) = store.sessions().get(index) else {
                return Err(CliRunError::NoSessionAtIndex {
                    index,
                    len: store.len(),
                });
            };
            if let Some(date) = patch.date.take() {
                patch.date = Some(normalize_date(&date)?);
            }
            let updated = patch.apply_to(existing);
            validate_session_input(&updated.subject, updated.duration)
                .map_err(CliRunError::InvalidInput)?;

            if !store.replace(index, updated)? {
                return Err(CliRunError::NoSessionAtIndex {
                    index,
                    len: store.len(),
                });
            }
            info!(index, "session updated");
            let _ = write_line(out, &format!("updated:\t{index}"))?;
            Ok(())
        }
        CliCommand::Day { date } => {
            let date = normalize_date(&date)?;
            let sessions = store.filter_by_date(&date);
            let details = format_day_details(&date, &sessions);
            let _ = write_line(out, details.trim_end_matches('\n'))?;
            Ok(())
        }
    }
}

#[derive(Serialize)]
struct ListedSession<'a> {
    index: usize,
    #[serde(flatten)]
    session: &'a StudySession,
}

fn build_list_json_payload<'a>(view: &[(usize, &'a StudySession)]) -> Vec<ListedSession<'a>> {
    view.iter()
        .map(|(index, session)| ListedSession {
            index: *index,
            session,
        })
        .collect()
}

fn format_list_line(index: usize, session: &StudySession) -> String {
    let notes = flatten_whitespace(&session.notes);
    format!(
        "{}\t{}\t{}\t{}\t{}",
        index,
        session.date,
        session.duration,
        flatten_whitespace(&session.subject),
        truncate_end(&notes, NOTES_WIDTH)
    )
}

fn flatten_whitespace(text: &str) -> String {
    text.split(['\t', '\r', '\n'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn truncate_end(text: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    for ch in text.chars() {
        let next = format!("{out}{ch}");
        if unicode_width::UnicodeWidthStr::width(next.as_str()) > width {
            break;
        }
        out.push(ch);
    }
    out
}

fn write_line(out: &mut impl Write, line: &str) -> io::Result<bool> {
    match writeln!(out, "{line}") {
        Ok(()) => Ok(true),
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(false),
        Err(error) => Err(error),
    }
}

fn flush_output(out: &mut impl Write) -> io::Result<bool> {
    match out.flush() {
        Ok(()) => Ok(true),
        Err(error) if error.kind() == io::ErrorKind::BrokenPipe => Ok(false),
        Err(error) => Err(error),
    }
}

fn flag_value<'a>(
    args: &mut impl Iterator<Item = &'a String>,
    flag: &str,
) -> Result<&'a str, CliParseError> {
    args.next()
        .map(String::as_str)
        .ok_or_else(|| CliParseError::MissingFlagValue(flag.to_string()))
}

fn parse_usize_flag(flag: &str, value: &str) -> Result<usize, CliParseError> {
    value
        .parse::<usize>()
        .map_err(|_| CliParseError::InvalidFlagValue {
            flag: flag.to_string(),
            value: value.to_string(),
        })
}

fn parse_i64_flag(flag: &str, value: &str) -> Result<i64, CliParseError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| CliParseError::InvalidFlagValue {
            flag: flag.to_string(),
            value: value.to_string(),
        })
}
