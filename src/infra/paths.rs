use std::ffi::OsString;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_SESSIONS_FILE: &str = "sessions.csv";
pub const SESSIONS_FILE_ENV: &str = "STUDY_PLANNER_FILE";

#[derive(Debug, Error)]
pub enum ResolveSessionsFileError {
    #[error("home directory not found (needed to expand {0})")]
    HomeDirNotFound(String),
}

pub fn resolve_sessions_file(flag: Option<&Path>) -> Result<PathBuf, ResolveSessionsFileError> {
    resolve_sessions_file_with(flag, std::env::var_os(SESSIONS_FILE_ENV), dirs::home_dir())
}

fn resolve_sessions_file_with(
    flag: Option<&Path>,
    env_value: Option<OsString>,
    home: Option<PathBuf>,
) -> Result<PathBuf, ResolveSessionsFileError> {
    let chosen = match (flag, env_value) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(value)) if !value.to_string_lossy().trim().is_empty() => {
            PathBuf::from(value.to_string_lossy().trim())
        }
        _ => return Ok(PathBuf::from(DEFAULT_SESSIONS_FILE)),
    };
    expand_home(chosen, home)
}

fn expand_home(path: PathBuf, home: Option<PathBuf>) -> Result<PathBuf, ResolveSessionsFileError> {
    let Ok(rest) = path.strip_prefix("~") else {
        return Ok(path);
    };
    let Some(home) = home else {
        return Err(ResolveSessionsFileError::HomeDirNotFound(
            path.display().to_string(),
        ));
    };
    Ok(home.join(rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_relative_sessions_csv() {
        let path = resolve_sessions_file_with(None, None, None).expect("resolve");
        assert_eq!(path, PathBuf::from("sessions.csv"));
    }

    #[test]
    fn env_overrides_default_and_blank_env_is_ignored() {
        let path = resolve_sessions_file_with(None, Some(OsString::from(" /tmp/s.csv ")), None)
            .expect("resolve");
        assert_eq!(path, PathBuf::from("/tmp/s.csv"));

        let path =
            resolve_sessions_file_with(None, Some(OsString::from("  ")), None).expect("resolve");
        assert_eq!(path, PathBuf::from("sessions.csv"));
    }

    #[test]
    fn flag_wins_over_env() {
        let path = resolve_sessions_file_with(
            Some(Path::new("mine.csv")),
            Some(OsString::from("/tmp/s.csv")),
            None,
        )
        .expect("resolve");
        assert_eq!(path, PathBuf::from("mine.csv"));
    }

    #[test]
    fn expands_tilde_against_home() {
        let path = resolve_sessions_file_with(
            Some(Path::new("~/study/sessions.csv")),
            None,
            Some(PathBuf::from("/home/me")),
        )
        .expect("resolve");
        assert_eq!(path, PathBuf::from("/home/me/study/sessions.csv"));

        let error = resolve_sessions_file_with(Some(Path::new("~/s.csv")), None, None)
            .expect_err("no home");
        assert!(matches!(error, ResolveSessionsFileError::HomeDirNotFound(_)));
    }
}
