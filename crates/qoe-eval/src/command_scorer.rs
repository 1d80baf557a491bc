//! External scoring program

use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Command;

use crate::{QualityScorer, ScoreError};

/// Runs `<program> [args..] <reference> <degraded>` and reads the score from
/// the last non-empty line of stdout.
#[derive(Clone, Debug)]
pub struct CommandScorer {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandScorer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        CommandScorer {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Leading arguments placed before the two signal paths
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

pub(crate) fn parse_score(stdout: &str) -> Result<f64, ScoreError> {
    let line = stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .ok_or_else(|| ScoreError::Unparseable(String::new()))?;

    match line.parse::<f64>() {
        Ok(score) if score.is_finite() => Ok(score),
        _ => Err(ScoreError::Unparseable(line.to_string())),
    }
}

impl QualityScorer<PathBuf> for CommandScorer {
    fn score(&self, reference: &PathBuf, degraded: &PathBuf) -> Result<f64, ScoreError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(reference)
            .arg(degraded)
            .output()
            .map_err(|source| match source.kind() {
                ErrorKind::NotFound | ErrorKind::PermissionDenied => ScoreError::Unavailable {
                    program: self.program.display().to_string(),
                    source,
                },
                _ => ScoreError::Failed(source.to_string()),
            })?;

        if !output.status.success() {
            return Err(ScoreError::Failed(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        parse_score(&String::from_utf8_lossy(&output.stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_last_line() {
        assert_eq!(parse_score("loading...\n3.72\n\n").unwrap(), 3.72);
        assert_eq!(parse_score("  4.1  ").unwrap(), 4.1);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(parse_score(""), Err(ScoreError::Unparseable(_))));
        assert!(matches!(parse_score("error: bad file"), Err(ScoreError::Unparseable(_))));
        assert!(matches!(parse_score("NaN"), Err(ScoreError::Unparseable(_))));
    }

    #[test]
    fn test_missing_program() {
        let scorer = CommandScorer::new("/nonexistent/pesq-score");
        let err = scorer
            .score(&PathBuf::from("a.wav"), &PathBuf::from("b.wav"))
            .unwrap_err();
        assert!(matches!(err, ScoreError::Unavailable { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_runs_program() {
        let scorer = CommandScorer::new("sh").with_args(["-c", "echo 3.25", "scorer"]);
        let score = scorer
            .score(&PathBuf::from("a.wav"), &PathBuf::from("b.wav"))
            .unwrap();
        assert_eq!(score, 3.25);
    }
}
