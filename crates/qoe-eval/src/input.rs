//! Reference signals fed to a sweep

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::{EvalError, EvalResult, PcmSignal};

/// Audio file extensions picked up from an input directory
pub const AUDIO_EXTENSIONS: [&str; 2] = ["wav", "flac"];

/// A named reference signal, shared by every job that uses it
#[derive(Debug)]
pub struct Input<S> {
    pub name: String,
    pub signal: Arc<S>,
}

impl<S> Clone for Input<S> {
    fn clone(&self) -> Self {
        Input {
            name: self.name.clone(),
            signal: Arc::clone(&self.signal),
        }
    }
}

impl<S> Input<S> {
    pub fn new(name: impl Into<String>, signal: S) -> Self {
        Input {
            name: name.into(),
            signal: Arc::new(signal),
        }
    }
}

impl Input<PathBuf> {
    /// Audio files directly under `dir`, sorted by file name
    pub fn from_dir(dir: impl AsRef<Path>) -> EvalResult<Vec<Self>> {
        let dir = dir.as_ref();
        let entries = fs::read_dir(dir).map_err(|source| EvalError::Input {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            let is_audio = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| AUDIO_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if path.is_file() && is_audio {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(EvalError::Config(format!(
                "no audio files in {}",
                dir.display()
            )));
        }

        Ok(paths
            .into_iter()
            .map(|path| {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                Input::new(name, path)
            })
            .collect())
    }
}

impl Input<PcmSignal> {
    /// `count` synthetic speech clips at 16 kHz, derived from `seed`
    pub fn synthetic(count: usize, seed: u64, seconds: f64) -> Vec<Self> {
        (0..count)
            .map(|i| {
                Input::new(
                    format!("synthetic-{i:02}"),
                    PcmSignal::synthetic_speech(seed.wrapping_add(i as u64), seconds, 16_000),
                )
            })
            .collect()
    }
}
