//! opus-tools codec: `opusenc` then `opusdec` on disk

use std::ffi::OsStr;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::{self, Command};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use qoe_core::Configuration;
use tracing::{debug, warn};

use crate::{Codec, CodecError};

/// Decoder output rate expected by wideband scorers
pub const DECODE_SAMPLE_RATE: u32 = 16_000;

/// Loss the encoder is told to expect when FEC is requested
pub const FEC_EXPECTED_LOSS: u32 = 5;

/// Runs the opus-tools command-line encoder and decoder.
///
/// Signals are file paths. Each call writes a compressed intermediate and a
/// decoded WAV into `work_dir`; the intermediate is always removed, the
/// decoded file is removed by `discard` unless `keep_outputs` is set.
///
/// File names carry the process id and a per-call sequence number after the
/// [`output_stem`], so concurrent jobs that pick the same configuration
/// never share a file. Clones share the sequence.
#[derive(Clone, Debug)]
pub struct OpusToolsCodec {
    pub opusenc: PathBuf,
    pub opusdec: PathBuf,
    pub work_dir: PathBuf,
    pub keep_outputs: bool,
    sequence: Arc<AtomicU64>,
}

impl OpusToolsCodec {
    /// Use `opusenc`/`opusdec` from `PATH`
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        OpusToolsCodec {
            opusenc: PathBuf::from("opusenc"),
            opusdec: PathBuf::from("opusdec"),
            work_dir: work_dir.into(),
            keep_outputs: false,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn with_tools(mut self, opusenc: impl Into<PathBuf>, opusdec: impl Into<PathBuf>) -> Self {
        self.opusenc = opusenc.into();
        self.opusdec = opusdec.into();
        self
    }

    /// Unique base name for one `process` call
    fn call_stem(&self, source: &Path, config: &Configuration, loss_percent: f64) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!(
            "{}_{}-{seq}",
            output_stem(source, config, loss_percent),
            process::id()
        )
    }

    pub fn keep_outputs(mut self, keep: bool) -> Self {
        self.keep_outputs = keep;
        self
    }

    fn encode_args(config: &Configuration, input: &Path, output: &Path) -> Vec<String> {
        let mut args = vec![
            "--bitrate".to_string(),
            config.bitrate_kbps().to_string(),
            "--framesize".to_string(),
            config.frame_size_ms.to_string(),
            "--comp".to_string(),
            config.complexity.to_string(),
        ];
        if config.use_fec {
            args.push("--expect-loss".to_string());
            args.push(FEC_EXPECTED_LOSS.to_string());
        }
        args.push(input.display().to_string());
        args.push(output.display().to_string());
        args
    }

    fn decode_args(loss_percent: f64, input: &Path, output: &Path) -> Vec<String> {
        vec![
            "--rate".to_string(),
            DECODE_SAMPLE_RATE.to_string(),
            "--packet-loss".to_string(),
            loss_percent.to_string(),
            input.display().to_string(),
            output.display().to_string(),
        ]
    }
}

/// `<stem>_b<kbps>_f<ms>_c<c>_<fec|nofec>_l<loss>`, with `.` in the loss
/// written as `p`
pub fn output_stem(source: &Path, config: &Configuration, loss_percent: f64) -> String {
    let stem = source
        .file_stem()
        .and_then(OsStr::to_str)
        .unwrap_or("input");
    let fec = if config.use_fec { "fec" } else { "nofec" };
    let loss = loss_percent.to_string().replace('.', "p");
    format!(
        "{stem}_b{}_f{}_c{}_{fec}_l{loss}",
        config.bitrate_kbps().to_string().replace('.', "p"),
        config.frame_size_ms,
        config.complexity
    )
}

fn run(tool: &Path, args: &[String]) -> Result<(), CodecError> {
    let name = tool.display().to_string();
    let output = Command::new(tool).args(args).output().map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            CodecError::ToolUnavailable {
                tool: name.clone(),
                source,
            }
        } else {
            CodecError::Io(source)
        }
    })?;

    if !output.status.success() {
        return Err(CodecError::ToolFailed {
            tool: name,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

/// Removes the wrapped file when dropped, unless kept
struct Scratch(Option<PathBuf>);

impl Scratch {
    fn new(path: PathBuf) -> Self {
        Scratch(Some(path))
    }

    fn path(&self) -> &Path {
        self.0.as_deref().unwrap_or(Path::new(""))
    }

    fn keep(mut self) -> PathBuf {
        self.0.take().unwrap_or_default()
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let Some(path) = self.0.take() else {
            return;
        };
        match fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(path = %path.display(), error = %e, "Cannot remove scratch file"),
        }
    }
}

impl Codec for OpusToolsCodec {
    type Signal = PathBuf;

    fn process(
        &self,
        config: &Configuration,
        source: &PathBuf,
        loss_percent: f64,
    ) -> Result<PathBuf, CodecError> {
        let stem = self.call_stem(source, config, loss_percent);
        let compressed = Scratch::new(self.work_dir.join(format!("{stem}.opus")));
        let decoded = Scratch::new(self.work_dir.join(format!("{stem}.wav")));

        run(
            &self.opusenc,
            &Self::encode_args(config, source, compressed.path()),
        )?;
        run(
            &self.opusdec,
            &Self::decode_args(loss_percent, compressed.path(), decoded.path()),
        )?;

        let decoded = decoded.keep();
        debug!(output = %decoded.display(), "Decoded degraded signal");
        Ok(decoded)
    }

    fn discard(&self, degraded: PathBuf) {
        if !self.keep_outputs {
            drop(Scratch::new(degraded));
        }
    }
}
