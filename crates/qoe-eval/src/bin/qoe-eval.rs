//! qoe-eval - compare encoding controllers or generate training data
//!
//! Usage:
//!   qoe-eval [--mode sweep|dataset] [--model PATH] [--settings PATH]
//!            [--sweep PATH] [--inputs DIR] [--scorer PROGRAM] [--out PATH]
//!            [--work-dir DIR] [--simulate] [--allow-fallback] [--json-logs]

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use qoe_control::{CandidateSearch, ControllerSet, ControllerSettings, ModelPolicy};
use qoe_eval::{
    dataset, logging, summarize, CommandScorer, EvalError, EvalResult, Input, OpusToolsCodec,
    PcmSignal, ResultsWriter, SimulatedCodec, SnrScorer, Sweep, SweepConfig,
};
use qoe_model::QualityPredictor;
use tracing::{error, info};

const USAGE: &str = "qoe-eval [--mode sweep|dataset] [--model PATH] [--settings PATH] \
[--sweep PATH] [--inputs DIR] [--scorer PROGRAM] [--out PATH] [--work-dir DIR] \
[--simulate] [--allow-fallback] [--json-logs]";

/// Synthetic clips used by `--simulate` unless `max_inputs` says otherwise
const SIMULATED_INPUTS: usize = 4;
const SIMULATED_SECONDS: f64 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    Sweep,
    Dataset,
}

#[derive(Debug)]
struct Options {
    mode: Mode,
    model: Option<PathBuf>,
    settings: Option<PathBuf>,
    sweep: Option<PathBuf>,
    inputs: Option<PathBuf>,
    scorer: Option<PathBuf>,
    out: Option<PathBuf>,
    work_dir: PathBuf,
    simulate: bool,
    allow_fallback: bool,
    json_logs: bool,
}

impl Options {
    fn parse(args: impl IntoIterator<Item = String>) -> EvalResult<Self> {
        let mut options = Options {
            mode: Mode::Sweep,
            model: None,
            settings: None,
            sweep: None,
            inputs: None,
            scorer: None,
            out: None,
            work_dir: std::env::temp_dir(),
            simulate: false,
            allow_fallback: false,
            json_logs: false,
        };

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = || {
                args.next()
                    .ok_or_else(|| EvalError::Usage(format!("{arg} needs a value")))
            };
            match arg.as_str() {
                "--mode" => {
                    options.mode = match value()?.as_str() {
                        "sweep" => Mode::Sweep,
                        "dataset" => Mode::Dataset,
                        other => return Err(EvalError::Usage(format!("unknown mode '{other}'"))),
                    }
                }
                "--model" => options.model = Some(value()?.into()),
                "--settings" => options.settings = Some(value()?.into()),
                "--sweep" => options.sweep = Some(value()?.into()),
                "--inputs" => options.inputs = Some(value()?.into()),
                "--scorer" => options.scorer = Some(value()?.into()),
                "--out" => options.out = Some(value()?.into()),
                "--work-dir" => options.work_dir = value()?.into(),
                "--simulate" => options.simulate = true,
                "--allow-fallback" => options.allow_fallback = true,
                "--json-logs" => options.json_logs = true,
                "-h" | "--help" => return Err(EvalError::Usage(USAGE.to_string())),
                other => return Err(EvalError::Usage(format!("unknown argument '{other}'"))),
            }
        }

        if !options.simulate {
            if options.inputs.is_none() {
                return Err(EvalError::Usage("--inputs is required without --simulate".into()));
            }
            if options.scorer.is_none() {
                return Err(EvalError::Usage("--scorer is required without --simulate".into()));
            }
        }
        Ok(options)
    }
}

fn on_disk(options: &Options) -> EvalResult<(Vec<Input<PathBuf>>, OpusToolsCodec, CommandScorer)> {
    let (Some(inputs), Some(scorer)) = (&options.inputs, &options.scorer) else {
        return Err(EvalError::Usage(USAGE.to_string()));
    };
    Ok((
        Input::from_dir(inputs)?,
        OpusToolsCodec::new(&options.work_dir),
        CommandScorer::new(scorer),
    ))
}

fn synthetic(config: &SweepConfig) -> Vec<Input<PcmSignal>> {
    let count = config.max_inputs.unwrap_or(SIMULATED_INPUTS);
    Input::synthetic(count, config.seed, SIMULATED_SECONDS)
}

fn output(path: &Option<PathBuf>) -> EvalResult<Box<dyn Write>> {
    Ok(match path {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(BufWriter::new(io::stdout())),
    })
}

async fn run(options: Options) -> EvalResult<()> {
    let settings = match &options.settings {
        Some(path) => ControllerSettings::load(path)?,
        None => ControllerSettings::default(),
    };
    let config = match &options.sweep {
        Some(path) => SweepConfig::load(path)?,
        None if options.mode == Mode::Dataset => SweepConfig::dataset(),
        None => SweepConfig::default(),
    };

    let mut writer = ResultsWriter::new(output(&options.out)?);

    match options.mode {
        Mode::Sweep => {
            let predictor = match &options.model {
                Some(path) => QualityPredictor::load_or_unavailable(path),
                None => QualityPredictor::unavailable("no model given"),
            };
            let policy = if options.allow_fallback {
                ModelPolicy::AllowFallback
            } else {
                ModelPolicy::Required
            };
            let controllers =
                ControllerSet::from_settings(&settings, &config.controllers, &predictor, policy)?;

            let observations = if options.simulate {
                let inputs = synthetic(&config);
                Sweep::new(SimulatedCodec::new(config.seed), SnrScorer, controllers, config)
                    .run(&inputs)
                    .await?
            } else {
                let (inputs, codec, scorer) = on_disk(&options)?;
                Sweep::new(codec, scorer, controllers, config)
                    .run(&inputs)
                    .await?
            };

            writer.write_all(&observations)?;
            for row in summarize(&observations) {
                info!(
                    controller = %row.controller,
                    loss = row.packet_loss_percent,
                    samples = row.samples,
                    mean_mos = format_args!("{:.3}", row.mean_mos),
                    "Summary"
                );
            }
        }
        Mode::Dataset => {
            let search = CandidateSearch::new(&settings.search_space)?;
            let rows = if options.simulate {
                let inputs = synthetic(&config);
                let codec = SimulatedCodec::new(config.seed);
                dataset::generate(codec, SnrScorer, &search, &inputs, &config).await?
            } else {
                let (inputs, codec, scorer) = on_disk(&options)?;
                dataset::generate(codec, scorer, &search, &inputs, &config).await?
            };
            writer.write_all(&rows)?;
        }
    }

    let rows = writer.rows();
    writer.finish()?;
    info!(rows, "Done");
    Ok(())
}

#[tokio::main]
async fn main() {
    let options = match Options::parse(std::env::args().skip(1)) {
        Ok(options) => options,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };
    logging::init(options.json_logs);

    if let Err(e) = run(options).await {
        error!(error = %e, "qoe-eval failed");
        std::process::exit(1);
    }
}
