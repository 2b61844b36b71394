//! `handsign` command line: record labeled samples from replayed detector
//! output and train, evaluate and export a classifier from them.

use std::path::{Path, PathBuf};
use std::time::Duration;

use handsign::config::{self, TrainerSettings};
use handsign::detector::{DetectorOptions, HandDetector, ReplayDetector};
use handsign::export::{read_samples_export, write_samples_export};
use handsign::logging;
use handsign::ml::Classifier;
use handsign::ml::mlp::{MlpClassifier, MlpOptions};
use handsign::samples::Sample;
use handsign::trainer::{ClassifierFactory, Trainer, TrainingEvent};

const TRAINING_TIMEOUT: Duration = Duration::from_secs(600);

fn main() {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }
    if let Err(err) = run() {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let command = parse_args(std::env::args().skip(1).collect())?;
    let settings = config::load_or_default().map_err(|err| err.to_string())?;
    match command {
        Command::Record(options) => record(&settings, options),
        Command::Train(options) => train(settings, options),
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Record(RecordOptions),
    Train(TrainOptions),
}

#[derive(Debug, Clone, PartialEq)]
struct RecordOptions {
    frames: PathBuf,
    label: String,
    out: Option<PathBuf>,
    num_hands: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
struct TrainOptions {
    samples: PathBuf,
    epochs: Option<usize>,
    seed: Option<u64>,
    out: Option<PathBuf>,
}

fn record(settings: &TrainerSettings, options: RecordOptions) -> Result<(), String> {
    let mut detector_options = DetectorOptions::default();
    if let Some(num_hands) = options.num_hands {
        detector_options.num_hands = num_hands;
    }
    let mut detector =
        ReplayDetector::open(&options.frames, &detector_options).map_err(|err| err.to_string())?;
    let out = match options.out {
        Some(path) => path,
        None => settings
            .resolve_export_dir()
            .map_err(|err| err.to_string())?
            .join(&settings.export_file_name),
    };

    let mut samples = if out.is_file() {
        read_samples_export(&out).map_err(|err| err.to_string())?
    } else {
        Vec::new()
    };
    let existing = samples.len();
    let mut skipped = 0usize;
    for timestamp_ms in detector.timestamps() {
        let frame = detector
            .detect_for_frame(timestamp_ms)
            .map_err(|err| err.to_string())?;
        if frame.is_empty() {
            skipped += 1;
            continue;
        }
        samples.push(Sample::from_frame(&frame, options.label.as_str()).map_err(|err| err.to_string())?);
    }
    let added = samples.len() - existing;
    if added == 0 {
        return Err("No pose data available to sample".to_string());
    }

    let (dir, file_name) = split_output_path(&out)?;
    let path = write_samples_export(&dir, &file_name, &samples).map_err(|err| err.to_string())?;
    println!(
        "Sample added for \"{}\" x{added} ({skipped} frames without hands). Total samples: {}",
        options.label,
        samples.len()
    );
    println!("Wrote {}", path.display());
    Ok(())
}

fn train(mut settings: TrainerSettings, options: TrainOptions) -> Result<(), String> {
    if let Some(epochs) = options.epochs {
        settings.epochs = epochs;
    }
    if options.seed.is_some() {
        settings.shuffle_seed = options.seed;
    }
    let settings = settings.normalized();
    let export_dir = match options.out {
        Some(dir) => dir,
        None => settings.resolve_export_dir().map_err(|err| err.to_string())?,
    };

    let samples = read_samples_export(&options.samples).map_err(|err| err.to_string())?;
    println!("Loaded {} samples from {}", samples.len(), options.samples.display());

    let mut trainer = Trainer::new(settings.training(), mlp_factory(settings.mlp.clone()));
    for sample in samples {
        trainer.add_sample(sample).map_err(|err| err.to_string())?;
    }
    println!("Labels: {}", trainer.store().label_summary());

    let started = trainer.train().map_err(|err| format!("Error: {err}"))?;
    println!(
        "Training model... ({} train / {} held out)",
        started.training, started.held_out
    );
    match trainer.wait_for_training(TRAINING_TIMEOUT) {
        Some(TrainingEvent::Completed { elapsed, .. }) => {
            println!("Training complete in {:.2}s", elapsed.as_secs_f64());
        }
        Some(TrainingEvent::Failed { reason }) => return Err(format!("Error: {reason}")),
        None => return Err("Training did not finish in time".to_string()),
    }

    match trainer.generate_confusion_matrix() {
        Ok(report) => {
            println!("held-out accuracy: {:.4}", report.accuracy());
            for stats in report.per_class() {
                println!(
                    "{:<16}  precision={:.3}  recall={:.3}  support={}",
                    stats.label, stats.precision, stats.recall, stats.support
                );
            }
            if report.skipped > 0 || report.unmatched > 0 {
                println!(
                    "{} samples failed, {} predicted labels outside the held-out set",
                    report.skipped, report.unmatched
                );
            }
            println!("confusion matrix (rows=true, cols=pred):");
            print!("{}", report.render_table());
        }
        Err(err) => println!("Evaluation skipped: {err}"),
    }

    let path = trainer
        .export_model(&export_dir, &settings.model_name)
        .map_err(|err| format!("Error exporting model: {err}"))?;
    println!(
        "Model exported successfully as \"{}\" ({})",
        settings.model_name,
        path.display()
    );
    Ok(())
}

fn mlp_factory(options: MlpOptions) -> ClassifierFactory {
    Box::new(move || Ok(Box::new(MlpClassifier::new(options.clone())) as Box<dyn Classifier>))
}

fn split_output_path(path: &Path) -> Result<(PathBuf, String), String> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| format!("Invalid output path: {}", path.display()))?
        .to_string();
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok((dir, file_name))
}

fn parse_args(args: Vec<String>) -> Result<Command, String> {
    let Some((command, rest)) = args.split_first() else {
        return Err(help_text());
    };
    match command.as_str() {
        "-h" | "--help" => Err(help_text()),
        "record" => parse_record(rest).map(Command::Record),
        "train" => parse_train(rest).map(Command::Train),
        other => Err(format!("Unknown command: {other}\n\n{}", help_text())),
    }
}

fn parse_record(args: &[String]) -> Result<RecordOptions, String> {
    let mut frames = None;
    let mut label = None;
    let mut out = None;
    let mut num_hands = None;
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--frames" => frames = Some(PathBuf::from(value(args, &mut idx, "--frames")?)),
            "--label" => label = Some(value(args, &mut idx, "--label")?.to_string()),
            "--out" => out = Some(PathBuf::from(value(args, &mut idx, "--out")?)),
            "--num-hands" => num_hands = Some(parse_number(args, &mut idx, "--num-hands")?),
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    let label = label
        .filter(|label| !label.trim().is_empty())
        .ok_or_else(|| "Please enter a label first (--label)".to_string())?;
    Ok(RecordOptions {
        frames: frames.ok_or_else(|| format!("Missing --frames\n\n{}", help_text()))?,
        label,
        out,
        num_hands,
    })
}

fn parse_train(args: &[String]) -> Result<TrainOptions, String> {
    let mut samples = None;
    let mut epochs = None;
    let mut seed = None;
    let mut out = None;
    let mut idx = 0usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "-h" | "--help" => return Err(help_text()),
            "--samples" => samples = Some(PathBuf::from(value(args, &mut idx, "--samples")?)),
            "--epochs" => epochs = Some(parse_number(args, &mut idx, "--epochs")?),
            "--seed" => seed = Some(parse_number(args, &mut idx, "--seed")?),
            "--out" => out = Some(PathBuf::from(value(args, &mut idx, "--out")?)),
            unknown => return Err(format!("Unknown argument: {unknown}\n\n{}", help_text())),
        }
        idx += 1;
    }
    Ok(TrainOptions {
        samples: samples.ok_or_else(|| format!("Missing --samples\n\n{}", help_text()))?,
        epochs,
        seed,
        out,
    })
}

fn value<'a>(args: &'a [String], idx: &mut usize, flag: &str) -> Result<&'a str, String> {
    *idx += 1;
    args.get(*idx)
        .map(String::as_str)
        .ok_or_else(|| format!("{flag} requires a value"))
}

fn parse_number<T: std::str::FromStr>(
    args: &[String],
    idx: &mut usize,
    flag: &str,
) -> Result<T, String> {
    let raw = value(args, idx, flag)?;
    raw.parse()
        .map_err(|_| format!("Invalid {flag} value: {raw}"))
}

fn help_text() -> String {
    [
        "handsign",
        "",
        "Record hand landmark samples and train a hand-sign classifier.",
        "",
        "Usage:",
        "  handsign record --frames <frames.jsonl> --label <label> [--out <file>] [--num-hands <n>]",
        "  handsign train --samples <file> [--epochs <n>] [--seed <n>] [--out <dir>]",
        "",
        "Settings are read from .handsign/config.toml (override the root with HANDSIGN_CONFIG_HOME).",
    ]
    .join("\n")
}
