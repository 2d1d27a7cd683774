//! Command-line driver for the spectral denoiser: `specbleach-cli [flags]
//! <input.wav> <output.wav>`. Mono 16-bit WAV in, mono 16-bit WAV out.
//! Learns a noise profile over the first `--learn-frames` samples (manual
//! and 2-D processors only), then switches to reduction for the remainder.

use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::PathBuf;

use specbleach_rs::denoiser::{AdaptiveDenoiser, ManualDenoiser, NlmDenoiser, SpectralDenoiser};
use specbleach_rs::params::{DenoiserParameters, EstimationMethod, NoiseScalingType, ProfileMode};

enum Processor {
    Manual(ManualDenoiser),
    Adaptive(AdaptiveDenoiser),
    Nlm(NlmDenoiser),
}

impl Processor {
    fn new(kind: &str, sample_rate: u32, frame_ms: f32) -> Result<Self> {
        Ok(match kind {
            "manual" => Processor::Manual(ManualDenoiser::initialize(sample_rate, frame_ms)?),
            "adaptive" => Processor::Adaptive(AdaptiveDenoiser::initialize(sample_rate, frame_ms)?),
            "nlm" | "2d" => Processor::Nlm(NlmDenoiser::initialize(sample_rate, frame_ms)?),
            other => bail!("unknown --processor '{other}', expected manual|adaptive|nlm"),
        })
    }

    fn load_parameters(&mut self, params: DenoiserParameters) -> Result<()> {
        match self {
            Processor::Manual(d) => d.load_parameters(params)?,
            Processor::Adaptive(d) => d.load_parameters(params)?,
            Processor::Nlm(d) => d.load_parameters(params)?,
        }
        Ok(())
    }

    fn process(&mut self, input: &[f32], output: &mut [f32]) -> bool {
        match self {
            Processor::Manual(d) => d.process(input, output),
            Processor::Adaptive(d) => d.process(input, output),
            Processor::Nlm(d) => d.process(input, output),
        }
    }

    fn get_latency(&self) -> usize {
        match self {
            Processor::Manual(d) => d.get_latency(),
            Processor::Adaptive(d) => d.get_latency(),
            Processor::Nlm(d) => d.get_latency(),
        }
    }

    fn supports_learning(&self) -> bool {
        !matches!(self, Processor::Adaptive(_))
    }
}

struct Args {
    input: PathBuf,
    output: PathBuf,
    params_file: Option<PathBuf>,
    processor: String,
    frame_ms: f32,
    learn_frames: usize,
    mode: i32,
    reduction_db: f32,
    estimator: i32,
    scaling: i32,
    adaptive_noise: bool,
    residual_listen: bool,
    whitening: f32,
    smoothing: f32,
    rescale: f32,
    post_filter_threshold: f32,
}

fn parse_args() -> Result<Args> {
    let mut positional = Vec::new();
    let mut args = Args {
        input: PathBuf::new(),
        output: PathBuf::new(),
        params_file: None,
        processor: "manual".to_string(),
        frame_ms: 20.0,
        learn_frames: 0,
        mode: 1,
        reduction_db: 10.0,
        estimator: 2,
        scaling: 0,
        adaptive_noise: false,
        residual_listen: false,
        whitening: 0.0,
        smoothing: 0.0,
        rescale: 0.0,
        post_filter_threshold: 0.0,
    };

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        let mut next = |name: &str| -> Result<String> {
            it.next().with_context(|| format!("missing value for {name}"))
        };
        match arg.as_str() {
            "--params" => args.params_file = Some(PathBuf::from(next("--params")?)),
            "--processor" => args.processor = next("--processor")?,
            "--frame-ms" => args.frame_ms = next("--frame-ms")?.parse()?,
            "--learn-frames" => args.learn_frames = next("--learn-frames")?.parse()?,
            "--mode" => args.mode = next("--mode")?.parse()?,
            "--reduction-db" => args.reduction_db = next("--reduction-db")?.parse()?,
            "--estimator" => args.estimator = next("--estimator")?.parse()?,
            "--scaling" => args.scaling = next("--scaling")?.parse()?,
            "--adaptive" => args.adaptive_noise = true,
            "--residual-listen" => args.residual_listen = true,
            "--whitening" => args.whitening = next("--whitening")?.parse()?,
            "--smoothing" => args.smoothing = next("--smoothing")?.parse()?,
            "--rescale" => args.rescale = next("--rescale")?.parse()?,
            "--post-filter-threshold" => args.post_filter_threshold = next("--post-filter-threshold")?.parse()?,
            other if other.starts_with("--") => bail!("unknown flag '{other}'"),
            other => positional.push(other.to_string()),
        }
    }

    if positional.len() != 2 {
        bail!("usage: specbleach-cli [flags] <input.wav> <output.wav>");
    }
    args.input = PathBuf::from(&positional[0]);
    args.output = PathBuf::from(&positional[1]);
    Ok(args)
}

fn build_params(args: &Args) -> Result<DenoiserParameters> {
    if let Some(path) = &args.params_file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read params file '{}'", path.display()))?;
        let params: DenoiserParameters = serde_json::from_str(&text)
            .with_context(|| format!("failed to parse params file '{}'", path.display()))?;
        return Ok(params.clamped());
    }

    let mut params = DenoiserParameters::default();
    params.noise_reduction_mode =
        ProfileMode::from_i32(args.mode).with_context(|| format!("invalid --mode {}", args.mode))?;
    params.reduction_amount = args.reduction_db;
    params.noise_estimation_method = EstimationMethod::from_i32(args.estimator)
        .with_context(|| format!("invalid --estimator {}", args.estimator))?;
    params.noise_scaling_type = NoiseScalingType::from_i32(args.scaling)
        .with_context(|| format!("invalid --scaling {}", args.scaling))?;
    params.adaptive_noise = args.adaptive_noise;
    params.residual_listen = args.residual_listen;
    params.whitening_factor = args.whitening;
    params.smoothing_factor = args.smoothing;
    params.noise_rescale = args.rescale;
    params.post_filter_threshold = args.post_filter_threshold;
    Ok(params.clamped())
}

fn read_mono_f32(path: &PathBuf) -> Result<(Vec<f32>, u32)> {
    let reader =
        WavReader::open(path).with_context(|| format!("failed to open input WAV '{}'", path.display()))?;
    let spec = reader.spec();
    if spec.channels != 1 {
        bail!("input WAV must be mono, got {} channels", spec.channels);
    }
    if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
        bail!("input WAV must be 16-bit PCM");
    }
    let sample_rate = spec.sample_rate;
    let samples: Result<Vec<f32>, _> = reader
        .into_samples::<i16>()
        .map(|s| s.map(|v| v as f32 / i16::MAX as f32))
        .collect();
    Ok((samples.context("failed reading WAV samples")?, sample_rate))
}

fn write_mono_f32(path: &PathBuf, samples: &[f32], sample_rate: u32) -> Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("failed to create output WAV '{}'", path.display()))?;
    for &s in samples {
        let clamped = (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(clamped)?;
    }
    writer.finalize()?;
    Ok(())
}

const BLOCK_SIZE: usize = 1024;

fn run() -> Result<()> {
    let args = parse_args()?;
    let (input, sample_rate) = read_mono_f32(&args.input)?;
    let mut processor = Processor::new(&args.processor, sample_rate, args.frame_ms)?;
    let mut params = build_params(&args)?;

    log::info!(
        "specbleach-cli: {} samples @ {} Hz, processor={}, latency={} samples",
        input.len(),
        sample_rate,
        args.processor,
        processor.get_latency()
    );

    let mut output = vec![0.0f32; input.len()];

    if args.learn_frames > 0 && processor.supports_learning() {
        let learn_end = args.learn_frames.min(input.len());
        let mut learn_params = params;
        learn_params.learn_noise = true;
        processor.load_parameters(learn_params)?;
        process_in_blocks(&mut processor, &input[..learn_end], &mut output[..learn_end]);
        params.learn_noise = false;
    }

    processor.load_parameters(params)?;
    process_in_blocks(&mut processor, &input, &mut output);

    write_mono_f32(&args.output, &output, sample_rate)?;
    println!(
        "wrote '{}' ({} samples, latency {} samples)",
        args.output.display(),
        output.len(),
        processor.get_latency()
    );
    Ok(())
}

fn process_in_blocks(processor: &mut Processor, input: &[f32], output: &mut [f32]) {
    let mut offset = 0;
    while offset < input.len() {
        let end = (offset + BLOCK_SIZE).min(input.len());
        processor.process(&input[offset..end], &mut output[offset..end]);
        offset = end;
    }
}

fn main() {
    init_logger();
    if let Err(err) = run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

fn init_logger() {
    let level = std::env::var("SPECBLEACH_LOG")
        .ok()
        .and_then(|v| v.parse::<log::LevelFilter>().ok())
        .unwrap_or(log::LevelFilter::Warn);
    let _ = log::set_boxed_logger(Box::new(StderrLogger(level))).map(|()| log::set_max_level(level));
}

struct StderrLogger(log::LevelFilter);

impl log::Log for StderrLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= self.0
    }

    fn log(&self, record: &log::Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}
