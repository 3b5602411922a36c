use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use reelcut::{
    CancelToken, CardSpec, Encoder, HighlightSelector, Pipeline, PipelineConfig, Progress,
    ReelOrder, SelectionBudget, SystemEncoder, Transcriber, TranscriptFile, audio_extraction,
};

#[derive(Parser, Debug)]
#[command(name = "reelcut", version, about = "Build highlight reels from a video and its transcript")]
struct Cli {
    /// Pipeline configuration JSON. Defaults apply to anything it leaves out.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the ranked, budget-trimmed highlights of a transcript as JSON (no encoding).
    Select(SelectArgs),
    /// Select and render highlight clips, printing one clip name per line.
    Highlights(HighlightsArgs),
    /// Concatenate previously rendered clips, in the given order, between title cards.
    Assemble(AssembleArgs),
    /// Transcript to finished reel in one go, clips in ranked order.
    Run(RunArgs),
    /// Write a 16 kHz mono WAV of the source audio for a speech recognizer.
    ExtractAudio(ExtractAudioArgs),
}

#[derive(Args, Debug)]
struct BudgetArgs {
    /// Maximum number of clips (default from config).
    #[arg(long)]
    max_clips: Option<usize>,

    /// Maximum total clip seconds (default from config).
    #[arg(long)]
    max_duration: Option<f64>,
}

#[derive(Args, Debug)]
struct CardArgs {
    /// Intro card text.
    #[arg(long)]
    intro: String,

    /// Outro card text.
    #[arg(long)]
    outro: String,

    /// Card style JSON (font, colours, duration) shared by both cards.
    #[arg(long)]
    card_style: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct SelectArgs {
    /// Transcript document (whisper-style JSON or SRT).
    #[arg(long)]
    transcript: PathBuf,

    #[command(flatten)]
    budget: BudgetArgs,
}

#[derive(Parser, Debug)]
struct HighlightsArgs {
    /// Source video.
    #[arg(long)]
    source: PathBuf,

    #[arg(long)]
    transcript: PathBuf,

    /// Existing directory that receives clips and the manifest.
    #[arg(long)]
    out_dir: PathBuf,

    #[command(flatten)]
    budget: BudgetArgs,
}

#[derive(Parser, Debug)]
struct AssembleArgs {
    /// Directory holding the clips and their manifest.
    #[arg(long)]
    out_dir: PathBuf,

    /// Clip name, repeated in reel order.
    #[arg(long = "clip")]
    clips: Vec<String>,

    #[command(flatten)]
    cards: CardArgs,
}

#[derive(Parser, Debug)]
struct RunArgs {
    #[arg(long)]
    source: PathBuf,

    #[arg(long)]
    transcript: PathBuf,

    #[arg(long)]
    out_dir: PathBuf,

    #[command(flatten)]
    budget: BudgetArgs,

    #[command(flatten)]
    cards: CardArgs,
}

#[derive(Parser, Debug)]
struct ExtractAudioArgs {
    #[arg(long)]
    source: PathBuf,

    /// Output WAV path.
    #[arg(long)]
    out: PathBuf,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let mut config = match &cli.config {
        Some(path) => PipelineConfig::from_path(path)?,
        None => PipelineConfig::default(),
    };
    match cli.cmd {
        Command::Select(args) => cmd_select(&config, args),
        Command::Highlights(args) => {
            apply_budget(&mut config, &args.budget);
            cmd_highlights(config, args)
        }
        Command::Assemble(args) => cmd_assemble(config, args),
        Command::Run(args) => {
            apply_budget(&mut config, &args.budget);
            cmd_run(config, args)
        }
        Command::ExtractAudio(args) => cmd_extract_audio(&config, args),
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("reelcut=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn apply_budget(config: &mut PipelineConfig, budget: &BudgetArgs) {
    if let Some(n) = budget.max_clips {
        config.selection.max_clips = n;
    }
    if let Some(secs) = budget.max_duration {
        config.selection.max_total_duration = secs;
    }
}

fn encoder(config: &PipelineConfig) -> SystemEncoder {
    SystemEncoder::new(&config.encoder, CancelToken::new())
}

fn card_specs(args: &CardArgs) -> anyhow::Result<(CardSpec, CardSpec)> {
    let base = match &args.card_style {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("read card style '{}'", path.display()))?;
            serde_json::from_slice::<CardSpec>(&bytes)
                .with_context(|| format!("parse card style '{}'", path.display()))?
        }
        None => CardSpec::default(),
    };
    let intro = CardSpec {
        text: args.intro.clone(),
        ..base.clone()
    };
    let outro = CardSpec {
        text: args.outro.clone(),
        ..base
    };
    Ok((intro, outro))
}

fn cmd_select(config: &PipelineConfig, args: SelectArgs) -> anyhow::Result<()> {
    let segments = TranscriptFile::new(&args.transcript).transcribe(Path::new(""))?;
    let budget = SelectionBudget::new(
        args.budget.max_clips.unwrap_or(config.selection.max_clips),
        args.budget
            .max_duration
            .unwrap_or(config.selection.max_total_duration),
    );
    let highlights =
        HighlightSelector::new(config.selection.keyword_set()).select(&segments, budget);
    println!("{}", serde_json::to_string_pretty(&highlights)?);
    Ok(())
}

fn cmd_highlights(config: PipelineConfig, args: HighlightsArgs) -> anyhow::Result<()> {
    let encoder = encoder(&config);
    let (max_clips, max_total) = (
        config.selection.max_clips,
        config.selection.max_total_duration,
    );
    let mut pipeline = Pipeline::new(config, &encoder, Progress::default())?;
    let segments = pipeline.transcribe(&TranscriptFile::new(&args.transcript), &args.source)?;
    let clips =
        pipeline.generate_highlights(&args.source, &segments, max_clips, max_total, &args.out_dir)?;
    for clip in &clips {
        println!("{}", clip.clip_id());
    }
    Ok(())
}

fn cmd_assemble(config: PipelineConfig, args: AssembleArgs) -> anyhow::Result<()> {
    let encoder = encoder(&config);
    let (intro, outro) = card_specs(&args.cards)?;
    let order = ReelOrder::parse(&args.clips)?;
    let pipeline = Pipeline::new(config, &encoder, Progress::default())?;
    let reel = pipeline.assemble_reel(&order, &args.out_dir, &intro, &outro)?;
    println!("{}", reel.path.display());
    Ok(())
}

fn cmd_run(config: PipelineConfig, args: RunArgs) -> anyhow::Result<()> {
    let encoder = encoder(&config);
    let (intro, outro) = card_specs(&args.cards)?;
    let mut pipeline = Pipeline::new(config, &encoder, Progress::default())?;
    let reel = pipeline.run(
        &args.source,
        &TranscriptFile::new(&args.transcript),
        &args.out_dir,
        &intro,
        &outro,
    )?;
    println!("{}", reel.path.display());
    Ok(())
}

fn cmd_extract_audio(config: &PipelineConfig, args: ExtractAudioArgs) -> anyhow::Result<()> {
    if !args.source.is_file() {
        anyhow::bail!("source '{}' does not exist", args.source.display());
    }
    encoder(config).run(&audio_extraction(&args.source, &args.out))?;
    println!("{}", args.out.display());
    Ok(())
}
