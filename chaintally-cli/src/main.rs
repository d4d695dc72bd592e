mod report;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::fs::{self, File};
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;

use chaintally_engine::{
    AgeMode, AltFormSource, ChainSession, MAIN_CHARACTER_ID, MilestoneRule, RewardConfig,
};
use report::ReportDocument;

#[derive(Debug, Parser)]
#[command(name = "chaintally", version = "0.1.0")]
#[command(about = "Milestone PT and age reports for jumpchain save files")]
struct Args {
    /// Path to the exported save file (JSON)
    save: PathBuf,

    /// Character to analyze (id from the save's character table)
    #[arg(long, default_value = MAIN_CHARACTER_ID)]
    character: String,

    /// List the characters in the save and exit
    #[arg(long)]
    list_characters: bool,

    /// Items payout rule as REWARD/PER (default 2/5)
    #[arg(long, value_parser = parse_rule)]
    items_rule: Option<MilestoneRule>,

    /// Alt-forms payout rule as REWARD/PER (default 1/2)
    #[arg(long, value_parser = parse_rule)]
    alt_forms_rule: Option<MilestoneRule>,

    /// Drawbacks payout rule as REWARD/PER (default 1/10)
    #[arg(long, value_parser = parse_rule)]
    drawbacks_rule: Option<MilestoneRule>,

    /// Exterminations payout rule as REWARD/PER (default 2/4)
    #[arg(long, value_parser = parse_rule)]
    exterminations_rule: Option<MilestoneRule>,

    /// Manual extermination counts (comma-separated JUMP=COUNT)
    #[arg(long, default_value = "")]
    exterminations: String,

    /// Age trajectories to include
    #[arg(long, default_value = "none")]
    #[arg(value_parser = ["participation", "continuous", "both", "none"])]
    ages: String,

    /// Count supplement durations when aging
    #[arg(long)]
    supplement_ages: bool,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let raw = fs::read_to_string(&args.save)
        .with_context(|| format!("failed to read {}", args.save.display()))?;
    let mut session = ChainSession::from_json(&raw)
        .with_context(|| format!("{} is not a recognizable save file", args.save.display()))?;

    if maybe_list_characters(&args, &session)? {
        return Ok(());
    }

    configure_session(&args, &mut session)?;

    if args.report == "console" && args.output.is_none() {
        announce_banner();
    }

    let document = build_document(&args, &mut session)?;
    write_report(&args, &document)
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();
}

fn announce_banner() {
    println!("{}", "⛓️  Chaintally".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn maybe_list_characters(args: &Args, session: &ChainSession) -> Result<bool> {
    if !args.list_characters {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(
        output_target.writer(),
        "Characters in {}:",
        args.save.display()
    )?;
    for (id, character) in &session.save().characters {
        writeln!(
            output_target.writer(),
            "  {:>6}  {} (starting age {})",
            id,
            session.save().character_name(id),
            character.starting_age()
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn configure_session(args: &Args, session: &mut ChainSession) -> Result<()> {
    if !session.save().characters.is_empty()
        && !session.save().characters.contains_key(&args.character)
    {
        log::warn!(
            "character {} is not in the save's character table; counting anyway",
            args.character
        );
    }
    session.select_character(&args.character);
    session.set_include_supplements(args.supplement_ages);
    session
        .set_reward_config(build_reward_config(args))
        .context("invalid payout rule")?;
    for (jump_id, count) in parse_overrides(&args.exterminations)? {
        session.set_override(&jump_id, count);
    }
    Ok(())
}

/// Start from the stock payout rules and overlay whatever the flags set.
fn build_reward_config(args: &Args) -> RewardConfig {
    let defaults = RewardConfig::default();
    RewardConfig {
        items: args.items_rule.unwrap_or(defaults.items),
        alt_forms: args.alt_forms_rule.unwrap_or(defaults.alt_forms),
        drawbacks: args.drawbacks_rule.unwrap_or(defaults.drawbacks),
        exterminations: args.exterminations_rule.unwrap_or(defaults.exterminations),
    }
}

fn build_document(args: &Args, session: &mut ChainSession) -> Result<ReportDocument> {
    let milestones = session.milestone_report().context("invalid payout rule")?;
    if !milestones.declared_order {
        log::warn!("save has no jumpList; using sorted jump keys as the traversal order");
    }
    log::debug!(
        "alt-form source: {:?}",
        AltFormSource::for_save(session.save())
    );

    let ages = requested_age_modes(&args.ages)
        .into_iter()
        .map(|mode| session.age_report(mode))
        .collect();

    Ok(ReportDocument {
        generated_at: report::timestamp(),
        save_file: args.save.display().to_string(),
        character_id: args.character.clone(),
        character_name: session.save().character_name(&args.character),
        milestones,
        ages,
    })
}

fn write_report(args: &Args, document: &ReportDocument) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => report::write_json_report(&mut output_target, document)?,
        "markdown" => report::write_markdown_report(&mut output_target, document)?,
        "csv" => report::write_csv_report(&mut output_target, document)?,
        _ => report::write_console_report(&mut output_target, document)?,
    }

    output_target.flush_inner()?;
    Ok(())
}

fn parse_rule(text: &str) -> Result<MilestoneRule, String> {
    let (reward, per) = text
        .split_once('/')
        .ok_or_else(|| format!("expected REWARD/PER, got {text:?}"))?;
    let reward: u32 = reward
        .trim()
        .parse()
        .map_err(|_| format!("bad reward in {text:?}"))?;
    let per: u32 = per
        .trim()
        .parse()
        .map_err(|_| format!("bad threshold in {text:?}"))?;
    Ok(MilestoneRule::new(reward, per))
}

/// Parse `JUMP=COUNT` tokens. Negative counts clamp to zero with a warning
/// so one bad token does not sink an otherwise usable invocation.
fn parse_overrides(text: &str) -> Result<Vec<(String, u64)>> {
    let mut overrides = Vec::new();
    for token in split_csv(text) {
        let (jump_id, count) = token
            .split_once('=')
            .with_context(|| format!("expected JUMP=COUNT, got {token:?}"))?;
        let count: i64 = count
            .trim()
            .parse()
            .with_context(|| format!("bad extermination count in {token:?}"))?;
        if count < 0 {
            log::warn!("extermination count for jump {jump_id} is negative; clamping to 0");
        }
        overrides.push((jump_id.trim().to_string(), count.max(0).unsigned_abs()));
    }
    Ok(overrides)
}

fn requested_age_modes(ages: &str) -> Vec<AgeMode> {
    match ages {
        "participation" => vec![AgeMode::Participation],
        "continuous" => vec![AgeMode::Continuous],
        "both" => vec![AgeMode::Participation, AgeMode::Continuous],
        _ => Vec::new(),
    }
}

fn split_csv(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect()
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
