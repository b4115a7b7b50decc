use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "meltscr", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the tables stored in a tables file.
    Inspect(FileArgs),
    /// Load a tables file and save it back, dropping unused dead tables.
    Prune(FileArgs),
    /// Print the offsets produced by consecutive transition starts.
    Preview(PreviewArgs),
}

#[derive(Parser, Debug)]
struct FileArgs {
    /// Tables file (usually `TABLES1.WAD` in the plugin config dir).
    #[arg(long)]
    file: PathBuf,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum SourceArg {
    Legacy,
    Fixed,
    Dynamic,
}

impl From<SourceArg> for meltscr::ValueSource {
    fn from(v: SourceArg) -> Self {
        match v {
            SourceArg::Legacy => Self::Legacy,
            SourceArg::Fixed => Self::Fixed,
            SourceArg::Dynamic => Self::Dynamic,
        }
    }
}

#[derive(Parser, Debug)]
struct PreviewArgs {
    #[arg(long, default_value_t = 160)]
    slices: u16,

    #[arg(long, default_value_t = 16)]
    steps: u16,

    /// Walk increment in 1/400 units.
    #[arg(long, default_value_t = 25)]
    increment: u8,

    /// Displacement range in percent.
    #[arg(long, default_value_t = 60)]
    factor: u8,

    /// Noise table edge: -1 (auto), 8, 16, 32 or 64.
    #[arg(long, default_value_t = 16, allow_hyphen_values = true)]
    table_size: i64,

    #[arg(long, value_enum, default_value_t = SourceArg::Legacy)]
    source: SourceArg,

    /// Seed for random value sources. Defaults to the clock.
    #[arg(long)]
    seed: Option<u64>,

    /// Number of transition starts to print.
    #[arg(long, default_value_t = 1)]
    runs: u32,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(tracing::Level::WARN)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Inspect(args) => cmd_inspect(args),
        Command::Prune(args) => cmd_prune(args),
        Command::Preview(args) => cmd_preview(args),
    }
}

fn cmd_inspect(args: FileArgs) -> anyhow::Result<()> {
    let mut store = meltscr::TableStore::new();
    let outcome = meltscr::TablesFile::new(&args.file).load(&mut store);

    println!("uuid\tposition\tdead\tvalues\toffsets");
    for table in store.iter() {
        println!(
            "{}\t{}\t{}\t{}\t{}",
            table.uuid(),
            table.position,
            u8::from(table.is_dead()),
            table.values_size(),
            table.offsets_size()
        );
    }

    let summary =
        outcome.with_context(|| format!("read tables file '{}'", args.file.display()))?;
    eprintln!(
        "{} tables ({} declared, {} duplicates skipped)",
        summary.loaded, summary.declared, summary.skipped
    );
    Ok(())
}

fn cmd_prune(args: FileArgs) -> anyhow::Result<()> {
    let file = meltscr::TablesFile::new(&args.file);
    let mut store = meltscr::TableStore::new();
    file.load(&mut store)
        .with_context(|| format!("read tables file '{}'", args.file.display()))?;
    let dropped = store.retain_live();
    let saved = file
        .save(&store)
        .with_context(|| format!("write tables file '{}'", args.file.display()))?;

    eprintln!(
        "wrote {} (kept {}, dropped {})",
        args.file.display(),
        saved.written,
        dropped
    );
    Ok(())
}

fn cmd_preview(args: PreviewArgs) -> anyhow::Result<()> {
    let table_size = meltscr::TableSize::try_from(args.table_size).map_err(anyhow::Error::msg)?;
    let mut settings = meltscr::MeltSettings {
        slices: args.slices,
        steps: args.steps,
        increment: args.increment,
        factor: args.factor,
        table_size,
        random_type: args.source.into(),
        ..meltscr::MeltSettings::default()
    };

    let rng = match args.seed {
        Some(seed) => meltscr::Rng64::new(seed),
        None => meltscr::Rng64::from_time(),
    };
    let mut store = meltscr::TableStore::new();
    let mut transition = meltscr::MeltTransition::with_rng(rng);
    let mut backend = meltscr::CpuTextureBackend;
    transition.update(&mut store, &mut settings)?;
    let uuid = transition
        .table_uuid()
        .context("transition has no table after update")?;

    for run in 0..args.runs {
        let start = store.get(uuid).map_or(0, |t| t.position);
        transition.start(&mut store, &mut backend)?;
        let table = store.get(uuid).context("bound table disappeared")?;
        let offsets: Vec<String> = table.offsets().iter().map(u8::to_string).collect();
        println!(
            "run {run} position {start} -> {}: {}",
            table.position,
            offsets.join(" ")
        );
    }
    Ok(())
}
