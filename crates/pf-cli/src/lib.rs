use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use pf_assets::{
    load_config, load_manifest, log_dir, prompt_file_name, prompt_source_for, resolve_locations,
    save_config, AssetLocations, LocationOverrides,
};
use pf_core::{CategoryFilter, CoreError, EntryId, PortfolioEntry, SortDirection, SortKey};
use pf_gallery::{derive_view, sweep_catalog, Catalog, Gallery, PromptLoader};

#[derive(Parser)]
#[command(name = "pf", version, about = "Promptfolio image and prompt gallery")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    /// Image directory or base URL.
    #[arg(long, global = true)]
    images: Option<String>,
    /// Prompt directory or base URL.
    #[arg(long, global = true)]
    prompts: Option<String>,
    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Write the asset locations to the configuration file.
    Init {
        /// Pause between entries during the startup sweep, in milliseconds.
        #[arg(long)]
        sweep_delay_ms: Option<u64>,
    },
    /// List entries in view order.
    List {
        /// Category to show, or "all".
        #[arg(long, default_value = "all", value_parser = parse_filter)]
        filter: CategoryFilter,
        /// Sort key.
        #[arg(long, value_enum, default_value = "timestamp")]
        sort: SortKeyArg,
        /// Sort direction.
        #[arg(long, value_enum, default_value = "desc")]
        direction: DirectionArg,
        /// Resolve unclassified entries before listing.
        #[arg(long)]
        classify: bool,
        /// Print entries as YAML.
        #[arg(long)]
        yaml: bool,
    },
    /// Show a single entry and its prompt.
    Show { id: String },
    /// Classify every unclassified entry from its prompt.
    Classify,
}

#[derive(Clone, ValueEnum)]
enum SortKeyArg {
    Timestamp,
    Time,
    Model,
    Title,
    Category,
}

impl From<SortKeyArg> for SortKey {
    fn from(value: SortKeyArg) -> Self {
        match value {
            SortKeyArg::Timestamp => SortKey::Timestamp,
            SortKeyArg::Time => SortKey::Time,
            SortKeyArg::Model => SortKey::Model,
            SortKeyArg::Title => SortKey::Title,
            SortKeyArg::Category => SortKey::Category,
        }
    }
}

#[derive(Clone, ValueEnum)]
enum DirectionArg {
    Asc,
    Desc,
}

impl From<DirectionArg> for SortDirection {
    fn from(value: DirectionArg) -> Self {
        match value {
            DirectionArg::Asc => SortDirection::Ascending,
            DirectionArg::Desc => SortDirection::Descending,
        }
    }
}

fn parse_filter(value: &str) -> Result<CategoryFilter, String> {
    value.parse().map_err(|err: pf_core::CoreError| err.to_string())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let overrides = LocationOverrides {
        image_base: cli.images,
        prompt_base: cli.prompts,
    };

    let command = match cli.command {
        Some(c) => c,
        None => {
            init_logging(cli.verbose, true)?;
            return run_tui(overrides);
        }
    };
    init_logging(cli.verbose, false)?;

    if let Command::Init { sweep_delay_ms } = &command {
        return init_config(overrides, *sweep_delay_ms);
    }

    let locations = resolve_locations(overrides).context("failed to resolve asset locations")?;
    let mut catalog = build_catalog(&locations);
    let loader = PromptLoader::new(prompt_source_for(&locations.prompt_base));
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to initialize runtime")?;

    match command {
        Command::List {
            filter,
            sort,
            direction,
            classify,
            yaml,
        } => {
            if classify {
                runtime.block_on(sweep_catalog(&mut catalog, &loader));
            }
            list_entries(&catalog, filter, sort.into(), direction.into(), yaml)
        }
        Command::Show { id } => show_entry(&runtime, catalog, &loader, &id),
        Command::Classify => classify_entries(&runtime, &mut catalog, &loader),
        Command::Init { .. } => unreachable!("handled above"),
    }
}

fn init_logging(verbose: bool, to_file: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "debug" } else { "info" })
    });
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let result = if to_file {
        let dir = log_dir()?;
        std::fs::create_dir_all(&dir).context("failed to create log directory")?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join("promptfolio.log"))
            .context("failed to open log file")?;
        builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
    } else {
        builder.with_writer(std::io::stderr).try_init()
    };
    result.map_err(|err| anyhow!(err.to_string()))
}

fn build_catalog(locations: &AssetLocations) -> Catalog {
    let manifest = load_manifest(&locations.image_base);
    Catalog::initialize(manifest.as_slice(), &locations.image_base, prompt_file_name)
}

fn run_tui(overrides: LocationOverrides) -> Result<()> {
    let locations = resolve_locations(overrides).context("failed to resolve asset locations")?;
    let gallery = Gallery::new(build_catalog(&locations));
    let source = prompt_source_for(&locations.prompt_base);
    pf_tui::run(gallery, source, locations.sweep_delay)
}

fn init_config(overrides: LocationOverrides, sweep_delay_ms: Option<u64>) -> Result<()> {
    let mut config = load_config().context("failed to read configuration")?;
    if overrides.image_base.is_some() {
        config.image_base = overrides.image_base;
    }
    if overrides.prompt_base.is_some() {
        config.prompt_base = overrides.prompt_base;
    }
    if sweep_delay_ms.is_some() {
        config.sweep_delay_ms = sweep_delay_ms;
    }
    let path = save_config(&config).context("failed to write configuration")?;
    println!("Configuration written to {}", path.display());
    Ok(())
}

fn list_entries(
    catalog: &Catalog,
    filter: CategoryFilter,
    key: SortKey,
    direction: SortDirection,
    yaml: bool,
) -> Result<()> {
    let view = derive_view(catalog.entries(), filter, key, direction);
    if yaml {
        let rendered = serde_yaml::to_string(&view).context("failed to render entries")?;
        print!("{rendered}");
        return Ok(());
    }
    for entry in view {
        println!("{}", format_row(entry));
    }
    Ok(())
}

fn show_entry(
    runtime: &tokio::runtime::Runtime,
    catalog: Catalog,
    loader: &PromptLoader,
    id: &str,
) -> Result<()> {
    let id: EntryId = id.parse().context("invalid id")?;
    let mut gallery = Gallery::new(catalog);
    let request = gallery.select(id).ok_or(CoreError::UnknownEntry(id))?;
    let outcome = runtime.block_on(loader.load_for(request));
    gallery.apply_load(&outcome);

    let entry = gallery.active_entry().ok_or(CoreError::UnknownEntry(id))?;
    println!("{}", entry.title);
    println!("Category: {}", entry.category);
    println!("Model: {}", entry.model);
    println!("Created: {} {}", entry.date, entry.time);
    println!("Image: {}", entry.image_path);
    println!();
    println!("{}", gallery.viewer().prompt_text());
    Ok(())
}

fn classify_entries(
    runtime: &tokio::runtime::Runtime,
    catalog: &mut Catalog,
    loader: &PromptLoader,
) -> Result<()> {
    let updated = runtime.block_on(sweep_catalog(catalog, loader));
    for entry in catalog.entries() {
        println!("{}\t{}", entry.id, entry.category);
    }
    tracing::info!(updated, "classification complete");
    Ok(())
}

fn format_row(entry: &PortfolioEntry) -> String {
    format!(
        "{}\t{}\t{}\t{} {}\t{}",
        entry.id, entry.title, entry.category, entry.date, entry.time, entry.model
    )
}
