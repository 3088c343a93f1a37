//! Doc Tree CLI
//!
//! Builds documentation trees from section files and explores them by address.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use doc_tree_index::{
    builder::{BuildOptions, TreeBuilder},
    config::Config,
    navigator::{Navigator, SectionEntry},
    path::PathAddress,
    persistence::{artifacts_exist, save_artifacts, DocsContext, DOCS_TREE_FILENAME},
    relay::Relay,
    search::{SearchHit, SearchIndex},
};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Doc Tree - hierarchical documentation trees for agent navigation
#[derive(Parser)]
#[command(name = "doc-tree")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the artifact pair from a directory of markdown section files
    Build {
        /// Directory holding the section files
        input: PathBuf,

        /// Project name used as the root page title
        #[arg(short, long)]
        project: String,

        /// Documentation source label
        #[arg(short, long, default_value = "deepwiki")]
        source: String,

        /// Output directory (defaults to <data_dir>/<project>/<source>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Outline file assigning indices (defaults to module_tree.json in the input)
        #[arg(long)]
        outline: Option<PathBuf>,

        /// Fail on index collisions instead of keeping the first file
        #[arg(long)]
        strict: bool,
    },

    /// Display the page hierarchy
    Show {
        /// Artifact directory or repository name under the data directory
        docs: String,

        /// Print the skeleton as JSON instead of a formatted tree
        #[arg(long)]
        json: bool,

        /// Only show the subtree of the page with this title (case-insensitive)
        #[arg(short, long)]
        title: Option<String>,
    },

    /// List the subpages and content keys at an address
    List {
        /// Artifact directory or repository name under the data directory
        docs: String,

        /// Address as a JSON array, e.g. '["subpages",0]'
        #[arg(default_value = "[]")]
        address: PathAddress,
    },

    /// Fetch depth-limited content at one or more addresses
    Get {
        /// Artifact directory or repository name under the data directory
        docs: String,

        /// Addresses as JSON arrays
        #[arg(required = true)]
        addresses: Vec<PathAddress>,

        /// Levels returned below each address (defaults to config)
        #[arg(short, long)]
        depth: Option<usize>,
    },

    /// Search titles, descriptions and text
    Search {
        /// Artifact directory or repository name under the data directory
        docs: String,

        /// The search query
        query: String,

        /// Skip page titles
        #[arg(long)]
        no_titles: bool,

        /// Skip page descriptions
        #[arg(long)]
        no_descriptions: bool,

        /// Maximum number of hits to print
        #[arg(short = 'k', long, default_value_t = 20)]
        limit: usize,
    },

    /// Show information about a documentation source
    Info {
        /// Artifact directory or repository name under the data directory
        docs: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    match cli.command {
        Commands::Build {
            input,
            project,
            source,
            output,
            outline,
            strict,
        } => cmd_build(&config, input, project, source, output, outline, strict),
        Commands::Show { docs, json, title } => cmd_show(&config, &docs, json, title.as_deref()),
        Commands::List { docs, address } => cmd_list(&config, &docs, &address),
        Commands::Get {
            docs,
            addresses,
            depth,
        } => cmd_get(&config, &docs, &addresses, depth),
        Commands::Search {
            docs,
            query,
            no_titles,
            no_descriptions,
            limit,
        } => cmd_search(&config, &docs, &query, !no_titles, !no_descriptions, limit),
        Commands::Info { docs } => cmd_info(&config, &docs),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Open an artifact directory, or detect a source for a repository name.
fn open_docs(config: &Config, target: &str) -> Result<DocsContext> {
    let path = Path::new(target);
    if artifacts_exist(path) {
        return DocsContext::load(path)
            .with_context(|| format!("Failed to load artifacts from '{}'", path.display()));
    }

    DocsContext::load_repo(&config.project.data_dir, target).with_context(|| {
        format!(
            "No artifacts at '{}' and no source for repository '{}' under '{}'",
            path.display(),
            target,
            config.project.data_dir.display()
        )
    })
}

fn cmd_build(
    config: &Config,
    input: PathBuf,
    project: String,
    source: String,
    output: Option<PathBuf>,
    outline: Option<PathBuf>,
    strict: bool,
) -> Result<()> {
    let output = output.unwrap_or_else(|| config.project.data_dir.join(&project).join(&source));

    println!("Building documentation tree: {}", input.display());
    let start = Instant::now();

    let options = BuildOptions {
        source,
        outline_path: outline,
        strict_collisions: strict,
        ..BuildOptions::new(project)
    };
    let result = TreeBuilder::with_options(options)
        .build_dir(&input)
        .context("Failed to build documentation tree")?;

    let build_duration = start.elapsed();

    println!("\nDocumentation Tree Built:");
    println!("  Files:       {}", result.report.files_seen);
    println!("  Sections:    {}", result.report.sections_built);
    println!("  Pages:       {}", result.docs.page_count());
    println!("  Max depth:   {}", result.docs.max_depth());
    println!("  Build time:  {:.2?}", build_duration);

    if result.report.has_warnings() {
        println!("\nWarnings:");
        for skipped in &result.report.skipped {
            println!("  skipped {}: {}", skipped.path.display(), skipped.reason);
        }
        for collision in &result.report.collisions {
            println!(
                "  index {} collision: kept {}, dropped {}",
                collision.index,
                collision.kept.display(),
                collision.dropped.display()
            );
        }
    }

    save_artifacts(&output, &result.docs, &result.tree).context("Failed to save artifacts")?;
    println!("\nArtifacts saved to: {}", output.display());

    Ok(())
}

fn cmd_show(config: &Config, target: &str, json: bool, title: Option<&str>) -> Result<()> {
    let docs = open_docs(config, target)?;

    if let Some(title) = title {
        let Some(page) = docs.docs().find_by_title(title) else {
            anyhow::bail!("No page titled '{}' in '{}'", title, target);
        };
        if json {
            let json_str =
                serde_json::to_string_pretty(page).context("Failed to serialize page")?;
            println!("{}", json_str);
        } else {
            print!("{}", page.format_tree(0));
        }
        return Ok(());
    }

    if json {
        let json_str = docs.skeleton().to_json().context("Failed to serialize skeleton")?;
        println!("{}", json_str);
    } else {
        println!("{}", docs.docs().format());
    }

    Ok(())
}

fn cmd_list(config: &Config, target: &str, address: &PathAddress) -> Result<()> {
    let docs = open_docs(config, target)?;
    let sections = Navigator::new(&docs).list_sections(address)?;

    if sections.is_empty() {
        println!("Nothing to list at {}", address);
        return Ok(());
    }

    for entry in &sections {
        match entry {
            SectionEntry::Subpage {
                title,
                has_content,
                has_subpages,
                path,
                ..
            } => {
                let mut flags = Vec::new();
                if *has_content {
                    flags.push("content");
                }
                if *has_subpages {
                    flags.push("subpages");
                }
                println!("  {:<40} {} [{}]", title, path, flags.join(", "));
            }
            SectionEntry::ContentSection {
                key,
                value_kind,
                path,
                ..
            } => {
                println!("  {:<40} {} ({})", key, path, value_kind.as_str());
            }
        }
    }

    Ok(())
}

fn cmd_get(
    config: &Config,
    target: &str,
    addresses: &[PathAddress],
    depth: Option<usize>,
) -> Result<()> {
    let docs = open_docs(config, target)?;
    let navigator =
        Navigator::new(&docs).with_depth_limit(depth.unwrap_or(config.navigator.depth_limit));
    let relay = Relay::new(config.navigator.max_tokens_per_response);

    let results = navigator.resolve_many(addresses);
    print!("{}", relay.format_resolved(&results));

    Ok(())
}

fn cmd_search(
    config: &Config,
    target: &str,
    query: &str,
    in_titles: bool,
    in_descriptions: bool,
    limit: usize,
) -> Result<()> {
    let docs = open_docs(config, target)?;
    let index = SearchIndex::new(&docs).with_excerpt_chars(config.search.excerpt_chars);

    let start = Instant::now();
    let hits: Vec<SearchHit> = index
        .search(query, in_titles, in_descriptions)
        .take(limit)
        .collect();
    let search_duration = start.elapsed();

    if hits.is_empty() {
        println!("No matches for \"{}\".", query);
        return Ok(());
    }

    let relay = Relay::new(config.navigator.max_tokens_per_response);
    print!("{}", relay.format_hits(&hits));
    println!("Found {} matches in {:.2?}", hits.len(), search_duration);

    Ok(())
}

fn cmd_info(config: &Config, target: &str) -> Result<()> {
    let docs = open_docs(config, target)?;
    let tree = docs.docs();

    println!("Documentation Information");
    println!("{}", "─".repeat(40));
    println!("  Project:      {}", tree.root.display_title());
    if let Some(source) = tree.root.metadata.get("source").and_then(|v| v.as_str()) {
        println!("  Source:       {}", source);
    }
    println!("  Pages:        {}", tree.page_count());
    println!("  Sections:     {}", tree.flatten_indices().len());
    println!("  Max depth:    {}", tree.max_depth());

    if let Some(dir) = docs.dir() {
        let size = std::fs::metadata(dir.join(DOCS_TREE_FILENAME))
            .map(|m| m.len())
            .unwrap_or(0);
        println!("  Skeleton:     {:.1} KB", size as f64 / 1024.0);
        println!("  Path:         {}", dir.display());
    }

    if let Some(desc) = &tree.root.description {
        println!("  Description:  {}", desc);
    }

    Ok(())
}
