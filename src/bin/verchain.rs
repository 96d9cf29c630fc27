//! # Verchain CLI - Versioning shell
//!
//! Drives a [`VersionManager`] from a script or from stdin. Version records
//! live in memory, so one process runs a whole session: every line is one
//! command against the same manager.
//!
//! ## Usage
//! ```bash
//! # Interactive session with content stored under ./.versions
//! verchain --storage .versions
//!
//! # Run a script, printing JSON
//! verchain --script session.txt --json
//! ```
//!
//! ## Commands
//! ```text
//! create doc-A ./report.txt -m "First draft" --by alice --tag draft
//! history doc-A
//! restore doc-A 1 ./report.txt --backup
//! compare doc-A 1 3
//! search --name report --sort version --order asc
//! stats
//! delete doc-A 2
//! verify doc-A 3
//! events --type restore
//! ```

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use humantime::format_duration;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use verchain::{
    format_bytes, CreateVersionOptions, EventQuery, EventType, FileVersion, MetadataValue,
    RestoreOptions, Result, SearchQuery, SortField, SortOrder, VersionError, VersionManager,
    VersioningConfig,
};

/// Verchain CLI - per-file version history shell
#[derive(Parser)]
#[command(name = "verchain")]
#[command(version)]
#[command(about = "Versioning shell: create, restore, compare and audit file versions")]
#[command(long_about = None)]
struct Cli {
    /// Storage directory for version content (defaults to .versions)
    #[arg(short, long)]
    storage: Option<PathBuf>,

    /// Versions kept per file before pruning
    #[arg(long)]
    max_versions: Option<usize>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read commands from a file instead of stdin
    #[arg(long)]
    script: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

/// One shell line
#[derive(Parser)]
#[command(multicall = true)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a version from a file on disk
    #[command(alias = "cv")]
    Create {
        /// Logical file id
        file_id: String,

        /// Path to the current content
        path: PathBuf,

        /// Comment
        #[arg(short, long)]
        message: Option<String>,

        /// Author
        #[arg(long)]
        by: Option<String>,

        /// Tag (repeatable)
        #[arg(short, long)]
        tag: Vec<String>,

        /// Metadata entry as key=value (repeatable)
        #[arg(long, value_parser = parse_key_value)]
        meta: Vec<(String, String)>,

        /// Record a version even if the content already exists
        #[arg(long)]
        force: bool,

        /// Override the file name
        #[arg(long)]
        name: Option<String>,
    },

    /// Show the version history of a file
    #[command(alias = "log")]
    History {
        /// Logical file id
        file_id: String,
    },

    /// Show one version
    Get {
        /// Logical file id
        file_id: String,

        /// Version number
        version: u32,
    },

    /// Restore a version to a path
    #[command(alias = "rs")]
    Restore {
        /// Logical file id
        file_id: String,

        /// Version number or version id prefix
        version: String,

        /// Where to write the restored content
        path: PathBuf,

        /// Save the active content as a backup version first
        #[arg(long)]
        backup: bool,

        /// Who performs the restore
        #[arg(long)]
        by: Option<String>,

        /// Comment for the restored version
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Compare two versions
    #[command(alias = "diff")]
    Compare {
        /// Logical file id
        file_id: String,

        /// First version number
        from: u32,

        /// Second version number
        to: u32,
    },

    /// Search versions across all files
    Search {
        /// Exact file id
        #[arg(long)]
        file_id: Option<String>,

        /// Substring of the file name
        #[arg(long)]
        name: Option<String>,

        /// Exact version number
        #[arg(long)]
        version: Option<u32>,

        /// Exact author
        #[arg(long)]
        by: Option<String>,

        /// Created at or after (RFC 3339)
        #[arg(long, value_parser = parse_time)]
        from: Option<DateTime<Utc>>,

        /// Created at or before (RFC 3339)
        #[arg(long, value_parser = parse_time)]
        to: Option<DateTime<Utc>>,

        /// Any of these tags (repeatable)
        #[arg(short, long)]
        tag: Vec<String>,

        /// Sort field
        #[arg(long, value_enum, default_value = "created-at")]
        sort: SortArg,

        /// Sort order
        #[arg(long, value_enum, default_value = "desc")]
        order: OrderArg,

        /// Results to skip
        #[arg(long, default_value = "0")]
        offset: usize,

        /// Page size
        #[arg(short, long, default_value = "50")]
        limit: usize,
    },

    /// Show store statistics
    Stats,

    /// Delete an inactive version
    #[command(alias = "rm")]
    Delete {
        /// Logical file id
        file_id: String,

        /// Version number or version id prefix
        version: String,
    },

    /// Re-hash a version's stored content
    Verify {
        /// Logical file id
        file_id: String,

        /// Version number
        version: u32,
    },

    /// Show the audit log
    Events {
        /// Only events for this file
        #[arg(long)]
        file_id: Option<String>,

        /// Only events of this type
        #[arg(long = "type", value_enum)]
        event_type: Option<EventArg>,

        /// Only the most recent N events
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// List file ids
    Files,

    /// End the session
    #[command(alias = "exit")]
    Quit,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum SortArg {
    Version,
    Size,
    CreatedAt,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OrderArg {
    Asc,
    Desc,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum EventArg {
    Create,
    Restore,
    Delete,
}

impl From<SortArg> for SortField {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Version => SortField::Version,
            SortArg::Size => SortField::Size,
            SortArg::CreatedAt => SortField::CreatedAt,
        }
    }
}

impl From<OrderArg> for SortOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Asc => SortOrder::Asc,
            OrderArg::Desc => SortOrder::Desc,
        }
    }
}

impl From<EventArg> for EventType {
    fn from(arg: EventArg) -> Self {
        match arg {
            EventArg::Create => EventType::Create,
            EventArg::Restore => EventType::Restore,
            EventArg::Delete => EventType::Delete,
        }
    }
}

fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .filter(|(k, _)| !k.is_empty())
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

fn parse_time(raw: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| format!("invalid RFC 3339 timestamp '{}': {}", raw, e))
}

fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so stdout stays parseable
    let filter = if cli.verbose {
        EnvFilter::new("verchain=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if std::env::var("NO_COLOR").is_ok() || cli.json {
        colored::control::set_override(false);
    }

    match run(cli) {
        Ok(0) => {}
        Ok(_) => std::process::exit(1),
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            std::process::exit(2);
        }
    }
}

/// Run the session; returns the number of failed commands
fn run(cli: Cli) -> anyhow::Result<usize> {
    let mut config = match &cli.config {
        Some(path) => VersioningConfig::from_json_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => VersioningConfig::default(),
    };
    if let Some(storage) = cli.storage {
        config.storage_root = storage;
    }
    if let Some(max) = cli.max_versions {
        config.max_versions_per_file = max;
    }

    let manager = VersionManager::new(config).context("starting version manager")?;

    let input: Box<dyn BufRead> = match &cli.script {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("opening script {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut shell = Shell {
        manager,
        json: cli.json,
        failures: 0,
    };

    for line in input.lines() {
        let line = line.context("reading command")?;
        if !shell.execute(&line) {
            break;
        }
    }
    io::stdout().flush().ok();

    Ok(shell.failures)
}

struct Shell {
    manager: VersionManager,
    json: bool,
    failures: usize,
}

impl Shell {
    /// Execute one line; returns false when the session should end
    fn execute(&mut self, line: &str) -> bool {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return true;
        }

        let Some(tokens) = shlex::split(trimmed) else {
            self.fail("unterminated quote or trailing escape");
            return true;
        };

        let parsed = match Line::try_parse_from(tokens) {
            Ok(parsed) => parsed,
            Err(e) => {
                use clap::error::ErrorKind;
                if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                    print!("{}", e);
                } else {
                    eprint!("{}", e);
                    self.failures += 1;
                }
                return true;
            }
        };

        if matches!(parsed.command, Command::Quit) {
            return false;
        }

        if let Err(e) = self.dispatch(parsed.command) {
            self.fail(&e.user_message());
        }
        true
    }

    fn fail(&mut self, msg: &str) {
        eprintln!("{}: {}", "Error".red().bold(), msg);
        self.failures += 1;
    }

    fn dispatch(&self, command: Command) -> Result<()> {
        match command {
            Command::Create {
                file_id,
                path,
                message,
                by,
                tag,
                meta,
                force,
                name,
            } => {
                let mut options = CreateVersionOptions {
                    comment: message,
                    created_by: by,
                    preserve_original: force,
                    file_name: name,
                    ..Default::default()
                };
                for t in tag {
                    options = options.with_tag(t);
                }
                for (k, v) in meta {
                    options = options.with_metadata(k, parse_meta_value(&v));
                }
                let before = self.manager.get_version_history(&file_id).ok();
                let version = self.manager.create_version(&file_id, &path, options)?;
                let reused = before
                    .map(|h| h.versions.iter().any(|v| v.id == version.id))
                    .unwrap_or(false);
                self.cmd_create(&version, reused)
            }
            Command::History { file_id } => self.cmd_history(&file_id),
            Command::Get { file_id, version } => {
                let version = self.manager.get_version(&file_id, version)?;
                if self.json {
                    return self.print_json(&version);
                }
                print_version(&version, true);
                Ok(())
            }
            Command::Restore {
                file_id,
                version,
                path,
                backup,
                by,
                message,
            } => {
                let target = self.resolve(&file_id, &version)?;
                let options = RestoreOptions {
                    target_version_id: target.id.clone(),
                    create_backup: backup,
                    restored_by: by,
                    comment: message,
                };
                let restored = self.manager.restore_version(&file_id, &path, options)?;
                if self.json {
                    return self.print_json(&restored);
                }
                println!(
                    "{} Restored version {} of {} as version {}",
                    "✓".green().bold(),
                    target.version.to_string().yellow(),
                    file_id.cyan(),
                    restored.version.to_string().yellow().bold()
                );
                println!("  Written to: {}", path.display().to_string().cyan());
                Ok(())
            }
            Command::Compare { file_id, from, to } => self.cmd_compare(&file_id, from, to),
            Command::Search {
                file_id,
                name,
                version,
                by,
                from,
                to,
                tag,
                sort,
                order,
                offset,
                limit,
            } => {
                let query = SearchQuery {
                    file_id,
                    file_name: name,
                    version,
                    created_by: by,
                    date_from: from,
                    date_to: to,
                    tags: tag,
                    sort_by: sort.into(),
                    sort_order: order.into(),
                    offset,
                    limit,
                };
                self.cmd_search(&query)
            }
            Command::Stats => self.cmd_stats(),
            Command::Delete { file_id, version } => {
                let target = self.resolve(&file_id, &version)?;
                let removed = self.manager.delete_version(&file_id, &target.id)?;
                if self.json {
                    return self.print_json(&removed);
                }
                println!(
                    "{} Deleted version {} of {}",
                    "✓".green().bold(),
                    removed.version.to_string().yellow(),
                    file_id.cyan()
                );
                Ok(())
            }
            Command::Verify { file_id, version } => {
                let report = self.manager.verify_version(&file_id, version)?;
                if self.json {
                    return self.print_json(&report);
                }
                if report.is_valid() {
                    println!(
                        "{} Version {} of {} is intact",
                        "✓".green().bold(),
                        version,
                        file_id.cyan()
                    );
                } else {
                    println!(
                        "{} Version {} of {} is corrupted",
                        "✗".red().bold(),
                        version,
                        file_id.cyan()
                    );
                    println!("  Expected: {}", report.expected_checksum.dimmed());
                    println!("  Actual:   {}", report.actual_checksum.red());
                    if !report.size_matches {
                        println!("  Size does not match the record");
                    }
                }
                Ok(())
            }
            Command::Events {
                file_id,
                event_type,
                limit,
            } => {
                let query = EventQuery {
                    file_id,
                    event_type: event_type.map(Into::into),
                    limit,
                };
                let events = self.manager.events(&query);
                if self.json {
                    return self.print_json(&events);
                }
                if events.is_empty() {
                    println!("{}", "No events.".yellow());
                }
                for event in &events {
                    let version = event
                        .version_id
                        .as_deref()
                        .map(short)
                        .unwrap_or("-");
                    print!(
                        "{} {:<8} {} {}",
                        event.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
                        event.event_type.to_string().blue(),
                        event.file_id.cyan(),
                        version.yellow()
                    );
                    if let Some(user) = &event.user_id {
                        print!(" by {}", user);
                    }
                    println!();
                }
                Ok(())
            }
            Command::Files => {
                let ids = self.manager.file_ids();
                if self.json {
                    return self.print_json(&ids);
                }
                for id in ids {
                    println!("{}", id);
                }
                Ok(())
            }
            Command::Quit => Ok(()),
        }
    }

    fn cmd_create(&self, version: &FileVersion, reused: bool) -> Result<()> {
        if self.json {
            return self.print_json(version);
        }
        if reused {
            println!(
                "{} Content unchanged, version {} of {} reused",
                "=".yellow().bold(),
                version.version.to_string().yellow(),
                version.file_id.cyan()
            );
            return Ok(());
        }
        println!(
            "{} Created version {} of {} {}",
            "✓".green().bold(),
            version.version.to_string().yellow().bold(),
            version.file_id.cyan(),
            version.short_id().dimmed()
        );
        println!("  Size: {}", format_bytes(version.size).cyan());
        println!("  Checksum: {}", version.checksum.dimmed());
        Ok(())
    }

    fn cmd_history(&self, file_id: &str) -> Result<()> {
        let history = self.manager.get_version_history(file_id)?;
        if self.json {
            return self.print_json(&history);
        }

        println!(
            "{} {} ({})",
            "History of".blue().bold(),
            history.file_id.cyan().bold(),
            history.file_name
        );
        println!(
            "  {} versions, {} total, current {}",
            history.total_versions,
            format_bytes(history.total_size),
            history.current_version.to_string().yellow()
        );
        println!();
        for version in &history.versions {
            print_version(version, false);
        }
        Ok(())
    }

    fn cmd_compare(&self, file_id: &str, from: u32, to: u32) -> Result<()> {
        let comparison = self.manager.compare_versions(file_id, from, to)?;
        if self.json {
            return self.print_json(&comparison);
        }

        println!(
            "{} {} {} → {}",
            "Comparing".blue().bold(),
            file_id.cyan(),
            from.to_string().yellow(),
            to.to_string().yellow()
        );
        if !comparison.has_changes() {
            println!("  {}", "No differences".green());
        }
        for change in &comparison.changes {
            let marker = match change.kind {
                verchain::ChangeKind::Added => "+".green().bold(),
                verchain::ChangeKind::Removed => "-".red().bold(),
                verchain::ChangeKind::Modified => "~".yellow().bold(),
            };
            println!("  {} {}", marker, change.description);
        }
        println!("  Similarity: {:.1}%", comparison.similarity * 100.0);
        Ok(())
    }

    fn cmd_search(&self, query: &SearchQuery) -> Result<()> {
        let result = self.manager.search_versions(query)?;
        if self.json {
            return self.print_json(&result);
        }

        if result.versions.is_empty() {
            println!("{}", "No versions found.".yellow());
            return Ok(());
        }
        for version in &result.versions {
            print!("{} ", version.file_id.cyan());
            print_version(version, false);
        }
        if result.has_more {
            println!(
                "\n{}",
                format!(
                    "Showing {} of {} versions",
                    result.versions.len(),
                    result.total
                )
                .dimmed()
            );
        }
        Ok(())
    }

    fn cmd_stats(&self) -> Result<()> {
        let stats = self.manager.get_version_stats();
        if self.json {
            return self.print_json(&stats);
        }

        println!("{}", "Version Statistics:".blue().bold());
        println!("  Files: {}", stats.total_files.to_string().cyan());
        println!("  Versions: {}", stats.total_versions.to_string().cyan());
        println!("  Size: {}", format_bytes(stats.total_size).cyan());
        println!(
            "  Average per file: {}",
            format!("{:.2}", stats.average_versions_per_file).cyan()
        );
        if let Some(oldest) = stats.oldest_version {
            println!("  Oldest: {}", age(oldest).dimmed());
        }
        if !stats.top_files.is_empty() {
            println!("\n{}", "Top files:".blue().bold());
            for file in &stats.top_files {
                println!(
                    "  {} {} - {} versions, {}",
                    file.file_id.cyan(),
                    file.file_name.dimmed(),
                    file.version_count,
                    format_bytes(file.total_size)
                );
            }
        }
        Ok(())
    }

    /// Resolve a version number or id prefix to a version record
    fn resolve(&self, file_id: &str, selector: &str) -> Result<FileVersion> {
        if let Ok(number) = selector.parse::<u32>() {
            return self.manager.get_version(file_id, number);
        }

        let history = self.manager.get_version_history(file_id)?;
        let mut matches = history
            .versions
            .into_iter()
            .filter(|v| v.id.starts_with(selector));
        match (matches.next(), matches.next()) {
            (Some(version), None) => Ok(version),
            (Some(_), Some(_)) => Err(VersionError::validation(format!(
                "version id prefix '{}' is ambiguous",
                selector
            ))),
            (None, _) => Err(VersionError::VersionNotFound {
                file_id: file_id.to_string(),
                version_id: selector.to_string(),
            }),
        }
    }

    fn print_json<T: Serialize + ?Sized>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}

fn print_version(version: &FileVersion, detailed: bool) {
    let marker = if version.is_active {
        "*".green().bold()
    } else {
        " ".normal()
    };

    print!(
        "{} v{} {} ",
        marker,
        version.version.to_string().yellow().bold(),
        version.short_id().dimmed()
    );
    print!("{:>10} ", format_bytes(version.size));
    print!("{} ", age(version.created_at).dimmed());
    if let Some(by) = &version.created_by {
        print!("{} ", by);
    }
    if !version.tags.is_empty() {
        let tags: Vec<&str> = version.tags.iter().map(String::as_str).collect();
        print!("[{}] ", tags.join(", ").magenta());
    }
    if let Some(comment) = &version.comment {
        print!("{}", comment.cyan());
    }
    println!();

    if detailed {
        println!("  Id: {}", version.id);
        println!("  File: {} ({})", version.file_name, version.mime_type);
        println!("  Stored at: {}", version.storage_path.display());
        println!("  Checksum: {}", version.checksum);
        if let Some(parent) = &version.parent_version_id {
            println!("  Parent: {}", short(parent).dimmed());
        }
        for (key, value) in &version.metadata {
            println!("  {}: {}", key, value);
        }
    }
}

/// Metadata values from the command line keep their natural type
fn parse_meta_value(raw: &str) -> MetadataValue {
    if let Ok(b) = raw.parse::<bool>() {
        MetadataValue::Bool(b)
    } else if let Ok(i) = raw.parse::<i64>() {
        MetadataValue::Integer(i)
    } else if let Ok(f) = raw.parse::<f64>() {
        MetadataValue::Float(f)
    } else {
        MetadataValue::Text(raw.to_string())
    }
}

fn age(at: DateTime<Utc>) -> String {
    let secs = (Utc::now() - at).num_seconds().max(0) as u64;
    if secs == 0 {
        return "just now".to_string();
    }
    format!("{} ago", format_duration(Duration::from_secs(secs)))
}

fn short(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}
