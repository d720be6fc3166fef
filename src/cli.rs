// 🖥️ Command-line front end
// Plays the caller role: collects batches, answers resolver prompts, saves.

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::info;

use namedb::{
    interchange, Config, DatabaseError, DuplicateGroups, DuplicateKind, MergeOutcome, NameDatabase, NewEntry,
    ProductInfo, Rebaser, Record, RecordEdit, Resolution, ResolutionPolicy, Resolver,
};

// ============================================================================
// ARGUMENTS
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "namedb")]
#[command(about = "Symbol name database for disassembly annotations")]
#[command(version)]
pub struct Args {
    /// JSON config file (reference base, product strings, status catalog)
    #[arg(short, long, global = true, env = "NAMEDB_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DuplicatePolicy {
    /// Ask for each collision on the terminal
    Ask,
    Incoming,
    Existing,
    Both,
    Abort,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FileFormat {
    Csv,
    Json,
}

impl From<FileFormat> for interchange::Format {
    fn from(format: FileFormat) -> Self {
        match format {
            FileFormat::Csv => interchange::Format::Csv,
            FileFormat::Json => interchange::Format::Json,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an empty database
    New {
        db: PathBuf,
        #[arg(long)]
        client_version: String,
    },

    /// Show client version, record count, categories and statuses
    Info { db: PathBuf },

    /// List records
    List {
        db: PathBuf,
        #[arg(long)]
        category: Option<String>,
    },

    /// Add a name entered against a binary loaded at --base
    Add {
        db: PathBuf,
        /// Absolute address in the running binary
        #[arg(long)]
        address: String,
        /// Load base of the binary (asks to use the default when missing)
        #[arg(long)]
        base: Option<String>,
        /// Use the default base without asking
        #[arg(long)]
        use_default_base: bool,
        #[arg(long, default_value = "")]
        category: String,
        #[arg(long)]
        name: String,
        /// Status code or label
        #[arg(long, default_value = "0")]
        status: String,
        #[arg(long, default_value = "")]
        comment: String,
        #[arg(long, value_enum, default_value_t = DuplicatePolicy::Ask)]
        on_duplicate: DuplicatePolicy,
    },

    /// Add or update a category header comment
    Header {
        db: PathBuf,
        #[arg(long)]
        category: String,
        #[arg(long, default_value = "")]
        comment: String,
    },

    /// Merge records from a CSV or JSON file
    Import {
        db: PathBuf,
        file: PathBuf,
        #[arg(long, value_enum)]
        format: Option<FileFormat>,
        /// Report exact matches as duplicates instead of updating them
        #[arg(long)]
        no_update: bool,
        #[arg(long, value_enum, default_value_t = DuplicatePolicy::Ask)]
        on_duplicate: DuplicatePolicy,
    },

    /// Edit the record at INDEX (as shown by `list`)
    Edit {
        db: PathBuf,
        index: usize,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        comment: Option<String>,
        /// New absolute address, rebased against --base
        #[arg(long, requires = "base")]
        address: Option<String>,
        #[arg(long)]
        base: Option<String>,
    },

    /// Delete the record at INDEX
    Delete { db: PathBuf, index: usize },

    /// Print the record at INDEX as copyable text
    Copy { db: PathBuf, index: usize },

    /// Export the sorted records
    Export {
        db: PathBuf,
        out: PathBuf,
        #[arg(long, value_enum)]
        format: Option<FileFormat>,
    },
}

// ============================================================================
// TERMINAL RESOLVER
// ============================================================================

/// Asks about each collision: keep incoming, existing, both, or cancel everything
pub struct PromptResolver<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptResolver<R, W> {
    pub fn new(input: R, output: W) -> Self {
        PromptResolver { input, output }
    }

    fn ask(&mut self, kind: DuplicateKind, incoming: &Record, existing: &Record) -> io::Result<Option<char>> {
        loop {
            writeln!(self.output, "⚠️  {} duplicate", kind.as_str())?;
            writeln!(self.output, "   existing: {}", describe(existing))?;
            writeln!(self.output, "   incoming: {}", describe(incoming))?;
            write!(self.output, "   keep [i]ncoming, [e]xisting, [b]oth or [c]ancel import? ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line)? == 0 {
                return Ok(None);
            }

            match line.trim().to_ascii_lowercase().chars().next() {
                Some(c @ ('i' | 'e' | 'b' | 'c')) => return Ok(Some(c)),
                _ => writeln!(self.output, "   please answer i, e, b or c")?,
            }
        }
    }
}

impl<R: BufRead, W: Write> Resolver for PromptResolver<R, W> {
    fn resolve(&mut self, groups: &DuplicateGroups) -> Resolution {
        fn keep(record: &Record, approved: &mut Vec<Record>) {
            if !approved.contains(record) {
                approved.push(record.clone());
            }
        }

        let mut approved: Vec<Record> = Vec::new();

        for (kind, pair) in groups.pairs() {
            match self.ask(kind, &pair.incoming, &pair.existing) {
                Ok(Some('i')) => keep(&pair.incoming, &mut approved),
                Ok(Some('e')) => keep(&pair.existing, &mut approved),
                Ok(Some('b')) => {
                    keep(&pair.existing, &mut approved);
                    keep(&pair.incoming, &mut approved);
                }
                _ => return Resolution::Cancelled,
            }
        }

        Resolution::Approved(approved)
    }
}

fn describe(record: &Record) -> String {
    format!(
        "[{}] {} {} (status {}){}",
        record.category,
        record.address,
        record.name,
        record.status,
        if record.comment.is_empty() {
            String::new()
        } else {
            format!(" // {}", record.comment)
        }
    )
}

fn resolver_for(policy: DuplicatePolicy) -> Box<dyn Resolver> {
    match policy {
        DuplicatePolicy::Ask => Box::new(PromptResolver::new(io::stdin().lock(), io::stdout())),
        DuplicatePolicy::Incoming => Box::new(ResolutionPolicy::KeepIncoming),
        DuplicatePolicy::Existing => Box::new(ResolutionPolicy::KeepExisting),
        DuplicatePolicy::Both => Box::new(ResolutionPolicy::KeepBoth),
        DuplicatePolicy::Abort => Box::new(ResolutionPolicy::Abort),
    }
}

/// y/N question on the terminal
fn confirm(question: &str) -> bool {
    print!("{} [y/N] ", question);
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(_) => matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}

// ============================================================================
// COMMANDS
// ============================================================================

pub fn run(args: Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    let product = ProductInfo::from_config(&config);

    match args.command {
        Command::New { db, client_version } => {
            let database = NameDatabase::create(&db, &client_version, &product)
                .with_context(|| format!("Failed to create database {}", db.display()))?;
            println!("✓ Created {} (client version {})", db.display(), database.client_version());
        }

        Command::Info { db } => {
            let database = open(&db)?;
            println!("📂 {}", db.display());
            println!("   Client version: {}", database.client_version());
            println!("   Records:        {}", database.len());
            println!("   Categories:     {}", database.categories().join(", "));
            println!("   Statuses:       {}", config.status_choices().join(", "));
        }

        Command::List { db, category } => {
            let database = open(&db)?;
            for (index, record) in database.records().iter().enumerate() {
                if category.as_deref().is_some_and(|c| c != record.category) {
                    continue;
                }
                let status = config.status_label(record.status).unwrap_or("?");
                println!(
                    "{:>5}  {:<16} {:<12} {:<32} {:<12} {}",
                    index, record.category, record.address, record.name, status, record.comment
                );
            }
        }

        Command::Add {
            db,
            address,
            base,
            use_default_base,
            category,
            name,
            status,
            comment,
            on_duplicate,
        } => {
            let mut database = open(&db)?;
            let base = Rebaser::resolve_base(base.as_deref(), &config.default_base, |default| {
                use_default_base
                    || confirm(&format!(
                        "No Base Address specified. Do you want to use the default address {}?",
                        default
                    ))
            })?;

            let entry = NewEntry {
                category,
                address,
                name,
                status: parse_status(&config, &status)?,
                comment,
            };

            let mut resolver = resolver_for(on_duplicate);
            let outcome = merged(database.submit(entry, &base, &config, resolver.as_mut()))?;
            report(&outcome);
            save(&database, &db, &product)?;
        }

        Command::Header { db, category, comment } => {
            let mut database = open(&db)?;
            let outcome = merged(database.add_header(&category, &comment, &config, &mut ResolutionPolicy::Abort))?;
            report(&outcome);
            save(&database, &db, &product)?;
        }

        Command::Import {
            db,
            file,
            format,
            no_update,
            on_duplicate,
        } => {
            let mut database = open(&db)?;
            let format = format
                .map(interchange::Format::from)
                .unwrap_or_else(|| interchange::Format::from_path(&file));
            let batch = interchange::import_file(&file, format, &config)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            info!("Read {} candidate records from {}", batch.len(), file.display());

            let mut resolver = resolver_for(on_duplicate);
            let outcome = merged(database.import(batch, !no_update, &config, resolver.as_mut()))?;
            report(&outcome);
            save(&database, &db, &product)?;
        }

        Command::Edit {
            db,
            index,
            category,
            name,
            status,
            comment,
            address,
            base,
        } => {
            let mut database = open(&db)?;
            let status = status.map(|s| parse_status(&config, &s)).transpose()?;

            // Address first: edit() re-sorts, which would move `index`
            let mut index = index;
            if let (Some(address), Some(base)) = (address, base) {
                let rebaser = config.rebaser()?;
                let moved = database.set_address(index, &base, &address, &rebaser)?.clone();
                index = database
                    .records()
                    .iter()
                    .position(|r| *r == moved)
                    .ok_or_else(|| anyhow!("Edited record vanished"))?;
            }

            let edit = RecordEdit {
                category,
                name,
                status,
                comment,
            };
            let record = database.edit(index, edit, &config)?.clone();
            println!("{}", record.copy_text());
            save(&database, &db, &product)?;
        }

        Command::Delete { db, index } => {
            let mut database = open(&db)?;
            let removed = database.delete(index)?;
            println!("🗑️  Deleted {} {}", removed.address, removed.name);
            save(&database, &db, &product)?;
        }

        Command::Copy { db, index } => {
            let database = open(&db)?;
            let record = database.get(index).ok_or(DatabaseError::IndexOutOfRange {
                index,
                len: database.len(),
            })?;
            println!("{}", record.copy_text());
        }

        Command::Export { db, out, format } => {
            let database = open(&db)?;
            if database.is_empty() {
                bail!("There are no names in the database to export");
            }

            let format = format
                .map(interchange::Format::from)
                .unwrap_or_else(|| interchange::Format::from_path(&out));
            interchange::export_file(&out, format, database.records())
                .with_context(|| format!("Failed to export to {}", out.display()))?;
            println!("✓ Exported {} names to {}", database.len(), out.display());
        }
    }

    Ok(())
}

fn open(path: &Path) -> Result<NameDatabase> {
    NameDatabase::load(path).with_context(|| format!("Failed to load database {}", path.display()))
}

fn save(database: &NameDatabase, path: &Path, product: &ProductInfo) -> Result<()> {
    database
        .save(path, product)
        .with_context(|| format!("Failed to save database {}", path.display()))?;
    println!("💾 Database saved to [{}]", path.display());
    Ok(())
}

fn parse_status(config: &Config, value: &str) -> Result<i32> {
    config
        .parse_status(value)
        .ok_or_else(|| anyhow!("Unknown status {:?} (expected one of: {})", value, config.status_choices().join(", ")))
}

/// Turn a cancelled merge into a user-facing abort message
fn merged(result: std::result::Result<MergeOutcome, DatabaseError>) -> Result<MergeOutcome> {
    result.map_err(|e| match e {
        DatabaseError::Merge(cancelled) => {
            anyhow!("{}. The database file was not modified.", cancelled)
        }
        other => other.into(),
    })
}

fn report(outcome: &MergeOutcome) {
    println!(
        "✓ {} added, {} updated, {} replaced ({} address / {} name duplicates)",
        outcome.added,
        outcome.updated,
        outcome.removed,
        outcome.address_duplicates(),
        outcome.name_duplicates()
    );
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn groups() -> DuplicateGroups {
        let mut groups = DuplicateGroups::new();
        groups.push(
            DuplicateKind::Address,
            Record::new("UI", "0x10", "Bar", 0, ""),
            Record::new("UI", "0x10", "Foo", 0, ""),
        );
        groups.push(
            DuplicateKind::Name,
            Record::new("UI", "0x40", "Foo", 0, ""),
            Record::new("UI", "0x10", "Foo", 0, ""),
        );
        groups
    }

    #[test]
    fn test_prompt_resolver_choices() {
        let mut output = Vec::new();
        let mut resolver = PromptResolver::new(Cursor::new("x\ni\nb\n"), &mut output);

        let resolution = resolver.resolve(&groups());

        assert_eq!(
            resolution,
            Resolution::Approved(vec![
                Record::new("UI", "0x10", "Bar", 0, ""),
                Record::new("UI", "0x10", "Foo", 0, ""),
                Record::new("UI", "0x40", "Foo", 0, ""),
            ])
        );
        let shown = String::from_utf8(output).unwrap();
        assert!(shown.contains("Address duplicate"));
        assert!(shown.contains("please answer"));
    }

    #[test]
    fn test_prompt_resolver_cancel_and_eof() {
        let mut resolver = PromptResolver::new(Cursor::new("e\nc\n"), Vec::new());
        assert_eq!(resolver.resolve(&groups()), Resolution::Cancelled);

        let mut resolver = PromptResolver::new(Cursor::new(""), Vec::new());
        assert_eq!(resolver.resolve(&groups()), Resolution::Cancelled);
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "namedb", "add", "names.json", "--address", "0x10001000", "--base", "0x10000000", "--name", "Foo",
            "--on-duplicate", "both",
        ])
        .unwrap();

        match args.command {
            Command::Add { on_duplicate, status, .. } => {
                assert_eq!(on_duplicate, DuplicatePolicy::Both);
                assert_eq!(status, "0");
            }
            other => panic!("parsed wrong command: {other:?}"),
        }
    }
}
