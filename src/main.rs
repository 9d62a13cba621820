//! Main entry point for the runrar CLI application.
//!
//! This binary provides a command-line interface for listing RAR archives and
//! extracting the raw stored bytes of their entries, from both the local
//! filesystem and remote HTTP URLs.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use runrar::{
    Catalog, Cli, Entry, HttpRangeReader, LocalFileReader, RarArchive, RarError, ReadAt,
};

/// Application entry point.
///
/// Parses command-line arguments and dispatches to the appropriate handler
/// based on whether the input is a local file or HTTP URL.
fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    if cli.is_http_url() {
        // Handle remote RAR file via HTTP Range requests
        let reader = HttpRangeReader::new(cli.file.clone())
            .with_context(|| format!("cannot open {}", cli.file))?;
        let transferred_before = reader.transferred_bytes();
        let reader = Arc::new(reader);

        process_rar(reader.clone(), &cli)?;

        // Display network transfer statistics for HTTP sources
        if !cli.is_quiet() {
            let transferred = reader.transferred_bytes() - transferred_before;
            eprintln!("\nTotal bytes transferred: {}", format_size(transferred));
        }
    } else {
        // Handle local RAR file
        let reader = LocalFileReader::new(Path::new(&cli.file))
            .with_context(|| format!("cannot open {}", cli.file))?;
        process_rar(Arc::new(reader), &cli)?;
    }

    Ok(())
}

/// Process a RAR archive based on CLI options.
///
/// This function handles listing, block dumps and extraction:
/// - Block mode (`-b`): dump the structural block layout
/// - List mode (`-l` or `-v`): display archive contents
/// - Extract mode: write the stored payload of matching entries
///
/// Entries that fail with a recoverable error are skipped with a message;
/// anything else stops the run.
///
/// # Arguments
///
/// * `reader` - A reader implementing the `ReadAt` trait for random access
/// * `cli` - Parsed command-line arguments
///
/// # Returns
///
/// Returns `Ok(())` on success, or an error if processing fails.
fn process_rar<R: ReadAt + 'static>(reader: Arc<R>, cli: &Cli) -> Result<()> {
    let archive = RarArchive::open(reader).with_context(|| cli.file.clone())?;

    if cli.blocks {
        return dump_blocks(&archive);
    }

    let catalog = archive
        .build_catalog()
        .with_context(|| format!("cannot read the catalog of {}", cli.file))?;

    // List mode: display archive contents and exit
    if cli.list || cli.verbose {
        list_files(&catalog, cli.verbose);
        return Ok(());
    }

    // Apply filters to determine which entries to extract:
    // 1. If specific files are requested, only include matching entries
    // 2. Exclude files matching the exclusion patterns
    let files_to_extract: Vec<_> = catalog
        .iter()
        .enumerate()
        .filter(|(_, e)| {
            let name = e.filename_lossy();

            // If specific files are requested via positional arguments,
            // only include entries that match
            if !cli.files.is_empty() {
                let matches = cli.files.iter().any(|f| {
                    if has_glob_chars(f) {
                        glob_match(f, &name)
                    } else {
                        // No wildcards: exact match on filename or its last component
                        name == *f || base_name(&name) == f
                    }
                });
                if !matches {
                    return false;
                }
            }

            // Exclude files matching the -x patterns
            !cli.exclude
                .iter()
                .any(|x| name.contains(x.as_str()) || glob_match(x, &name))
        })
        .collect();

    // Extract each matching entry
    let multiple_files = cli.pipe && files_to_extract.len() > 1;
    for (id, entry) in files_to_extract {
        match extract_file(&archive, &catalog, id, entry, cli, multiple_files) {
            Err(e) if is_recoverable(&e) => {
                if !cli.is_very_quiet() {
                    eprintln!("Skipping: {} ({e})", entry.filename_lossy());
                }
            }
            other => other?,
        }
    }

    Ok(())
}

/// Print the structural layout of every block.
fn dump_blocks<R: ReadAt>(archive: &RarArchive<R>) -> Result<()> {
    let blocks = archive.scan_blocks()?;

    println!(
        "{:>12}  {:<8}  {:>6}  {:>8}  {:>12}",
        "Offset", "Type", "Flags", "HeadSize", "PackedSize"
    );
    println!("{}", "-".repeat(54));
    for block in &blocks {
        println!(
            "{:>12}  {:<8}  {:#06x}  {:>8}  {:>12}",
            block.block_start,
            block.kind.name(),
            block.flags,
            block.head_size,
            block.packed_size
        );
    }
    println!("{}", "-".repeat(54));
    println!("{} blocks", blocks.len());

    Ok(())
}

/// List entries in the RAR archive.
///
/// Supports two output formats:
/// - Simple format (`-l`): Just file names, one per line
/// - Verbose format (`-v`): Table with sizes, method, timestamps and flags
///
/// # Arguments
///
/// * `catalog` - The catalog to list
/// * `verbose` - If true, show the archive traits line and the detailed table
fn list_files(catalog: &Catalog, verbose: bool) {
    if verbose {
        let flags = catalog.archive_flags();
        let mut traits = Vec::new();
        if flags.is_volume() {
            traits.push(if flags.is_first_volume() {
                "first volume"
            } else {
                "volume"
            });
        }
        if flags.is_solid() {
            traits.push("solid");
        }
        if flags.is_locked() {
            traits.push("locked");
        }
        if flags.has_new_naming() {
            traits.push("new volume naming");
        }
        if flags.has_recovery_record() {
            traits.push("recovery record");
        }
        if flags.has_encrypted_headers() {
            traits.push("encrypted headers");
        }
        if !traits.is_empty() {
            println!("Archive: {}", traits.join(", "));
        }

        // Print table header for verbose output
        println!(
            "{:>12}  {:>12}  {:>5}  {:>10}  {:>5}  {:<6}  {:<5}  Name",
            "Length", "Packed", "Lvl", "Date", "Time", "OS", "Flags"
        );
        println!("{}", "-".repeat(82));
    }

    // Track totals for summary line
    let mut total_real = 0u64;
    let mut total_packed = 0u64;

    for entry in catalog {
        if verbose {
            let (year, month, day) = entry.mod_date();
            let (hour, minute, _second) = entry.mod_time();

            println!(
                "{:>12}  {:>12}  {:>5}  {:04}-{:02}-{:02}  {:02}:{:02}  {:<6}  {:<5}  {}",
                entry.real_size,
                entry.packed_size,
                entry.compression_level,
                year,
                month,
                day,
                hour,
                minute,
                entry.os_origin.name(),
                flag_marks(entry),
                entry.filename_lossy()
            );

            total_real += entry.real_size;
            total_packed += entry.packed_size;
        } else {
            println!("{}", entry.filename_lossy());
        }
    }

    // Print summary line in verbose mode
    if verbose {
        println!("{}", "-".repeat(82));
        println!(
            "{:>12}  {:>12}  {:>39}  {} files",
            total_real,
            total_packed,
            "",
            catalog.len()
        );
    }
}

/// Short flag column: `*` encrypted, `<` continued, `>` continues, `L` large.
fn flag_marks(entry: &Entry) -> String {
    let mut marks = String::new();
    if entry.is_encrypted() {
        marks.push('*');
    }
    if entry.is_continued_from_previous() {
        marks.push('<');
    }
    if entry.continues_in_next() {
        marks.push('>');
    }
    if entry.is_large() {
        marks.push('L');
    }
    marks
}

/// Extract a single entry from the archive.
///
/// Handles various extraction options:
/// - Pipe mode (`-p`): Write to stdout instead of file
/// - Byte range (`--offset`, `--length`): Extract part of the payload
/// - Custom output directory (`-d`): Extract to specified directory
/// - Junk paths (`-j`): Ignore directory structure in archive
/// - Overwrite control (`-n`, `-o`): Handle existing files
///
/// # Arguments
///
/// * `archive` - The opened archive
/// * `catalog` - The catalog built from `archive`
/// * `id` - Catalog id of the entry
/// * `entry` - The entry to extract
/// * `cli` - Parsed command-line arguments
/// * `show_filename` - If true, print a filename marker before content (pipe mode with multiple files)
///
/// # Returns
///
/// Returns `Ok(())` on success or skip, or an error if extraction fails.
fn extract_file<R: ReadAt + 'static>(
    archive: &RarArchive<R>,
    catalog: &Catalog,
    id: usize,
    entry: &Entry,
    cli: &Cli,
    show_filename: bool,
) -> Result<()> {
    let name = entry.filename_lossy();

    if let Some(reason) = skip_reason(entry, cli) {
        if !cli.is_very_quiet() {
            eprintln!("Skipping: {reason}");
        }
        return Ok(());
    }
    if !entry.is_stored() {
        log::warn!(
            "{name}: compressed at level {}, writing packed bytes",
            entry.compression_level
        );
    }

    // Pipe mode: write stored bytes directly to stdout
    if cli.pipe {
        let stdout = std::io::stdout();
        let mut stdout = stdout.lock();
        if show_filename {
            stdout.write_all(format!("--- {name} ---\n").as_bytes())?;
        }
        archive.extract_to_writer(catalog, id, cli.offset, cli.length, &mut stdout)?;
        return Ok(());
    }

    // Determine the output path based on CLI options
    let file_name = if cli.junk_paths {
        // Junk paths: use only the base filename, ignore directory structure
        base_name(&name)
    } else {
        // Preserve directory structure from archive
        name.as_str()
    };
    let Some(relative) = safe_relative_path(file_name) else {
        if !cli.is_very_quiet() {
            eprintln!("Skipping: {name} (path leaves the extraction directory)");
        }
        return Ok(());
    };
    let output_path = match cli.extract_dir {
        Some(ref dir) => PathBuf::from(dir).join(relative),
        None => relative,
    };

    // Handle existing files based on overwrite options
    if output_path.exists() {
        if cli.never_overwrite {
            // -n flag: never overwrite, skip silently (unless quiet)
            if !cli.is_quiet() {
                eprintln!("Skipping: {name} (file exists)");
            }
            return Ok(());
        }

        if !cli.overwrite {
            // Default behavior: skip with suggestion to use -o
            if !cli.is_quiet() {
                eprintln!("Skipping: {name} (use -o to overwrite)");
            }
            return Ok(());
        }
        // -o flag: overwrite without prompting (fall through to extraction)
    }

    // Display extraction progress
    if !cli.is_quiet() {
        println!("  extracting: {name}");
    }

    if cli.offset == 0 && cli.length.is_none() {
        archive.extract_to_file(catalog, id, &output_path)?;
    } else {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = std::io::BufWriter::new(std::fs::File::create(&output_path)?);
        archive.extract_to_writer(catalog, id, cli.offset, cli.length, &mut file)?;
    }

    Ok(())
}

/// Decide whether an entry must be skipped before any output is created.
///
/// # Arguments
///
/// * `entry` - The catalog entry about to be extracted
/// * `cli` - Parsed command-line arguments
///
/// # Returns
///
/// A message explaining the skip, or `None` if the entry can be extracted.
fn skip_reason(entry: &Entry, cli: &Cli) -> Option<String> {
    if !cli.allow_encrypted {
        if let Err(e) = entry.ensure_unencrypted() {
            return Some(format!("{e} (use --allow-encrypted for raw bytes)"));
        }
    }
    // --offset applies to every selected entry; small ones cannot honour it
    if let Err(e) = entry.check_offset(cli.offset) {
        return Some(format!("{} ({e})", entry.filename_lossy()));
    }
    None
}

/// Check whether an extraction error only concerns the current entry.
///
/// # Arguments
///
/// * `err` - The error returned while extracting one entry
///
/// # Returns
///
/// Returns `true` if the error is a recoverable [`RarError`], so the
/// remaining entries can still be extracted.
fn is_recoverable(err: &anyhow::Error) -> bool {
    err.downcast_ref::<RarError>()
        .is_some_and(RarError::is_recoverable)
}

/// Turn an archive name into a path that stays below the extraction directory.
///
/// RAR names may use either separator. Empty and `.` components are dropped.
///
/// # Arguments
///
/// * `name` - The entry name as stored in the archive
///
/// # Returns
///
/// The relative path, or `None` if the name is absolute, carries a drive
/// prefix, climbs with `..`, or has no file component at all.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(safe_relative_path("dir\\a.txt"), Some(PathBuf::from("dir/a.txt")));
/// assert_eq!(safe_relative_path("../x"), None);
/// ```
fn safe_relative_path(name: &str) -> Option<PathBuf> {
    let normalized = name.replace('\\', "/");
    let mut path = PathBuf::new();
    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if path.as_os_str().is_empty() {
        return None;
    }
    Some(path)
}

/// Last path component of an archive name.
///
/// # Arguments
///
/// * `name` - The entry name, with `/` or `\\` separators
///
/// # Returns
///
/// The text after the last separator, or the whole name if it has none.
fn base_name(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// Check if a pattern contains glob wildcard characters.
///
/// # Arguments
///
/// * `pattern` - The pattern to check
///
/// # Returns
///
/// Returns `true` if the pattern contains `*` or `?` wildcards.
fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Simple glob pattern matching supporting `*` and `?` wildcards.
///
/// This is a basic implementation for file matching:
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
///
/// # Arguments
///
/// * `pattern` - The glob pattern to match against
/// * `text` - The text to check for a match
///
/// # Returns
///
/// Returns `true` if the text matches the pattern, `false` otherwise.
///
/// # Examples
///
/// ```ignore
/// assert!(glob_match("*.txt", "readme.txt"));
/// assert!(glob_match("file?.dat", "file1.dat"));
/// assert!(!glob_match("*.txt", "readme.md"));
/// ```
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();

    fn do_match(pattern: &[char], text: &[char]) -> bool {
        match (pattern.first(), text.first()) {
            (None, None) => true,
            // Star matches zero characters, or one and stays for more
            (Some('*'), _) => {
                do_match(&pattern[1..], text) || (!text.is_empty() && do_match(pattern, &text[1..]))
            }
            (Some('?'), Some(_)) => do_match(&pattern[1..], &text[1..]),
            (Some(p), Some(t)) if *p == *t => do_match(&pattern[1..], &text[1..]),
            _ => false,
        }
    }

    do_match(&pattern_chars, &text_chars)
}

/// Format a byte size into a human-readable string.
///
/// Automatically selects the appropriate unit (bytes, KB, MB, GB)
/// based on the size magnitude.
///
/// # Arguments
///
/// * `size` - The size in bytes to format
///
/// # Returns
///
/// A formatted string with the size and appropriate unit.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(format_size(500), "500 bytes");
/// assert_eq!(format_size(1536), "1.50 KB");
/// ```
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}
