use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "runrar")]
#[command(version)]
#[command(about = "A Rust RAR reader that streams raw stored payloads, with HTTP URL support", long_about = None)]
#[command(after_help = "Examples:\n  \
  runrar data1.rar -x joe        extract all files except joe from data1.rar\n  \
  runrar -p foo.rar | more       send stored bytes of foo.rar via pipe into more\n  \
  runrar -p --offset 1024 movie.rar clip.avi   stream clip.avi from byte 1024\n  \
  runrar -l https://example.com/archive.rar   list files from remote RAR")]
pub struct Cli {
    /// RAR file path or HTTP URL
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Files to extract (default: all)
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,

    /// List files (short format)
    #[arg(short = 'l')]
    pub list: bool,

    /// List verbosely/show version info
    #[arg(short = 'v')]
    pub verbose: bool,

    /// Dump the block layout of the archive
    #[arg(short = 'b')]
    pub blocks: bool,

    /// Extract files to pipe, no messages
    #[arg(short = 'p')]
    pub pipe: bool,

    /// Extract files into exdir
    #[arg(short = 'd', value_name = "DIR")]
    pub extract_dir: Option<String>,

    /// Exclude files that follow
    #[arg(short = 'x', value_name = "FILE", num_args = 1..)]
    pub exclude: Vec<String>,

    /// Never overwrite existing files
    #[arg(short = 'n')]
    pub never_overwrite: bool,

    /// Overwrite files WITHOUT prompting
    #[arg(short = 'o')]
    pub overwrite: bool,

    /// Junk paths (do not make directories)
    #[arg(short = 'j')]
    pub junk_paths: bool,

    /// Quiet mode (-qq => quieter)
    #[arg(short = 'q', action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Start each payload at this byte offset
    #[arg(long, value_name = "BYTES", default_value_t = 0)]
    pub offset: u64,

    /// Read at most this many bytes of each payload
    #[arg(long, value_name = "BYTES")]
    pub length: Option<u64>,

    /// Emit the raw bytes of password-protected entries instead of skipping them
    #[arg(long)]
    pub allow_encrypted: bool,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.file.starts_with("http://") || self.file.starts_with("https://")
    }

    pub fn is_quiet(&self) -> bool {
        self.quiet > 0 || self.pipe
    }

    pub fn is_very_quiet(&self) -> bool {
        self.quiet > 1
    }

    /// Default log filter, overridden by `RUST_LOG`.
    pub fn log_filter(&self) -> &'static str {
        if self.is_very_quiet() {
            "off"
        } else if self.quiet > 0 {
            "error"
        } else if self.verbose {
            "info"
        } else {
            "warn"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_range_options() {
        let cli = Cli::try_parse_from([
            "runrar", "-p", "--offset", "1024", "--length", "16", "movie.rar", "clip.avi",
        ])
        .unwrap();
        assert!(cli.pipe);
        assert_eq!(cli.offset, 1024);
        assert_eq!(cli.length, Some(16));
        assert_eq!(cli.files, vec!["clip.avi".to_string()]);
        assert!(cli.is_quiet());
    }

    #[test]
    fn detects_urls() {
        let cli = Cli::try_parse_from(["runrar", "-l", "https://example.com/a.rar"]).unwrap();
        assert!(cli.is_http_url());
        assert!(cli.list);

        let cli = Cli::try_parse_from(["runrar", "a.rar"]).unwrap();
        assert!(!cli.is_http_url());
        assert_eq!(cli.offset, 0);
        assert_eq!(cli.length, None);
    }

    #[test]
    fn log_filter_follows_verbosity() {
        assert_eq!(Cli::try_parse_from(["runrar", "a.rar"]).unwrap().log_filter(), "warn");
        assert_eq!(Cli::try_parse_from(["runrar", "-v", "a.rar"]).unwrap().log_filter(), "info");
        assert_eq!(Cli::try_parse_from(["runrar", "-q", "a.rar"]).unwrap().log_filter(), "error");
        assert_eq!(Cli::try_parse_from(["runrar", "-qq", "a.rar"]).unwrap().log_filter(), "off");
    }
}
