use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{ArgAction, ArgGroup, Parser};
use serde::Deserialize;

use kcat_api::{ClientProperties, StartOffset};
use kcat_engine::{CompiledFormat, FramerConfig, parse_delimiter};

use super::error::CatError;

/// Placeholder rendered for null keys and payloads with `-Z`.
pub const DEFAULT_NULL_STR: &str = "NULL";

// ═══════════════════════════════════════════════════════════════
//  Config file (TOML)
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    pub brokers: Option<String>,
    pub null_str: Option<String>,
    /// Client properties, same names as `-X`.
    #[serde(default)]
    pub properties: BTreeMap<String, toml::Value>,
}

pub fn load_config(path: &Path) -> Result<Config, CatError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CatError::Config(format!("cannot read config {}: {e}", path.display())))?;
    toml::from_str(&content).map_err(|e| CatError::Config(format!("bad config {}: {e}", path.display())))
}

fn property_value(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ═══════════════════════════════════════════════════════════════
//  CLI args
// ═══════════════════════════════════════════════════════════════

#[derive(Parser, Clone, Debug)]
#[command(
    name = "kcat",
    version,
    about = "Generic command line producer and consumer for Kafka",
    group(ArgGroup::new("mode").args(["produce", "consume", "list"]))
)]
pub struct Cli {
    /// Producer mode (writes messages to a topic)
    #[arg(short = 'P')]
    pub produce: bool,

    /// Consumer mode (reads messages from a topic)
    #[arg(short = 'C')]
    pub consume: bool,

    /// Metadata list mode
    #[arg(short = 'L')]
    pub list: bool,

    /// Topic to produce to, consume from or list
    #[arg(short = 't', value_name = "TOPIC")]
    pub topic: Option<String>,

    /// Partition (-1 for any)
    #[arg(short = 'p', value_name = "PARTITION", allow_negative_numbers = true)]
    pub partition: Option<i32>,

    /// Bootstrap broker(s) (host[:port],..)
    #[arg(short = 'b', value_name = "BROKERS")]
    pub brokers: Option<String>,

    /// Message delimiter: a character, \n, \t or \xNN
    #[arg(short = 'D', value_name = "DELIM", default_value = "\\n")]
    pub delimiter: String,

    /// Key delimiter, same syntax as -D
    #[arg(short = 'K', value_name = "DELIM")]
    pub key_delimiter: Option<String>,

    /// Stop after this many messages
    #[arg(short = 'c', value_name = "CNT")]
    pub count: Option<u64>,

    /// Exit once the last message of every partition was received
    #[arg(short = 'e')]
    pub exit_eof: bool,

    /// Start offset: beginning, end, stored, <n> or -<n> (n from the end)
    #[arg(short = 'o', value_name = "OFFSET", allow_hyphen_values = true)]
    pub offset: Option<StartOffset>,

    /// Output format: %t %p %o %k %K %s %S, escapes \n \r \t \xNN
    #[arg(short = 'f', value_name = "FMT")]
    pub format: Option<String>,

    /// JSON envelope for messages, JSON output for metadata
    #[arg(short = 'J')]
    pub json: bool,

    /// Print message offset in the default format
    #[arg(short = 'O')]
    pub print_offset: bool,

    /// Empty key or value means NULL when producing; render NULL when consuming
    #[arg(short = 'Z')]
    pub null: bool,

    /// String rendered for NULL with -Z
    #[arg(long = "null-str", value_name = "STR")]
    pub null_str: Option<String>,

    /// Echo produced messages to stdout
    #[arg(short = 'T')]
    pub tee: bool,

    /// Unbuffered output
    #[arg(short = 'u')]
    pub unbuffered: bool,

    /// Send messages from a file separated by the delimiter, as with stdin
    #[arg(short = 'l')]
    pub line_file: bool,

    /// Compression codec: none, gzip, snappy, lz4, zstd
    #[arg(short = 'z', value_name = "CODEC")]
    pub compression: Option<String>,

    /// Client debug contexts, comma separated
    #[arg(short = 'd', value_name = "CONTEXTS")]
    pub debug: Option<String>,

    /// Be quiet
    #[arg(short = 'q')]
    pub quiet: bool,

    /// Increase verbosity
    #[arg(short = 'v', action = ArgAction::Count)]
    pub verbose: u8,

    /// Client property; topic.<prop> sets a topic property; `-X dump` prints the configuration
    #[arg(short = 'X', value_name = "PROP=VAL")]
    pub properties: Vec<String>,

    /// Path to a TOML config file
    #[arg(long, value_name = "PATH", env = "KCAT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Files to produce, one message per file
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,
}

impl Cli {
    /// Default log filter when `RUST_LOG` is not set.
    pub fn log_filter(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "error",
            (false, 0) => "info",
            (false, 1) => "debug",
            (false, _) => "trace",
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Effective: merged config
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Produce,
    Consume,
    List,
    /// `-X dump`: print the configuration and exit.
    Dump,
}

/// Final configuration: config file < CLI.
#[derive(Debug)]
pub struct Effective {
    pub mode: Mode,
    pub topic: String,
    pub partition: Option<i32>,
    pub properties: ClientProperties,
    pub framer: FramerConfig,
    pub count: Option<u64>,
    pub exit_eof: bool,
    pub offset: StartOffset,
    pub format: CompiledFormat,
    pub json: bool,
    pub null_str: Option<String>,
    pub unbuffered: bool,
    pub line_file: bool,
    pub files: Vec<PathBuf>,
}

impl Effective {
    pub fn new(cli: &Cli) -> Result<Self, CatError> {
        let cfg = match &cli.config {
            Some(path) => load_config(path)?,
            None => Config::default(),
        };
        Self::merge(cli, cfg, std::io::stdin().is_terminal())
    }

    fn merge(cli: &Cli, cfg: Config, stdin_is_terminal: bool) -> Result<Self, CatError> {
        let mut properties = ClientProperties::new();
        for (name, value) in &cfg.properties {
            properties.set(name.as_str(), property_value(value));
        }

        let mut dump = false;
        for assignment in &cli.properties {
            if assignment == "dump" {
                dump = true;
                continue;
            }
            properties
                .assign(assignment)
                .map_err(|e| CatError::Config(format!("-X {assignment}: {}", e.message())))?;
        }

        if let Some(brokers) = cli.brokers.as_ref().or(cfg.brokers.as_ref()) {
            properties.set("bootstrap.servers", brokers.as_str());
        }
        if let Some(codec) = &cli.compression {
            properties.set("compression.codec", codec.as_str());
        }
        if let Some(contexts) = &cli.debug {
            properties.set("debug", contexts.as_str());
        }

        let mode = if dump {
            Mode::Dump
        } else if cli.produce {
            Mode::Produce
        } else if cli.consume {
            Mode::Consume
        } else if cli.list {
            Mode::List
        } else if stdin_is_terminal {
            Mode::Consume
        } else {
            Mode::Produce
        };

        let delimiter = parse_delimiter(&cli.delimiter)
            .map_err(|e| CatError::Config(format!("-D: {e}")))?;
        let key_delimiter = cli
            .key_delimiter
            .as_deref()
            .map(parse_delimiter)
            .transpose()
            .map_err(|e| CatError::Config(format!("-K: {e}")))?;

        let format = match &cli.format {
            Some(fmt) => CompiledFormat::compile(fmt),
            None if cli.json => CompiledFormat::compile(&escape_byte(delimiter)),
            None => CompiledFormat::default_for(
                &escape_byte(delimiter),
                key_delimiter.map(escape_byte).as_deref(),
                cli.print_offset,
            ),
        }
        .map_err(|e| CatError::Config(e.to_string()))?;

        let eff = Self {
            mode,
            topic: cli.topic.clone().unwrap_or_default(),
            partition: cli.partition.filter(|&p| p >= 0),
            properties,
            framer: FramerConfig {
                delimiter,
                key_delimiter,
                null_empty: cli.null,
                tee: cli.tee,
            },
            count: cli.count,
            exit_eof: cli.exit_eof,
            offset: cli.offset.unwrap_or_default(),
            format,
            json: cli.json,
            null_str: cli
                .null
                .then(|| cli.null_str.clone().or(cfg.null_str).unwrap_or_else(|| DEFAULT_NULL_STR.into())),
            unbuffered: cli.unbuffered,
            line_file: cli.line_file,
            files: cli.files.clone(),
        };
        eff.validate()?;
        Ok(eff)
    }

    fn validate(&self) -> Result<(), CatError> {
        if self.mode == Mode::Dump {
            return Ok(());
        }
        if self.properties.get("bootstrap.servers").is_none()
            && self.properties.get("metadata.broker.list").is_none()
        {
            return Err(CatError::Config("-b <broker,..> missing".into()));
        }
        if matches!(self.mode, Mode::Produce | Mode::Consume) && self.topic.is_empty() {
            return Err(CatError::Config("-t <topic> missing".into()));
        }
        if self.mode != Mode::Produce && !self.files.is_empty() {
            return Err(CatError::Config("file arguments are only valid in producer mode".into()));
        }
        if self.line_file && self.files.len() != 1 {
            return Err(CatError::Config("-l expects exactly one file".into()));
        }
        Ok(())
    }
}

/// A delimiter byte in format-string syntax.
fn escape_byte(b: u8) -> String {
    format!("\\x{b:02x}")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use kcat_engine::{Field, Token};

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("kcat").chain(args.iter().copied())).unwrap()
    }

    fn effective(args: &[&str]) -> Result<Effective, CatError> {
        Effective::merge(&cli(args), Config::default(), true)
    }

    #[test]
    fn producer_flags() {
        let eff = effective(&["-P", "-b", "b1:9092", "-t", "t", "-p", "2", "-K", ":", "-D", "\\t", "-Z"]).unwrap();
        assert_eq!(eff.mode, Mode::Produce);
        assert_eq!(eff.partition, Some(2));
        assert_eq!(eff.framer.delimiter, b'\t');
        assert_eq!(eff.framer.key_delimiter, Some(b':'));
        assert!(eff.framer.null_empty);
        assert_eq!(eff.properties.get("bootstrap.servers"), Some("b1:9092"));
    }

    #[test]
    fn negative_partition_means_any() {
        let eff = effective(&["-C", "-b", "b", "-t", "t", "-p", "-1"]).unwrap();
        assert_eq!(eff.partition, None);
    }

    #[test]
    fn offsets() {
        let eff = effective(&["-C", "-b", "b", "-t", "t", "-o", "-10"]).unwrap();
        assert_eq!(eff.offset, StartOffset::Tail(10));
        let eff = effective(&["-C", "-b", "b", "-t", "t", "-o", "stored"]).unwrap();
        assert_eq!(eff.offset, StartOffset::Stored);
        let eff = effective(&["-C", "-b", "b", "-t", "t"]).unwrap();
        assert_eq!(eff.offset, StartOffset::Beginning);
        assert!(Cli::try_parse_from(["kcat", "-C", "-o", "later"]).is_err());
    }

    #[test]
    fn modes_are_exclusive() {
        assert!(Cli::try_parse_from(["kcat", "-P", "-C"]).is_err());
    }

    #[test]
    fn auto_mode_follows_stdin() {
        let args = cli(&["-b", "b", "-t", "t"]);
        assert_eq!(Effective::merge(&args, Config::default(), true).unwrap().mode, Mode::Consume);
        assert_eq!(Effective::merge(&args, Config::default(), false).unwrap().mode, Mode::Produce);
    }

    #[test]
    fn missing_required_values() {
        assert!(matches!(effective(&["-C", "-t", "t"]), Err(CatError::Config(m)) if m.contains("-b")));
        assert!(matches!(effective(&["-C", "-b", "b"]), Err(CatError::Config(m)) if m.contains("-t")));
        assert!(effective(&["-L", "-b", "b"]).is_ok());
        assert!(effective(&["-P", "-b", "b", "-t", "t", "-l"]).is_err());
        assert!(effective(&["-C", "-b", "b", "-t", "t", "file.txt"]).is_err());
    }

    #[test]
    fn passthrough_properties() {
        let eff = effective(&[
            "-P", "-b", "b", "-t", "t", "-X", "linger.ms=5", "-X", "topic.acks=all", "-z", "snappy",
        ])
        .unwrap();
        assert_eq!(eff.properties.get("linger.ms"), Some("5"));
        assert_eq!(eff.properties.get("topic.acks"), Some("all"));
        assert_eq!(eff.properties.get("compression.codec"), Some("snappy"));

        assert!(matches!(effective(&["-P", "-b", "b", "-t", "t", "-X", "novalue"]), Err(CatError::Config(_))));
    }

    #[test]
    fn dump_needs_nothing_else() {
        let eff = effective(&["-X", "dump", "-X", "client.id=me"]).unwrap();
        assert_eq!(eff.mode, Mode::Dump);
        assert_eq!(eff.properties.get("client.id"), Some("me"));
    }

    #[test]
    fn default_format_uses_delimiters() {
        let eff = effective(&["-C", "-b", "b", "-t", "t", "-K", "%", "-O"]).unwrap();
        assert_eq!(
            eff.format.tokens(),
            &[
                Token::Field(Field::Offset),
                Token::Literal(b"%".to_vec()),
                Token::Field(Field::Key),
                Token::Literal(b"%".to_vec()),
                Token::Field(Field::Payload),
                Token::Literal(b"\n".to_vec()),
            ]
        );

        let eff = effective(&["-C", "-b", "b", "-t", "t", "-J"]).unwrap();
        assert_eq!(eff.format.tokens(), &[Token::Literal(b"\n".to_vec())]);
    }

    #[test]
    fn bad_format_is_a_config_error() {
        let err = effective(&["-C", "-b", "b", "-t", "t", "-f", "%q"]).unwrap_err();
        assert!(err.to_string().contains("%q"));
    }

    #[test]
    fn null_placeholder() {
        assert_eq!(effective(&["-C", "-b", "b", "-t", "t"]).unwrap().null_str, None);
        let eff = effective(&["-C", "-b", "b", "-t", "t", "-Z"]).unwrap();
        assert_eq!(eff.null_str.as_deref(), Some("NULL"));
        let eff = effective(&["-C", "-b", "b", "-t", "t", "-Z", "--null-str", "~"]).unwrap();
        assert_eq!(eff.null_str.as_deref(), Some("~"));
    }

    #[test]
    fn config_file_is_overridden_by_cli() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "brokers = \"from-file:9092\"\nnull_str = \"<null>\"\n\n[properties]\n\"queue.buffering.max.ms\" = 10\n\"client.id\" = \"file\""
        )
        .unwrap();

        let path = file.path().to_str().unwrap();
        let args = cli(&["-C", "-t", "t", "-Z", "--config", path, "-X", "client.id=cli"]);
        let eff = Effective::merge(&args, load_config(file.path()).unwrap(), true).unwrap();
        assert_eq!(eff.properties.get("bootstrap.servers"), Some("from-file:9092"));
        assert_eq!(eff.properties.get("queue.buffering.max.ms"), Some("10"));
        assert_eq!(eff.properties.get("client.id"), Some("cli"));
        assert_eq!(eff.null_str.as_deref(), Some("<null>"));

        let args = cli(&["-C", "-t", "t", "-b", "from-cli"]);
        let eff = Effective::merge(&args, load_config(file.path()).unwrap(), true).unwrap();
        assert_eq!(eff.properties.get("bootstrap.servers"), Some("from-cli"));
    }

    #[test]
    fn unreadable_config_file() {
        let err = load_config(Path::new("/nonexistent/kcat.toml")).unwrap_err();
        assert!(err.to_string().contains("cannot read config"));
    }
}
