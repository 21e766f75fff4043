use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::cli::{AppContext, InitArgs};
use crate::core::cache::MalformedPolicy;

/// Config file names probed in the working directory, first hit wins.
const CONFIG_FILES: [&str; 4] = ["reelmerge.toml", "reelmerge.yaml", "reelmerge.json", ".reelmerge.toml"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Durable record cache (JSONL, one record per line)
    pub cache_path: PathBuf,

    /// Directory for per-source partial exports
    pub export_dir: PathBuf,

    /// Optional word list (one word per line) added to the built-in dictionary
    pub dictionary_path: Option<PathBuf>,

    /// Words always treated as English (names, franchise titles)
    pub extra_words: Vec<String>,

    /// What to do with undecodable cache lines
    pub on_malformed: MalformedPolicy,

    /// Feed records released before this year are ignored (0 disables)
    pub min_year: i32,
}

impl Default for Config
{
    fn default() -> Self
    {
        Self {
            cache_path: PathBuf::from("cache/cache.jsonl"),
            export_dir: PathBuf::from("cache"),
            dictionary_path: None,
            extra_words: Vec::new(),
            on_malformed: MalformedPolicy::Skip,
            min_year: 1950,
        }
    }
}

impl Config
{
    /// Expand `~` and `$VAR` in the configured paths.
    pub fn expand_paths(mut self) -> Result<Self>
    {
        self.cache_path = expand(&self.cache_path)?;
        self.export_dir = expand(&self.export_dir)?;
        self.dictionary_path = self
            .dictionary_path
            .as_deref()
            .map(expand)
            .transpose()?;
        Ok(self)
    }
}

pub fn expand(path: &Path) -> Result<PathBuf>
{
    let raw = path.to_string_lossy();
    let expanded =
        shellexpand::full(&raw).with_context(|| format!("expand path: {}", path.display()))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

pub fn load_config() -> Result<Config>
{
    load_config_from(Path::new("."))
}

/// Load config from the first config file under `dir`, then `REELMERGE_*` env vars.
pub fn load_config_from(dir: &Path) -> Result<Config>
{
    let mut builder = config::Config::builder();

    for name in CONFIG_FILES
    {
        let path = dir.join(name);
        if path.exists()
        {
            builder = builder.add_source(config::File::from(path));
            break;
        }
    }

    // Add environment variables with REELMERGE_ prefix
    builder = builder.add_source(
        config::Environment::with_prefix("REELMERGE")
            .prefix_separator("_")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("extra_words")
            .try_parsing(true),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    parsed.expand_paths()
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join("reelmerge.toml");

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    if ctx.dry_run
    {
        println!("{toml_string}");
        return Ok(());
    }

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}
