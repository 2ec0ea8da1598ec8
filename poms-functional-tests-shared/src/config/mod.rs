mod file_config;

pub use file_config::{FileConfig, SectionConfig};

use anyhow::{anyhow, bail, Result};
use clap::ValueEnum;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Environment variable naming the TOML config file.
pub const CONFIG_PATH_VAR: &str = "POMS_TESTS_CONFIG";

/// Environment variable selecting the environment to test.
pub const ENV_VAR: &str = "POMS_ENV";

const VAR_PREFIX: &str = "POMS_";

/// A deployment of the POMS stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, ValueEnum)]
pub enum Env {
    Localhost,
    Dev,
    #[default]
    Test,
    Acc,
    Prod,
}

impl FromStr for Env {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "localhost" | "local" => Ok(Env::Localhost),
            "dev" => Ok(Env::Dev),
            "test" => Ok(Env::Test),
            "acc" | "acceptance" => Ok(Env::Acc),
            "prod" | "production" => Ok(Env::Prod),
            other => bail!("Unknown environment: {}", other),
        }
    }
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Env::Localhost => "localhost",
            Env::Dev => "dev",
            Env::Test => "test",
            Env::Acc => "acc",
            Env::Prod => "prod",
        };
        f.write_str(name)
    }
}

/// The deployed system a setting belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Prefix {
    /// The public frontend API.
    NpoApi,
    /// The media backend API used by broadcasters to deliver metadata.
    NpoBackendApi,
    /// The POMS GUI, which also hosts the letterbox import endpoints.
    Poms,
    Images,
    Selenium,
}

impl Prefix {
    pub const ALL: [Prefix; 5] = [
        Prefix::NpoApi,
        Prefix::NpoBackendApi,
        Prefix::Poms,
        Prefix::Images,
        Prefix::Selenium,
    ];

    /// Name of the section in the config file.
    pub fn section(&self) -> &'static str {
        match self {
            Prefix::NpoApi => "npo_api",
            Prefix::NpoBackendApi => "npo_backend_api",
            Prefix::Poms => "poms",
            Prefix::Images => "images",
            Prefix::Selenium => "selenium",
        }
    }

    /// Environment variable that overrides `key` in this section.
    pub fn env_var(&self, key: &str) -> String {
        format!(
            "{}{}_{}",
            VAR_PREFIX,
            self.section().to_ascii_uppercase(),
            normalize_key(key).to_ascii_uppercase()
        )
    }

    fn default_base_url(&self, env: Env) -> Option<&'static str> {
        let url = match (self, env) {
            (Prefix::NpoApi, Env::Localhost) => "http://localhost:8070/v1/",
            (Prefix::NpoApi, Env::Dev) => "https://rs-dev.poms.omroep.nl/v1/",
            (Prefix::NpoApi, Env::Test) => "https://rs-test.poms.omroep.nl/v1/",
            (Prefix::NpoApi, Env::Acc) => "https://rs-acc.poms.omroep.nl/v1/",
            (Prefix::NpoApi, Env::Prod) => "https://rs.poms.omroep.nl/v1/",
            (Prefix::NpoBackendApi, Env::Localhost) => "http://localhost:8071/rs/",
            (Prefix::NpoBackendApi, Env::Dev) => "https://api-dev.poms.omroep.nl/",
            (Prefix::NpoBackendApi, Env::Test) => "https://api-test.poms.omroep.nl/",
            (Prefix::NpoBackendApi, Env::Acc) => "https://api-acc.poms.omroep.nl/",
            (Prefix::NpoBackendApi, Env::Prod) => "https://api.poms.omroep.nl/",
            (Prefix::Poms, Env::Localhost) => "http://localhost:8071/poms/",
            (Prefix::Poms, Env::Dev) => "https://poms-dev.omroep.nl/",
            (Prefix::Poms, Env::Test) => "https://poms-test.omroep.nl/",
            (Prefix::Poms, Env::Acc) => "https://poms-acc.omroep.nl/",
            (Prefix::Poms, Env::Prod) => "https://poms.omroep.nl/",
            (Prefix::Images, Env::Localhost) => "http://localhost:8072/",
            (Prefix::Images, Env::Dev) => "https://images-dev.poms.omroep.nl/",
            (Prefix::Images, Env::Test) => "https://images-test.poms.omroep.nl/",
            (Prefix::Images, Env::Acc) => "https://images-acc.poms.omroep.nl/",
            (Prefix::Images, Env::Prod) => "https://images.poms.omroep.nl/",
            (Prefix::Selenium, _) => return None,
        };
        Some(url)
    }
}

impl fmt::Display for Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.section())
    }
}

/// `letterbox-user` and `letterbox_user` name the same option.
pub(crate) fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase().replace('-', "_")
}

/// Resolved configuration of the environment under test.
#[derive(Debug, Clone)]
pub struct Config {
    env: Env,
    relaxed_https: bool,
    sections: HashMap<Prefix, BTreeMap<String, String>>,
    source: Option<PathBuf>,
    // POMS_ENV was among the variables
    env_selected: bool,
}

impl Config {
    /// Loads the config file (if any) and applies `POMS_*` environment variables.
    pub fn load() -> Result<Self> {
        Self::load_for(None)
    }

    /// Like [`Config::load`], with `env` taking precedence over `POMS_ENV`.
    pub fn load_for(env: Option<Env>) -> Result<Self> {
        let path = config_path();
        let file_config = match &path {
            Some(path) if path.exists() => Some(FileConfig::load(path)?),
            _ => None,
        };
        let source = path.filter(|path| path.exists());
        let mut vars: Vec<(String, String)> = std::env::vars()
            .filter(|(name, _)| env.is_none() || name != ENV_VAR)
            .collect();
        if let Some(env) = env {
            vars.push((ENV_VAR.to_string(), env.to_string()));
        }
        let mut config = Self::from_file_config(file_config, vars)?;
        config.source = source;
        Ok(config)
    }

    /// Resolves configuration from an optional file and `POMS_*` variables.
    /// Variables override the file, the file overrides built-in defaults.
    pub fn from_file_config(
        file_config: Option<FileConfig>,
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self> {
        let vars: Vec<(String, String)> = vars
            .into_iter()
            .filter(|(name, _)| name.starts_with(VAR_PREFIX))
            .collect();
        let file = file_config.unwrap_or_default();

        let env_selected = vars.iter().any(|(name, _)| name == ENV_VAR);
        let env = match vars.iter().find(|(name, _)| name == ENV_VAR) {
            Some((_, value)) => value.parse()?,
            None => match &file.env {
                Some(value) => value.parse()?,
                None => Env::default(),
            },
        };

        let relaxed_https = match vars.iter().find(|(name, _)| name == "POMS_RELAXED_HTTPS") {
            Some((_, value)) => parse_bool(value)?,
            None => file.relaxed_https.unwrap_or(false),
        };

        let mut sections = HashMap::new();
        for prefix in Prefix::ALL {
            let mut options = file_section(&file, prefix)
                .map(|section| section.options(env))
                .unwrap_or_default();
            let var_prefix = format!("{}{}_", VAR_PREFIX, prefix.section().to_ascii_uppercase());
            for (name, value) in &vars {
                if let Some(key) = name.strip_prefix(&var_prefix) {
                    options.insert(normalize_key(key), value.clone());
                }
            }
            sections.insert(prefix, options);
        }

        Ok(Self {
            env,
            relaxed_https,
            sections,
            source: None,
            env_selected,
        })
    }

    pub fn env(&self) -> Env {
        self.env
    }

    /// Whether certificate errors are tolerated (self-signed test environments).
    pub fn relaxed_https(&self) -> bool {
        self.relaxed_https
    }

    /// The config file this was loaded from, if there was one.
    pub fn source(&self) -> Option<&PathBuf> {
        self.source.as_ref()
    }

    /// Whether a real environment was configured rather than only defaults.
    pub fn is_configured(&self) -> bool {
        self.source.is_some() || self.env_selected
    }

    pub fn config_option(&self, prefix: Prefix, key: &str) -> Option<String> {
        self.sections
            .get(&prefix)
            .and_then(|options| options.get(&normalize_key(key)))
            .cloned()
    }

    pub fn required_option(&self, prefix: Prefix, key: &str) -> Result<String> {
        self.config_option(prefix, key).ok_or_else(|| {
            anyhow!(
                "Missing required option '{}' in section [{}] for env {} (or set {})",
                normalize_key(key),
                prefix.section(),
                self.env,
                prefix.env_var(key)
            )
        })
    }

    pub fn base_url(&self, prefix: Prefix) -> Result<String> {
        self.config_option(prefix, "base_url")
            .or_else(|| prefix.default_base_url(self.env).map(str::to_string))
            .ok_or_else(|| anyhow!("No base_url configured for [{}]", prefix.section()))
    }

    /// Joins `path` to the base url of `prefix` with exactly one slash.
    pub fn url(&self, prefix: Prefix, path: &str) -> Result<String> {
        let base = self.base_url(prefix)?;
        Ok(format!(
            "{}/{}",
            base.trim_end_matches('/'),
            path.trim_start_matches('/')
        ))
    }
}

fn file_section(file: &FileConfig, prefix: Prefix) -> Option<&SectionConfig> {
    match prefix {
        Prefix::NpoApi => file.npo_api.as_ref(),
        Prefix::NpoBackendApi => file.npo_backend_api.as_ref(),
        Prefix::Poms => file.poms.as_ref(),
        Prefix::Images => file.images.as_ref(),
        Prefix::Selenium => file.selenium.as_ref(),
    }
}

fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
        return Some(PathBuf::from(path));
    }
    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join("conf").join("poms-functional-tests.toml"))
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => bail!("Not a boolean: {}", other),
    }
}
