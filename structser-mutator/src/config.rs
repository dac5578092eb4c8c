use std::path::Path;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Environment variable naming a TOML file with a [`MutatorConfig`].
pub const CONFIG_ENV: &str = "STRUCTSER_CONFIG";

/// Knobs that steer the recursive mutation of a single value.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
#[serde(default)]
pub struct MutationSettings {
    /// Probability that a sum mutation switches to another variant.
    pub switch_variant_probability: f64,
    /// Probability that a product mutation touches more than one field.
    pub multi_field_probability: f64,
    /// Probability that a freshly switched-to variant gets its payload mutated once.
    pub fresh_payload_probability: f64,
    /// Require every mutation to produce a structurally different value when possible.
    pub enforce_changes: bool,
}

impl Default for MutationSettings {
    fn default() -> Self {
        Self {
            switch_variant_probability: 0.2,
            multi_field_probability: 0.1,
            fresh_payload_probability: 0.5,
            enforce_changes: true,
        }
    }
}

impl MutationSettings {
    pub fn validate(&self) -> Result<(), Error> {
        for (name, p) in [
            ("switch-variant-probability", self.switch_variant_probability),
            ("multi-field-probability", self.multi_field_probability),
            ("fresh-payload-probability", self.fresh_payload_probability),
        ] {
            if !(0.0..=1.0).contains(&p) {
                return Err(Error::InvalidConfig(format!(
                    "{} must be within [0, 1], got {}",
                    name, p
                )));
            }
        }
        Ok(())
    }
}

fn default_fuzz_count() -> u32 {
    1024
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct MutatorConfig {
    #[serde(default)]
    pub mutation: MutationSettings,
    /// Number of mutations AFL++ performs per queue entry.
    #[serde(default = "default_fuzz_count")]
    pub fuzz_count: u32,
}

impl Default for MutatorConfig {
    fn default() -> Self {
        Self {
            mutation: MutationSettings::default(),
            fuzz_count: default_fuzz_count(),
        }
    }
}

impl MutatorConfig {
    pub fn from_toml_str(content: &str, path: &Path) -> Result<Self, Error> {
        let config: MutatorConfig = toml::from_str(content).map_err(|source| Error::ParseConfig {
            path: path.to_path_buf(),
            source,
        })?;
        config.mutation.validate()?;
        Ok(config)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|source| Error::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    /// Loads the file named by `var`, or the defaults if the variable is unset.
    pub fn from_env_var(var: &str) -> Result<Self, Error> {
        match std::env::var_os(var) {
            Some(path) => Self::load_from_file(Path::new(&path)),
            None => Ok(Self::default()),
        }
    }

    pub fn from_env() -> Result<Self, Error> {
        Self::from_env_var(CONFIG_ENV)
    }

    /// Process-wide configuration, read from [`CONFIG_ENV`] on first use.
    ///
    /// A config that fails to load is reported once and replaced by the defaults.
    pub fn global() -> &'static MutatorConfig {
        static GLOBAL: OnceLock<MutatorConfig> = OnceLock::new();
        GLOBAL.get_or_init(|| match Self::from_env() {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(error = %err, "falling back to default mutator config");
                Self::default()
            }
        })
    }
}
