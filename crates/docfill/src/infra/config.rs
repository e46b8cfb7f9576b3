//! Configuration management utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::domain::model::SubstitutionPolicy;

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static WORKSPACE_CONFIG_DIR: &str = ".docfill";
static WORKSPACE_CONFIG_FILE: &str = "config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub registry: RegistrySettings,
    #[serde(default)]
    pub merge: MergeSettings,
    #[serde(default)]
    pub output: OutputSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RegistrySettings {
    #[serde(default)]
    path: Option<PathBuf>,
}

impl RegistrySettings {
    fn default_path() -> PathBuf {
        PathBuf::from("templates.json")
    }

    /// Location of the template registry resource.
    pub fn path(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(Self::default_path)
    }

    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = Some(path.into());
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct MergeSettings {
    #[serde(default)]
    policy: Option<SubstitutionPolicy>,
    #[serde(default)]
    name_field: Option<String>,
}

impl MergeSettings {
    fn default_name_field() -> &'static str {
        "Name"
    }

    pub fn policy(&self) -> SubstitutionPolicy {
        self.policy.unwrap_or_default()
    }

    pub fn set_policy(&mut self, policy: SubstitutionPolicy) {
        self.policy = Some(policy);
    }

    /// Field whose value names suggested output files.
    pub fn name_field(&self) -> String {
        self.name_field
            .clone()
            .unwrap_or_else(|| Self::default_name_field().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct OutputSettings {
    /// Directory suggested destinations are placed in.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// minijinja pattern for the suggested file name.
    #[serde(default)]
    file_name: Option<String>,
}

impl OutputSettings {
    fn default_file_name() -> &'static str {
        "{{ name }}_{{ template }}"
    }

    pub fn file_name(&self) -> String {
        self.file_name
            .clone()
            .unwrap_or_else(|| Self::default_file_name().to_string())
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    registry: Option<String>,
    policy: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            registry: env::var("DOCFILL_REGISTRY").ok(),
            policy: env::var("DOCFILL_POLICY").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(registry: &str, policy: &str) -> Self {
        Self {
            registry: Some(registry.to_owned()),
            policy: Some(policy.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            tracing::debug!(path = %global_path.display(), "reading user config");
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            tracing::debug!(path = %workspace_path.display(), "reading workspace config");
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        apply_env_overrides(merged, env_overrides)
    }

    /// Read one config file. A relative registry path is taken relative to
    /// the directory that owns the config (the workspace root for
    /// `.docfill/config.toml`).
    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let mut config = Self::from_str(&data)
            .with_context(|| format!("invalid config file: {}", path.display()))?;

        if let Some(registry) = config.registry.path.as_mut()
            && registry.is_relative()
        {
            let owner = path
                .parent()
                .filter(|dir| dir.ends_with(WORKSPACE_CONFIG_DIR))
                .and_then(Path::parent)
                .or_else(|| path.parent());
            if let Some(owner) = owner {
                *registry = owner.join(&*registry);
            }
        }
        Ok(config)
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            registry: merge_registry(self.registry, other.registry),
            merge: merge_merge_settings(self.merge, other.merge),
            output: merge_output(self.output, other.output),
        }
    }
}

fn merge_registry(mut base: RegistrySettings, overlay: RegistrySettings) -> RegistrySettings {
    if let Some(path) = overlay.path {
        base.path = Some(path);
    }
    base
}

fn merge_merge_settings(mut base: MergeSettings, overlay: MergeSettings) -> MergeSettings {
    if let Some(policy) = overlay.policy {
        base.policy = Some(policy);
    }
    if let Some(name_field) = overlay.name_field {
        base.name_field = Some(name_field);
    }
    base
}

fn merge_output(mut base: OutputSettings, overlay: OutputSettings) -> OutputSettings {
    if let Some(directory) = overlay.directory {
        base.directory = Some(directory);
    }
    if let Some(file_name) = overlay.file_name {
        base.file_name = Some(file_name);
    }
    base
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("docfill").join(WORKSPACE_CONFIG_FILE))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_workspace_root(&cwd).unwrap_or(cwd);
    Ok(Some(
        root.join(WORKSPACE_CONFIG_DIR).join(WORKSPACE_CONFIG_FILE),
    ))
}

fn find_workspace_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(WORKSPACE_CONFIG_DIR).is_dir() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Result<Config> {
    if let Some(registry) = env.registry {
        config.registry.set_path(registry);
    }
    if let Some(policy) = env.policy {
        config
            .merge
            .set_policy(policy.parse().context("invalid DOCFILL_POLICY")?);
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_uses_defaults_when_no_files() {
        let config = Config::load_with_layers(None, None, EnvOverrides::default())
            .expect("load default config");
        assert_eq!(config.registry.path(), PathBuf::from("templates.json"));
        assert_eq!(config.merge.policy(), SubstitutionPolicy::Lenient);
        assert_eq!(config.merge.name_field(), "Name");
        assert_eq!(config.output.file_name(), "{{ name }}_{{ template }}");
    }

    #[test]
    fn merge_global_and_workspace() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let global = temp.path().join("config.toml");
        fs::write(
            &global,
            r#"
[merge]
policy = "strict"
[output]
directory = "/tmp/filled"
"#,
        )?;

        let workspace_dir = temp.path().join("office");
        fs::create_dir_all(workspace_dir.join(WORKSPACE_CONFIG_DIR))?;
        let workspace = workspace_dir.join(".docfill/config.toml");
        fs::write(
            &workspace,
            r#"
[registry]
path = "forms/templates.json"
[merge]
name_field = "Client"
"#,
        )?;

        let config = Config::load_with_layers(Some(global), Some(workspace), EnvOverrides::default())?;

        assert_eq!(config.merge.policy(), SubstitutionPolicy::Strict);
        assert_eq!(config.merge.name_field(), "Client");
        assert_eq!(config.output.directory, Some(PathBuf::from("/tmp/filled")));
        assert_eq!(
            config.registry.path(),
            workspace_dir.join("forms/templates.json")
        );

        Ok(())
    }

    #[test]
    fn workspace_can_restore_default_values() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let global = temp.path().join("config.toml");
        fs::write(
            &global,
            "[merge]\npolicy = \"strict\"\nname_field = \"Client\"\n[output]\nfile_name = \"{{ date }}\"\n",
        )?;
        let workspace_dir = temp.path().join("office");
        fs::create_dir_all(workspace_dir.join(WORKSPACE_CONFIG_DIR))?;
        let workspace = workspace_dir.join(".docfill/config.toml");
        fs::write(
            &workspace,
            "[merge]\npolicy = \"lenient\"\nname_field = \"Name\"\n[output]\nfile_name = \"{{ name }}_{{ template }}\"\n",
        )?;

        let config = Config::load_with_layers(Some(global), Some(workspace), EnvOverrides::default())?;

        assert_eq!(config.merge.policy(), SubstitutionPolicy::Lenient);
        assert_eq!(config.merge.name_field(), "Name");
        assert_eq!(config.output.file_name(), "{{ name }}_{{ template }}");
        Ok(())
    }

    #[test]
    fn user_config_registry_is_relative_to_its_directory() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let global = temp.path().join("config.toml");
        fs::write(&global, "[registry]\npath = \"templates.yaml\"\n")?;
        let config = Config::load_with_layers(Some(global), None, EnvOverrides::default())?;
        assert_eq!(config.registry.path(), temp.path().join("templates.yaml"));
        Ok(())
    }

    #[test]
    fn env_overrides_take_precedence() -> Result<()> {
        let overrides = EnvOverrides::for_tests("/srv/templates.json", "strict");
        let config = Config::load_with_layers(None, None, overrides)?;
        assert_eq!(config.registry.path(), PathBuf::from("/srv/templates.json"));
        assert_eq!(config.merge.policy(), SubstitutionPolicy::Strict);
        Ok(())
    }

    #[test]
    fn invalid_env_policy_is_an_error() {
        let overrides = EnvOverrides::for_tests("templates.json", "sometimes");
        assert!(Config::load_with_layers(None, None, overrides).is_err());
    }

    #[test]
    fn invalid_config_returns_error() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let file = temp.path().join("broken.toml");
        fs::write(&file, "this is not toml")?;
        let result = Config::from_file(&file);
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn workspace_root_is_found_from_nested_directory() -> Result<()> {
        let temp = tempfile::tempdir()?;
        fs::create_dir_all(temp.path().join(WORKSPACE_CONFIG_DIR))?;
        let nested = temp.path().join("a/b");
        fs::create_dir_all(&nested)?;
        assert_eq!(find_workspace_root(&nested), Some(temp.path().to_path_buf()));
        Ok(())
    }
}
