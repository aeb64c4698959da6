use directories::ProjectDirs;
use eyre::ContextCompat as _;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct ToolPaths {
    pub config_dir: PathBuf,
    pub data_dir: PathBuf,
    pub log_file: PathBuf,
}

impl ToolPaths {
    pub fn discover() -> eyre::Result<Self> {
        // Test/CI override knobs. Either may be set on its own.
        let env_dir = |var: &str| {
            std::env::var_os(var)
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
        };
        let config_override = env_dir("MM_MNEMONIC_CONFIG_DIR");
        let data_override = env_dir("MM_MNEMONIC_DATA_DIR");

        let (config_dir, data_dir) = match (config_override, data_override) {
            (Some(c), Some(d)) => (c, d),
            (c, d) => {
                // macOS: ~/Library/Application Support/mm-mnemonic
                // Linux: ~/.config/mm-mnemonic, ~/.local/share/mm-mnemonic
                // Windows: %APPDATA%\\mm-mnemonic
                let proj = ProjectDirs::from("", "", "mm-mnemonic")
                    .context("failed to resolve project dirs")?;
                (
                    c.unwrap_or_else(|| proj.config_dir().to_path_buf()),
                    d.unwrap_or_else(|| proj.data_dir().to_path_buf()),
                )
            }
        };

        let log_file = data_dir.join("mm-mnemonic.log.jsonl");
        Ok(Self {
            config_dir,
            data_dir,
            log_file,
        })
    }

    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.toml")
    }
}
