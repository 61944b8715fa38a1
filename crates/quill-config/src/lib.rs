//! Configuration management for quill.
//!
//! Parses `quill.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! Programmatic settings can be layered on top during load via [`Overrides`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//! - `~` - expands to the home directory
//!
//! Expanded fields:
//! - `output.directory`
//! - `output.file_stem`

mod expand;

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct Overrides {
    /// Override image resolution.
    pub image_dpi: Option<u32>,
    /// Override image file format.
    pub image_format: Option<ImageFormat>,
    /// Override image colour model.
    pub color_model: Option<ColorModel>,
    /// Override output directory.
    pub output_dir: Option<PathBuf>,
    /// Override output file stem.
    pub file_stem: Option<String>,
    /// Override human-readable (indented) output.
    pub human_readable: Option<bool>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "quill.toml";

/// Smallest accepted image resolution.
pub const MIN_DPI: u32 = 16;
/// Largest accepted image resolution.
pub const MAX_DPI: u32 = 1200;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Raster image configuration.
    pub images: ImagesConfig,
    /// Output configuration (paths are relative strings from TOML).
    #[serde(default)]
    output: OutputConfigRaw,

    /// Resolved output configuration (set after loading).
    #[serde(skip)]
    pub output_resolved: OutputConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// File format for raster figures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Portable Network Graphics.
    #[default]
    Png,
    /// JPEG.
    Jpeg,
    /// Graphics Interchange Format.
    Gif,
}

impl ImageFormat {
    /// File extension without the leading dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Gif => "gif",
        }
    }
}

/// Colour model raster figures are converted to before encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorModel {
    /// Full colour.
    #[default]
    Rgb,
    /// 8-bit grey scale.
    Gray,
    /// Two-level black and white.
    BlackWhite,
}

/// Raster image configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    /// Dots per inch used to size figure canvases.
    pub dpi: u32,
    /// Encoded file format.
    pub format: ImageFormat,
    /// Colour model.
    pub color_model: ColorModel,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            dpi: 96,
            format: ImageFormat::Png,
            color_model: ColorModel::Rgb,
        }
    }
}

/// Raw output configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct OutputConfigRaw {
    directory: Option<String>,
    file_stem: Option<String>,
    human_readable: Option<bool>,
}

/// Resolved output configuration with absolute paths.
#[derive(Debug)]
pub struct OutputConfig {
    /// Directory the document and its resources are written to.
    pub directory: PathBuf,
    /// Base name of the document file and its images.
    pub file_stem: String,
    /// Whether markup is indented by nesting depth.
    pub human_readable: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("out"),
            file_stem: "index".to_owned(),
            human_readable: true,
        }
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`output.directory`").
        field: String,
        /// Error message (e.g., "${`QUILL_OUT`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a file stem to be a bare name.
fn require_bare_name(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.contains(['/', '\\']) || value == "." || value == ".." {
        return Err(ConfigError::Validation(format!(
            "{field} must be a file name without directories"
        )));
    }
    Ok(())
}

impl Config {
    /// Load configuration from file with optional overrides.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `quill.toml` in current directory and parents.
    ///
    /// Overrides are applied after loading and path resolution and the
    /// result is validated once more.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the final values are out of range.
    pub fn load(
        config_path: Option<&Path>,
        overrides: Option<&Overrides>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(overrides) = overrides {
            config.apply_overrides(overrides);
            config.validate()?;
        }

        Ok(config)
    }

    /// Parse configuration from a TOML string, resolving paths against `base`.
    ///
    /// # Errors
    ///
    /// Returns error if parsing, expansion or validation fails.
    pub fn from_toml_str(content: &str, base: &Path) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        config.expand_env_vars()?;
        config.resolve_paths(base);
        config.validate()?;
        Ok(config)
    }

    /// Apply overrides to the configuration.
    fn apply_overrides(&mut self, overrides: &Overrides) {
        if let Some(dpi) = overrides.image_dpi {
            self.images.dpi = dpi;
        }
        if let Some(format) = overrides.image_format {
            self.images.format = format;
        }
        if let Some(color_model) = overrides.color_model {
            self.images.color_model = color_model;
        }
        if let Some(dir) = &overrides.output_dir {
            self.output_resolved.directory.clone_from(dir);
        }
        if let Some(stem) = &overrides.file_stem {
            self.output_resolved.file_stem.clone_from(stem);
        }
        if let Some(human_readable) = overrides.human_readable {
            self.output_resolved.human_readable = human_readable;
        }
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_images()?;
        self.validate_output()?;
        Ok(())
    }

    fn validate_images(&self) -> Result<(), ConfigError> {
        let dpi = self.images.dpi;
        if !(MIN_DPI..=MAX_DPI).contains(&dpi) {
            return Err(ConfigError::Validation(format!(
                "images.dpi must be between {MIN_DPI} and {MAX_DPI}, got {dpi}"
            )));
        }
        Ok(())
    }

    fn validate_output(&self) -> Result<(), ConfigError> {
        require_non_empty(&self.output_resolved.file_stem, "output.file_stem")?;
        require_bare_name(&self.output_resolved.file_stem, "output.file_stem")?;
        Ok(())
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let mut current = std::env::current_dir().ok()?;
        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                return Some(candidate);
            }
            if !current.pop() {
                return None;
            }
        }
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            images: ImagesConfig::default(),
            output: OutputConfigRaw::default(),
            output_resolved: OutputConfig {
                directory: base.join("out"),
                ..OutputConfig::default()
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config_dir = path.parent().unwrap_or(Path::new("."));
        let mut config = Self::from_toml_str(&content, config_dir)?;
        config.config_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref dir) = self.output.directory {
            self.output.directory = Some(expand::expand_env(dir, "output.directory")?);
        }
        if let Some(ref stem) = self.output.file_stem {
            self.output.file_stem = Some(expand::expand_env(stem, "output.file_stem")?);
        }
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let defaults = OutputConfig::default();
        self.output_resolved = OutputConfig {
            directory: config_dir.join(self.output.directory.as_deref().unwrap_or("out")),
            file_stem: self
                .output
                .file_stem
                .clone()
                .unwrap_or(defaults.file_stem),
            human_readable: self.output.human_readable.unwrap_or(defaults.human_readable),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default_with_base(Path::new("/test"));
        assert_eq!(config.images.dpi, 96);
        assert_eq!(config.images.format, ImageFormat::Png);
        assert_eq!(config.images.color_model, ColorModel::Rgb);
        assert_eq!(config.output_resolved.directory, PathBuf::from("/test/out"));
        assert_eq!(config.output_resolved.file_stem, "index");
        assert!(config.output_resolved.human_readable);
    }

    #[test]
    fn test_parse_minimal_config() {
        let config = Config::from_toml_str("", Path::new("/project")).unwrap();
        assert_eq!(config.images.dpi, 96);
        assert_eq!(
            config.output_resolved.directory,
            PathBuf::from("/project/out")
        );
    }

    #[test]
    fn test_parse_images_config() {
        let toml = r#"
[images]
dpi = 300
format = "jpeg"
color_model = "black_white"
"#;
        let config = Config::from_toml_str(toml, Path::new("/project")).unwrap();
        assert_eq!(config.images.dpi, 300);
        assert_eq!(config.images.format, ImageFormat::Jpeg);
        assert_eq!(config.images.color_model, ColorModel::BlackWhite);
    }

    #[test]
    fn test_unknown_format_is_parse_error() {
        let toml = r#"
[images]
format = "bmp"
"#;
        let err = Config::from_toml_str(toml, Path::new("/project")).unwrap_err();
        assert!(
            matches!(err, ConfigError::Parse(_)),
            "Expected ConfigError::Parse, got {err:?}"
        );
    }

    #[test]
    fn test_resolve_paths() {
        let toml = r#"
[output]
directory = "build/report"
file_stem = "report"
human_readable = false
"#;
        let config = Config::from_toml_str(toml, Path::new("/project")).unwrap();
        assert_eq!(
            config.output_resolved.directory,
            PathBuf::from("/project/build/report")
        );
        assert_eq!(config.output_resolved.file_stem, "report");
        assert!(!config.output_resolved.human_readable);
    }

    #[test]
    fn test_absolute_directory_is_kept() {
        let toml = r#"
[output]
directory = "/var/quill"
"#;
        let config = Config::from_toml_str(toml, Path::new("/project")).unwrap();
        assert_eq!(
            config.output_resolved.directory,
            PathBuf::from("/var/quill")
        );
    }

    #[test]
    fn test_directory_default_expansion() {
        let toml = r#"
[output]
directory = "${QUILL_TEST_SURELY_UNSET:-fallback}"
"#;
        let config = Config::from_toml_str(toml, Path::new("/project")).unwrap();
        assert_eq!(
            config.output_resolved.directory,
            PathBuf::from("/project/fallback")
        );
    }

    #[test]
    fn test_dpi_out_of_range() {
        for dpi in [0, 15, 1201] {
            let toml = format!("[images]\ndpi = {dpi}\n");
            let err = Config::from_toml_str(&toml, Path::new("/project")).unwrap_err();
            assert!(
                matches!(err, ConfigError::Validation(_)),
                "Expected ConfigError::Validation for {dpi}, got {err:?}"
            );
            assert!(err.to_string().contains("images.dpi"));
        }
    }

    #[test]
    fn test_dpi_bounds_are_inclusive() {
        for dpi in [MIN_DPI, MAX_DPI] {
            let toml = format!("[images]\ndpi = {dpi}\n");
            let config = Config::from_toml_str(&toml, Path::new("/project")).unwrap();
            assert_eq!(config.images.dpi, dpi);
        }
    }

    #[test]
    fn test_empty_stem_is_rejected() {
        let toml = r#"
[output]
file_stem = ""
"#;
        let err = Config::from_toml_str(toml, Path::new("/project")).unwrap_err();
        assert!(err.to_string().contains("output.file_stem cannot be empty"));
    }

    #[test]
    fn test_stem_with_directory_is_rejected() {
        let toml = r#"
[output]
file_stem = "nested/index"
"#;
        let err = Config::from_toml_str(toml, Path::new("/project")).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = Config::default_with_base(Path::new("/test"));
        let overrides = Overrides {
            image_dpi: Some(200),
            image_format: Some(ImageFormat::Gif),
            output_dir: Some(PathBuf::from("/elsewhere")),
            ..Default::default()
        };

        config.apply_overrides(&overrides);

        assert_eq!(config.images.dpi, 200);
        assert_eq!(config.images.format, ImageFormat::Gif);
        assert_eq!(config.images.color_model, ColorModel::Rgb); // Unchanged
        assert_eq!(
            config.output_resolved.directory,
            PathBuf::from("/elsewhere")
        );
        assert_eq!(config.output_resolved.file_stem, "index"); // Unchanged
    }

    #[test]
    fn test_load_explicit_missing_file() {
        let result = Config::load(Some(Path::new("/nonexistent/quill.toml")), None);
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quill.toml");
        std::fs::write(&path, "[images]\ndpi = 150\n\n[output]\ndirectory = \"site\"\n")
            .unwrap();

        let config = Config::load(Some(&path), None).unwrap();

        assert_eq!(config.images.dpi, 150);
        assert_eq!(config.output_resolved.directory, dir.path().join("site"));
        assert_eq!(config.config_path, Some(path));
    }

    #[test]
    fn test_load_rejects_invalid_override() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quill.toml");
        std::fs::write(&path, "").unwrap();
        let overrides = Overrides {
            image_dpi: Some(5000),
            ..Default::default()
        };

        let result = Config::load(Some(&path), Some(&overrides));

        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_image_format_extension() {
        assert_eq!(ImageFormat::Png.extension(), "png");
        assert_eq!(ImageFormat::Jpeg.extension(), "jpg");
        assert_eq!(ImageFormat::Gif.extension(), "gif");
    }
}
