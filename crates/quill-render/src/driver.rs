//! Process-wide settings and per-run output contexts.

use std::fs::OpenOptions;
use std::io::BufWriter;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use quill_config::{ColorModel, Config, ImageFormat, MAX_DPI, MIN_DPI};

use crate::backend::RenderBackend;
use crate::document::Document;
use crate::error::DocumentError;
use crate::xhtml::XhtmlBackend;

/// Image and output settings shared by every document a driver creates.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DriverSettings {
    /// Resolution used to size figure canvases.
    pub image_dpi: u32,
    /// Encoded image format.
    pub image_format: ImageFormat,
    /// Colour model images are converted to.
    pub color_model: ColorModel,
    /// Indent markup by nesting depth.
    pub human_readable: bool,
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self {
            image_dpi: 96,
            image_format: ImageFormat::Png,
            color_model: ColorModel::Rgb,
            human_readable: true,
        }
    }
}

impl DriverSettings {
    /// Check that the values are usable.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::InvalidSettings` if the DPI is out of range.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if !(MIN_DPI..=MAX_DPI).contains(&self.image_dpi) {
            return Err(DocumentError::InvalidSettings(format!(
                "image DPI must be between {MIN_DPI} and {MAX_DPI}, got {}",
                self.image_dpi
            )));
        }
        Ok(())
    }
}

impl From<&Config> for DriverSettings {
    fn from(config: &Config) -> Self {
        Self {
            image_dpi: config.images.dpi,
            image_format: config.images.format,
            color_model: config.images.color_model,
            human_readable: config.output_resolved.human_readable,
        }
    }
}

/// Factory for rendering contexts of one backend.
///
/// Settings may be changed from any thread; each context takes a snapshot.
#[derive(Debug)]
pub struct Driver<B: RenderBackend> {
    settings: Mutex<DriverSettings>,
    _backend: PhantomData<fn() -> B>,
}

/// Driver for the XHTML backend.
pub type XhtmlDriver = Driver<XhtmlBackend>;

impl<B: RenderBackend> Default for Driver<B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: RenderBackend> Driver<B> {
    /// Create a driver with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            settings: Mutex::new(DriverSettings::default()),
            _backend: PhantomData,
        }
    }

    /// Create a driver configured from a loaded configuration file.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::InvalidSettings` if the configured values are out of range.
    pub fn from_config(config: &Config) -> Result<Self, DocumentError> {
        let driver = Self::new();
        driver.configure(DriverSettings::from(config))?;
        Ok(driver)
    }

    /// Replace the settings used by contexts created from now on.
    ///
    /// # Errors
    ///
    /// Returns `DocumentError::InvalidSettings` and keeps the old settings if
    /// `settings` are out of range.
    pub fn configure(&self, settings: DriverSettings) -> Result<(), DocumentError> {
        settings.validate()?;
        *self.settings.lock().unwrap_or_else(PoisonError::into_inner) = settings;
        Ok(())
    }

    /// Current settings.
    pub fn settings(&self) -> DriverSettings {
        *self.settings.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a context writing into `base_dir`, creating the directory if needed.
    pub fn create_context(&self, base_dir: impl Into<PathBuf>) -> Result<Context<B>, DocumentError> {
        let dir = base_dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Context {
            dir,
            file_stem: DEFAULT_FILE_STEM.to_owned(),
            settings: self.settings(),
            created: false,
            _backend: PhantomData,
        })
    }

    /// Create a context for the output directory and stem of `config`.
    pub fn create_context_for(&self, config: &Config) -> Result<Context<B>, DocumentError> {
        Ok(self
            .create_context(&config.output_resolved.directory)?
            .with_file_stem(&config.output_resolved.file_stem))
    }
}

const DEFAULT_FILE_STEM: &str = "index";

/// One rendering run: an output directory holding one document.
#[derive(Debug)]
pub struct Context<B: RenderBackend> {
    dir: PathBuf,
    file_stem: String,
    settings: DriverSettings,
    created: bool,
    _backend: PhantomData<fn() -> B>,
}

impl<B: RenderBackend> Context<B> {
    /// Use `stem` instead of `index` as the document and image base name.
    #[must_use]
    pub fn with_file_stem(mut self, stem: impl Into<String>) -> Self {
        self.file_stem = stem.into();
        self
    }

    /// Output directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Settings snapshot taken when the context was created.
    pub fn settings(&self) -> DriverSettings {
        self.settings
    }

    /// Path of the main output file.
    pub fn document_path(&self) -> PathBuf {
        self.dir
            .join(format!("{}.{}", self.file_stem, B::FILE_EXTENSION))
    }

    /// Create the output file and a document writing into it.
    ///
    /// # Errors
    ///
    /// Returns the unmodified I/O error if the file already exists, and
    /// `DocumentError::AlreadyCreated` on a second call.
    pub fn create_document(&mut self) -> Result<Document<B>, DocumentError> {
        if self.created {
            return Err(DocumentError::AlreadyCreated);
        }
        let path = self.document_path();
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)?;
        self.created = true;
        tracing::info!(path = %path.display(), backend = B::NAME, "Created document");
        Ok(Document::new(
            BufWriter::new(file),
            path,
            self.dir.clone(),
            self.file_stem.clone(),
            self.settings,
        ))
    }

    /// Copy the backend's static resources into the output directory.
    pub fn install_resources(&self) -> Result<Vec<PathBuf>, DocumentError> {
        install_resources::<B>(&self.dir)
    }
}

/// Copy `B::RESOURCES` from the assets crate into `dir`.
pub(crate) fn install_resources<B: RenderBackend>(dir: &Path) -> Result<Vec<PathBuf>, DocumentError> {
    let mut installed = Vec::with_capacity(B::RESOURCES.len());
    for resource in B::RESOURCES {
        let data = quill_assets::get(resource.name).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("resource {} is not available", resource.name),
            )
        })?;
        let target = dir.join(resource.name);
        std::fs::write(&target, &data)?;
        installed.push(target);
    }
    tracing::info!(dir = %dir.display(), count = installed.len(), "Installed resources");
    Ok(installed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    static_assertions::assert_impl_all!(XhtmlDriver: Send, Sync);

    #[test]
    fn test_default_settings() {
        let driver = XhtmlDriver::new();
        assert_eq!(driver.settings(), DriverSettings::default());
        assert_eq!(driver.settings().image_dpi, 96);
    }

    #[test]
    fn test_configure_rejects_bad_dpi() {
        let driver = XhtmlDriver::new();
        let result = driver.configure(DriverSettings {
            image_dpi: 4000,
            ..DriverSettings::default()
        });
        assert!(matches!(result, Err(DocumentError::InvalidSettings(_))));
        assert_eq!(driver.settings().image_dpi, 96);
    }

    #[test]
    fn test_configure_from_other_thread() {
        let driver = XhtmlDriver::new();
        std::thread::scope(|scope| {
            scope.spawn(|| {
                driver
                    .configure(DriverSettings {
                        image_dpi: 300,
                        ..DriverSettings::default()
                    })
                    .unwrap();
            });
        });
        assert_eq!(driver.settings().image_dpi, 300);
    }

    #[test]
    fn test_settings_from_config() {
        let config = Config::from_toml_str(
            "[images]\ndpi = 150\nformat = \"gif\"\ncolor_model = \"gray\"\n\n[output]\nhuman_readable = false\n",
            Path::new("/project"),
        )
        .unwrap();
        let settings = DriverSettings::from(&config);
        assert_eq!(settings.image_dpi, 150);
        assert_eq!(settings.image_format, ImageFormat::Gif);
        assert_eq!(settings.color_model, ColorModel::Gray);
        assert!(!settings.human_readable);
    }

    #[test]
    fn test_context_snapshots_settings() {
        let dir = tempfile::tempdir().unwrap();
        let driver = XhtmlDriver::new();
        let context = driver.create_context(dir.path().join("out")).unwrap();
        driver
            .configure(DriverSettings {
                image_dpi: 200,
                ..DriverSettings::default()
            })
            .unwrap();
        assert_eq!(context.settings().image_dpi, 96);
        assert!(context.dir().is_dir());
    }

    #[test]
    fn test_create_document_twice_fails() {
        let dir = tempfile::tempdir().unwrap();
        let mut context = XhtmlDriver::new().create_context(dir.path()).unwrap();
        let _document = context.create_document().unwrap();
        assert!(matches!(
            context.create_document(),
            Err(DocumentError::AlreadyCreated)
        ));
    }

    #[test]
    fn test_existing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.xhtml"), "old").unwrap();
        let mut context = XhtmlDriver::new().create_context(dir.path()).unwrap();
        match context.create_document() {
            Err(DocumentError::Io(e)) => {
                assert_eq!(e.kind(), std::io::ErrorKind::AlreadyExists);
            }
            Err(other) => panic!("expected I/O error, got {other:?}"),
            Ok(_) => panic!("expected I/O error, got a document"),
        }
    }

    #[test]
    fn test_file_stem() {
        let dir = tempfile::tempdir().unwrap();
        let context = XhtmlDriver::new()
            .create_context(dir.path())
            .unwrap()
            .with_file_stem("report");
        assert_eq!(context.document_path(), dir.path().join("report.xhtml"));
    }

    #[test]
    fn test_context_for_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::from_toml_str(
            "[images]\ndpi = 300\n\n[output]\ndirectory = \"site\"\nfile_stem = \"paper\"\n",
            dir.path(),
        )
        .unwrap();
        let driver = XhtmlDriver::from_config(&config).unwrap();
        assert_eq!(driver.settings().image_dpi, 300);
        let context = driver.create_context_for(&config).unwrap();
        assert_eq!(context.document_path(), dir.path().join("site/paper.xhtml"));
        assert!(dir.path().join("site").is_dir());
    }

    #[test]
    fn test_install_resources() {
        let dir = tempfile::tempdir().unwrap();
        let context = XhtmlDriver::new().create_context(dir.path()).unwrap();
        let installed = context.install_resources().unwrap();
        assert_eq!(
            installed,
            vec![dir.path().join("screen.css"), dir.path().join("print.css")]
        );
        assert!(!std::fs::read(dir.path().join("screen.css")).unwrap().is_empty());
    }
}
