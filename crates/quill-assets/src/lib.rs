//! Static resources copied next to rendered documents.
//!
//! Provides a single API for accessing the stylesheets in both embedded and
//! filesystem modes:
//!
//! - **`embed` feature on**: Files are compiled into the library via `rust-embed`
//! - **`embed` feature off**: Files are read from the crate's `styles/` directory at runtime

use std::borrow::Cow;
#[cfg(not(feature = "embed"))]
use std::path::Path;

/// Embedded stylesheets (only available with `embed` feature).
#[cfg(feature = "embed")]
#[derive(rust_embed::RustEmbed)]
#[folder = "styles"]
#[prefix = ""]
struct Styles;

/// Directory for filesystem-based resource loading.
#[cfg(not(feature = "embed"))]
const STYLES_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/styles");

/// Stylesheet applied on screens.
pub const SCREEN_CSS: &str = "screen.css";
/// Stylesheet applied when printing.
pub const PRINT_CSS: &str = "print.css";

/// Get a resource by name (relative to `styles/`).
///
/// Returns the file contents if the resource exists, `None` otherwise.
#[cfg(feature = "embed")]
pub fn get(name: &str) -> Option<Cow<'static, [u8]>> {
    Styles::get(name).map(|f| f.data)
}

/// Get a resource by name (relative to `styles/`).
///
/// Returns the file contents if the resource exists, `None` otherwise.
#[cfg(not(feature = "embed"))]
pub fn get(name: &str) -> Option<Cow<'static, [u8]>> {
    let full_path = Path::new(STYLES_DIR).join(name);
    std::fs::read(&full_path).ok().map(Cow::Owned)
}

/// Iterate all available resource names.
#[cfg(feature = "embed")]
pub fn iter() -> impl Iterator<Item = Cow<'static, str>> {
    Styles::iter()
}

/// Iterate all available resource names.
#[cfg(not(feature = "embed"))]
pub fn iter() -> impl Iterator<Item = Cow<'static, str>> {
    let mut names: Vec<String> = std::fs::read_dir(STYLES_DIR)
        .into_iter()
        .flatten()
        .flatten()
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names.into_iter().map(Cow::Owned)
}

/// Return the MIME type string for the given file name.
pub fn mime_for(name: &str) -> &'static str {
    mime_guess::from_path(name)
        .first_raw()
        .unwrap_or("application/octet-stream")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_for_known_types() {
        assert_eq!(mime_for("screen.css"), "text/css");
        assert_eq!(mime_for("figure1.png"), "image/png");
        assert_eq!(mime_for("figure1.gif"), "image/gif");
    }

    #[test]
    fn test_mime_for_unknown_type() {
        assert_eq!(mime_for("file.unknown_ext_xyz"), "application/octet-stream");
    }

    #[test]
    fn test_get_nonexistent_resource() {
        assert!(get("nonexistent_file_that_does_not_exist.txt").is_none());
    }

    #[test]
    fn test_stylesheets_are_available() {
        for name in [SCREEN_CSS, PRINT_CSS] {
            let data = get(name).unwrap_or_else(|| panic!("missing {name}"));
            assert!(!data.is_empty());
        }
        let names: Vec<_> = iter().collect();
        assert!(names.iter().any(|n| n == SCREEN_CSS));
        assert!(names.iter().any(|n| n == PRINT_CSS));
    }
}
