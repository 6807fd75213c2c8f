//! Pre-flight validation of client inputs
//!
//! Every operation runs these checks before touching the network, so a
//! rejected input never leaves a partial side effect behind.

use crate::error::GraderError;
use std::path::Path;

/// Image file extensions accepted for upload (case-sensitive)
pub const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "tif", "tiff"];

/// Pick the explicit value if given, otherwise the configured one
pub fn resolve<'a>(explicit: Option<&'a str>, fallback: Option<&'a str>) -> Option<&'a str> {
    explicit.or(fallback)
}

/// Check that a base URL is present and starts with `http://` or `https://`
pub fn validate_url(url: Option<&str>) -> Result<&str, GraderError> {
    let url = url.ok_or_else(|| {
        GraderError::InvalidArgument(
            "The URL is missing. Try passing the URL explicitly.".to_string(),
        )
    })?;

    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url)
    } else {
        Err(GraderError::InvalidFormat(format!(
            "The URL {} does not appear to have a properly formed 'http://' or 'https://' prefix",
            url
        )))
    }
}

/// Check that a credential is present; its content is opaque
pub fn validate_credential(credential: Option<&str>) -> Result<&str, GraderError> {
    match credential {
        Some(credential) if !credential.is_empty() => Ok(credential),
        _ => Err(GraderError::InvalidArgument(
            "The credential is missing. Try passing it explicitly.".to_string(),
        )),
    }
}

/// Check that a resource identifier is present; no schema is enforced
pub fn validate_uri(uri: Option<&str>) -> Result<&str, GraderError> {
    match uri {
        Some(uri) if !uri.is_empty() => Ok(uri),
        _ => Err(GraderError::InvalidArgument(
            "The URI is missing. Try passing it explicitly.".to_string(),
        )),
    }
}

/// Check that an image exists and has one of [`IMAGE_EXTENSIONS`]
///
/// The extension is checked first, so a wrong extension is reported even for
/// a file that exists. An empty path has no extension.
pub fn validate_image_path(path: &Path) -> Result<(), GraderError> {
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");
    if !IMAGE_EXTENSIONS.contains(&extension) {
        return Err(GraderError::NotFound {
            path: path.to_path_buf(),
            message: "The image file must have a jpg, jpeg, png, tif, or tiff extension"
                .to_string(),
        });
    }

    if !path.exists() {
        return Err(GraderError::NotFound {
            path: path.to_path_buf(),
            message: "The image file does not appear to exist".to_string(),
        });
    }

    Ok(())
}

/// Check that a download destination can receive a file of the given extension
///
/// `extension` is given without the leading dot (`json`, not `.json`). The
/// containing directory must be named and must already exist, so a bare file
/// name or an empty path is rejected.
pub fn validate_destination(path: &Path, extension: &str) -> Result<(), GraderError> {
    let directory = match path.parent() {
        Some(parent) => parent,
        None if path.has_root() => path,
        None => Path::new(""),
    };
    if directory.as_os_str().is_empty() {
        return Err(GraderError::NotFound {
            path: path.to_path_buf(),
            message: "The destination path names no directory".to_string(),
        });
    }
    if !directory.is_dir() {
        return Err(GraderError::NotFound {
            path: directory.to_path_buf(),
            message: "The directory does not appear to exist".to_string(),
        });
    }

    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if !ext.is_empty() && ext == extension => Ok(()),
        _ => Err(GraderError::InvalidFormat(format!(
            "To properly receive data, the destination file must have a {} extension",
            extension
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_prefers_explicit() {
        assert_eq!(resolve(Some("a"), Some("b")), Some("a"));
        assert_eq!(resolve(None, Some("b")), Some("b"));
        assert_eq!(resolve(Some("a"), None), Some("a"));
        assert_eq!(resolve(None, None), None);
    }

    #[test]
    fn test_validate_url_missing() {
        assert!(matches!(
            validate_url(None),
            Err(GraderError::InvalidArgument(_))
        ));
        assert!(matches!(
            validate_url(Some("")),
            Err(GraderError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_validate_url_partial_prefix() {
        for url in ["http:/grader.com", "https:grader.com", "HTTP://grader.com", "ftp://x"] {
            assert!(
                matches!(validate_url(Some(url)), Err(GraderError::InvalidFormat(_))),
                "{} should be rejected",
                url
            );
        }
    }

    #[test]
    fn test_validate_credential_and_uri() {
        assert_eq!(validate_credential(Some("token")).unwrap(), "token");
        assert!(matches!(
            validate_credential(None),
            Err(GraderError::InvalidArgument(_))
        ));
        assert_eq!(validate_uri(Some("abc123")).unwrap(), "abc123");
        assert!(matches!(
            validate_uri(Some("")),
            Err(GraderError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_validate_image_path() {
        let temp = TempDir::new().unwrap();
        let image = temp.path().join("sheet.jpeg");
        fs::write(&image, b"jpeg bytes").unwrap();

        assert!(validate_image_path(&image).is_ok());
        assert!(matches!(
            validate_image_path(&temp.path().join("missing.png")),
            Err(GraderError::NotFound { .. })
        ));
        assert!(matches!(
            validate_image_path(Path::new("")),
            Err(GraderError::NotFound { .. })
        ));
    }

    #[test]
    fn test_validate_image_path_is_case_sensitive() {
        let temp = TempDir::new().unwrap();
        let image = temp.path().join("sheet.JPG");
        fs::write(&image, b"jpeg bytes").unwrap();

        assert!(matches!(
            validate_image_path(&image),
            Err(GraderError::NotFound { .. })
        ));
    }

    #[test]
    fn test_validate_destination() {
        let temp = TempDir::new().unwrap();

        assert!(validate_destination(&temp.path().join("answers.json"), "json").is_ok());
        assert!(matches!(
            validate_destination(&temp.path().join("nested/answers.json"), "json"),
            Err(GraderError::NotFound { .. })
        ));
        assert!(matches!(
            validate_destination(&temp.path().join("answers"), "json"),
            Err(GraderError::InvalidFormat(_))
        ));
        assert!(matches!(
            validate_destination(&temp.path().join("answers.jpg"), "json"),
            Err(GraderError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_validate_destination_needs_named_directory() {
        assert!(matches!(
            validate_destination(Path::new("answers.json"), "json"),
            Err(GraderError::NotFound { .. })
        ));
        assert!(matches!(
            validate_destination(Path::new(""), "json"),
            Err(GraderError::NotFound { .. })
        ));
        assert!(matches!(
            validate_destination(Path::new("./answers.json"), "json"),
            Ok(())
        ));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_url_without_http_prefix_is_invalid_format(url in "[a-zA-Z0-9:/._-]{0,40}") {
            prop_assume!(!url.starts_with("http://") && !url.starts_with("https://"));
            prop_assert!(matches!(validate_url(Some(&url)), Err(GraderError::InvalidFormat(_))));
        }

        #[test]
        fn prop_url_with_http_prefix_is_valid(
            scheme in prop::sample::select(vec!["http://", "https://"]),
            rest in "[a-zA-Z0-9:/._-]{0,40}",
        ) {
            let url = format!("{}{}", scheme, rest);
            prop_assert_eq!(validate_url(Some(&url)).unwrap(), url.as_str());
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(30))]

        // An unsupported extension is rejected even when the file is there
        #[test]
        fn prop_unsupported_image_extension_not_found(ext in "[a-zA-Z]{1,5}") {
            prop_assume!(!IMAGE_EXTENSIONS.contains(&ext.as_str()));
            let temp = TempDir::new().unwrap();
            let image = temp.path().join(format!("sheet.{}", ext));
            fs::write(&image, b"bytes").unwrap();

            let is_not_found = matches!(
                validate_image_path(&image),
                Err(GraderError::NotFound { .. })
            );
            prop_assert!(is_not_found);
        }

        #[test]
        fn prop_destination_valid_iff_dir_exists_and_extension_matches(
            ext in prop::sample::select(vec!["json", "jpg", "png", "txt", ""]),
            required in prop::sample::select(vec!["json", "jpg"]),
            dir_exists in any::<bool>(),
        ) {
            let temp = TempDir::new().unwrap();
            let dir = if dir_exists { temp.path().to_path_buf() } else { temp.path().join("absent") };
            let name = if ext.is_empty() { "download".to_string() } else { format!("download.{}", ext) };
            let destination = dir.join(name);

            let expected = dir_exists && ext == required;
            prop_assert_eq!(validate_destination(&destination, required).is_ok(), expected);
        }
    }
}
