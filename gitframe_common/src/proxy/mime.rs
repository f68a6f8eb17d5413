//! Extension to MIME type table for raw blobs.

use std::{collections::HashMap, path::Path};

use once_cell::sync::Lazy;

/// Fallback for raw blobs whose type is unknown or not guessed.
pub const DEFAULT_BLOB_MIME: &str = "text/plain";

const BASE_MIME_TYPES: &[(&str, &str)] = &[
    ("ada", "text/x-ada"),
    ("asm", "text/x-asm"),
    ("asp", "text/x-asp"),
    ("awk", "text/x-awk"),
    ("bmp", "image/bmp"),
    ("c", "text/x-csrc"),
    ("cc", "text/x-c++src"),
    ("cpp", "text/x-c++src"),
    ("cs", "text/x-csharp"),
    ("css", "text/css"),
    ("csv", "text/csv"),
    ("diff", "text/x-diff"),
    ("el", "text/x-elisp"),
    ("f", "text/x-fortran"),
    ("gif", "image/gif"),
    ("h", "text/x-chdr"),
    ("hh", "text/x-c++hdr"),
    ("hpp", "text/x-c++hdr"),
    ("hs", "text/x-haskell"),
    ("htm", "text/html"),
    ("html", "text/html"),
    ("ico", "image/x-icon"),
    ("idl", "text/x-idl"),
    ("ini", "text/x-ini"),
    ("java", "text/x-java"),
    ("jpeg", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("js", "text/x-javascript"),
    ("json", "application/json"),
    ("lua", "text/x-lua"),
    ("m", "text/x-objc"),
    ("m4", "text/x-m4"),
    ("mk", "text/x-makefile"),
    ("ml", "text/x-ocaml"),
    ("patch", "text/x-diff"),
    ("pdf", "application/pdf"),
    ("php", "text/x-php"),
    ("pl", "text/x-perl"),
    ("pm", "text/x-perl"),
    ("ps", "application/postscript"),
    ("py", "text/x-python"),
    ("rb", "text/x-ruby"),
    ("rs", "text/x-rust"),
    ("rst", "text/x-rst"),
    ("scm", "text/x-scheme"),
    ("sh", "application/x-sh"),
    ("sql", "text/x-sql"),
    ("svg", "image/svg+xml"),
    ("tcl", "text/x-tcl"),
    ("tex", "text/x-tex"),
    ("txt", "text/plain"),
    ("vb", "text/x-vba"),
    ("xml", "text/xml"),
    ("xsl", "text/xsl"),
    ("y", "text/x-yacc"),
    ("yaml", "text/x-yaml"),
    ("yml", "text/x-yaml"),
    ("zip", "application/zip"),
];

/// Applied on top of the base table.
const MIME_OVERRIDES: &[(&str, &str)] = &[("png", "image/png")];

static MIME_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut map: HashMap<_, _> = BASE_MIME_TYPES.iter().copied().collect();
    map.extend(MIME_OVERRIDES.iter().copied());
    map
});

/// Looks up an extension given without its dot. Matching is case-sensitive.
pub fn mime_for_extension(extension: &str) -> Option<&'static str> {
    MIME_MAP.get(extension).copied()
}

/// Looks up the extension of the last path component. Dotfiles such as `.gitignore` have
/// no extension.
pub fn mime_for_filename(filename: &str) -> Option<&'static str> {
    Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(mime_for_extension)
}

/// MIME type sent for a `blob_plain` page of `filename`.
pub fn blob_mime_type(send_mime_override: bool, filename: Option<&str>) -> &'static str {
    if !send_mime_override {
        return DEFAULT_BLOB_MIME;
    }

    mime_for_filename(filename.unwrap_or("")).unwrap_or(DEFAULT_BLOB_MIME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_entry_wins() {
        assert_eq!(mime_for_extension("png"), Some("image/png"));
        assert_eq!(mime_for_extension("PNG"), None);
    }

    #[test]
    fn filenames_use_their_last_extension() {
        assert_eq!(mime_for_filename("docs/logo.png"), Some("image/png"));
        assert_eq!(mime_for_filename("src/lib.rs"), Some("text/x-rust"));
        assert_eq!(mime_for_filename("dist/release.tar.zip"), Some("application/zip"));
        assert_eq!(mime_for_filename(".gitignore"), None);
        assert_eq!(mime_for_filename("Makefile"), None);
    }

    #[test]
    fn blob_type_is_guessed_only_with_the_override() {
        assert_eq!(blob_mime_type(true, Some("img/a.png")), "image/png");
        assert_eq!(blob_mime_type(false, Some("img/a.png")), "text/plain");
        assert_eq!(blob_mime_type(true, Some("README")), "text/plain");
        assert_eq!(blob_mime_type(true, Some("archive.unknownext")), "text/plain");
        assert_eq!(blob_mime_type(true, None), "text/plain");
    }
}
