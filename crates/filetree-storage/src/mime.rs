//! Extension-based MIME type guessing.

/// Fallback for content whose type cannot be guessed.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Guess a MIME type from the extension of a path or file name.
pub fn guess_from_path(path: &str) -> Option<&'static str> {
    mime_guess::from_path(path).first_raw()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_from_path() {
        assert_eq!(guess_from_path("report.pdf"), Some("application/pdf"));
        assert_eq!(guess_from_path("a/b/IMG.PNG"), Some("image/png"));
        assert_eq!(guess_from_path("notes.txt"), Some("text/plain"));
        assert_eq!(guess_from_path("noext"), None);
        assert_eq!(guess_from_path("file.notarealext"), None);
    }
}
