pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Best-effort content type for an object key, derived from its extension.
pub fn resolve_content_type(path: &str) -> String {
    mime_guess::from_path(path)
        .first_raw()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string()
}
