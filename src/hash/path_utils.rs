// Path identity utilities
// File references are compared as plain strings; no normalization is done

/// Return the file name component of a path string
///
/// Both `/` and `\` count as separators regardless of platform, so a
/// Windows-style path entered on Unix (or read from a checksum file)
/// still yields its file name.
pub fn file_name_of(path: &str) -> &str {
    match path.rfind(&['/', '\\'][..]) {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}

/// Identity key of a path under the given policy
pub fn identity_key(path: &str, use_full_path: bool) -> &str {
    if use_full_path {
        path
    } else {
        file_name_of(path)
    }
}

/// Case-insensitive equality used for identity keys and hash codes
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        return a.eq_ignore_ascii_case(b);
    }
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}
