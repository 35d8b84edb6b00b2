//! Object path helpers
//!
//! Paths inside a volume always use `/`, whatever the host OS. A trailing
//! `/` marks a directory entry; its absence marks a leaf file.

/// Separator used in volume-relative paths
pub const SLASH_SEPARATOR: &str = "/";

/// Check whether `s` ends with `suffix`
pub fn has_suffix(s: &str, suffix: &str) -> bool {
    s.ends_with(suffix)
}

/// Whether a volume-relative path names a directory
pub fn is_dir_path(path: &str) -> bool {
    has_suffix(path, SLASH_SEPARATOR)
}

/// Ensure a non-empty path ends with the separator
pub fn retain_slash(s: &str) -> String {
    if s.is_empty() || has_suffix(s, SLASH_SEPARATOR) {
        s.to_string()
    } else {
        format!("{s}{SLASH_SEPARATOR}")
    }
}

/// Lexically clean a `/`-separated path.
///
/// Collapses repeated separators, drops `.` elements and resolves `..`
/// against the preceding element. An empty result becomes `.`.
pub fn clean(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let rooted = path.starts_with(SLASH_SEPARATOR);
    let mut parts: Vec<&str> = Vec::new();

    for part in path.split(SLASH_SEPARATOR) {
        match part {
            "" | "." => {}
            ".." => {
                if parts.last().is_some_and(|p| *p != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            p => parts.push(p),
        }
    }

    let joined = parts.join(SLASH_SEPARATOR);
    if rooted {
        format!("{SLASH_SEPARATOR}{joined}")
    } else if joined.is_empty() {
        ".".to_string()
    } else {
        joined
    }
}

/// Join path elements and clean the result, keeping the trailing
/// separator of the last element.
///
/// Empty elements are ignored; joining nothing but empty elements yields
/// an empty string.
pub fn path_join(elements: &[&str]) -> String {
    let trailing_slash = elements.last().is_some_and(|last| is_dir_path(last));

    let non_empty: Vec<&str> = elements.iter().copied().filter(|e| !e.is_empty()).collect();
    if non_empty.is_empty() {
        return String::new();
    }

    let cleaned = clean(&non_empty.join(SLASH_SEPARATOR));
    if trailing_slash && cleaned != SLASH_SEPARATOR {
        retain_slash(&cleaned)
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retain_slash() {
        assert_eq!(retain_slash(""), "");
        assert_eq!(retain_slash("tmp"), "tmp/");
        assert_eq!(retain_slash("tmp/"), "tmp/");
    }

    #[test]
    fn test_clean() {
        assert_eq!(clean(""), ".");
        assert_eq!(clean("a//b/./c"), "a/b/c");
        assert_eq!(clean("a/b/../c"), "a/c");
        assert_eq!(clean("../a"), "../a");
        assert_eq!(clean("/../a"), "/a");
        assert_eq!(clean("a/.."), ".");
    }

    #[test]
    fn test_path_join() {
        assert_eq!(path_join(&[]), "");
        assert_eq!(path_join(&["", ""]), "");
        assert_eq!(path_join(&["tmp"]), "tmp");
        assert_eq!(path_join(&["a/", "b"]), "a/b");
        assert_eq!(path_join(&["a/", "c/"]), "a/c/");
        assert_eq!(path_join(&["a//", "/c/"]), "a/c/");
        assert_eq!(path_join(&["/"]), "/");
    }

    #[test]
    fn test_is_dir_path() {
        assert!(is_dir_path("a/c/"));
        assert!(!is_dir_path("a/c"));
        assert!(!is_dir_path(""));
    }
}
