//! Path segmentation, grounded in `src/common/misc/str-utils.c`'s
//! `PINT_string_next_segment`.
//!
//! Reference: spec.md §4.5.1 Lookup, §8 "Path segmentation is lossless".

use crate::error::PvfsTypeError;

pub const MAX_SEGMENT_LEN: usize = 256;

/// Splits a normalized path into its `/`-delimited segments.
///
/// Each segment is non-empty, ≤ [`MAX_SEGMENT_LEN`] bytes, and contains no
/// embedded slash (slashes are the delimiter, not part of a segment). The
/// empty path is invalid; a leading slash is required.
pub fn segments(path: &str) -> crate::Result<Vec<&str>> {
    if path.is_empty() {
        return Err(PvfsTypeError::EmptyPath);
    }
    if !path.starts_with('/') {
        return Err(PvfsTypeError::NoLeadingSlash);
    }

    let mut out = Vec::new();
    for part in path.split('/') {
        if part.is_empty() {
            continue;
        }
        if part.len() > MAX_SEGMENT_LEN {
            return Err(PvfsTypeError::SegmentTooLong {
                max: MAX_SEGMENT_LEN,
            });
        }
        out.push(part);
    }
    Ok(out)
}

/// Canonicalizes a path: collapses repeated slashes, drops a trailing
/// slash (other than the root itself), and rejects `..`/`.` traversal
/// components above what the caller should ever see reach the wire.
///
/// Reference: spec.md §4.5.1 step 1 ("Normalize the path. Reject `..`
/// traversals above root.").
pub fn normalize(path: &str) -> crate::Result<String> {
    let segs = segments(path)?;
    let mut stack: Vec<&str> = Vec::new();
    for seg in segs {
        match seg {
            "." => continue,
            ".." => {
                if stack.pop().is_none() {
                    return Err(PvfsTypeError::PathAboveRoot);
                }
            }
            _ => stack.push(seg),
        }
    }
    Ok(format!("/{}", stack.join("/")))
}

/// Reconstructs a canonical path from its segments, the inverse of
/// [`segments`] for any already-canonicalized input (spec.md §8 "Path
/// segmentation is lossless").
pub fn join(segs: &[&str]) -> String {
    format!("/{}", segs.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_and_missing_leading_slash() {
        assert!(segments("").is_err());
        assert!(segments("a/b").is_err());
    }

    #[test]
    fn splits_on_slashes_and_drops_empties() {
        assert_eq!(segments("/a/b/c").unwrap(), vec!["a", "b", "c"]);
        assert_eq!(segments("/a//b///c/").unwrap(), vec!["a", "b", "c"]);
        assert_eq!(segments("/").unwrap(), Vec::<&str>::new());
    }

    #[test]
    fn rejects_overlong_segment() {
        let long = "a".repeat(MAX_SEGMENT_LEN + 1);
        let path = format!("/{long}");
        assert!(segments(&path).is_err());
    }

    #[test]
    fn join_is_lossless_round_trip_of_segments() {
        let path = "/a/b/c";
        let segs = segments(path).unwrap();
        assert_eq!(join(&segs), path);
    }

    #[test]
    fn normalize_collapses_dot_and_dotdot() {
        assert_eq!(normalize("/a/./b/../c").unwrap(), "/a/c");
        assert_eq!(normalize("/a//b").unwrap(), "/a/b");
    }

    #[test]
    fn normalize_rejects_traversal_above_root() {
        assert!(normalize("/../a").is_err());
    }
}
