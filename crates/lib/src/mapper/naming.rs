//! Identifier ↔ path derivation for section fields.
//!
//! An underscore in a field identifier starts a new path segment, and every
//! uppercase character after the first position of a segment becomes a
//! hyphen followed by its lowercase form: `maxConnections` maps to
//! `max-connections` and `pool_maxSize` to `pool.max-size`. Runs of capitals
//! are not collapsed, so `maxTTL` maps to `max-t-t-l`; that keeps the
//! derivation invertible. For lower camel case identifiers the two directions
//! are exact inverses.

use crate::path::Path;

/// Derives the default path of a field from its identifier.
///
/// ```
/// # use cfgtree::mapper::naming::derive_path;
/// assert_eq!(derive_path("listenPort").to_string(), "listen-port");
/// assert_eq!(derive_path("tls_certFile").to_string(), "tls.cert-file");
/// ```
pub fn derive_path(identifier: &str) -> Path {
    identifier
        .split('_')
        .filter(|segment| !segment.is_empty())
        .map(derive_segment)
        .collect()
}

fn derive_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len() + 4);
    for (i, c) in segment.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                out.push('-');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Rebuilds the identifier a derived path came from.
///
/// ```
/// # use cfgtree::mapper::naming::{derive_path, identifier_for};
/// let path = derive_path("tls_certFile");
/// assert_eq!(identifier_for(&path), "tls_certFile");
/// ```
pub fn identifier_for(path: &Path) -> String {
    path.iter()
        .map(|segment| {
            let mut out = String::with_capacity(segment.len());
            let mut upper_next = false;
            for c in segment.chars() {
                if c == '-' {
                    upper_next = true;
                } else if upper_next {
                    out.extend(c.to_uppercase());
                    upper_next = false;
                } else {
                    out.push(c);
                }
            }
            out
        })
        .collect::<Vec<_>>()
        .join("_")
}
