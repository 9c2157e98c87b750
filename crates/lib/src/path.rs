//! Path types for addressing nodes inside a configuration tree.
//!
//! A [`Path`] is an ordered sequence of segments. It is purely structural: it
//! never folds case or trims segments. Key normalization is the job of the
//! [`MapNode`](crate::node::MapNode) that stores the entries, which applies its
//! [`KeyPolicy`](crate::node::KeyPolicy) at lookup and insert time.
//!
//! # Usage
//!
//! ```rust
//! use cfgtree::path::Path;
//! use std::str::FromStr;
//!
//! let path = Path::from_str("server.tls.cert")?;
//! assert_eq!(path.first(), Some("server"));
//! assert!(!path.is_base_path());
//!
//! let rest = path.sub_path()?;
//! assert_eq!(rest.as_string('/'), "tls/cert");
//! assert_eq!(rest.as_sub_path("server"), path);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{fmt, str::FromStr};

pub use errors::PathError;

pub mod errors;

/// The delimiter used by [`Display`](fmt::Display) and [`FromStr`].
pub const DEFAULT_DELIMITER: char = '.';

/// An owned, ordered sequence of path segments.
///
/// Segments may contain any characters, including the delimiter of some other
/// rendering; the delimiter only matters when a path is parsed from or rendered
/// to text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Path {
    segments: Vec<String>,
}

impl Path {
    /// Creates a path from an iterator of segments.
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Creates an empty path. The empty path addresses the container itself.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a base path holding exactly one segment.
    pub fn from_segment(segment: impl Into<String>) -> Self {
        Self {
            segments: vec![segment.into()],
        }
    }

    /// Parses `text` using `delimiter` between segments.
    ///
    /// Empty segments produced by leading, trailing or doubled delimiters are
    /// dropped, so `".a..b."` parses to `["a", "b"]`.
    ///
    /// ```rust
    /// # use cfgtree::path::Path;
    /// let path = Path::parse("a/b/c", '/');
    /// assert_eq!(path.segments(), ["a", "b", "c"]);
    /// assert!(Path::parse("", '.').is_empty());
    /// ```
    pub fn parse(text: &str, delimiter: char) -> Self {
        Self::new(text.split(delimiter).filter(|segment| !segment.is_empty()))
    }

    /// Returns `true` iff exactly one segment remains.
    pub fn is_base_path(&self) -> bool {
        self.segments.len() == 1
    }

    /// Returns the first segment, or `None` for the empty path.
    pub fn first(&self) -> Option<&str> {
        self.segments.first().map(String::as_str)
    }

    /// Returns the last segment, or `None` for the empty path.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Returns this path without its first segment.
    ///
    /// # Errors
    /// [`PathError::BasePath`] if only one segment remains and
    /// [`PathError::Empty`] for the empty path.
    pub fn sub_path(&self) -> Result<Path, PathError> {
        match self.segments.len() {
            0 => Err(PathError::Empty),
            1 => Err(PathError::BasePath {
                path: self.to_string(),
            }),
            _ => Ok(Path {
                segments: self.segments[1..].to_vec(),
            }),
        }
    }

    /// Returns a new path with `segment` prepended.
    pub fn as_sub_path(&self, segment: impl Into<String>) -> Path {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.push(segment.into());
        segments.extend(self.segments.iter().cloned());
        Path { segments }
    }

    /// Renders the path with `delimiter` between segments.
    pub fn as_string(&self, delimiter: char) -> String {
        let mut rendered = String::new();
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                rendered.push(delimiter);
            }
            rendered.push_str(segment);
        }
        rendered
    }

    /// Appends a segment (builder style).
    pub fn push(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Appends every segment of `other`.
    pub fn join(mut self, other: &Path) -> Self {
        self.segments.extend(other.segments.iter().cloned());
        self
    }

    /// Returns the path without its last segment, or `None` for the empty path.
    pub fn parent(&self) -> Option<Path> {
        if self.segments.is_empty() {
            None
        } else {
            Some(Path {
                segments: self.segments[..self.segments.len() - 1].to_vec(),
            })
        }
    }

    /// Returns `true` if `prefix` matches the leading segments exactly.
    pub fn starts_with(&self, prefix: &Path) -> bool {
        self.segments.starts_with(&prefix.segments)
    }

    /// Removes `prefix` from the front of this path.
    pub fn strip_prefix(&self, prefix: &Path) -> Option<Path> {
        self.segments
            .strip_prefix(prefix.segments.as_slice())
            .map(|rest| Path {
                segments: rest.to_vec(),
            })
    }

    /// Returns the segments as a slice.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns an iterator over the segments as string slices.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().map(String::as_str)
    }

    /// Returns the number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns `true` if the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            write!(f, "(empty path)")
        } else {
            write!(f, "{}", self.as_string(DEFAULT_DELIMITER))
        }
    }
}

impl FromStr for Path {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s, DEFAULT_DELIMITER))
    }
}

impl From<&str> for Path {
    fn from(value: &str) -> Self {
        Self::parse(value, DEFAULT_DELIMITER)
    }
}

impl From<String> for Path {
    fn from(value: String) -> Self {
        Self::parse(&value, DEFAULT_DELIMITER)
    }
}

impl<S: Into<String>> FromIterator<S> for Path {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self::new(iter)
    }
}

impl AsRef<Path> for Path {
    fn as_ref(&self) -> &Path {
        self
    }
}

/// Constructs a [`Path`] from one or more dotted fragments.
///
/// Every argument is parsed with the default delimiter and the results are
/// concatenated, so `path!("a.b", "c")` equals `path!("a.b.c")`.
///
/// ```rust
/// # use cfgtree::path;
/// let base = "server";
/// let path = path!(base, "tls.cert");
/// assert_eq!(path.segments(), ["server", "tls", "cert"]);
/// assert!(path!().is_empty());
/// ```
#[macro_export]
macro_rules! path {
    () => {
        $crate::path::Path::empty()
    };

    ($($fragment:expr),+ $(,)?) => {{
        let mut path = $crate::path::Path::empty();
        $(
            path = path.join(&$crate::path::Path::parse(
                ::std::convert::AsRef::<str>::as_ref(&$fragment),
                $crate::path::DEFAULT_DELIMITER,
            ));
        )+
        path
    }};
}
