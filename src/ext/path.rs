use std::path::{Path, PathBuf};

/// Extension trait for Path to handle template suffixes
pub trait PathExt {
    /// Removes a textual suffix such as `.in` from the whole path.
    ///
    /// Returns `None` when the path does not end with `suffix`, or when
    /// nothing would be left of the file name after removing it.
    ///
    /// # Examples
    /// ```
    /// use preprocess::ext::PathExt;
    /// use std::path::{Path, PathBuf};
    ///
    /// let path = Path::new("res/AndroidManifest.xml.in");
    /// assert_eq!(path.strip_str_suffix(".in"), Some(PathBuf::from("res/AndroidManifest.xml")));
    /// assert_eq!(Path::new("foo.bar").strip_str_suffix(".in"), None);
    /// ```
    fn strip_str_suffix(&self, suffix: &str) -> Option<PathBuf>;
}

impl PathExt for Path {
    fn strip_str_suffix(&self, suffix: &str) -> Option<PathBuf> {
        let path = self.to_str()?;
        path.strip_suffix(suffix)
            .filter(|stripped| !stripped.is_empty() && !stripped.ends_with(['/', '\\']))
            .map(PathBuf::from)
    }
}
