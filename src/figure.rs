//! Figure persistence
//!
//! trueno-lab does not draw anything. A caller's figure type implements
//! [`Figure`] so an active experiment can lay it out and write it into the
//! run directory.

use std::path::Path;

use crate::Result;

/// Extension used when none is given.
pub const DEFAULT_FIGURE_EXTENSION: &str = ".pdf";

/// A rendered (or renderable) plot owned by the caller.
pub trait Figure {
    /// Shrink margins so labels fit. The default leaves the figure untouched.
    fn tight_layout(&mut self) {}

    /// Write the figure to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Implementations return `Error::Io` for write failures and
    /// `Error::Figure` for rendering failures.
    fn save(&self, path: &Path) -> Result<()>;
}

impl<F: Figure + ?Sized> Figure for &mut F {
    fn tight_layout(&mut self) {
        (**self).tight_layout();
    }

    fn save(&self, path: &Path) -> Result<()> {
        (**self).save(path)
    }
}

impl<F: Figure + ?Sized> Figure for Box<F> {
    fn tight_layout(&mut self) {
        (**self).tight_layout();
    }

    fn save(&self, path: &Path) -> Result<()> {
        (**self).save(path)
    }
}

/// File name for a figure: spaces become underscores, then `extension` is
/// appended as given (include the leading dot).
///
/// ```rust
/// use trueno_lab::figure::figure_file_name;
///
/// assert_eq!(figure_file_name("My Figure", ".pdf"), "My_Figure.pdf");
/// ```
#[must_use]
pub fn figure_file_name(name: &str, extension: &str) -> String {
    let mut file_name = name.replace(' ', "_");
    file_name.push_str(extension);
    file_name
}
