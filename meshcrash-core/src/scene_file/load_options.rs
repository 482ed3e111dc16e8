/// Defines how a scene file whose size disagrees with its header is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeCheck {
    /// Zero-fill whatever the file does not provide and carry on.
    ///
    /// Negative header counts are read as zero. This is the default, since the
    /// repro tools exist to hand exactly such input to the library.
    Lenient,

    /// Reject negative counts and files shorter than the header declares.
    Strict,
}

/// Options for controlling scene file loading and declaration.
///
/// # Examples
///
/// ```no_run
/// # use meshcrash_core::scene_file::{LoadOptions, SizeCheck};
/// // Declare at most 646 triangles to the library, refuse short files
/// let options = LoadOptions::new()
///     .triangle_limit(Some(646))
///     .size_check(SizeCheck::Strict);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Upper bound on the triangle count declared when the mesh is created.
    ///
    /// The whole triangle array is still read from the file.
    pub triangle_limit: Option<usize>,

    /// How to handle size mismatches between header and file body.
    pub size_check: SizeCheck,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            triangle_limit: None,
            size_check: SizeCheck::Lenient,
        }
    }
}

impl LoadOptions {
    /// Creates a new `LoadOptions` with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn triangle_limit(mut self, limit: Option<usize>) -> Self {
        self.triangle_limit = limit;
        self
    }

    pub fn size_check(mut self, check: SizeCheck) -> Self {
        self.size_check = check;
        self
    }
}
