//! Configuration for the repro procedures

use crate::backend::BackendKind;
use crate::error::{MeshCrashError, Result};
use crate::geometry::SquareScatter;
use crate::scene_file::{DEFAULT_SCENE_PATH, LoadOptions, SizeCheck};
use std::path::PathBuf;

/// Square counts of the two generated passes.
pub const DEFAULT_SQUARE_COUNTS: [usize; 2] = [50, 50_000];

/// Triangle count declared by `--limit-triangle`.
pub const LIMITED_TRIANGLE_COUNT: usize = 646;

/// Largest square count whose vertex indices still fit in `i32`.
pub const MAX_SQUARE_COUNT: usize = i32::MAX as usize / 4;

pub const FLAG_NO_EMBREE: &str = "--no-embree";
pub const FLAG_EMBREE: &str = "--embree";
pub const FLAG_LIMIT_TRIANGLE: &str = "--limit-triangle";
pub const FLAG_WRITE_RAW: &str = "--write-raw";
pub const FLAG_STRICT: &str = "--strict";

/// Configuration descriptor for a repro run
#[derive(Debug, Clone, PartialEq)]
pub struct ReproDesc {
    /// Ray tracer behind the scene
    pub backend: BackendKind,
    /// Squares per generated pass, one OBJ export per entry
    pub square_counts: Vec<usize>,
    /// Placement parameters for generated squares
    pub scatter: SquareScatter,
    /// Export `<prefix><pass>.obj` for 1-based pass numbers
    pub obj_prefix: String,
    /// Also write each generated pass as `<prefix><pass>.raw`
    pub write_raw: bool,
    /// Scene file read by the loader procedure
    pub scene_path: PathBuf,
    pub load_options: LoadOptions,
}

impl Default for ReproDesc {
    fn default() -> Self {
        Self {
            backend: BackendKind::Default,
            square_counts: DEFAULT_SQUARE_COUNTS.to_vec(),
            scatter: SquareScatter::default(),
            obj_prefix: "Scene".to_string(),
            write_raw: false,
            scene_path: PathBuf::from(DEFAULT_SCENE_PATH),
            load_options: LoadOptions::default(),
        }
    }
}

impl ReproDesc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings for the generator procedure: Embree unless `--no-embree`.
    pub fn generated_from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let flags = collect_flags(args);
        let backend = if has_flag(&flags, FLAG_NO_EMBREE) {
            BackendKind::Default
        } else {
            BackendKind::Embree
        };

        Self::default()
            .backend(backend)
            .write_raw(has_flag(&flags, FLAG_WRITE_RAW))
    }

    /// Settings for the loader procedure: default scene unless `--embree`,
    /// declared triangles clamped with `--limit-triangle`, strict sizes with `--strict`.
    pub fn loaded_from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let flags = collect_flags(args);
        let backend = if has_flag(&flags, FLAG_EMBREE) {
            BackendKind::Embree
        } else {
            BackendKind::Default
        };
        let triangle_limit =
            has_flag(&flags, FLAG_LIMIT_TRIANGLE).then_some(LIMITED_TRIANGLE_COUNT);
        let size_check = if has_flag(&flags, FLAG_STRICT) {
            SizeCheck::Strict
        } else {
            SizeCheck::Lenient
        };

        Self::default().backend(backend).load_options(
            LoadOptions::new()
                .triangle_limit(triangle_limit)
                .size_check(size_check),
        )
    }

    pub fn backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    pub fn square_counts(mut self, counts: Vec<usize>) -> Self {
        self.square_counts = counts;
        self
    }

    pub fn scatter(mut self, scatter: SquareScatter) -> Self {
        self.scatter = scatter;
        self
    }

    pub fn obj_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.obj_prefix = prefix.into();
        self
    }

    pub fn write_raw(mut self, write_raw: bool) -> Self {
        self.write_raw = write_raw;
        self
    }

    pub fn scene_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.scene_path = path.into();
        self
    }

    pub fn load_options(mut self, options: LoadOptions) -> Self {
        self.load_options = options;
        self
    }

    /// Rejects square counts and scatter ranges the generator cannot honor.
    pub fn validate(&self) -> Result<()> {
        if let Some(&count) = self.square_counts.iter().find(|&&n| n > MAX_SQUARE_COUNT) {
            return Err(MeshCrashError::Configuration(format!(
                "{} squares exceed the maximum of {}",
                count, MAX_SQUARE_COUNT
            )));
        }

        let ranges = [
            ("position", &self.scatter.position_range),
            ("scale", &self.scatter.scale_range),
        ];
        for (name, range) in ranges {
            let (start, end) = (*range.start(), *range.end());
            if !(start.is_finite() && end.is_finite() && start <= end) {
                return Err(MeshCrashError::Configuration(format!(
                    "invalid {} range {:?}",
                    name, range
                )));
            }
        }

        Ok(())
    }

    /// OBJ export name for a 1-based pass number
    pub fn obj_path(&self, pass: usize) -> String {
        format!("{}{}.obj", self.obj_prefix, pass)
    }

    /// Raw dump name for a 1-based pass number
    pub fn raw_path(&self, pass: usize) -> PathBuf {
        PathBuf::from(format!("{}{}.raw", self.obj_prefix, pass))
    }
}

fn collect_flags<I, S>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter().map(|arg| arg.as_ref().to_string()).collect()
}

/// A flag counts if the token appears anywhere in argv.
fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|arg| arg == flag)
}
