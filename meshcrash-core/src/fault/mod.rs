//! Fault reporting for crashes inside the scene backend.
//!
//! On a fault the reporter prints which loaded module contains the faulting
//! instruction and at what offset, then lets the default handling take over.
//! It never recovers from the fault.
//!
//! ```no_run
//! let _reporter = meshcrash_core::fault::install();
//! // ... drive the scene backend; a crash now prints e.g.
//! // Signal 11 (SIGSEGV) @ libphonon.so+0x1a2b3c
//! ```

#[cfg(target_os = "linux")]
mod linux;
#[cfg(windows)]
mod windows;

#[cfg(target_os = "linux")]
use linux as platform;
#[cfg(windows)]
use windows as platform;

#[cfg(not(any(target_os = "linux", windows)))]
mod platform {
    use super::ModuleRange;
    use std::io;

    pub(super) struct Registration;

    pub(super) fn install() -> io::Result<Registration> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "fault reporting is not supported on this platform",
        ))
    }

    pub(super) fn module_map() -> Vec<ModuleRange> {
        Vec::new()
    }
}

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

/// Address range occupied by a loaded module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRange {
    pub name: String,
    pub base: usize,
    pub size: usize,
}

impl ModuleRange {
    pub fn new(name: impl Into<String>, base: usize, size: usize) -> Self {
        Self {
            name: name.into(),
            base,
            size,
        }
    }

    /// Half-open containment: `base <= address < base + size`.
    pub fn contains(&self, address: usize) -> bool {
        address
            .checked_sub(self.base)
            .is_some_and(|offset| offset < self.size)
    }
}

/// Where a fault address landed. Borrows the module name, so building and
/// printing one never allocates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultLocation<'a> {
    InModule { module: &'a str, offset: usize },
    Unknown { address: usize },
}

impl fmt::Display for FaultLocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InModule { module, offset } => write!(f, "{}+{:#x}", module, offset),
            Self::Unknown { address } => write!(f, "{:#x}", address),
        }
    }
}

/// Finds the first module containing `address`.
pub fn locate(address: usize, modules: &[ModuleRange]) -> FaultLocation<'_> {
    modules
        .iter()
        .find(|module| module.contains(address))
        .map_or(FaultLocation::Unknown { address }, |module| {
            FaultLocation::InModule {
                module: &module.name,
                offset: address - module.base,
            }
        })
}

/// Fixed-size line buffer for fault handlers, which must not allocate.
///
/// Output past the capacity is dropped and the line still ends in `\n`.
#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
pub(crate) struct LineBuffer {
    bytes: [u8; LineBuffer::CAPACITY],
    len: usize,
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
impl LineBuffer {
    const CAPACITY: usize = 512;

    pub(crate) const fn new() -> Self {
        Self {
            bytes: [0; Self::CAPACITY],
            len: 0,
        }
    }

    /// The buffered text with a trailing newline.
    pub(crate) fn finish(&mut self) -> &[u8] {
        if self.len == Self::CAPACITY {
            self.len -= 1;
        }
        self.bytes[self.len] = b'\n';
        &self.bytes[..=self.len]
    }
}

impl fmt::Write for LineBuffer {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        let available = Self::CAPACITY - self.len;
        let take = s.len().min(available);
        self.bytes[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
        self.len += take;
        if take < s.len() {
            Err(fmt::Error)
        } else {
            Ok(())
        }
    }
}

/// Parses `/proc/<pid>/maps` text into one range per backing file.
///
/// All mappings of a file are merged into a single range from the lowest start
/// to the highest end. Anonymous and pseudo mappings (`[heap]`, `[stack]`,
/// `[vdso]`, ...) are skipped.
pub fn parse_module_map(maps: &str) -> Vec<ModuleRange> {
    let mut order: Vec<&str> = Vec::new();
    let mut spans: HashMap<&str, (usize, usize)> = HashMap::new();

    for line in maps.lines() {
        let mut fields = line.split_whitespace();
        let Some(range) = fields.next() else {
            continue;
        };
        // perms, offset, dev, inode
        if fields.by_ref().take(4).count() < 4 {
            continue;
        }
        let Some(path) = line_path(line) else {
            continue;
        };
        if path.starts_with('[') {
            continue;
        }
        let Some((start, end)) = range.split_once('-') else {
            continue;
        };
        let (Ok(start), Ok(end)) = (
            usize::from_str_radix(start, 16),
            usize::from_str_radix(end, 16),
        ) else {
            continue;
        };

        spans
            .entry(path)
            .and_modify(|span| {
                span.0 = span.0.min(start);
                span.1 = span.1.max(end);
            })
            .or_insert_with(|| {
                order.push(path);
                (start, end)
            });
    }

    order
        .into_iter()
        .map(|path| {
            let (start, end) = spans[path];
            let name = Path::new(path)
                .file_name()
                .map_or_else(|| path.to_string(), |n| n.to_string_lossy().into_owned());
            ModuleRange::new(name, start, end - start)
        })
        .collect()
}

/// Path column of a maps line, which may itself contain spaces.
fn line_path(line: &str) -> Option<&str> {
    let mut rest = line;
    for _ in 0..5 {
        rest = rest.trim_start();
        rest = &rest[rest.find(char::is_whitespace)?..];
    }
    let path = rest.trim();
    (!path.is_empty()).then_some(path)
}

/// Modules currently loaded in this process.
///
/// Empty on platforms without a module enumeration.
pub fn current_module_map() -> Vec<ModuleRange> {
    platform::module_map()
}

static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Handle to the installed fault handler. Dropping it removes the handler.
#[must_use = "the fault handler is removed when the reporter is dropped"]
pub struct FaultReporter {
    registration: Option<platform::Registration>,
}

impl FaultReporter {
    pub fn is_active(&self) -> bool {
        self.registration.is_some()
    }
}

impl Drop for FaultReporter {
    fn drop(&mut self) {
        if let Some(registration) = self.registration.take() {
            drop(registration);
            INSTALLED.store(false, Ordering::SeqCst);
            log::debug!("Fault reporter removed");
        }
    }
}

/// Installs the process-wide fault handler.
///
/// Only one reporter is active at a time; while one is alive, further calls
/// return an inactive reporter.
pub fn install() -> FaultReporter {
    if INSTALLED.swap(true, Ordering::SeqCst) {
        log::warn!("Fault reporter already installed");
        return FaultReporter { registration: None };
    }

    match platform::install() {
        Ok(registration) => {
            log::info!("Fault reporter installed");
            FaultReporter {
                registration: Some(registration),
            }
        }
        Err(e) => {
            INSTALLED.store(false, Ordering::SeqCst);
            log::warn!("Failed to install fault reporter: {}", e);
            FaultReporter { registration: None }
        }
    }
}
