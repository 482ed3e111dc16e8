use super::{LineBuffer, ModuleRange, locate, parse_module_map};
use libc::{c_int, c_void, siginfo_t};
use std::fmt::Write;
use std::io;
use std::mem;
use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

const FAULT_SIGNALS: [c_int; 4] = [libc::SIGSEGV, libc::SIGBUS, libc::SIGILL, libc::SIGFPE];

/// Module map captured at install time. The signal handler only reads it, so
/// it never touches the allocator or the filesystem. Libraries loaded later
/// are reported by raw address.
static MODULES: AtomicPtr<Vec<ModuleRange>> = AtomicPtr::new(ptr::null_mut());

/// Previous dispositions and the module snapshot, released on drop.
pub(super) struct Registration {
    previous: Vec<(c_int, libc::sigaction)>,
}

impl Drop for Registration {
    fn drop(&mut self) {
        restore(&self.previous);
        release_snapshot();
    }
}

pub(super) fn install() -> io::Result<Registration> {
    let modules = Box::into_raw(Box::new(module_map()));
    free_snapshot(MODULES.swap(modules, Ordering::AcqRel));

    let handler: extern "C" fn(c_int, *mut siginfo_t, *mut c_void) = on_fault;
    let mut previous = Vec::with_capacity(FAULT_SIGNALS.len());

    for signal in FAULT_SIGNALS {
        // SA_RESETHAND: once the handler returns, the fault is delivered again
        // under the default disposition.
        let result = unsafe {
            let mut action: libc::sigaction = mem::zeroed();
            action.sa_sigaction = handler as libc::sighandler_t;
            action.sa_flags = libc::SA_SIGINFO | libc::SA_RESETHAND;
            libc::sigemptyset(&mut action.sa_mask);

            let mut old: libc::sigaction = mem::zeroed();
            let result = libc::sigaction(signal, &action, &mut old);
            (result, old)
        };

        match result {
            (0, old) => previous.push((signal, old)),
            _ => {
                let error = io::Error::last_os_error();
                restore(&previous);
                release_snapshot();
                return Err(error);
            }
        }
    }

    Ok(Registration { previous })
}

fn restore(previous: &[(c_int, libc::sigaction)]) {
    for (signal, action) in previous {
        unsafe {
            libc::sigaction(*signal, action, std::ptr::null_mut());
        }
    }
}

fn release_snapshot() {
    free_snapshot(MODULES.swap(ptr::null_mut(), Ordering::AcqRel));
}

fn free_snapshot(modules: *mut Vec<ModuleRange>) {
    if !modules.is_null() {
        drop(unsafe { Box::from_raw(modules) });
    }
}

fn snapshot() -> &'static [ModuleRange] {
    unsafe { MODULES.load(Ordering::Acquire).as_ref() }
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

pub(super) fn module_map() -> Vec<ModuleRange> {
    std::fs::read_to_string("/proc/self/maps")
        .map(|maps| parse_module_map(&maps))
        .unwrap_or_default()
}

/// Formats the report line without allocating.
fn format_report<'a>(
    line: &'a mut LineBuffer,
    signal: c_int,
    address: usize,
    modules: &[ModuleRange],
) -> &'a [u8] {
    // Overlong lines are cut short; the report still goes out.
    let _ = write!(
        line,
        "Signal {} ({}) @ {}",
        signal,
        signal_name(signal),
        locate(address, modules)
    );
    line.finish()
}

// Async-signal-safe: stack buffer, no locks, a single write(2).
extern "C" fn on_fault(signal: c_int, info: *mut siginfo_t, context: *mut c_void) {
    let address = unsafe { fault_address(info, context) };
    let mut line = LineBuffer::new();
    let report = format_report(&mut line, signal, address, snapshot());

    unsafe {
        libc::write(libc::STDERR_FILENO, report.as_ptr().cast(), report.len());
        // The default disposition is back; re-raise so sent signals terminate too.
        libc::raise(signal);
    }
}

/// Faulting instruction when the context exposes it, otherwise `si_addr`.
unsafe fn fault_address(info: *mut siginfo_t, context: *mut c_void) -> usize {
    unsafe {
        instruction_pointer(context)
            .or_else(|| info.as_ref().map(|info| info.si_addr() as usize))
            .unwrap_or(0)
    }
}

#[cfg(target_arch = "x86_64")]
unsafe fn instruction_pointer(context: *mut c_void) -> Option<usize> {
    let context = unsafe { (context as *const libc::ucontext_t).as_ref()? };
    Some(context.uc_mcontext.gregs[libc::REG_RIP as usize] as usize)
}

#[cfg(target_arch = "aarch64")]
unsafe fn instruction_pointer(context: *mut c_void) -> Option<usize> {
    let context = unsafe { (context as *const libc::ucontext_t).as_ref()? };
    Some(context.uc_mcontext.pc as usize)
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
unsafe fn instruction_pointer(_context: *mut c_void) -> Option<usize> {
    None
}

fn signal_name(signal: c_int) -> &'static str {
    match signal {
        libc::SIGSEGV => "SIGSEGV",
        libc::SIGBUS => "SIGBUS",
        libc::SIGILL => "SIGILL",
        libc::SIGFPE => "SIGFPE",
        _ => "unknown",
    }
}
