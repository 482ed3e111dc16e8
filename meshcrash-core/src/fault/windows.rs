use super::{ModuleRange, locate};
use std::ffi::c_void;
use std::io;
use std::mem;
use windows_sys::Win32::Foundation::{CloseHandle, INVALID_HANDLE_VALUE};
use windows_sys::Win32::System::Diagnostics::Debug::{
    AddVectoredExceptionHandler, EXCEPTION_POINTERS, RemoveVectoredExceptionHandler,
};
use windows_sys::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, MODULEENTRY32W, Module32FirstW, Module32NextW, TH32CS_SNAPMODULE,
};
use windows_sys::Win32::System::Threading::GetCurrentProcessId;

const EXCEPTION_CONTINUE_SEARCH: i32 = 0;

/// Vectored exception handler registration, removed on drop.
pub(super) struct Registration {
    handle: *mut c_void,
}

impl Drop for Registration {
    fn drop(&mut self) {
        unsafe {
            RemoveVectoredExceptionHandler(self.handle);
        }
    }
}

pub(super) fn install() -> io::Result<Registration> {
    let handle = unsafe { AddVectoredExceptionHandler(1, Some(on_exception)) };
    if handle.is_null() {
        return Err(io::Error::last_os_error());
    }
    Ok(Registration { handle })
}

pub(super) fn module_map() -> Vec<ModuleRange> {
    let mut modules = Vec::new();

    unsafe {
        let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPMODULE, GetCurrentProcessId());
        if snapshot == INVALID_HANDLE_VALUE {
            return modules;
        }

        let mut entry: MODULEENTRY32W = mem::zeroed();
        entry.dwSize = mem::size_of::<MODULEENTRY32W>() as u32;

        let mut more = Module32FirstW(snapshot, &mut entry) != 0;
        while more {
            modules.push(ModuleRange::new(
                wide_to_string(&entry.szModule),
                entry.modBaseAddr as usize,
                entry.modBaseSize as usize,
            ));
            more = Module32NextW(snapshot, &mut entry) != 0;
        }

        CloseHandle(snapshot);
    }

    modules
}

unsafe extern "system" fn on_exception(pointers: *mut EXCEPTION_POINTERS) -> i32 {
    let record = unsafe { pointers.as_ref().and_then(|p| p.ExceptionRecord.as_ref()) };

    if let Some(record) = record {
        let modules = module_map();
        let location = locate(record.ExceptionAddress as usize, &modules);
        eprintln!(
            "Exception ({:#x}) @ {}",
            record.ExceptionCode as u32, location
        );
    }

    EXCEPTION_CONTINUE_SEARCH
}

fn wide_to_string(wide: &[u16]) -> String {
    let len = wide.iter().position(|&c| c == 0).unwrap_or(wide.len());
    String::from_utf16_lossy(&wide[..len])
}
