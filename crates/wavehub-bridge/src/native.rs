//! Raw FFI surface exported by the host-provided bridge library.
//!
//! Symbols are resolved dynamically via `libloading` rather than linked at
//! compile time, since the library path is only known at runtime (`--dll`)
//! and differs per host installation.

use std::path::Path;

use libloading::{Library, Symbol};

use crate::error::BridgeError;

type PbInit = unsafe extern "C" fn(channel_wide: *const u16, capacity_bytes: i64) -> i32;
type PbClose = unsafe extern "C" fn();
type PbMaxDoubles = unsafe extern "C" fn() -> i32;
type PbWriteDoubles =
    unsafe extern "C" fn(stream: i32, sid: i32, ptr: *const f64, count: i32, ts: i64) -> i32;
type PbReadDoubles = unsafe extern "C" fn(
    stream: i32,
    sid: *mut i32,
    buf: *mut f64,
    cap: i32,
    got: *mut i32,
    ts: *mut i64,
) -> i32;

/// Resolved entry points into the native bridge library.
///
/// Holds the `Library` alive for the lifetime of the symbols: the function
/// pointers are only valid while `_lib` is not dropped, which is why they
/// are kept together in one struct rather than resolved ad hoc per call.
pub struct NativeBridge {
    _lib: Library,
    init: PbInit,
    close: PbClose,
    max_doubles: PbMaxDoubles,
    write_doubles: PbWriteDoubles,
    read_doubles: PbReadDoubles,
    /// `PB_ReadNextDoubles` is preferred when present; absent on
    /// older host library builds, in which case the core degrades to
    /// `PB_ReadDoubles` and accepts weaker cross-call ordering guarantees.
    read_next_doubles: Option<PbReadDoubles>,
}

unsafe fn load_symbol<'lib, T>(
    lib: &'lib Library,
    path: &Path,
    name: &'static str,
) -> Result<Symbol<'lib, T>, BridgeError> {
    unsafe {
        lib.get::<T>(name.as_bytes())
            .map_err(|source| BridgeError::MissingSymbol { path: path.to_path_buf(), symbol: name, source })
    }
}

impl NativeBridge {
    pub fn load(path: &Path) -> Result<Self, BridgeError> {
        let lib = unsafe { Library::new(path) }
            .map_err(|source| BridgeError::LibraryLoad { path: path.to_path_buf(), source })?;

        // SAFETY: each symbol is resolved against the declared extern "C" signature;
        // the host library contract fixes those signatures.
        let init = *unsafe { load_symbol::<PbInit>(&lib, path, "PB_Init") }?;
        let close = *unsafe { load_symbol::<PbClose>(&lib, path, "PB_Close") }?;
        let max_doubles = *unsafe { load_symbol::<PbMaxDoubles>(&lib, path, "PB_MaxDoubles") }?;
        let write_doubles =
            *unsafe { load_symbol::<PbWriteDoubles>(&lib, path, "PB_WriteDoubles") }?;
        let read_doubles =
            *unsafe { load_symbol::<PbReadDoubles>(&lib, path, "PB_ReadDoubles") }?;
        let read_next_doubles =
            unsafe { load_symbol::<PbReadDoubles>(&lib, path, "PB_ReadNextDoubles") }
                .ok()
                .map(|sym| *sym);

        Ok(Self { _lib: lib, init, close, max_doubles, write_doubles, read_doubles, read_next_doubles })
    }

    pub fn init(&self, channel_wide: &[u16], capacity_bytes: i64) -> i32 {
        unsafe { (self.init)(channel_wide.as_ptr(), capacity_bytes) }
    }

    pub fn close(&self) {
        unsafe { (self.close)() }
    }

    pub fn max_doubles(&self) -> i32 {
        unsafe { (self.max_doubles)() }
    }

    pub fn write_doubles(&self, stream: i32, sid: i32, payload: &[f64], ts: i64) -> i32 {
        unsafe {
            (self.write_doubles)(stream, sid, payload.as_ptr(), payload.len() as i32, ts)
        }
    }

    /// Uses `PB_ReadNextDoubles` when available, else `PB_ReadDoubles`.
    /// Returns `true` (preferred FIFO dequeue) or `false` (legacy) alongside
    /// the raw return code, so callers can log the degraded-ordering case
    /// once rather than per call.
    pub fn read_next(
        &self,
        stream: i32,
        sid: &mut i32,
        buf: &mut [f64],
        got: &mut i32,
        ts: &mut i64,
    ) -> (i32, bool) {
        let cap = buf.len() as i32;
        if let Some(read_next) = self.read_next_doubles {
            let code = unsafe { read_next(stream, sid, buf.as_mut_ptr(), cap, got, ts) };
            (code, true)
        } else {
            let code = unsafe { (self.read_doubles)(stream, sid, buf.as_mut_ptr(), cap, got, ts) };
            (code, false)
        }
    }

    pub fn prefers_fifo(&self) -> bool {
        self.read_next_doubles.is_some()
    }
}
