//! Well-known symbols exported by an ahead-of-time compiled snapshot library.
use crate::{Library, Result};
use core::fmt::Debug;

pub const VM_SNAPSHOT_DATA_SYMBOL: &str = "_kDartVmSnapshotData";
pub const VM_SNAPSHOT_INSTRUCTIONS_SYMBOL: &str = "_kDartVmSnapshotInstructions";
pub const ISOLATE_SNAPSHOT_DATA_SYMBOL: &str = "_kDartIsolateSnapshotData";
pub const ISOLATE_SNAPSHOT_INSTRUCTIONS_SYMBOL: &str = "_kDartIsolateSnapshotInstructions";

/// Addresses of the four snapshot pieces. They stay valid while the library they came from is loaded.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SnapshotSymbols {
    pub vm_data: *const u8,
    pub vm_instructions: *const u8,
    pub isolate_data: *const u8,
    pub isolate_instructions: *const u8,
}

impl Debug for SnapshotSymbols {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SnapshotSymbols")
            .field("vm_data", &self.vm_data)
            .field("vm_instructions", &self.vm_instructions)
            .field("isolate_data", &self.isolate_data)
            .field("isolate_instructions", &self.isolate_instructions)
            .finish()
    }
}

impl SnapshotSymbols {
    /// Look up all four snapshot symbols in `lib`, failing on the first one that is missing.
    pub fn resolve(lib: &Library) -> Result<SnapshotSymbols> {
        let find = |name: &str| -> Result<*const u8> {
            let sym = unsafe { lib.get::<u8>(name)? };
            Ok(sym.into_raw().cast())
        };
        let symbols = SnapshotSymbols {
            vm_data: find(VM_SNAPSHOT_DATA_SYMBOL)?,
            vm_instructions: find(VM_SNAPSHOT_INSTRUCTIONS_SYMBOL)?,
            isolate_data: find(ISOLATE_SNAPSHOT_DATA_SYMBOL)?,
            isolate_instructions: find(ISOLATE_SNAPSHOT_INSTRUCTIONS_SYMBOL)?,
        };
        log::info!("Resolved snapshot symbols in [{}]: {:?}", lib.name(), symbols);
        Ok(symbols)
    }
}
