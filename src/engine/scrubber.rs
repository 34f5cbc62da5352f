// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Removes the export marker once the wrapper is in place, so the rewritten
//! library no longer depends on the marker's assembly.

use crate::config::consts::{MARKER_ASSEMBLY_NAME, MARKER_ATTRIBUTE_NAME};
use crate::il::{MethodLocation, Module};

/// What [`scrub_marker`] actually removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrubReport {
    pub attribute_removed: bool,
    pub reference_removed: bool,
}

/// Drops the marker attribute from the candidate and the marker assembly
/// reference from the module. Either may already be gone.
pub fn scrub_marker(module: &mut Module, candidate: MethodLocation) -> ScrubReport {
    let attribute_removed = module
        .method_mut(candidate)
        .map(|method| method.remove_attribute(MARKER_ATTRIBUTE_NAME))
        .unwrap_or(false);
    let reference_removed = module.remove_assembly_ref(MARKER_ASSEMBLY_NAME);

    ScrubReport {
        attribute_removed,
        reference_removed,
    }
}
