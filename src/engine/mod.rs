// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod candidate;
pub mod exporter;
pub mod patcher;
pub mod scrubber;
pub mod signature;
pub mod wrapper;
pub mod writer;

pub use candidate::{find_candidates, resolve_candidate, ExportCandidate};
pub use exporter::{DllExporter, ExportOutcome, ExportSummary, RunState};
pub use patcher::ExportPatch;
