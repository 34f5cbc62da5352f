// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! The export engine.
//!
//! [`DllExporter::open`] inspects the target and resolves the candidate, so a
//! misconfigured library fails before anything is written.
//! [`DllExporter::export`] then rewrites the library in place:
//!
//! 1. Inject the wrapper and scrub the marker from the in-memory module
//! 2. Assemble the module over the target
//! 3. Disassemble the target to `<target>.il`
//! 4. Patch `.corflags` and the export directives into the listing
//! 5. Reassemble `<target>.il` over the target
//! 6. Remove `<target>.il` and `<target>.res` unless asked to keep them
//!
//! One exporter performs at most one export.

use serde::Serialize;
use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::Instrument;

use crate::config::consts::MARKER_ATTRIBUTE_NAME;
use crate::config::WrapperSpec;
use crate::engine::candidate::{resolve_candidate, ExportCandidate};
use crate::engine::patcher::{patch_file, ExportPatch};
use crate::engine::scrubber::scrub_marker;
use crate::engine::signature::{validate_injection_target, validate_signature};
use crate::engine::wrapper::synthesize_wrapper;
use crate::engine::writer::{
    existing, load_module, write_module, BuildOptions, LoadedModule, Scratch,
};
use crate::errors::{ExportError, ExportResult};
use crate::image::{load_image_info, ImageInfo, TargetPlatform};
use crate::observability::messages::export::{
    CandidateFound, ExportCompleted, ExportFailed, InjectingWrapper, NothingToExport,
    PlatformDetected,
};
use crate::observability::messages::toolchain::{CleaningUp, CleanupFailed};
use crate::observability::messages::StructuredLog;
use crate::traits::{resource_sibling, AssembleRequest, DisassembleRequest, Toolchain};

/// Progress of one exporter instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Uninitialized,
    /// Target inspected and candidate checked
    Validated,
    /// Wrapper added to the in-memory module
    Injected,
    /// Export finished, successfully or not
    Finalized,
}

/// What an export run did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExportOutcome {
    /// No method is marked; the target was not touched.
    NothingToExport,
    Exported(ExportSummary),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportSummary {
    pub candidate: String,
    pub wrapper_type: String,
    pub wrapper_method: String,
    pub alias: String,
    pub platform: TargetPlatform,
    pub cor_flags: u32,
    pub kept_il: bool,
    /// The patched listing, when kept
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intermediate: Option<PathBuf>,
}

/// Platform-dependent values fixed at open.
#[derive(Debug, Clone)]
struct PlatformPlan {
    platform: TargetPlatform,
    cor_flags: u32,
    alias: String,
}

/// Rewrites one managed DLL so its marked method is callable as a native export.
pub struct DllExporter {
    target: PathBuf,
    spec: WrapperSpec,
    toolchain: Arc<dyn Toolchain>,
    image: ImageInfo,
    plan: PlatformPlan,
    scratch: Scratch,
    loaded: LoadedModule,
    candidate: Option<ExportCandidate>,
    core_library: Option<String>,
    state: RunState,
    attempted: bool,
}

impl DllExporter {
    /// Inspects `target` and resolves its export candidate.
    ///
    /// Fails if the target is not a DLL, targets AnyCPU, has more than one
    /// marked method, or its marked method has the wrong shape.
    pub async fn open(
        target: impl AsRef<Path>,
        spec: WrapperSpec,
        toolchain: Arc<dyn Toolchain>,
    ) -> ExportResult<Self> {
        let target = target.as_ref();
        let target = std::path::absolute(target).map_err(|e| ExportError::io(target, e))?;
        let display = target.display().to_string();

        let image = load_image_info(&target).await?;
        if !image.is_dll {
            return Err(ExportError::NotADll(target));
        }
        let plan = plan_platform(&image, &spec)?;
        PlatformDetected {
            target: &display,
            machine: image.machine,
            platform: plan.platform,
        }
        .log();

        let scratch = Scratch::new()?;
        let loaded = load_module(
            toolchain.as_ref(),
            &target,
            &scratch,
            image.has_debug_info,
        )
        .await?;

        let mut exporter = Self {
            target,
            spec,
            toolchain,
            image,
            plan,
            scratch,
            loaded,
            candidate: None,
            core_library: None,
            state: RunState::Uninitialized,
            attempted: false,
        };
        exporter.validate(&display)?;
        Ok(exporter)
    }

    fn validate(&mut self, display: &str) -> ExportResult<()> {
        match resolve_candidate(&self.loaded.module)? {
            Some(candidate) => {
                CandidateFound {
                    method: &candidate.qualified_name(),
                }
                .log();
                validate_signature(&candidate)?;
                let core_library = validate_injection_target(&self.loaded.module, &self.spec)?;
                self.core_library = Some(core_library.to_string());
                self.candidate = Some(candidate);
            }
            None => NothingToExport {
                target: display,
                attribute: MARKER_ATTRIBUTE_NAME,
            }
            .log(),
        }
        self.state = RunState::Validated;
        Ok(())
    }

    pub fn target(&self) -> &Path {
        &self.target
    }

    /// The method that will be exported, if any is marked.
    pub fn found_method(&self) -> Option<&ExportCandidate> {
        self.candidate.as_ref()
    }

    pub fn platform(&self) -> TargetPlatform {
        self.plan.platform
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn image(&self) -> &ImageInfo {
        &self.image
    }

    /// Runs the export. May be called once per exporter.
    pub async fn export(&mut self) -> ExportResult<ExportOutcome> {
        if self.attempted {
            return Err(ExportError::AlreadyExported);
        }
        self.attempted = true;

        let Some(candidate) = self.candidate.clone() else {
            self.state = RunState::Finalized;
            return Ok(ExportOutcome::NothingToExport);
        };

        let display = self.target.display().to_string();
        let span = PlatformDetected {
            target: &display,
            machine: self.image.machine,
            platform: self.plan.platform,
        }
        .span("export");

        let started = Instant::now();
        let result = self.run(&candidate).instrument(span).await;
        self.state = RunState::Finalized;

        match result {
            Ok(summary) => {
                ExportCompleted {
                    target: &display,
                    alias: &summary.alias,
                    duration: started.elapsed(),
                }
                .log();
                Ok(ExportOutcome::Exported(summary))
            }
            Err(error) => {
                ExportFailed {
                    target: &display,
                    error: &error,
                }
                .log();
                Err(error)
            }
        }
    }

    async fn run(&mut self, candidate: &ExportCandidate) -> ExportResult<ExportSummary> {
        let core_library = self
            .core_library
            .clone()
            .ok_or(ExportError::MissingCoreLibrary)?;
        let wrapper_name = format!("{}::{}", self.spec.full_type_name(), self.spec.method_name);
        InjectingWrapper {
            wrapper: &wrapper_name,
            candidate: &candidate.qualified_name(),
        }
        .log();

        let wrapper = synthesize_wrapper(&self.spec, candidate, &core_library);
        self.loaded.module.add_type(wrapper);
        scrub_marker(&mut self.loaded.module, candidate.location);
        self.state = RunState::Injected;

        let options = BuildOptions {
            platform: self.plan.platform,
            debug: self.image.has_debug_info,
        };
        write_module(
            self.toolchain.as_ref(),
            &self.loaded,
            &self.scratch,
            &self.target,
            options,
        )
        .await?;

        let listing = intermediate_listing(&self.target);
        let resource = resource_sibling(&listing);
        // A resource file left by an earlier run must not be embedded again
        match tokio::fs::remove_file(&resource).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(ExportError::io(&resource, e)),
        }
        self.toolchain
            .disassemble(&DisassembleRequest {
                module: self.target.clone(),
                output: listing.clone(),
                line_numbers: self.image.has_debug_info,
            })
            .await?;

        let patch = ExportPatch {
            cor_flags: self.plan.cor_flags,
            wrapper_type: self.spec.quoted_type_name(),
            alias: self.plan.alias.clone(),
        };
        patch_file(&listing, &patch).await?;

        self.toolchain
            .assemble(&AssembleRequest {
                source: listing.clone(),
                output: self.target.clone(),
                resource: existing(resource.clone()).await,
                debug: options.debug,
                platform: options.platform,
            })
            .await?;

        let kept_il = self.spec.keep_il;
        if !kept_il {
            remove_intermediates(&[listing.clone(), resource]).await;
        }

        Ok(ExportSummary {
            candidate: candidate.qualified_name(),
            wrapper_type: self.spec.full_type_name(),
            wrapper_method: self.spec.method_name.clone(),
            alias: patch.alias,
            platform: self.plan.platform,
            cor_flags: patch.cor_flags,
            kept_il,
            intermediate: kept_il.then_some(listing),
        })
    }
}

fn plan_platform(image: &ImageInfo, spec: &WrapperSpec) -> ExportResult<PlatformPlan> {
    let platform = TargetPlatform::from_image(image);
    let unsupported = || ExportError::UnsupportedPlatform {
        machine: image.machine,
        cli_flags: image.cli_flags,
    };
    let cor_flags = platform.cor_flags().ok_or_else(unsupported)?;
    let alias = platform
        .export_alias(&spec.method_name)
        .ok_or_else(unsupported)?;
    Ok(PlatformPlan {
        platform,
        cor_flags,
        alias,
    })
}

/// `<target>.il`, next to the target.
pub fn intermediate_listing(target: &Path) -> PathBuf {
    let mut path = OsString::from(target.as_os_str());
    path.push(".il");
    PathBuf::from(path)
}

/// Deletes intermediate files; missing files are fine and other failures are
/// only logged.
async fn remove_intermediates(paths: &[PathBuf]) {
    let names: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
    CleaningUp { paths: &names }.log();

    for (path, name) in paths.iter().zip(&names) {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => CleanupFailed {
                path: name,
                error: &e,
            }
            .log(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::pe::{COMIMAGE_FLAGS_32BITREQUIRED, COMIMAGE_FLAGS_ILONLY};
    use crate::image::Machine;

    fn image(machine: Machine, cli_flags: u32) -> ImageInfo {
        ImageInfo {
            machine,
            cli_flags,
            is_dll: true,
            has_debug_info: false,
        }
    }

    #[test]
    fn test_intermediate_listing_appends_extension() {
        assert_eq!(
            intermediate_listing(Path::new("/bin/MyExtension.dll")),
            PathBuf::from("/bin/MyExtension.dll.il")
        );
    }

    #[test]
    fn test_plan_platform() {
        let spec = WrapperSpec::default();

        let x86 = plan_platform(
            &image(Machine::I386, COMIMAGE_FLAGS_ILONLY | COMIMAGE_FLAGS_32BITREQUIRED),
            &spec,
        )
        .unwrap();
        assert_eq!(x86.cor_flags, 0x2);
        assert_eq!(x86.alias, "_RVExtension@12");

        let x64 = plan_platform(&image(Machine::Amd64, COMIMAGE_FLAGS_ILONLY), &spec).unwrap();
        assert_eq!(x64.cor_flags, 0x0);
        assert_eq!(x64.alias, "RVExtension");

        assert!(matches!(
            plan_platform(&image(Machine::I386, COMIMAGE_FLAGS_ILONLY), &spec),
            Err(ExportError::UnsupportedPlatform {
                machine: Machine::I386,
                cli_flags: COMIMAGE_FLAGS_ILONLY
            })
        ));
    }

    #[tokio::test]
    async fn test_remove_intermediates_tolerates_missing_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let present = dir.path().join("a.dll.il");
        tokio::fs::write(&present, "x").await.unwrap();

        remove_intermediates(&[present.clone(), dir.path().join("a.dll.res")]).await;

        assert!(!present.exists());
    }

    #[test]
    fn test_outcome_serialization() {
        let summary = ExportSummary {
            candidate: "MyExtension.Entry::Invoke".to_string(),
            wrapper_type: "Maca134.Arma.DllExport.DllExportWrapper".to_string(),
            wrapper_method: "RVExtension".to_string(),
            alias: "RVExtension".to_string(),
            platform: TargetPlatform::X64,
            cor_flags: 0,
            kept_il: false,
            intermediate: None,
        };

        let json = serde_json::to_value(ExportOutcome::Exported(summary)).unwrap();
        assert_eq!(json["status"], "exported");
        assert_eq!(json["platform"], "x64");
        assert_eq!(json["alias"], "RVExtension");
        assert!(json.get("intermediate").is_none());

        let json = serde_json::to_value(ExportOutcome::NothingToExport).unwrap();
        assert_eq!(json, serde_json::json!({ "status": "nothing_to_export" }));
    }
}
