// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Shape checks that run before the module is touched.

use crate::config::WrapperSpec;
use crate::engine::candidate::ExportCandidate;
use crate::errors::{ExportError, ExportResult, SignatureError};
use crate::il::Module;

const EXPECTED_RETURN: &str = "string";
const EXPECTED_PARAMETERS: [&str; 2] = ["string", "int32"];

/// Checks the candidate's shape, first failure wins.
///
/// Order: return type, parameter list, declaring type visibility, static,
/// method visibility.
pub fn check_signature(candidate: &ExportCandidate) -> Result<(), SignatureError> {
    if candidate.return_type != EXPECTED_RETURN {
        return Err(SignatureError::ReturnType {
            found: candidate.return_type.clone(),
        });
    }

    if candidate.parameter_types != EXPECTED_PARAMETERS {
        return Err(SignatureError::Parameters {
            found: candidate.parameter_types.join(", "),
        });
    }

    if !candidate.type_is_public {
        let type_name = if candidate.type_namespace.is_empty() {
            candidate.type_name.clone()
        } else {
            format!("{}.{}", candidate.type_namespace, candidate.type_name)
        };
        return Err(SignatureError::DeclaringTypeNotPublic { type_name });
    }

    if !candidate.is_static {
        return Err(SignatureError::NotStatic);
    }

    if !candidate.is_public {
        return Err(SignatureError::NotPublic);
    }

    Ok(())
}

/// [`check_signature`] wrapped with the candidate's name.
pub fn validate_signature(candidate: &ExportCandidate) -> ExportResult<()> {
    check_signature(candidate).map_err(|source| ExportError::InvalidCandidate {
        method: candidate.qualified_name(),
        source,
    })
}

/// Checks the module can take the wrapper: the name is free and a core library
/// is referenced. Returns the core library name.
pub fn validate_injection_target<'m>(
    module: &'m Module,
    wrapper: &WrapperSpec,
) -> ExportResult<&'m str> {
    if module
        .find_type(&wrapper.namespace, &wrapper.type_name)
        .is_some()
    {
        return Err(ExportError::WrapperTypeExists(wrapper.full_type_name()));
    }
    module.core_library().ok_or(ExportError::MissingCoreLibrary)
}
