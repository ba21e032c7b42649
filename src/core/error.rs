//! Strongly-typed error kinds for manifest, registration and resolver
//! failures.
//!
//! The variants map onto the tool's failure classes:
//!
//! - **Validation**: [`O3deError::ManifestParseError`],
//!   [`O3deError::DescriptorParseError`], [`O3deError::MissingRequiredField`],
//!   [`O3deError::InvalidVersionSpecifier`]
//! - **Conflict**: [`O3deError::RegistrationConflict`]
//! - **Unresolved**: [`O3deError::UnresolvedDependency`],
//!   [`O3deError::EngineNotFound`], [`O3deError::GemNotFound`],
//!   [`O3deError::DescriptorNotFound`]
//! - **I/O**: propagated through [`anyhow`] with file context at the call
//!   site rather than duplicated here.
//!
//! Ambiguity (several candidates at the same winning version) is not an
//! error: the resolver warns and deterministically picks the first seen.

use thiserror::Error;

/// All typed failure modes surfaced by the CLI.
#[derive(Error, Debug)]
pub enum O3deError {
    /// The per-user manifest exists but is not valid JSON.
    #[error("Failed to parse manifest {file}: {reason}")]
    ManifestParseError {
        /// Path of the manifest file that failed to parse
        file: String,
        /// Parser diagnostic
        reason: String,
    },

    /// A descriptor file (engine.json, project.json, gem.json, template.json,
    /// repo.json) is not valid JSON.
    #[error("Failed to parse {file}: {reason}")]
    DescriptorParseError {
        /// Path of the descriptor file
        file: String,
        /// Parser diagnostic
        reason: String,
    },

    /// A descriptor is missing a required field, typically its identity key.
    #[error("{file} is missing required field '{field}'")]
    MissingRequiredField {
        /// Path of the offending descriptor
        file: String,
        /// Name of the missing field
        field: String,
    },

    /// A descriptor could not be located by name or path.
    #[error("No registered {kind} matches '{target}'")]
    DescriptorNotFound {
        /// Kind of object looked up (engine, project, gem, template, repo)
        kind: String,
        /// The name or path that failed to resolve
        target: String,
    },

    /// An identity is already registered at a different path with differing
    /// contents, and `--force` was not given.
    #[error(
        "{kind} '{name}' is already registered with different contents; \
         use --force to replace the registration"
    )]
    RegistrationConflict {
        /// Kind of object being registered
        kind: String,
        /// Identity key that collided
        name: String,
    },

    /// A project's engine binding matched no registered engine.
    #[error("No registered engine satisfies '{name}'")]
    EngineNotFound {
        /// The engine name (optionally with a version specifier)
        name: String,
    },

    /// A gem name matched no candidate, locally or in cached repos.
    #[error("No gem matches '{name}'")]
    GemNotFound {
        /// The gem name (optionally with a version specifier)
        name: String,
    },

    /// A dependency token in `gem_names` matched no candidate gem.
    #[error("Unresolved gem dependency '{token}'")]
    UnresolvedDependency {
        /// The offending dependency token, verbatim
        token: String,
    },

    /// A dependency token or version string does not follow the
    /// `NAME [OP VERSION]` grammar.
    #[error("Invalid version specifier '{token}': {reason}")]
    InvalidVersionSpecifier {
        /// The token that failed to parse
        token: String,
        /// What was wrong with it
        reason: String,
    },

    /// A remote repo manifest could not be fetched.
    #[error("Failed to fetch repo manifest from '{uri}': {reason}")]
    RepoFetchError {
        /// The repo URI
        uri: String,
        /// Transport or HTTP diagnostic
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_entity() {
        let err = O3deError::UnresolvedDependency { token: "gemA==2.0.0".into() };
        assert!(err.to_string().contains("gemA==2.0.0"));

        let err = O3deError::RegistrationConflict { kind: "engine".into(), name: "o3de".into() };
        assert!(err.to_string().contains("engine"));
        assert!(err.to_string().contains("--force"));
    }

    #[test]
    fn test_converts_into_anyhow() {
        fn fails() -> anyhow::Result<()> {
            Err(O3deError::EngineNotFound { name: "missing".into() }.into())
        }
        let err = fails().unwrap_err();
        assert!(err.to_string().contains("missing"));
        assert!(err.downcast_ref::<O3deError>().is_some());
    }
}
