use thiserror::Error;

/// Result type alias using ProdexError
pub type Result<T> = std::result::Result<T, ProdexError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// Structural failures abort an operation; validation findings never show up
/// here (they are accumulated as messages instead). Each kind maps to a
/// stable code usable by callers and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PxErrorKind {
    // Structural
    InvalidInput,
    NotFound,
    AlreadyExists,
    CycleDetected,
    StructureCycle,

    // Deep copy
    MissingHandle,
    AtomicityBreach,

    // Integration/IO
    Io,
    Serialization,
    InvalidDocument,
    Persistence,
    ExternalService,

    // Internal
    Internal,
}

impl PxErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            PxErrorKind::InvalidInput => "ERR_INVALID_INPUT",
            PxErrorKind::NotFound => "ERR_NOT_FOUND",
            PxErrorKind::AlreadyExists => "ERR_ALREADY_EXISTS",
            PxErrorKind::CycleDetected => "ERR_CYCLE_DETECTED",
            PxErrorKind::StructureCycle => "ERR_STRUCTURE_CYCLE",
            PxErrorKind::MissingHandle => "ERR_MISSING_HANDLE",
            PxErrorKind::AtomicityBreach => "ERR_ATOMICITY_BREACH",
            PxErrorKind::Io => "ERR_IO",
            PxErrorKind::Serialization => "ERR_SERIALIZATION",
            PxErrorKind::InvalidDocument => "ERR_INVALID_DOCUMENT",
            PxErrorKind::Persistence => "ERR_PERSISTENCE",
            PxErrorKind::ExternalService => "ERR_EXTERNAL_SERVICE",
            PxErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries a classification kind plus optional context for debugging. Store
/// and CLI code report failures through this type; the kernel converts its
/// `ProdexError` variants into it at the boundary.
#[derive(Debug, Clone)]
pub struct PxError {
    kind: PxErrorKind,
    op: Option<String>,
    entity_id: Option<String>,
    path: Option<Vec<String>>,
    message: String,
    source: Option<Box<PxError>>,
}

impl PxError {
    /// Create a new error with the specified kind
    pub fn new(kind: PxErrorKind) -> Self {
        Self {
            kind,
            op: None,
            entity_id: None,
            path: None,
            message: String::new(),
            source: None,
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add entity identity context (type name, component name or handle)
    pub fn with_entity_id(mut self, id: impl Into<String>) -> Self {
        self.entity_id = Some(id.into());
        self
    }

    /// Add the offending path (supertype chain or structure path)
    pub fn with_path(mut self, path: Vec<String>) -> Self {
        self.path = Some(path);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Add source error
    pub fn with_source(mut self, source: PxError) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> PxErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    pub fn path(&self) -> Option<&[String]> {
        self.path.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn source_error(&self) -> Option<&PxError> {
        self.source.as_deref()
    }
}

impl std::fmt::Display for PxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(entity_id) = &self.entity_id {
            write!(f, " (entity: {})", entity_id)?;
        }
        if let Some(path) = &self.path {
            write!(f, " (path: {})", path.join(" -> "))?;
        }
        Ok(())
    }
}

impl std::error::Error for PxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|s| s as &(dyn std::error::Error + 'static))
    }
}

// ========== End Error Facility ==========

/// Structural failures raised by the model kernel
///
/// These abort the operation in progress. Callers are expected to surface
/// them and retry only after the underlying data has been corrected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProdexError {
    // ===== Lookup Errors =====
    /// Type not found in the project index
    #[error("Type not found: {type_name}")]
    TypeNotFound { type_name: String },

    /// Product component not found
    #[error("Product component not found: {component_name}")]
    ComponentNotFound { component_name: String },

    /// Project not registered in the index
    #[error("Project not found: {project}")]
    ProjectNotFound { project: String },

    /// Structure node id does not belong to the structure
    #[error("Structure node not found: {node_id}")]
    NodeNotFound { node_id: usize },

    // ===== Hierarchy Errors =====
    /// Supertype chain revisits a type
    #[error("Supertype hierarchy of {type_name} is cyclic: {}", chain.join(" -> "))]
    SupertypeCycle {
        type_name: String,
        chain: Vec<String>,
    },

    // ===== Structure Errors =====
    /// A structure path returns to one of its own ancestors
    #[error("Cycle in product structure: {}", path.join(" -> "))]
    StructureCycle { path: Vec<String> },

    // ===== Deep Copy Errors =====
    /// A node selected for copying has no target handle
    #[error("No copy handle given for component {component_name}")]
    MissingCopyHandle { component_name: String },

    /// The target handle already exists in the persistence target
    #[error("Copy target already exists: {handle}")]
    HandleAlreadyExists { handle: String },

    /// Two different components were mapped onto the same handle
    #[error("Copy handle {handle} is assigned to more than one component")]
    DuplicateHandle { handle: String },

    /// A produced handle is missing or still dirty after the batch completed
    #[error("Copy atomicity breach: {message}")]
    CopyAtomicityBreach { message: String },

    // ===== Persistence Errors =====
    /// A document node could not be decoded into an entity
    #[error("Invalid document node <{node}>: {reason}")]
    InvalidDocument { node: String, reason: String },

    /// Settings could not be parsed
    #[error("Invalid settings: {reason}")]
    InvalidSettings { reason: String },

    /// Serialization error (JSON encoding/decoding)
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl From<ProdexError> for PxError {
    fn from(err: ProdexError) -> Self {
        match err {
            ProdexError::TypeNotFound { type_name } => PxError::new(PxErrorKind::NotFound)
                .with_entity_id(type_name)
                .with_message("Type not found"),

            ProdexError::ComponentNotFound { component_name } => {
                PxError::new(PxErrorKind::NotFound)
                    .with_entity_id(component_name)
                    .with_message("Product component not found")
            }

            ProdexError::ProjectNotFound { project } => PxError::new(PxErrorKind::NotFound)
                .with_entity_id(project)
                .with_message("Project not found"),

            ProdexError::NodeNotFound { node_id } => PxError::new(PxErrorKind::NotFound)
                .with_entity_id(format!("node:{}", node_id))
                .with_message("Structure node not found"),

            ProdexError::SupertypeCycle { type_name, chain } => {
                PxError::new(PxErrorKind::CycleDetected)
                    .with_entity_id(type_name)
                    .with_path(chain)
                    .with_message("Supertype hierarchy is cyclic")
            }

            ProdexError::StructureCycle { path } => PxError::new(PxErrorKind::StructureCycle)
                .with_op("build_structure")
                .with_path(path)
                .with_message("Product structure contains a cycle"),

            ProdexError::MissingCopyHandle { component_name } => {
                PxError::new(PxErrorKind::MissingHandle)
                    .with_op("deep_copy")
                    .with_entity_id(component_name)
                    .with_message("No copy handle given")
            }

            ProdexError::HandleAlreadyExists { handle } => {
                PxError::new(PxErrorKind::AlreadyExists)
                    .with_op("deep_copy")
                    .with_entity_id(handle)
                    .with_message("Copy target already exists")
            }

            ProdexError::DuplicateHandle { handle } => PxError::new(PxErrorKind::InvalidInput)
                .with_op("deep_copy")
                .with_entity_id(handle)
                .with_message("Handle assigned to more than one component"),

            ProdexError::CopyAtomicityBreach { message } => {
                PxError::new(PxErrorKind::AtomicityBreach)
                    .with_op("deep_copy")
                    .with_message(message)
            }

            ProdexError::InvalidDocument { node, reason } => {
                PxError::new(PxErrorKind::InvalidDocument)
                    .with_entity_id(node)
                    .with_message(reason)
            }

            ProdexError::InvalidSettings { reason } => {
                PxError::new(PxErrorKind::InvalidInput)
                    .with_op("load_settings")
                    .with_message(reason)
            }

            ProdexError::Serialization { message } => {
                PxError::new(PxErrorKind::Serialization).with_message(message)
            }

            ProdexError::Internal { message } => {
                PxError::new(PxErrorKind::Internal).with_message(message)
            }
        }
    }
}

/// Conversion from serde_json::Error to ProdexError
impl From<serde_json::Error> for ProdexError {
    fn from(err: serde_json::Error) -> Self {
        ProdexError::Serialization {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_codes() {
        let cases = [
            (PxErrorKind::CycleDetected, "ERR_CYCLE_DETECTED"),
            (PxErrorKind::StructureCycle, "ERR_STRUCTURE_CYCLE"),
            (PxErrorKind::MissingHandle, "ERR_MISSING_HANDLE"),
            (PxErrorKind::AtomicityBreach, "ERR_ATOMICITY_BREACH"),
            (PxErrorKind::InvalidDocument, "ERR_INVALID_DOCUMENT"),
        ];
        for (kind, expected_code) in cases {
            assert_eq!(kind.code(), expected_code, "Wrong code for {:?}", kind);
        }
    }

    #[test]
    fn test_structure_cycle_keeps_path() {
        let err: PxError = ProdexError::StructureCycle {
            path: vec!["A".into(), "B".into(), "A".into()],
        }
        .into();
        assert_eq!(err.kind(), PxErrorKind::StructureCycle);
        assert_eq!(
            err.path().expect("path should be set"),
            &["A".to_string(), "B".to_string(), "A".to_string()]
        );
        assert!(err.to_string().contains("A -> B -> A"));
    }

    #[test]
    fn test_supertype_cycle_display() {
        let err = ProdexError::SupertypeCycle {
            type_name: "a.A".into(),
            chain: vec!["a.A".into(), "a.B".into(), "a.A".into()],
        };
        assert_eq!(
            err.to_string(),
            "Supertype hierarchy of a.A is cyclic: a.A -> a.B -> a.A"
        );
    }

    #[test]
    fn test_source_chain() {
        let inner = PxError::new(PxErrorKind::Io).with_message("disk gone");
        let outer = PxError::new(PxErrorKind::Persistence).with_source(inner);
        assert_eq!(
            outer.source_error().map(|e| e.kind()),
            Some(PxErrorKind::Io)
        );
    }
}
