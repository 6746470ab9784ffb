use serde::{Deserialize, Serialize};
use std::fmt;

/// Upper bound of an association or link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CardinalityRepr", into = "CardinalityRepr")]
pub enum Cardinality {
    Bounded(u32),
    Unbounded,
}

impl Cardinality {
    /// True when more than one target is allowed
    pub fn is_many(&self) -> bool {
        match self {
            Cardinality::Bounded(n) => *n > 1,
            Cardinality::Unbounded => true,
        }
    }

    /// Check whether `count` targets respect this upper bound
    pub fn allows(&self, count: usize) -> bool {
        match self {
            Cardinality::Bounded(n) => count <= *n as usize,
            Cardinality::Unbounded => true,
        }
    }

    /// True when this bound is at least `min`
    pub fn is_at_least(&self, min: u32) -> bool {
        match self {
            Cardinality::Bounded(n) => *n >= min,
            Cardinality::Unbounded => true,
        }
    }

    /// Parse `*` or a non-negative number
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if text == "*" {
            return Some(Cardinality::Unbounded);
        }
        text.parse().ok().map(Cardinality::Bounded)
    }
}

impl Default for Cardinality {
    fn default() -> Self {
        Cardinality::Bounded(1)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cardinality::Bounded(n) => write!(f, "{}", n),
            Cardinality::Unbounded => write!(f, "*"),
        }
    }
}

/// Wire form: a number or `"*"`
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum CardinalityRepr {
    Count(u32),
    Text(String),
}

impl TryFrom<CardinalityRepr> for Cardinality {
    type Error = String;

    fn try_from(repr: CardinalityRepr) -> std::result::Result<Self, Self::Error> {
        match repr {
            CardinalityRepr::Count(n) => Ok(Cardinality::Bounded(n)),
            CardinalityRepr::Text(text) => Cardinality::parse(&text)
                .ok_or_else(|| format!("invalid cardinality '{}'", text)),
        }
    }
}

impl From<Cardinality> for CardinalityRepr {
    fn from(c: Cardinality) -> Self {
        match c {
            Cardinality::Bounded(n) => CardinalityRepr::Count(n),
            Cardinality::Unbounded => CardinalityRepr::Text("*".to_string()),
        }
    }
}

/// Association kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssociationKind {
    CompositionMasterToDetail,
    CompositionDetailToMaster,
    Aggregation,
    #[default]
    Association,
}

impl AssociationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssociationKind::CompositionMasterToDetail => "composition_master_to_detail",
            AssociationKind::CompositionDetailToMaster => "composition_detail_to_master",
            AssociationKind::Aggregation => "aggregation",
            AssociationKind::Association => "association",
        }
    }

    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "composition_master_to_detail" => Some(AssociationKind::CompositionMasterToDetail),
            "composition_detail_to_master" => Some(AssociationKind::CompositionDetailToMaster),
            "aggregation" => Some(AssociationKind::Aggregation),
            "association" => Some(AssociationKind::Association),
            _ => None,
        }
    }
}

/// Association owned by a type
///
/// The singular role name identifies the association within its owner.
/// `target`, `subsetted_derived_union` and `inverse_association` are names
/// resolved on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Association {
    /// Qualified name of the target type
    pub target: String,

    pub target_role_singular: String,

    /// Required only when the max cardinality allows more than one target
    #[serde(default)]
    pub target_role_plural: String,

    #[serde(default)]
    pub min_cardinality: u32,

    #[serde(default)]
    pub max_cardinality: Cardinality,

    #[serde(default)]
    pub kind: AssociationKind,

    #[serde(default)]
    pub derived_union: bool,

    /// Name of the derived union this association is a subset of
    #[serde(default)]
    pub subsetted_derived_union: Option<String>,

    /// Narrows the same-named association of a supertype
    #[serde(default)]
    pub constrain: bool,

    /// Name of the bidirectional counterpart on the target type
    #[serde(default)]
    pub inverse_association: Option<String>,

    #[serde(default)]
    pub qualified: bool,
}

impl Association {
    /// Create a plain 0..1 association
    pub fn new(target: impl Into<String>, role_singular: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            target_role_singular: role_singular.into(),
            target_role_plural: String::new(),
            min_cardinality: 0,
            max_cardinality: Cardinality::Bounded(1),
            kind: AssociationKind::Association,
            derived_union: false,
            subsetted_derived_union: None,
            constrain: false,
            inverse_association: None,
            qualified: false,
        }
    }

    /// Create a 0..* association with singular and plural role names
    pub fn to_many(
        target: impl Into<String>,
        role_singular: impl Into<String>,
        role_plural: impl Into<String>,
    ) -> Self {
        let mut association = Self::new(target, role_singular);
        association.target_role_plural = role_plural.into();
        association.max_cardinality = Cardinality::Unbounded;
        association
    }

    /// The association's name (its singular role)
    pub fn name(&self) -> &str {
        &self.target_role_singular
    }

    pub fn is_plural_required(&self) -> bool {
        self.max_cardinality.is_many()
    }

    pub fn is_subset_of_derived_union(&self) -> bool {
        self.subsetted_derived_union.is_some()
    }

    pub fn is_composition_detail_to_master(&self) -> bool {
        self.kind == AssociationKind::CompositionDetailToMaster
    }
}
