//! Document entities: shell, submodels, elements, concept descriptions.

use crate::value::{PropertyValue, ValueType};

/// Language tag for display names and definitions.
pub const DEFAULT_LANGUAGE: &str = "en";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
    Instance,
    Type,
}

impl AssetKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AssetKind::Instance => "Instance",
            AssetKind::Type => "Type",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Instance" => Some(AssetKind::Instance),
            "Type" => Some(AssetKind::Type),
            _ => None,
        }
    }
}

impl std::fmt::Display for AssetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Upper case, the way the tree view shows it
        f.write_str(&self.as_str().to_uppercase())
    }
}

/// Lightweight pointer from the shell to a submodel. Identity only; it is not
/// kept in sync with the submodel's contents.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmodelRef {
    pub id: String,
    pub id_short: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shell {
    pub id: String,
    pub id_short: String,
    pub asset_kind: AssetKind,
    pub global_asset_id: String,
    pub submodels: Vec<SubmodelRef>,
}

impl Shell {
    pub fn new(id: &str, id_short: &str, global_asset_id: &str) -> Self {
        Self {
            id: id.to_string(),
            id_short: id_short.to_string(),
            asset_kind: AssetKind::Instance,
            global_asset_id: global_asset_id.to_string(),
            submodels: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub id_short: String,
    pub value_type: ValueType,
    pub value: Option<PropertyValue>,
    /// Global id of a concept description. Never resolved or validated.
    pub semantic_id: Option<String>,
}

/// One entry of a submodel's ordered element list.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmodelElement {
    Property(Property),
    /// An element kind this crate does not edit, kept verbatim from a loaded
    /// file so saving it again loses nothing.
    Opaque {
        id_short: String,
        model_type: String,
        raw: serde_json::Value,
    },
}

impl SubmodelElement {
    pub fn id_short(&self) -> &str {
        match self {
            SubmodelElement::Property(p) => &p.id_short,
            SubmodelElement::Opaque { id_short, .. } => id_short,
        }
    }

    pub fn as_property(&self) -> Option<&Property> {
        match self {
            SubmodelElement::Property(p) => Some(p),
            SubmodelElement::Opaque { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Submodel {
    pub id: String,
    pub id_short: String,
    pub elements: Vec<SubmodelElement>,
}

impl Submodel {
    pub fn new(id: &str, id_short: &str) -> Self {
        Self {
            id: id.to_string(),
            id_short: id_short.to_string(),
            elements: Vec::new(),
        }
    }

    /// First element with this short name.
    pub fn element(&self, id_short: &str) -> Option<&SubmodelElement> {
        self.elements.iter().find(|e| e.id_short() == id_short)
    }

    pub fn element_mut(&mut self, id_short: &str) -> Option<&mut SubmodelElement> {
        self.elements.iter_mut().find(|e| e.id_short() == id_short)
    }
}

/// A single-locale text (`en`).
#[derive(Debug, Clone, PartialEq)]
pub struct LangString {
    pub language: String,
    pub text: String,
}

impl LangString {
    pub fn en(text: &str) -> Self {
        Self {
            language: DEFAULT_LANGUAGE.to_string(),
            text: text.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConceptDescription {
    pub id: String,
    pub id_short: String,
    pub display_name: Option<LangString>,
    pub definition: Option<LangString>,
}
