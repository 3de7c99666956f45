//! The in-memory document and its structural and element operations.
//!
//! Every operation resolves and validates everything it needs before it
//! touches the document, so a failed call leaves the document unchanged.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{AasError, Result};
use crate::model::{
    ConceptDescription, LangString, Property, Shell, Submodel, SubmodelElement, SubmodelRef,
};
use crate::value::{PropertyValue, ValueType};

/// What re-adding an existing submodel id, concept id or element name does.
/// One policy covers all three.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicatePolicy {
    /// Replace the existing entry in place, keeping its position.
    #[default]
    Overwrite,
    /// Fail with `DuplicateId` / `DuplicateName`.
    Reject,
}

/// Result of an insert that may have replaced an existing entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Upsert<T> {
    pub item: T,
    pub replaced: bool,
}

/// Old and new value of an updated property.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChange {
    pub old: Option<PropertyValue>,
    pub new: PropertyValue,
}

/// One shell, its submodels keyed by id, and concept descriptions keyed by id.
/// Both maps iterate in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Document {
    pub shell: Option<Shell>,
    pub submodels: IndexMap<String, Submodel>,
    pub concept_descriptions: IndexMap<String, ConceptDescription>,
    policy: DuplicatePolicy,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: DuplicatePolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Drop everything. The duplicate policy survives.
    pub fn reset(&mut self) {
        *self = Self::with_policy(self.policy);
    }

    /// Swap in a freshly loaded document wholesale.
    pub fn replace_with(&mut self, loaded: Document) {
        let policy = self.policy;
        *self = loaded;
        self.policy = policy;
    }

    pub fn is_empty(&self) -> bool {
        self.shell.is_none() && self.submodels.is_empty() && self.concept_descriptions.is_empty()
    }

    pub fn element_count(&self) -> usize {
        self.submodels.values().map(|sm| sm.elements.len()).sum()
    }

    // ── Structural operations ──

    /// Replace the shell. Existing submodels and concepts stay; the new
    /// shell references every submodel already present.
    pub fn create_shell(&mut self, id: &str, id_short: &str, global_asset_id: &str) -> &Shell {
        let mut shell = Shell::new(id, id_short, global_asset_id);
        shell.submodels = self
            .submodels
            .values()
            .map(|sm| SubmodelRef {
                id: sm.id.clone(),
                id_short: sm.id_short.clone(),
            })
            .collect();
        info!("Created shell '{}' ({})", id_short, id);
        self.shell.insert(shell)
    }

    pub fn add_submodel(&mut self, id: &str, id_short: &str) -> Result<Upsert<&Submodel>> {
        let policy = self.policy;
        let shell = self.shell.as_mut().ok_or(AasError::NoShell)?;
        let exists = self.submodels.contains_key(id);
        if exists && policy == DuplicatePolicy::Reject {
            return Err(AasError::DuplicateId {
                kind: "Submodel",
                id: id.to_string(),
            });
        }

        match shell.submodels.iter_mut().find(|r| r.id == id) {
            Some(existing) => existing.id_short = id_short.to_string(),
            None => shell.submodels.push(SubmodelRef {
                id: id.to_string(),
                id_short: id_short.to_string(),
            }),
        }

        // IndexMap::insert keeps the original slot for an existing key
        self.submodels
            .insert(id.to_string(), Submodel::new(id, id_short));
        info!("Added submodel '{}' ({}), replaced={}", id_short, id, exists);

        Ok(Upsert {
            item: &self.submodels[id],
            replaced: exists,
        })
    }

    pub fn add_concept_description(
        &mut self,
        id: &str,
        id_short: &str,
        preferred_name: Option<&str>,
        definition: Option<&str>,
    ) -> Result<Upsert<&ConceptDescription>> {
        let exists = self.concept_descriptions.contains_key(id);
        if exists && self.policy == DuplicatePolicy::Reject {
            return Err(AasError::DuplicateId {
                kind: "Concept description",
                id: id.to_string(),
            });
        }

        let concept = ConceptDescription {
            id: id.to_string(),
            id_short: id_short.to_string(),
            display_name: non_empty(preferred_name).map(LangString::en),
            definition: non_empty(definition).map(LangString::en),
        };
        self.concept_descriptions.insert(id.to_string(), concept);
        info!("Added concept description '{}' ({})", id_short, id);

        Ok(Upsert {
            item: &self.concept_descriptions[id],
            replaced: exists,
        })
    }

    // ── Lookup ──

    /// First submodel with this short name, in insertion order.
    pub fn submodel(&self, id_short: &str) -> Result<&Submodel> {
        self.submodels
            .values()
            .find(|sm| sm.id_short == id_short)
            .ok_or_else(|| AasError::SubmodelNotFound(id_short.to_string()))
    }

    fn submodel_mut(&mut self, id_short: &str) -> Result<&mut Submodel> {
        self.submodels
            .values_mut()
            .find(|sm| sm.id_short == id_short)
            .ok_or_else(|| AasError::SubmodelNotFound(id_short.to_string()))
    }

    pub fn property(&self, submodel: &str, name: &str) -> Result<&Property> {
        let sm = self.submodel(submodel)?;
        let element = sm.element(name).ok_or_else(|| AasError::PropertyNotFound {
            submodel: submodel.to_string(),
            name: name.to_string(),
        })?;
        element
            .as_property()
            .ok_or_else(|| AasError::NotAProperty(name.to_string()))
    }

    fn property_mut(&mut self, submodel: &str, name: &str) -> Result<&mut Property> {
        let sm = self.submodel_mut(submodel)?;
        match sm.element_mut(name) {
            Some(SubmodelElement::Property(p)) => Ok(p),
            Some(SubmodelElement::Opaque { .. }) => Err(AasError::NotAProperty(name.to_string())),
            None => Err(AasError::PropertyNotFound {
                submodel: submodel.to_string(),
                name: name.to_string(),
            }),
        }
    }

    // ── Element operations ──

    pub fn add_property(
        &mut self,
        submodel: &str,
        name: &str,
        value_type: &str,
        value: Option<&Value>,
        semantic_id: Option<&str>,
    ) -> Result<Upsert<&Property>> {
        let policy = self.policy;
        let sm = self.submodel_mut(submodel)?;
        let value_type = ValueType::from_tag(value_type)?;
        let value = match value {
            Some(v) if !v.is_null() => Some(value_type.coerce(v)?),
            _ => None,
        };

        let position = sm.elements.iter().position(|e| e.id_short() == name);
        if position.is_some() && policy == DuplicatePolicy::Reject {
            return Err(AasError::DuplicateName {
                submodel: submodel.to_string(),
                name: name.to_string(),
            });
        }

        let element = SubmodelElement::Property(Property {
            id_short: name.to_string(),
            value_type,
            value,
            semantic_id: non_empty(semantic_id).map(String::from),
        });
        let idx = match position {
            Some(idx) => {
                sm.elements[idx] = element;
                idx
            }
            None => {
                sm.elements.push(element);
                sm.elements.len() - 1
            }
        };
        info!("Added property '{}' ({}) to '{}'", name, value_type, submodel);

        let property = sm.elements[idx]
            .as_property()
            .ok_or_else(|| AasError::NotAProperty(name.to_string()))?;
        Ok(Upsert {
            item: property,
            replaced: position.is_some(),
        })
    }

    /// Re-coerce `value` with the property's existing type and store it.
    pub fn update_property(&mut self, submodel: &str, name: &str, value: &Value) -> Result<ValueChange> {
        let property = self.property_mut(submodel, name)?;
        let new = property.value_type.coerce(value)?;
        let old = property.value.replace(new.clone());
        debug!("Updated '{}.{}': {:?} -> {:?}", submodel, name, old, new);
        Ok(ValueChange { old, new })
    }

    /// Overwrite the semantic reference. Returns the previous one.
    pub fn update_semantic_id(
        &mut self,
        submodel: &str,
        name: &str,
        semantic_id: &str,
    ) -> Result<Option<String>> {
        let property = self.property_mut(submodel, name)?;
        let previous = property.semantic_id.replace(semantic_id.to_string());
        info!("Semantic id of '{}.{}' set to {}", submodel, name, semantic_id);
        Ok(previous)
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn motor() -> Document {
        let mut doc = Document::new();
        doc.create_shell("https://ex/aas/motor", "motor", "https://ex/assets/motor1");
        doc.add_submodel("https://ex/sm/tech", "TechData").unwrap();
        doc
    }

    #[test]
    fn test_add_submodel_requires_shell() {
        let mut doc = Document::new();
        let result = doc.add_submodel("https://ex/sm/tech", "TechData");
        assert!(matches!(result, Err(AasError::NoShell)));
        assert!(doc.submodels.is_empty());
    }

    #[test]
    fn test_add_submodel_references_shell() {
        let doc = motor();
        let shell = doc.shell.as_ref().unwrap();
        assert_eq!(shell.submodels.len(), 1);
        assert_eq!(shell.submodels[0].id, "https://ex/sm/tech");
        assert_eq!(shell.submodels[0].id_short, "TechData");
    }

    #[test]
    fn test_create_shell_keeps_submodels() {
        let mut doc = motor();
        doc.add_concept_description("urn:cd:temp", "Temp", None, None)
            .unwrap();
        doc.create_shell("https://ex/aas/pump", "pump", "https://ex/assets/pump1");

        assert_eq!(doc.shell.as_ref().unwrap().id_short, "pump");
        assert_eq!(doc.submodels.len(), 1);
        assert_eq!(doc.concept_descriptions.len(), 1);
        assert_eq!(doc.shell.as_ref().unwrap().submodels.len(), 1);
    }

    #[test]
    fn test_duplicate_submodel_overwrites_in_place() {
        let mut doc = motor();
        doc.add_submodel("https://ex/sm/nameplate", "Nameplate")
            .unwrap();
        doc.add_property("TechData", "Speed", "int", Some(&json!(1500)), None)
            .unwrap();

        let added = doc.add_submodel("https://ex/sm/tech", "Technical").unwrap();
        assert!(added.replaced);
        assert!(added.item.elements.is_empty());

        let order: Vec<&str> = doc.submodels.values().map(|s| s.id_short.as_str()).collect();
        assert_eq!(order, vec!["Technical", "Nameplate"]);
        let refs = &doc.shell.as_ref().unwrap().submodels;
        assert_eq!(refs.len(), 2);
        assert_eq!(refs[0].id_short, "Technical");
    }

    #[test]
    fn test_duplicate_submodel_rejected() {
        let mut doc = Document::with_policy(DuplicatePolicy::Reject);
        doc.create_shell("aas", "a", "asset");
        doc.add_submodel("sm", "One").unwrap();
        let result = doc.add_submodel("sm", "Two");
        assert!(matches!(result, Err(AasError::DuplicateId { .. })));
        assert_eq!(doc.submodel("One").unwrap().id, "sm");
        assert_eq!(doc.shell.as_ref().unwrap().submodels.len(), 1);
    }

    #[test]
    fn test_duplicate_property_policy() {
        let mut doc = motor();
        doc.add_property("TechData", "Temperature", "float", Some(&json!(20)), None)
            .unwrap();
        let again = doc
            .add_property("TechData", "Temperature", "int", Some(&json!(5)), None)
            .unwrap();
        assert!(again.replaced);
        assert_eq!(doc.submodel("TechData").unwrap().elements.len(), 1);
        assert_eq!(
            doc.property("TechData", "Temperature").unwrap().value,
            Some(PropertyValue::Integer(5))
        );

        let mut strict = Document::with_policy(DuplicatePolicy::Reject);
        strict.create_shell("aas", "a", "asset");
        strict.add_submodel("sm", "S").unwrap();
        strict.add_property("S", "P", "string", None, None).unwrap();
        let result = strict.add_property("S", "P", "string", None, None);
        assert!(matches!(result, Err(AasError::DuplicateName { .. })));
    }

    #[test]
    fn test_duplicate_concept_policy() {
        let mut doc = Document::new();
        doc.add_concept_description("cd", "A", Some("Alpha"), None)
            .unwrap();
        let again = doc
            .add_concept_description("cd", "B", None, Some("Beta"))
            .unwrap();
        assert!(again.replaced);
        assert_eq!(doc.concept_descriptions["cd"].id_short, "B");
        assert!(doc.concept_descriptions["cd"].display_name.is_none());

        let mut strict = Document::with_policy(DuplicatePolicy::Reject);
        strict.add_concept_description("cd", "A", None, None).unwrap();
        assert!(strict.add_concept_description("cd", "B", None, None).is_err());
        assert_eq!(strict.concept_descriptions["cd"].id_short, "A");
    }

    #[test]
    fn test_add_property_failures_leave_document() {
        let mut doc = motor();
        assert!(matches!(
            doc.add_property("Missing", "P", "int", None, None),
            Err(AasError::SubmodelNotFound(_))
        ));
        assert!(matches!(
            doc.add_property("TechData", "P", "decimal", None, None),
            Err(AasError::InvalidType(_))
        ));
        assert!(matches!(
            doc.add_property("TechData", "P", "int", Some(&json!("abc")), None),
            Err(AasError::InvalidValue { .. })
        ));
        assert!(matches!(
            doc.add_property("TechData", "Big", "int", Some(&json!(3000000000i64)), None),
            Err(AasError::InvalidValue { .. })
        ));
        assert!(doc.submodel("TechData").unwrap().elements.is_empty());
    }

    #[test]
    fn test_semantic_id_attached_and_overwritten() {
        let mut doc = motor();
        doc.add_property("TechData", "Temperature", "float", None, Some("urn:a"))
            .unwrap();
        assert_eq!(
            doc.property("TechData", "Temperature").unwrap().semantic_id.as_deref(),
            Some("urn:a")
        );
        let previous = doc
            .update_semantic_id("TechData", "Temperature", "urn:b")
            .unwrap();
        assert_eq!(previous.as_deref(), Some("urn:a"));
        assert_eq!(
            doc.property("TechData", "Temperature").unwrap().semantic_id.as_deref(),
            Some("urn:b")
        );
    }

    #[test]
    fn test_update_property_coerces_with_existing_type() {
        let mut doc = motor();
        doc.add_property("TechData", "Temperature", "float", Some(&json!(25.5)), None)
            .unwrap();
        let change = doc
            .update_property("TechData", "Temperature", &json!("30"))
            .unwrap();
        assert_eq!(change.old, Some(PropertyValue::Float(25.5)));
        assert_eq!(change.new, PropertyValue::Float(30.0));
    }

    #[test]
    fn test_update_property_invalid_value_keeps_old() {
        let mut doc = motor();
        doc.add_property("TechData", "Speed", "int", Some(&json!(1500)), None)
            .unwrap();
        let result = doc.update_property("TechData", "Speed", &json!("fast"));
        assert!(matches!(result, Err(AasError::InvalidValue { .. })));
        assert_eq!(
            doc.property("TechData", "Speed").unwrap().value,
            Some(PropertyValue::Integer(1500))
        );
    }

    #[test]
    fn test_update_missing_and_opaque() {
        let mut doc = motor();
        assert!(matches!(
            doc.update_property("TechData", "Nope", &json!(1)),
            Err(AasError::PropertyNotFound { .. })
        ));
        assert!(matches!(
            doc.update_property("Nope", "Nope", &json!(1)),
            Err(AasError::SubmodelNotFound(_))
        ));

        doc.submodels
            .get_mut("https://ex/sm/tech")
            .unwrap()
            .elements
            .push(SubmodelElement::Opaque {
                id_short: "Manual".into(),
                model_type: "File".into(),
                raw: json!({"modelType": "File", "idShort": "Manual"}),
            });
        assert!(matches!(
            doc.update_property("TechData", "Manual", &json!("x")),
            Err(AasError::NotAProperty(_))
        ));
        assert!(matches!(
            doc.property("TechData", "Manual"),
            Err(AasError::NotAProperty(_))
        ));
    }

    #[test]
    fn test_submodel_lookup_first_match() {
        let mut doc = motor();
        doc.add_submodel("https://ex/sm/tech2", "TechData").unwrap();
        assert_eq!(doc.submodel("TechData").unwrap().id, "https://ex/sm/tech");
    }

    #[test]
    fn test_reset_keeps_policy() {
        let mut doc = Document::with_policy(DuplicatePolicy::Reject);
        doc.create_shell("aas", "a", "asset");
        doc.reset();
        assert!(doc.is_empty());
        assert_eq!(doc.policy(), DuplicatePolicy::Reject);
    }
}
