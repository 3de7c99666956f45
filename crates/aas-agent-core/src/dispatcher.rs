//! Routes operations to the document and renders every outcome as text.

use serde_json::Value;
use tracing::{info, warn};

use crate::document::{Document, DuplicatePolicy};
use crate::error::Result;
use crate::operations::Operation;
use crate::render;
use crate::storage::Storage;
use crate::value::display_value;

/// Owns one document and the storage it saves to.
pub struct Dispatcher {
    document: Document,
    storage: Storage,
}

impl Dispatcher {
    pub fn new(storage: Storage, policy: DuplicatePolicy) -> Self {
        Self {
            document: Document::with_policy(policy),
            storage,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn reset(&mut self) {
        self.document.reset();
    }

    /// Run a named call. Never fails: errors come back as `❌ ` text.
    pub fn dispatch(&mut self, name: &str, args: &Value) -> String {
        let result = Operation::from_call(name, args).and_then(|op| self.execute(op));
        match result {
            Ok(text) => {
                info!("Tool {} succeeded", name);
                text
            }
            Err(e) => {
                warn!("Tool {} failed: {}", name, e);
                format!("❌ {}", e)
            }
        }
    }

    pub fn execute(&mut self, op: Operation) -> Result<String> {
        let doc = &mut self.document;
        match op {
            Operation::CreateAas(a) => {
                let shell = doc.create_shell(&a.aas_id, &a.id_short, &a.global_asset_id);
                Ok(format!("✅ Created AAS '{}' with ID: {}", shell.id_short, shell.id))
            }

            Operation::AddSubmodel(a) => {
                let added = doc.add_submodel(&a.submodel_id, &a.id_short)?;
                if added.replaced {
                    Ok(format!(
                        "✅ Replaced submodel '{}' ({})",
                        added.item.id_short, added.item.id
                    ))
                } else {
                    Ok(format!("✅ Added submodel '{}' to AAS", added.item.id_short))
                }
            }

            Operation::AddProperty(a) => {
                let added = doc.add_property(
                    &a.submodel_id_short,
                    &a.property_name,
                    &a.value_type,
                    a.value.as_ref(),
                    a.semantic_id.as_deref(),
                )?;
                let p = added.item;
                let verb = if added.replaced { "Replaced" } else { "Added" };
                let mut text = format!(
                    "✅ {} property '{}' ({}) to submodel '{}'",
                    verb, p.id_short, p.value_type, a.submodel_id_short
                );
                if let Some(v) = &p.value {
                    text.push_str(&format!(" with value {}", v));
                }
                if let Some(s) = &p.semantic_id {
                    text.push_str(&format!("\n   Semantic ID: {}", s));
                }
                Ok(text)
            }

            Operation::UpdateProperty(a) => {
                let change = doc.update_property(&a.submodel_id_short, &a.property_name, &a.value)?;
                Ok(format!(
                    "✅ Updated '{}': {} → {}",
                    a.property_name,
                    display_value(change.old.as_ref()),
                    change.new
                ))
            }

            Operation::GetPropertyValue(a) => {
                let p = doc.property(&a.submodel_id_short, &a.property_name)?;
                Ok(format!(
                    "📌 {} = {} ({})",
                    p.id_short,
                    display_value(p.value.as_ref()),
                    p.value_type
                ))
            }

            Operation::SaveAas(a) => {
                let saved = self.storage.save(doc, &a.filename)?;
                Ok(format!(
                    "✅ Saved AAS to '{}' ({} submodels{})",
                    saved.filename,
                    saved.submodels,
                    concept_suffix(saved.concepts)
                ))
            }

            Operation::LoadAas(a) => {
                let loaded = self.storage.load_into(doc, &a.filename)?;
                let id_short = doc
                    .shell
                    .as_ref()
                    .map(|s| s.id_short.as_str())
                    .unwrap_or_default();
                Ok(format!(
                    "✅ Loaded '{}' from '{}' ({} submodels, {} elements{})",
                    id_short,
                    loaded.filename,
                    loaded.submodels,
                    loaded.elements,
                    concept_suffix(loaded.concepts)
                ))
            }

            Operation::GetTreeView => Ok(render::tree_view(doc)),

            Operation::GetCurrentState => Ok(render::current_state(doc)),

            Operation::AddConceptDescription(a) => {
                let added = doc.add_concept_description(
                    &a.concept_id,
                    &a.id_short,
                    a.preferred_name.as_deref(),
                    a.definition.as_deref(),
                )?;
                let cd = added.item;
                let verb = if added.replaced { "Replaced" } else { "Added" };
                let mut text = format!("✅ {} concept description '{}'", verb, cd.id_short);
                if let Some(name) = &cd.display_name {
                    text.push_str(&format!("\n   Name: {}", name.text));
                }
                if let Some(def) = &cd.definition {
                    text.push_str(&format!("\n   Definition: {}", def.text));
                }
                Ok(text)
            }

            Operation::UpdateSemanticId(a) => {
                doc.update_semantic_id(&a.submodel_id_short, &a.property_name, &a.semantic_id)?;
                Ok(format!(
                    "✅ Updated semantic ID for '{}'\n   Semantic ID: {}",
                    a.property_name, a.semantic_id
                ))
            }

            Operation::GetDigitalTwinJson => render::digital_twin_json(doc),
        }
    }
}

fn concept_suffix(count: usize) -> String {
    if count > 0 {
        format!(", {} concept(s)", count)
    } else {
        String::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn dispatcher(dir: &TempDir) -> Dispatcher {
        Dispatcher::new(Storage::new(dir.path()), DuplicatePolicy::Overwrite)
    }

    fn build_motor(d: &mut Dispatcher) {
        d.dispatch(
            "create_aas",
            &json!({
                "aas_id": "https://ex/aas/motor",
                "id_short": "motor",
                "global_asset_id": "https://ex/assets/motor1",
            }),
        );
        d.dispatch(
            "add_submodel",
            &json!({"submodel_id": "https://ex/sm/tech", "id_short": "TechData"}),
        );
    }

    #[test]
    fn test_motor_scenario_end_to_end() {
        let dir = TempDir::new().unwrap();
        let mut d = dispatcher(&dir);

        let created = d.dispatch(
            "create_aas",
            &json!({
                "aas_id": "https://ex/aas/motor",
                "id_short": "motor",
                "global_asset_id": "https://ex/assets/motor1",
            }),
        );
        assert_eq!(created, "✅ Created AAS 'motor' with ID: https://ex/aas/motor");
        assert_eq!(
            d.dispatch(
                "add_submodel",
                &json!({"submodel_id": "https://ex/sm/tech", "id_short": "TechData"})
            ),
            "✅ Added submodel 'TechData' to AAS"
        );
        let added = d.dispatch(
            "add_property",
            &json!({
                "submodel_id_short": "TechData",
                "property_name": "Temperature",
                "value_type": "float",
                "value": 25.5,
            }),
        );
        assert_eq!(
            added,
            "✅ Added property 'Temperature' (float) to submodel 'TechData' with value 25.5"
        );
        let path = json!({"submodel_id_short": "TechData", "property_name": "Temperature"});
        assert_eq!(
            d.dispatch("get_property_value", &path),
            "📌 Temperature = 25.5 (float)"
        );

        let updated = d.dispatch(
            "update_property",
            &json!({
                "submodel_id_short": "TechData",
                "property_name": "Temperature",
                "value": "30",
            }),
        );
        assert_eq!(updated, "✅ Updated 'Temperature': 25.5 → 30.0");

        let saved = d.dispatch("save_aas", &json!({"filename": "motor.json"}));
        assert_eq!(saved, "✅ Saved AAS to 'motor.json' (1 submodels)");

        let mut fresh = dispatcher(&dir);
        let loaded = fresh.dispatch("load_aas", &json!({"filename": "motor.json"}));
        assert_eq!(
            loaded,
            "✅ Loaded 'motor' from 'motor.json' (1 submodels, 1 elements)"
        );
        let state = fresh.dispatch("get_current_state", &Value::Null);
        assert!(state.starts_with("Current AAS: motor (https://ex/aas/motor)"));
        assert!(state.contains("  - TechData: 1 elements"));
        assert!(state.contains("    • Temperature (float): 30.0"));
    }

    #[test]
    fn test_add_submodel_without_shell() {
        let dir = TempDir::new().unwrap();
        let mut d = dispatcher(&dir);
        let out = d.dispatch(
            "add_submodel",
            &json!({"submodel_id": "sm", "id_short": "S"}),
        );
        assert_eq!(out, "❌ No AAS exists. Please create an AAS first.");
        assert!(d.document().submodels.is_empty());
    }

    #[test]
    fn test_values_render_per_type() {
        let dir = TempDir::new().unwrap();
        let mut d = dispatcher(&dir);
        build_motor(&mut d);

        let cases = [
            ("Label", "string", json!("Motor A"), "Motor A"),
            ("Speed", "int", json!(1500), "1500"),
            ("Load", "float", json!(0.75), "0.75"),
            ("Running", "boolean", json!("yes"), "true"),
            ("Broken", "boolean", json!("garbage"), "false"),
        ];
        for (name, ty, value, shown) in cases {
            d.dispatch(
                "add_property",
                &json!({
                    "submodel_id_short": "TechData",
                    "property_name": name,
                    "value_type": ty,
                    "value": value,
                }),
            );
            let out = d.dispatch(
                "get_property_value",
                &json!({"submodel_id_short": "TechData", "property_name": name}),
            );
            assert_eq!(out, format!("📌 {} = {} ({})", name, shown, ty));
        }
    }

    #[test]
    fn test_invalid_update_keeps_value() {
        let dir = TempDir::new().unwrap();
        let mut d = dispatcher(&dir);
        build_motor(&mut d);
        d.dispatch(
            "add_property",
            &json!({
                "submodel_id_short": "TechData",
                "property_name": "Speed",
                "value_type": "int",
                "value": 1500,
            }),
        );
        let out = d.dispatch(
            "update_property",
            &json!({"submodel_id_short": "TechData", "property_name": "Speed", "value": "fast"}),
        );
        assert!(out.starts_with("❌ Invalid value for int"));
        assert_eq!(
            d.dispatch(
                "get_property_value",
                &json!({"submodel_id_short": "TechData", "property_name": "Speed"})
            ),
            "📌 Speed = 1500 (int)"
        );
    }

    #[test]
    fn test_failures_are_text() {
        let dir = TempDir::new().unwrap();
        let mut d = dispatcher(&dir);
        assert_eq!(
            d.dispatch("fly_to_moon", &json!({})),
            "❌ Unknown function: fly_to_moon"
        );
        assert!(d
            .dispatch("save_aas", &json!({}))
            .starts_with("❌ Invalid arguments for save_aas"));
        assert_eq!(
            d.dispatch("load_aas", &json!({"filename": "missing.json"})),
            "❌ File 'missing.json' not found"
        );
        assert_eq!(d.dispatch("get_tree_view", &json!({})), "❌ No AAS available");
        assert!(d
            .dispatch("get_digital_twin_json", &json!({}))
            .starts_with("❌ "));
    }

    #[test]
    fn test_concepts_and_semantic_ids() {
        let dir = TempDir::new().unwrap();
        let mut d = dispatcher(&dir);
        let out = d.dispatch(
            "add_concept_description",
            &json!({
                "concept_id": "https://ex/cd/temp",
                "id_short": "Temperature",
                "preferred_name": "Motor temperature",
                "definition": "Winding temperature in °C",
            }),
        );
        assert_eq!(
            out,
            "✅ Added concept description 'Temperature'\n   Name: Motor temperature\n   Definition: Winding temperature in °C"
        );

        build_motor(&mut d);
        let added = d.dispatch(
            "add_property",
            &json!({
                "submodel_id_short": "TechData",
                "property_name": "Temperature",
                "value_type": "float",
                "semantic_id": "https://ex/cd/temp",
            }),
        );
        assert_eq!(
            added,
            "✅ Added property 'Temperature' (float) to submodel 'TechData'\n   Semantic ID: https://ex/cd/temp"
        );
        let out = d.dispatch(
            "update_semantic_id",
            &json!({
                "submodel_id_short": "TechData",
                "property_name": "Temperature",
                "semantic_id": "https://ex/cd/temp2",
            }),
        );
        assert_eq!(
            out,
            "✅ Updated semantic ID for 'Temperature'\n   Semantic ID: https://ex/cd/temp2"
        );

        let saved = d.dispatch("save_aas", &json!({"filename": "with_cd"}));
        assert_eq!(saved, "✅ Saved AAS to 'with_cd.json' (1 submodels, 1 concept(s))");
    }

    #[test]
    fn test_reset_empties_document() {
        let dir = TempDir::new().unwrap();
        let mut d = dispatcher(&dir);
        build_motor(&mut d);
        d.reset();
        assert!(d.document().is_empty());
        assert_eq!(d.dispatch("get_current_state", &json!({})), "No AAS exists yet.");
    }
}
