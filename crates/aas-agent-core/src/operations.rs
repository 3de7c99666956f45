//! The operation catalog and the typed command produced from a function call.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{AasError, Result};
use crate::value::ValueType;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateAas {
    pub aas_id: String,
    pub id_short: String,
    pub global_asset_id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AddSubmodel {
    pub submodel_id: String,
    pub id_short: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AddProperty {
    pub submodel_id_short: String,
    pub property_name: String,
    /// Kept as the raw tag so an unknown one surfaces as `InvalidType`.
    pub value_type: String,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default)]
    pub semantic_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpdateProperty {
    pub submodel_id_short: String,
    pub property_name: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PropertyPath {
    pub submodel_id_short: String,
    pub property_name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FileArg {
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AddConceptDescription {
    pub concept_id: String,
    pub id_short: String,
    #[serde(default)]
    pub preferred_name: Option<String>,
    #[serde(default)]
    pub definition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpdateSemanticId {
    pub submodel_id_short: String,
    pub property_name: String,
    pub semantic_id: String,
}

/// One variant per catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    CreateAas(CreateAas),
    AddSubmodel(AddSubmodel),
    AddProperty(AddProperty),
    UpdateProperty(UpdateProperty),
    GetPropertyValue(PropertyPath),
    SaveAas(FileArg),
    LoadAas(FileArg),
    GetTreeView,
    GetCurrentState,
    AddConceptDescription(AddConceptDescription),
    UpdateSemanticId(UpdateSemanticId),
    GetDigitalTwinJson,
}

impl Operation {
    /// Translate a named call with loosely-typed arguments into a command.
    /// `null` arguments count as an empty object.
    pub fn from_call(name: &str, args: &Value) -> Result<Self> {
        let op = match name {
            "create_aas" => Operation::CreateAas(parse_args(name, args)?),
            "add_submodel" => Operation::AddSubmodel(parse_args(name, args)?),
            "add_property" => Operation::AddProperty(parse_args(name, args)?),
            "update_property" => Operation::UpdateProperty(parse_args(name, args)?),
            "get_property_value" => Operation::GetPropertyValue(parse_args(name, args)?),
            "save_aas" => Operation::SaveAas(parse_args(name, args)?),
            "load_aas" => Operation::LoadAas(parse_args(name, args)?),
            "get_tree_view" => Operation::GetTreeView,
            "get_current_state" => Operation::GetCurrentState,
            "add_concept_description" => Operation::AddConceptDescription(parse_args(name, args)?),
            "update_semantic_id" => Operation::UpdateSemanticId(parse_args(name, args)?),
            "get_digital_twin_json" => Operation::GetDigitalTwinJson,
            _ => return Err(AasError::UnknownOperation(name.to_string())),
        };
        Ok(op)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateAas(_) => "create_aas",
            Operation::AddSubmodel(_) => "add_submodel",
            Operation::AddProperty(_) => "add_property",
            Operation::UpdateProperty(_) => "update_property",
            Operation::GetPropertyValue(_) => "get_property_value",
            Operation::SaveAas(_) => "save_aas",
            Operation::LoadAas(_) => "load_aas",
            Operation::GetTreeView => "get_tree_view",
            Operation::GetCurrentState => "get_current_state",
            Operation::AddConceptDescription(_) => "add_concept_description",
            Operation::UpdateSemanticId(_) => "update_semantic_id",
            Operation::GetDigitalTwinJson => "get_digital_twin_json",
        }
    }
}

fn parse_args<T: DeserializeOwned>(operation: &str, args: &Value) -> Result<T> {
    let args = if args.is_null() { json!({}) } else { args.clone() };
    serde_json::from_value(args).map_err(|e| AasError::InvalidArguments {
        operation: operation.to_string(),
        reason: e.to_string(),
    })
}

// ── Catalog ──

#[derive(Debug, Clone)]
pub struct OperationDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    /// JSON schema of the argument object.
    pub parameters: Value,
}

fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn string(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

pub fn catalog() -> Vec<OperationDescriptor> {
    let value_tags: Vec<&str> = ValueType::ALL.iter().map(|t| t.tag()).collect();

    vec![
        OperationDescriptor {
            name: "create_aas",
            description: "Create a new Asset Administration Shell. Replaces any existing shell but keeps submodels and concept descriptions.",
            parameters: object(
                json!({
                    "aas_id": string("Unique identifier for the AAS (URL format, e.g. https://example.com/aas/motor)"),
                    "id_short": string("Short human-readable identifier"),
                    "global_asset_id": string("Global identifier for the asset"),
                }),
                &["aas_id", "id_short", "global_asset_id"],
            ),
        },
        OperationDescriptor {
            name: "add_submodel",
            description: "Add a submodel to the AAS",
            parameters: object(
                json!({
                    "submodel_id": string("Unique identifier for the submodel"),
                    "id_short": string("Short human-readable identifier"),
                }),
                &["submodel_id", "id_short"],
            ),
        },
        OperationDescriptor {
            name: "add_property",
            description: "Add a property element to a submodel",
            parameters: object(
                json!({
                    "submodel_id_short": string("ID short of the submodel to add property to"),
                    "property_name": string("Name/ID short of the property"),
                    "value_type": {
                        "type": "string",
                        "enum": value_tags,
                        "description": "Data type of the property",
                    },
                    "value": {
                        "type": ["string", "number", "boolean"],
                        "description": "Value to set (can be string, number, or boolean)",
                    },
                    "semantic_id": string("Optional semantic ID reference to concept description"),
                }),
                &["submodel_id_short", "property_name", "value_type"],
            ),
        },
        OperationDescriptor {
            name: "update_property",
            description: "Update the value of an existing property",
            parameters: object(
                json!({
                    "submodel_id_short": string("ID short of the submodel containing the property"),
                    "property_name": string("Name/ID short of the property to update"),
                    "value": {
                        "type": ["string", "number", "boolean"],
                        "description": "New value to set",
                    },
                }),
                &["submodel_id_short", "property_name", "value"],
            ),
        },
        OperationDescriptor {
            name: "get_property_value",
            description: "Get the current value of a property",
            parameters: object(
                json!({
                    "submodel_id_short": string("ID short of the submodel"),
                    "property_name": string("Name/ID short of the property"),
                }),
                &["submodel_id_short", "property_name"],
            ),
        },
        OperationDescriptor {
            name: "save_aas",
            description: "Save the AAS to a JSON file",
            parameters: object(
                json!({ "filename": string("Name of the file to save (should end with .json)") }),
                &["filename"],
            ),
        },
        OperationDescriptor {
            name: "load_aas",
            description: "Load an AAS from a JSON file, replacing the current one",
            parameters: object(
                json!({ "filename": string("Name of the file to load") }),
                &["filename"],
            ),
        },
        OperationDescriptor {
            name: "get_tree_view",
            description: "Get a tree view representation of the entire AAS structure",
            parameters: object(json!({}), &[]),
        },
        OperationDescriptor {
            name: "get_current_state",
            description: "Get a summary of the current AAS state including all submodels and properties",
            parameters: object(json!({}), &[]),
        },
        OperationDescriptor {
            name: "add_concept_description",
            description: "Add a concept description to define semantic meaning of properties",
            parameters: object(
                json!({
                    "concept_id": string("Unique identifier for the concept"),
                    "id_short": string("Short identifier"),
                    "preferred_name": string("Human-readable name"),
                    "definition": string("Definition of the concept"),
                }),
                &["concept_id", "id_short"],
            ),
        },
        OperationDescriptor {
            name: "update_semantic_id",
            description: "Update or add semantic ID reference to an existing property",
            parameters: object(
                json!({
                    "submodel_id_short": string("ID short of the submodel"),
                    "property_name": string("Name of the property to update"),
                    "semantic_id": string("Semantic ID reference (usually concept description ID)"),
                }),
                &["submodel_id_short", "property_name", "semantic_id"],
            ),
        },
        OperationDescriptor {
            name: "get_digital_twin_json",
            description: "Get the complete Digital Twin (AAS) as JSON format string",
            parameters: object(json!({}), &[]),
        },
    ]
}

/// The catalog as Chat Completions function tools.
pub fn tool_definitions() -> Vec<Value> {
    catalog()
        .into_iter()
        .map(|op| {
            json!({
                "type": "function",
                "function": {
                    "name": op.name,
                    "description": op.description,
                    "parameters": op.parameters,
                }
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_call_typed_fields() {
        let op = Operation::from_call(
            "add_property",
            &json!({
                "submodel_id_short": "TechData",
                "property_name": "Temperature",
                "value_type": "float",
                "value": 25.5,
            }),
        )
        .unwrap();
        match op {
            Operation::AddProperty(args) => {
                assert_eq!(args.submodel_id_short, "TechData");
                assert_eq!(args.value, Some(json!(25.5)));
                assert_eq!(args.semantic_id, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_from_call_no_argument_operations() {
        assert_eq!(
            Operation::from_call("get_tree_view", &Value::Null).unwrap(),
            Operation::GetTreeView
        );
        assert_eq!(
            Operation::from_call("get_current_state", &json!({"extra": 1})).unwrap(),
            Operation::GetCurrentState
        );
    }

    #[test]
    fn test_from_call_unknown_name() {
        let err = Operation::from_call("delete_everything", &json!({})).unwrap_err();
        assert!(matches!(err, AasError::UnknownOperation(ref n) if n == "delete_everything"));
    }

    #[test]
    fn test_from_call_missing_or_mistyped_fields() {
        let missing = Operation::from_call("update_property", &json!({
            "submodel_id_short": "TechData",
            "property_name": "Temperature",
        }));
        assert!(matches!(missing, Err(AasError::InvalidArguments { .. })));

        let mistyped = Operation::from_call("save_aas", &json!({"filename": 7}));
        assert!(matches!(mistyped, Err(AasError::InvalidArguments { .. })));
    }

    #[test]
    fn test_catalog_matches_translation() {
        let names: Vec<&str> = catalog().iter().map(|d| d.name).collect();
        assert_eq!(names.len(), 12);
        for name in names {
            // Every catalog name is known to the translator
            let result = Operation::from_call(name, &json!({}));
            assert!(!matches!(result, Err(AasError::UnknownOperation(_))), "{name}");
            if let Ok(op) = result {
                assert_eq!(op.name(), name);
            }
        }
    }

    #[test]
    fn test_tool_definitions_shape() {
        let tools = tool_definitions();
        let add = tools
            .iter()
            .find(|t| t["function"]["name"] == "add_property")
            .unwrap();
        assert_eq!(add["type"], "function");
        assert_eq!(
            add["function"]["parameters"]["properties"]["value_type"]["enum"],
            json!(["string", "int", "float", "boolean"])
        );
        assert_eq!(
            add["function"]["parameters"]["required"],
            json!(["submodel_id_short", "property_name", "value_type"])
        );
    }
}
