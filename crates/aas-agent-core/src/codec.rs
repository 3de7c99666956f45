//! Serialization adapter between the document and the AAS v3 JSON
//! environment format (`assetAdministrationShells`, `submodels`,
//! `conceptDescriptions`).

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::document::Document;
use crate::error::{AasError, Result};
use crate::model::{
    AssetKind, ConceptDescription, LangString, Property, Shell, Submodel, SubmodelElement,
    SubmodelRef, DEFAULT_LANGUAGE,
};
use crate::value::ValueType;

/// Narrow byte-level interface the storage layer talks to.
pub trait DocumentCodec {
    fn serialize(&self, document: &Document) -> Result<Vec<u8>>;
    fn deserialize(&self, bytes: &[u8]) -> Result<Document>;
}

/// AAS JSON, pretty-printed.
#[derive(Debug, Clone, Copy, Default)]
pub struct AasJsonCodec;

impl AasJsonCodec {
    pub fn to_json_string(&self, document: &Document) -> Result<String> {
        let env = Environment::from_document(document);
        serde_json::to_string_pretty(&env)
            .map_err(|e| AasError::DeserializationError(format!("serialize: {}", e)))
    }
}

impl DocumentCodec for AasJsonCodec {
    fn serialize(&self, document: &Document) -> Result<Vec<u8>> {
        Ok(self.to_json_string(document)?.into_bytes())
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Document> {
        // Files saved by Windows tools often start with a BOM
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        let env: Environment = serde_json::from_slice(bytes)?;
        env.into_document()
    }
}

// ── Wire types ──

const GLOBAL_REFERENCE: &str = "GlobalReference";
const EXTERNAL_REFERENCE: &str = "ExternalReference";
const MODEL_REFERENCE: &str = "ModelReference";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Environment {
    #[serde(default)]
    asset_administration_shells: Vec<ShellDto>,
    #[serde(default)]
    submodels: Vec<SubmodelDto>,
    #[serde(default)]
    concept_descriptions: Vec<ConceptDto>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShellDto {
    #[serde(default = "shell_model_type")]
    model_type: String,
    id: String,
    #[serde(default)]
    id_short: Option<String>,
    asset_information: AssetInformationDto,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    submodels: Vec<ReferenceDto>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetInformationDto {
    asset_kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    global_asset_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ReferenceDto {
    #[serde(rename = "type")]
    kind: String,
    keys: Vec<KeyDto>,
}

#[derive(Debug, Serialize, Deserialize)]
struct KeyDto {
    #[serde(rename = "type")]
    kind: String,
    value: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmodelDto {
    #[serde(default = "submodel_model_type")]
    model_type: String,
    id: String,
    #[serde(default)]
    id_short: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    submodel_elements: Vec<Value>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PropertyDto {
    model_type: String,
    id_short: String,
    value_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    semantic_id: Option<ReferenceDto>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConceptDto {
    #[serde(default = "concept_model_type")]
    model_type: String,
    id: String,
    #[serde(default)]
    id_short: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    display_name: Vec<LangStringDto>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    description: Vec<LangStringDto>,
}

#[derive(Debug, Serialize, Deserialize)]
struct LangStringDto {
    language: String,
    text: String,
}

fn shell_model_type() -> String {
    "AssetAdministrationShell".into()
}
fn submodel_model_type() -> String {
    "Submodel".into()
}
fn concept_model_type() -> String {
    "ConceptDescription".into()
}

fn global_reference(value: &str) -> ReferenceDto {
    ReferenceDto {
        kind: EXTERNAL_REFERENCE.into(),
        keys: vec![KeyDto {
            kind: GLOBAL_REFERENCE.into(),
            value: value.to_string(),
        }],
    }
}

fn lang_strings(text: &Option<LangString>) -> Vec<LangStringDto> {
    text.iter()
        .map(|l| LangStringDto {
            language: l.language.clone(),
            text: l.text.clone(),
        })
        .collect()
}

/// Prefer the `en` entry, fall back to the first one.
fn pick_lang(entries: Vec<LangStringDto>) -> Option<LangString> {
    let idx = entries
        .iter()
        .position(|l| l.language == DEFAULT_LANGUAGE)
        .unwrap_or(0);
    entries.into_iter().nth(idx).map(|l| LangString {
        language: l.language,
        text: l.text,
    })
}

// ── Document -> wire ──

impl Environment {
    fn from_document(doc: &Document) -> Self {
        let shells = doc
            .shell
            .iter()
            .map(|shell| ShellDto {
                model_type: shell_model_type(),
                id: shell.id.clone(),
                id_short: Some(shell.id_short.clone()),
                asset_information: AssetInformationDto {
                    asset_kind: shell.asset_kind.as_str().into(),
                    global_asset_id: Some(shell.global_asset_id.clone()),
                },
                submodels: shell
                    .submodels
                    .iter()
                    .map(|r| ReferenceDto {
                        kind: MODEL_REFERENCE.into(),
                        keys: vec![KeyDto {
                            kind: "Submodel".into(),
                            value: r.id.clone(),
                        }],
                    })
                    .collect(),
            })
            .collect();

        let submodels = doc
            .submodels
            .values()
            .map(|sm| SubmodelDto {
                model_type: submodel_model_type(),
                id: sm.id.clone(),
                id_short: Some(sm.id_short.clone()),
                submodel_elements: sm.elements.iter().map(element_to_json).collect(),
            })
            .collect();

        let concept_descriptions = doc
            .concept_descriptions
            .values()
            .map(|cd| ConceptDto {
                model_type: concept_model_type(),
                id: cd.id.clone(),
                id_short: Some(cd.id_short.clone()),
                display_name: lang_strings(&cd.display_name),
                description: lang_strings(&cd.definition),
            })
            .collect();

        Environment {
            asset_administration_shells: shells,
            submodels,
            concept_descriptions,
        }
    }
}

fn element_to_json(element: &SubmodelElement) -> Value {
    match element {
        SubmodelElement::Property(p) => {
            let dto = PropertyDto {
                model_type: "Property".into(),
                id_short: p.id_short.clone(),
                value_type: p.value_type.xsd().into(),
                value: p.value.as_ref().map(|v| v.to_string()),
                semantic_id: p.semantic_id.as_deref().map(global_reference),
            };
            serde_json::to_value(dto).unwrap_or_default()
        }
        SubmodelElement::Opaque { raw, .. } => raw.clone(),
    }
}

// ── wire -> Document ──

impl Environment {
    fn into_document(self) -> Result<Document> {
        let mut doc = Document::new();

        for sm in self.submodels {
            let elements = sm
                .submodel_elements
                .into_iter()
                .map(element_from_json)
                .collect::<Result<Vec<_>>>()?;
            doc.submodels.insert(
                sm.id.clone(),
                Submodel {
                    id: sm.id,
                    id_short: sm.id_short.unwrap_or_default(),
                    elements,
                },
            );
        }

        for cd in self.concept_descriptions {
            doc.concept_descriptions.insert(
                cd.id.clone(),
                ConceptDescription {
                    id: cd.id,
                    id_short: cd.id_short.unwrap_or_default(),
                    display_name: pick_lang(cd.display_name),
                    definition: pick_lang(cd.description),
                },
            );
        }

        let mut shells = self.asset_administration_shells.into_iter();
        if let Some(dto) = shells.next() {
            let asset_kind = AssetKind::parse(&dto.asset_information.asset_kind).ok_or_else(|| {
                AasError::DeserializationError(format!(
                    "unknown assetKind '{}'",
                    dto.asset_information.asset_kind
                ))
            })?;
            let submodels = dto
                .submodels
                .into_iter()
                .filter_map(|r| r.keys.into_iter().next())
                .map(|key| SubmodelRef {
                    id_short: doc
                        .submodels
                        .get(&key.value)
                        .map(|sm| sm.id_short.clone())
                        .unwrap_or_default(),
                    id: key.value,
                })
                .collect();
            doc.shell = Some(Shell {
                id: dto.id,
                id_short: dto.id_short.unwrap_or_default(),
                asset_kind,
                global_asset_id: dto.asset_information.global_asset_id.unwrap_or_default(),
                submodels,
            });
        }
        let extra = shells.count();
        if extra > 0 {
            warn!("File holds {} more shell(s); only the first is kept", extra);
        }

        Ok(doc)
    }
}

fn element_from_json(raw: Value) -> Result<SubmodelElement> {
    let model_type = raw
        .get("modelType")
        .and_then(|v| v.as_str())
        .unwrap_or("")
        .to_string();
    let id_short = raw
        .get("idShort")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AasError::DeserializationError("submodel element without idShort".into()))?
        .to_string();

    let value_type = raw
        .get("valueType")
        .and_then(|v| v.as_str())
        .and_then(ValueType::from_xsd);

    match (model_type.as_str(), value_type) {
        ("Property", Some(value_type)) => {
            let dto: PropertyDto = serde_json::from_value(raw)?;
            let value = dto
                .value
                .as_deref()
                .map(|s| value_type.parse_stored(s))
                .transpose()
                .map_err(|e| AasError::DeserializationError(format!("{}: {}", id_short, e)))?;
            let semantic_id = dto
                .semantic_id
                .and_then(|r| r.keys.into_iter().next())
                .map(|k| k.value);
            Ok(SubmodelElement::Property(Property {
                id_short,
                value_type,
                value,
                semantic_id,
            }))
        }
        _ => Ok(SubmodelElement::Opaque {
            id_short,
            model_type,
            raw,
        }),
    }
}
