//! Read-only views of the document: state summary, tree view, JSON export.

use crate::codec::AasJsonCodec;
use crate::document::Document;
use crate::error::{AasError, Result};
use crate::model::SubmodelElement;
use crate::value::display_value;

/// Summary used in the system prompt and by the `/state` command.
pub fn current_state(doc: &Document) -> String {
    let Some(shell) = doc.shell.as_ref() else {
        return "No AAS exists yet.".to_string();
    };

    let mut lines = vec![
        format!("Current AAS: {} ({})", shell.id_short, shell.id),
        format!("Asset ID: {}", shell.global_asset_id),
        format!("Number of Submodels: {}", doc.submodels.len()),
    ];

    if !doc.submodels.is_empty() {
        lines.push(String::new());
        lines.push("Submodels:".to_string());
        for sm in doc.submodels.values() {
            lines.push(format!("  - {}: {} elements", sm.id_short, sm.elements.len()));
            for prop in sm.elements.iter().filter_map(SubmodelElement::as_property) {
                lines.push(format!(
                    "    • {} ({}): {}",
                    prop.id_short,
                    prop.value_type,
                    display_value(prop.value.as_ref())
                ));
            }
        }
    }

    if !doc.concept_descriptions.is_empty() {
        lines.push(format!(
            "Concept Descriptions: {}",
            doc.concept_descriptions.len()
        ));
    }

    lines.join("\n")
}

/// Connector glyph and the continuation prefix for children of a node.
fn branch(is_last: bool) -> (&'static str, &'static str) {
    if is_last {
        ("└─", "   ")
    } else {
        ("├─", "│  ")
    }
}

/// Box-drawing tree of the whole document.
pub fn tree_view(doc: &Document) -> String {
    let Some(shell) = doc.shell.as_ref() else {
        return "❌ No AAS available".to_string();
    };

    let mut lines = vec![
        "📦 Asset Administration Shell".to_string(),
        "│".to_string(),
        format!("├─ ID Short: {}", shell.id_short),
        format!("├─ ID: {}", shell.id),
        "├─ 🏭 Asset Information".to_string(),
        format!("│  ├─ Global Asset ID: {}", shell.global_asset_id),
        format!("│  └─ Asset Kind: {}", shell.asset_kind),
    ];

    if doc.submodels.is_empty() {
        lines.push("└─ Submodels: 0 (empty)".to_string());
    } else {
        lines.push("│".to_string());
        let count = doc.submodels.len();
        for (sm_idx, sm) in doc.submodels.values().enumerate() {
            let is_last_submodel = sm_idx + 1 == count;
            let (sm_prefix, cont) = branch(is_last_submodel);

            lines.push(format!("{} 📋 Submodel: {}", sm_prefix, sm.id_short));
            lines.push(format!("{}├─ ID: {}", cont, sm.id));

            if sm.elements.is_empty() {
                lines.push(format!("{}└─ Elements: 0 (empty)", cont));
            } else {
                lines.push(format!("{}├─ Elements: {}", cont, sm.elements.len()));
                lines.push(format!("{}│", cont));
                let n = sm.elements.len();
                for (idx, element) in sm.elements.iter().enumerate() {
                    let (prefix, elem_cont) = branch(idx + 1 == n);
                    match element {
                        SubmodelElement::Property(p) => {
                            lines.push(format!("{}│  {} 📌 {}", cont, prefix, p.id_short));
                            lines.push(format!("{}│  {}├─ Type: {}", cont, elem_cont, p.value_type));
                            lines.push(format!(
                                "{}│  {}└─ Value: {}",
                                cont,
                                elem_cont,
                                display_value(p.value.as_ref())
                            ));
                        }
                        SubmodelElement::Opaque {
                            id_short,
                            model_type,
                            ..
                        } => {
                            lines.push(format!(
                                "{}│  {} 🧩 {} ({})",
                                cont, prefix, id_short, model_type
                            ));
                        }
                    }
                }
            }

            if !is_last_submodel {
                lines.push("│".to_string());
            }
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "Summary: {} Submodel(s), {} Element(s)",
        doc.submodels.len(),
        doc.element_count()
    ));
    lines.join("\n")
}

/// Pretty AAS JSON of the whole document followed by a count manifest.
pub fn digital_twin_json(doc: &Document) -> Result<String> {
    let shell = doc.shell.as_ref().ok_or(AasError::NoShell)?;
    let json = AasJsonCodec.to_json_string(doc)?;

    Ok(format!(
        "📄 **Digital Twin JSON:**\n\n```json\n{}\n```\n\n\
         ✅ Complete Digital Twin with:\n\
         \x20  • 1 AAS: {}\n\
         \x20  • {} Submodel(s)\n\
         \x20  • {} Element(s)\n\
         \x20  • {} Concept Description(s)\n",
        json,
        shell.id_short,
        doc.submodels.len(),
        doc.element_count(),
        doc.concept_descriptions.len()
    ))
}
