//! System prompt and the fixed command texts.

use crate::document::Document;
use crate::render;

pub const WELCOME: &str = "\
🤖 Welcome to the AAS Agent!

I help you create and manage Asset Administration Shells (AAS) for digital twins.

Just tell me what you want in plain language, for example:
• \"Create an AAS for a motor\"
• \"Add a technical data submodel\"
• \"Add a temperature property with value 25.5\"
• \"Show me the tree view\"
• \"Save it to motor.json\"

Type /help for all commands.";

pub const HELP: &str = "\
📚 AAS Agent Help

Commands:
/start - Welcome message
/help - This help
/state - Current AAS summary
/tree - Tree view of the AAS
/reset - Discard the AAS and start over

Things you can ask for:
1. Create an AAS
2. Add submodels
3. Add properties (string, int, float, boolean)
4. Update and read property values
5. Add concept descriptions and link them via semantic IDs
6. Save to and load from JSON files
7. Export the complete digital twin as JSON";

pub const RESET_DONE: &str = "✅ Reset complete! Starting fresh with no AAS.";

/// Instructions for the model, grounded in the current document.
pub fn system_prompt(doc: &Document) -> String {
    format!(
        "You are an intelligent assistant for managing Asset Administration Shells (AAS).

Current AAS State:
{state}

You can help users with these operations:
1. Create AAS
2. Add submodels
3. Add properties/elements to submodels
4. Update property values
5. Get property values
6. Save AAS to file
7. Load AAS from file
8. Show tree view of AAS structure
9. Get current state summary
10. Add concept descriptions and semantic IDs
11. Export the digital twin as JSON

When users ask to do something, call the appropriate function. Be conversational and friendly.
If the user's request requires generating IDs (like AAS ID or Submodel ID), create them in a proper URL format like:
- https://example.com/aas/[descriptive-name]
- https://example.com/submodels/[descriptive-name]

Always confirm what you've done and provide helpful feedback.",
        state = render::current_state(doc)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_embeds_state() {
        let mut doc = Document::new();
        assert!(system_prompt(&doc).contains("No AAS exists yet."));
        doc.create_shell("https://ex/aas/motor", "motor", "https://ex/assets/motor1");
        assert!(system_prompt(&doc).contains("Current AAS: motor (https://ex/aas/motor)"));
    }
}
