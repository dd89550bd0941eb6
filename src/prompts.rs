//! Prompt templates for the chat model.
//!
//! Every template that expects structured output says so explicitly and
//! shows the shape; the lenient extractor on the other side forgives fences
//! and prose, but the stricter the instruction, the less it has to forgive.

/// Reply sent without calling the model when retrieval produced nothing to
/// ground on.
pub const EMPTY_REFERENCE_REPLY: &str =
    "Hi! I'm your personal shopping assistant. Tell me what you're looking \
     for — a style, an occasion, or a specific piece — and I'll find \
     matching items from our catalog.";

/// Instruction for the vision model on the caption path.
pub const CAPTION_PROMPT: &str = "Describe the content of this image in detail. Focus on the \
     clothing and accessory items: their type, color, material, and style.";

/// Few-shot prompt turning a conversation into catalog search queries.
pub fn query_generation(transcript: &str, image_context: &str) -> String {
    format!(
        r#"You are a product search assistant for a fashion catalog.
Read the conversation and the image description, then write one short search query for each distinct product the customer is interested in.

Rules:
- One query per distinct product mention, at most a few words each.
- Use the image description to resolve references like "this dress".
- If no product is mentioned at all, output an empty array.
- Output ONLY a JSON array of strings, nothing else.

Example:
Conversation:
user: I need a dress for a beach party, and maybe sandals to go with it
Image description: No image provided
Output: ["beach party dress", "flat sandals"]

Example:
Conversation:
user: hello!
Image description: No image provided
Output: []

Conversation:
{transcript}
Image description: {image_context}
Output:"#
    )
}

/// System prompt for the grounded reply stage.
pub const GROUNDED_SYSTEM_PROMPT: &str = "You are a customer service assistant for a fashion store. \
     Answer the customer's question using ONLY the product information \
     provided below. Mention product names and prices when relevant. If the \
     provided products do not answer the question, say so honestly instead \
     of inventing items.";

/// User message for the grounded reply stage.
pub fn grounded_user(question: &str, reference: &str) -> String {
    format!("Product information:\n{reference}\n\nCustomer question: {question}")
}

/// "Complete the look" prompt for style suggestions.
pub fn style_suggestions(transcript: &str, image_context: &str) -> String {
    format!(
        r#"You are a fashion stylist. The customer is interested in the items below.
Suggest 5 to 7 complementary pieces that would complete the look — different categories than what they already have (if they have a dress, suggest shoes, bags, jackets, jewelry).

Each suggestion is a short catalog search query, a few words at most.
Output ONLY a JSON array of strings, nothing else.

Conversation:
{transcript}
Image description: {image_context}
Output:"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_prompt_embeds_both_contexts() {
        let prompt = query_generation("user: need a coat", "A wool coat in camel");
        assert!(prompt.contains("user: need a coat"));
        assert!(prompt.contains("A wool coat in camel"));
        assert!(prompt.contains("JSON array"));
    }

    #[test]
    fn grounded_user_orders_reference_before_question() {
        let msg = grounded_user("how much is the dress?", r#"[{"name":"Slip Dress"}]"#);
        let reference_at = msg.find("Slip Dress").unwrap();
        let question_at = msg.find("how much").unwrap();
        assert!(reference_at < question_at);
    }

    #[test]
    fn style_prompt_asks_for_complements() {
        let prompt = style_suggestions("user: bought the red dress", "No image provided");
        assert!(prompt.contains("5 to 7"));
        assert!(prompt.contains("JSON array"));
    }
}
