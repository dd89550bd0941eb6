//! Walkthrough of the Vitrine server API with a plain HTTP client.

use reqwest::Client;
use serde_json::json;

const SERVER_URL: &str = "http://localhost:8080";
const API_KEY: &str = "demo-key-12345";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let client = Client::new();

    // Example 1: Health check
    println!("1. Health Check:");
    let resp = client.get(format!("{SERVER_URL}/health")).send().await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    // Example 2: Search the catalog from a chat message
    println!("2. Search:");
    let resp = client
        .post(format!("{SERVER_URL}/api/v1/search"))
        .header("X-Api-Key", API_KEY)
        .json(&json!({
            "query": "I need a dress for a beach party, and sandals to match"
        }))
        .send()
        .await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    // Example 3: Presign an image upload
    println!("3. Presign Upload:");
    let resp = client
        .post(format!("{SERVER_URL}/api/v1/uploads/presign"))
        .header("X-Api-Key", API_KEY)
        .json(&json!({
            "file_name": "outfit.jpg",
            "content_type": "image/jpeg"
        }))
        .send()
        .await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    // Example 4: Caption an uploaded image
    println!("4. Caption:");
    let resp = client
        .post(format!("{SERVER_URL}/api/v1/caption"))
        .header("X-Api-Key", API_KEY)
        .json(&json!({
            "object_key": "uploads/00000000-0000-0000-0000-000000000000-outfit.jpg"
        }))
        .send()
        .await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    // Example 5: Style suggestions
    println!("5. Style Suggestions:");
    let resp = client
        .post(format!("{SERVER_URL}/api/v1/style"))
        .header("X-Api-Key", API_KEY)
        .json(&json!({
            "query": "I just bought a red wrap dress"
        }))
        .send()
        .await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    // Example 6: Full assist flow
    println!("6. Assist:");
    let resp = client
        .post(format!("{SERVER_URL}/api/v1/assist"))
        .header("X-Api-Key", API_KEY)
        .json(&json!({
            "messages": [
                {"role": "user", "content": "Looking for summer outfits"},
                {"role": "assistant", "content": "Any particular occasion?"},
                {"role": "user", "content": "A beach party next weekend"}
            ]
        }))
        .send()
        .await?;
    println!("Status: {}", resp.status());
    println!("Body: {}", resp.text().await?);
    println!();

    println!("All examples completed!");
    Ok(())
}
