use reqwest::Client;
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let client = Client::new();
    let base_url =
        std::env::var("NIRMAI_URL").unwrap_or_else(|_| "http://127.0.0.1:3000".to_string());

    println!("Testing NirmAI client against {}", base_url);

    println!("\nHealth Check:");
    let health_response = client.get(format!("{}/health", base_url)).send().await?;

    println!("Status: {}", health_response.status());
    let health_json: serde_json::Value = health_response.json().await?;
    println!("Response: {}", serde_json::to_string_pretty(&health_json)?);

    println!("\nQuery Test:");
    let query_payload = json!({
        "query": "What is the fiscal deficit target?"
    });

    let query_response = client
        .post(format!("{}/api/query", base_url))
        .json(&query_payload)
        .send()
        .await?;

    println!("Status: {}", query_response.status());
    let query_json: serde_json::Value = query_response.json().await?;
    println!("Response: {}", serde_json::to_string_pretty(&query_json)?);

    println!("\nMethod Check:");
    let get_response = client.get(format!("{}/api/query", base_url)).send().await?;
    println!("Status: {}", get_response.status());

    println!("\nClient test completed!");
    Ok(())
}
