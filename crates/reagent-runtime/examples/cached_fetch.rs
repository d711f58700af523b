//! Read-through cache agent wired to the reference capabilities.
//!
//! Run with: cargo run --example cached_fetch

use reagent_backends::{Capabilities, HttpClient, MemoryStore};
use reagent_runtime::{RunOptions, Step, Value, Vm};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let program = Step::from_json(&json!({
        "op": "seq",
        "steps": [
            {"op": "store.get", "key": "args.url", "result": "cached"},
            {"op": "logic.neq", "a": "cached", "b": null, "result": "hasCached"},
            {"op": "if",
                "condition": "hasCached",
                "vars": {"hasCached": "hasCached"},
                "then": [
                    {"op": "var.get", "key": "cached", "result": "result"},
                    {"op": "return", "schema": {"properties": {"result": {}}}}
                ],
                "else": [
                    {"op": "http.fetch", "url": "args.url", "result": "result"},
                    {"op": "store.set", "key": "args.url", "value": "result"},
                    {"op": "return", "schema": {"properties": {"result": {}}}}
                ]
            }
        ]
    }))?;

    let store = Arc::new(MemoryStore::new());
    let capabilities = Capabilities::new()
        .with_http(Arc::new(HttpClient::new()))
        .with_store(store);

    let vm = Vm::new()?;
    let args: HashMap<String, Value> = [(
        "url".to_string(),
        Value::from("https://httpbin.org/json"),
    )]
    .into_iter()
    .collect();

    // First run misses the cache and fetches; the second run hits.
    for pass in 1..=2 {
        let outcome = vm
            .run(
                &program,
                args.clone(),
                RunOptions::new().with_capabilities(capabilities.clone()),
            )
            .await?;
        println!(
            "pass {pass}: fuel_used={} output={:?}",
            outcome.fuel_used, outcome.output
        );
    }

    Ok(())
}
