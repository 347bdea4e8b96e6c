//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI document for the login, signup and ask endpoints.
//! Usage: `openapi [OUTPUT]` (defaults to `openapi.json`).

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "openapi.json".to_string());

    let spec_json = ApiDoc::openapi().to_pretty_json()?;
    std::fs::write(&output, spec_json)?;
    println!("OpenAPI specification written to {}", output);
    Ok(())
}
