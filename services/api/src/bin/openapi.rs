//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI 3 document for the Tehillim REST API. The output path is
//! the first argument, `openapi.json` when omitted.

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "openapi.json".to_string());

    let mut api_doc = ApiDoc::openapi();
    api_doc.info.title = "Tehillim API".to_string();
    api_doc.info.version = env!("CARGO_PKG_VERSION").to_string();

    std::fs::write(&path, api_doc.to_pretty_json()?)?;
    println!("OpenAPI specification written to {}", path);
    Ok(())
}
