// ABOUTME: Request commands for fee-cli
// ABOUTME: Handles gate dry-runs, guarded requests and the backend status probe
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 College Fee Client Contributors

use college_fee_client::{
    client::{ApiClient, ApiRequest},
    errors::{AppError, AppResult},
    health::check_backend,
};
use http::Method;
use serde_json::Value;

use crate::helpers::display::{display_decision, display_status, print_json};

type Result<T> = AppResult<T>;

fn parse_method(method: &str) -> Result<Method> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| AppError::invalid_input(format!("'{method}' is not an HTTP method")))
}

fn parse_query(pairs: &[String]) -> Result<Vec<(String, String)>> {
    pairs
        .iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .ok_or_else(|| AppError::invalid_input(format!("query '{pair}' is not key=value")))
        })
        .collect()
}

/// Print the gate decision for `method path`
pub fn can(client: &ApiClient, method: &str, path: &str) -> Result<()> {
    let method = parse_method(method)?;
    let decision = client.check(&method, path)?;
    display_decision(&method, path, &decision);
    Ok(())
}

/// Send a guarded request and print its JSON (or text) body
pub async fn send(
    client: &ApiClient,
    method: &str,
    path: &str,
    data: Option<&str>,
    query: &[String],
) -> Result<()> {
    let mut request = ApiRequest::new(parse_method(method)?, path);
    for (key, value) in parse_query(query)? {
        request = request.query(key, value);
    }
    if let Some(data) = data {
        let body: Value = serde_json::from_str(data)
            .map_err(|e| AppError::invalid_input(format!("--data is not valid JSON: {e}")))?;
        request = request.json_value(body);
    }

    let response = client.send(request).await?;
    match serde_json::from_slice::<Value>(&response.body) {
        Ok(json) => print_json(&json),
        Err(_) => println!("{}", response.text()),
    }
    Ok(())
}

/// Probe backend connectivity
pub async fn status(client: &ApiClient) {
    display_status(&check_backend(client).await);
}
