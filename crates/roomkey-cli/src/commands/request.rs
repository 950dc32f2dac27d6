//! Raw request command implementation.

use anyhow::{Context, Result};
use clap::Args;
use serde_json::Value;

use roomkey_core::{ApiRequest, Method};

use crate::output;
use crate::session;

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE)
    pub method: Method,

    /// Path relative to the API base URL (e.g. /hotels)
    pub path: String,

    /// JSON request body
    #[arg(long)]
    pub data: Option<String>,

    /// Query parameter as key=value (repeatable)
    #[arg(long = "query", value_parser = parse_pair)]
    pub query: Vec<(String, String)>,
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{}'", s))?;
    Ok((key.to_string(), value.to_string()))
}

pub async fn run(api: &str, args: RequestArgs) -> Result<()> {
    let client = session::connect(api)?;

    let mut request = ApiRequest::new(args.method, &args.path);
    for (key, value) in args.query {
        request = request.with_query(key, value);
    }
    if let Some(data) = args.data {
        let body: Value = serde_json::from_str(&data).context("--data is not valid JSON")?;
        request = request.with_body(body);
    }

    let response = client
        .execute(request)
        .await
        .with_context(|| format!("{} {} failed", args.method, args.path))?;

    output::json_pretty(&response.body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_query_pairs() {
        assert_eq!(
            parse_pair("city=Lisbon").unwrap(),
            ("city".to_string(), "Lisbon".to_string())
        );
        assert_eq!(
            parse_pair("q=a=b").unwrap(),
            ("q".to_string(), "a=b".to_string())
        );
        assert!(parse_pair("city").is_err());
    }
}
