//! Probe command - send a search to a running provider

use std::time::Duration;

use chrono::{DateTime, Utc};
use colored::Colorize;
use serde_json::{Map, Value, json};
use ureq::Agent;

use crate::interfaces::cli::CliError;

const PROBE_TIMEOUT_SECS: u64 = 60;
const SAMPLE_IDS: usize = 5;

pub struct ProbeArgs {
    pub url: String,
    pub bbox: Option<Vec<f64>>,
    pub datetime: Option<String>,
    pub limit: Option<u32>,
    pub filter: Option<String>,
}

/// What the probe found in a search response
#[derive(Debug, Default, PartialEq)]
pub struct ProbeSummary {
    pub count: usize,
    pub sample_ids: Vec<String>,
    /// [minx, miny, maxx, maxy] over point geometries
    pub extent: Option<[f64; 4]>,
    pub time_range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    pub next_page: Option<u64>,
}

impl ProbeSummary {
    pub fn from_response(body: &Value) -> Result<Self, CliError> {
        let features = body
            .get("features")
            .and_then(Value::as_array)
            .ok_or_else(|| CliError::ParseError("response has no features array".to_string()))?;

        let mut summary = ProbeSummary {
            count: features.len(),
            next_page: body
                .pointer("/pagination/page")
                .and_then(Value::as_u64),
            ..Default::default()
        };

        for feature in features {
            if summary.sample_ids.len() < SAMPLE_IDS
                && let Some(id) = feature.get("id").and_then(Value::as_str)
            {
                summary.sample_ids.push(id.to_string());
            }

            if let Some(coords) = feature.pointer("/geometry/coordinates").and_then(Value::as_array)
                && let [Some(x), Some(y)] = [
                    coords.first().and_then(Value::as_f64),
                    coords.get(1).and_then(Value::as_f64),
                ]
            {
                let e = summary.extent.get_or_insert([x, y, x, y]);
                e[0] = e[0].min(x);
                e[1] = e[1].min(y);
                e[2] = e[2].max(x);
                e[3] = e[3].max(y);
            }

            if let Some(dt) = feature
                .pointer("/properties/datetime")
                .and_then(Value::as_str)
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            {
                let dt = dt.with_timezone(&Utc);
                summary.time_range = Some(match summary.time_range {
                    Some((lo, hi)) => (lo.min(dt), hi.max(dt)),
                    None => (dt, dt),
                });
            }
        }

        Ok(summary)
    }
}

/// Build the POST /search body from command-line arguments
pub fn build_search_body(args: &ProbeArgs) -> Result<Value, CliError> {
    let mut body = Map::new();

    if let Some(bbox) = &args.bbox {
        if bbox.len() != 4 {
            return Err(CliError::ParseError(format!(
                "bbox needs 4 numbers, got {}",
                bbox.len()
            )));
        }
        body.insert("bbox".into(), json!(bbox));
    }

    if let Some(datetime) = &args.datetime {
        let (start, end) = datetime.split_once('/').ok_or_else(|| {
            CliError::ParseError("datetime must be <start>/<end>".to_string())
        })?;
        body.insert("datetime".into(), json!([start.trim(), end.trim()]));
    }

    if let Some(limit) = args.limit {
        body.insert("limit".into(), json!(limit));
    }

    if let Some(filter) = &args.filter {
        let parsed: Value = serde_json::from_str(filter)
            .map_err(|e| CliError::ParseError(format!("filter is not valid JSON: {}", e)))?;
        body.insert("filter".into(), parsed);
    }

    Ok(Value::Object(body))
}

/// POST a search to a running provider and print a summary
pub async fn probe(args: ProbeArgs) -> Result<(), CliError> {
    let body = build_search_body(&args)?;
    let endpoint = format!("{}/search", args.url.trim_end_matches('/'));

    println!("{} {}", "Probing".yellow(), endpoint.blue());

    let request_url = endpoint.clone();
    let (status, response) =
        tokio::task::spawn_blocking(move || post_search(&request_url, &body))
            .await
            .map_err(|e| CliError::CommandError(format!("probe task failed: {}", e)))??;

    if status != 200 {
        let message = response
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unexpected response");
        return Err(CliError::RequestError(format!(
            "{} returned {}: {}",
            endpoint, status, message
        )));
    }

    let summary = ProbeSummary::from_response(&response)?;
    print_summary(&summary);
    Ok(())
}

fn post_search(url: &str, body: &Value) -> Result<(u16, Value), CliError> {
    let agent: Agent = Agent::config_builder()
        .timeout_global(Some(Duration::from_secs(PROBE_TIMEOUT_SECS)))
        .http_status_as_error(false)
        .build()
        .into();

    let resp = agent
        .post(url)
        .send_json(body)
        .map_err(|e| CliError::RequestError(e.to_string()))?;
    let status = resp.status().as_u16();
    let value = resp
        .into_body()
        .read_json::<Value>()
        .map_err(|e| CliError::ParseError(format!("response is not JSON: {}", e)))?;
    Ok((status, value))
}

fn print_summary(summary: &ProbeSummary) {
    println!(
        "{} {}",
        "Features:".bold().green(),
        summary.count.to_string().cyan()
    );
    if !summary.sample_ids.is_empty() {
        println!("  {}: {}", "Sample ids".cyan(), summary.sample_ids.join(", "));
    }
    if let Some([minx, miny, maxx, maxy]) = summary.extent {
        println!(
            "  {}: [{:.4}, {:.4}, {:.4}, {:.4}]",
            "Extent".cyan(),
            minx,
            miny,
            maxx,
            maxy
        );
    }
    if let Some((start, end)) = summary.time_range {
        println!(
            "  {}: {} .. {}",
            "Time range".cyan(),
            start.to_rfc3339(),
            end.to_rfc3339()
        );
    }
    if let Some(page) = summary.next_page {
        println!("  {}: {}", "Next page".cyan(), page);
    }
}
