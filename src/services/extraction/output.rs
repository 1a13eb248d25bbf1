use super::types::ExtractionResult;
use tracing::warn;

/// Recovers the tool's result.
///
/// A non-empty result file is authoritative. Otherwise the first stdout line
/// carrying `marker` followed by a JSON object is used, and when no such line
/// exists the whole of stdout is tried as JSON.
pub fn parse_result(
    result_file: Option<&str>,
    stdout: &str,
    marker: &str,
) -> Option<ExtractionResult> {
    if let Some(text) = result_file.map(str::trim).filter(|t| !t.is_empty()) {
        return serde_json::from_str(text)
            .map_err(|e| warn!("Result file is not a valid extraction result: {}", e))
            .ok();
    }

    match marked_payload(stdout, marker) {
        Some(payload) => parse_leading_object(payload),
        None => serde_json::from_str(stdout.trim())
            .map_err(|e| warn!("Extractor stdout is not a JSON result: {}", e))
            .ok(),
    }
}

/// Text following the first `marker` that is followed by an object, up to
/// the end of that line.
fn marked_payload<'a>(stdout: &'a str, marker: &str) -> Option<&'a str> {
    if marker.is_empty() {
        return None;
    }
    stdout.lines().find_map(|line| {
        let (_, rest) = line.split_once(marker)?;
        let rest = rest.trim_start();
        rest.starts_with('{').then_some(rest)
    })
}

/// Parses the first JSON value of `payload`, ignoring anything after it.
fn parse_leading_object(payload: &str) -> Option<ExtractionResult> {
    let mut values = serde_json::Deserializer::from_str(payload).into_iter::<ExtractionResult>();
    match values.next() {
        Some(Ok(result)) => Some(result),
        Some(Err(e)) => {
            warn!("Marked result line is not a valid extraction result: {}", e);
            None
        }
        None => None,
    }
}
