//! Environment variable filtering: selects `KEY=VALUE` entries by prefix and
//! forwards the remainder as argument tokens.

use regex::Regex;
use tracing::debug;

use crate::error::YamlfigError;

/// Keep entries whose key starts with `prefix`, with the prefix stripped and
/// the `KEY=VALUE` shape and relative order preserved.
///
/// The prefix is interpolated into a regular expression, so a prefix that
/// does not form a valid pattern is an error. The caller defers it to the
/// resulting stream's first read.
pub(crate) fn filter_env(prefix: &str, vars: &[String]) -> Result<Vec<String>, YamlfigError> {
    let pattern = format!("^{prefix}([^=]*=.*)$");
    let matcher = Regex::new(&pattern).map_err(|source| YamlfigError::InvalidEnvPrefix {
        prefix: prefix.to_string(),
        source,
    })?;

    let args: Vec<String> = vars
        .iter()
        .filter_map(|entry| {
            matcher
                .captures(entry)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        })
        .collect();
    debug!(prefix, matched = args.len(), "filtered environment entries");
    Ok(args)
}
