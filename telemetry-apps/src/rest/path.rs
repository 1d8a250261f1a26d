//! Path queries over the projected telemetry tree.

use serde_json::{json, Value};

/// Outcome of resolving a slash-delimited path.
///
/// A miss is a user-visible diagnostic payload, not an error: it names
/// the segment that failed to match and the value reached at the point
/// of failure.
#[derive(Debug, Clone, PartialEq)]
pub enum PathResolution {
    Found(Value),
    Missing { key: String, last_dict: Value },
}

impl PathResolution {
    /// Render the resolution as the JSON response body.
    pub fn into_json(self) -> Value {
        match self {
            PathResolution::Found(value) => value,
            PathResolution::Missing { key, last_dict } => {
                json!({ "key": key, "last_dict": last_dict })
            }
        }
    }
}

/// Walk `root` one `/`-separated segment at a time.
///
/// Each segment is a literal key - no wildcards, no array indices, no
/// backtracking. An empty path returns the full tree unchanged; the
/// first segment that does not match a key of the current object stops
/// the walk immediately.
pub fn resolve_path(root: &Value, path: &str) -> PathResolution {
    if path.is_empty() {
        return PathResolution::Found(root.clone());
    }

    let mut current = root;
    for key in path.split('/') {
        match current.as_object().and_then(|object| object.get(key)) {
            Some(next) => current = next,
            None => {
                return PathResolution::Missing {
                    key: key.to_string(),
                    last_dict: current.clone(),
                }
            }
        }
    }
    PathResolution::Found(current.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projected() -> Value {
        json!({
            "GPS": { "lat": "1.0", "lon": "2.0" },
            "ATTITUDE": { "roll": "0.25" },
        })
    }

    #[test]
    fn empty_path_returns_root_unchanged() {
        assert_eq!(
            resolve_path(&projected(), ""),
            PathResolution::Found(projected())
        );
    }

    #[test]
    fn nested_path_returns_leaf() {
        assert_eq!(
            resolve_path(&projected(), "GPS/lat"),
            PathResolution::Found(json!("1.0"))
        );
    }

    #[test]
    fn single_segment_returns_sub_object() {
        assert_eq!(
            resolve_path(&projected(), "ATTITUDE"),
            PathResolution::Found(json!({ "roll": "0.25" }))
        );
    }

    #[test]
    fn first_segment_miss_reports_full_object() {
        assert_eq!(
            resolve_path(&projected(), "RC_CHANNELS/chan1_raw"),
            PathResolution::Missing {
                key: "RC_CHANNELS".to_string(),
                last_dict: projected(),
            }
        );
    }

    #[test]
    fn deep_miss_reports_inner_object() {
        assert_eq!(
            resolve_path(&projected(), "GPS/alt"),
            PathResolution::Missing {
                key: "alt".to_string(),
                last_dict: json!({ "lat": "1.0", "lon": "2.0" }),
            }
        );
    }

    #[test]
    fn descending_past_a_leaf_misses() {
        // The leaf itself is the value at the point of failure.
        assert_eq!(
            resolve_path(&projected(), "GPS/lat/extra"),
            PathResolution::Missing {
                key: "extra".to_string(),
                last_dict: json!("1.0"),
            }
        );
    }

    #[test]
    fn miss_renders_as_diagnostic_payload() {
        let body = resolve_path(&projected(), "WIND").into_json();
        assert_eq!(body["key"], json!("WIND"));
        assert_eq!(body["last_dict"], projected());
    }
}
