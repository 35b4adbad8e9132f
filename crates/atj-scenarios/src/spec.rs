use anyhow::{anyhow, Context, Result};
use atj_algo::ParameterOverrides;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// A sweep specification: explicit points, a parameter grid, or both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepSet {
    pub version: Option<u32>,
    /// Case file the sweep runs against
    pub case_file: Option<String>,
    #[serde(default)]
    pub defaults: SweepDefaults,
    #[serde(default)]
    pub points: Vec<SweepPointSpec>,
    /// Axis name to values; expanded as a cartesian product in declaration order
    #[serde(default)]
    pub grid: IndexMap<String, Vec<f64>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepDefaults {
    #[serde(default)]
    pub overrides: ParameterOverrides,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepPointSpec {
    pub point_id: String,
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub overrides: ParameterOverrides,
}

/// One sweep point with defaults folded in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedPoint {
    pub point_id: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub overrides: ParameterOverrides,
}

/// Grid axes a sweep may vary.
pub const GRID_AXES: &[&str] = &[
    "saf_premium",
    "eth_premium",
    "blend",
    "max_saf_capacity",
    "breakpoints",
    "greenfield_factor",
    "big_m",
    "reference_capex",
    "logistics_rate",
    "fixed_logistics_rate",
    "sugar_demand",
    "ground_demand",
];

pub fn load_spec_from_path(path: &Path) -> Result<SweepSet> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading sweep spec '{}'", path.display()))?;
    match path.extension().and_then(|ext| ext.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
            serde_yaml::from_str(&data).context("parsing sweep spec yaml")
        }
        Some(ext) if ext.eq_ignore_ascii_case("json") => {
            serde_json::from_str(&data).context("parsing sweep spec json")
        }
        _ => serde_yaml::from_str(&data)
            .or_else(|_| serde_json::from_str(&data))
            .context("parsing sweep spec"),
    }
}

pub fn resolve_points(set: &SweepSet) -> Result<Vec<ResolvedPoint>> {
    if set.points.is_empty() && set.grid.is_empty() {
        return Err(anyhow!("sweep spec declares neither points nor a grid"));
    }
    let defaults = &set.defaults;
    let mut seen = HashSet::new();
    let mut resolved = Vec::new();

    for point in &set.points {
        if point.point_id.trim().is_empty() {
            return Err(anyhow!("point_id cannot be empty"));
        }
        if !seen.insert(point.point_id.clone()) {
            return Err(anyhow!("duplicate point_id '{}' in spec", point.point_id));
        }
        resolved.push(ResolvedPoint {
            point_id: point.point_id.clone(),
            description: point.description.clone(),
            tags: point
                .tags
                .as_ref()
                .cloned()
                .unwrap_or_else(|| defaults.tags.clone()),
            overrides: defaults.overrides.merged(&point.overrides),
        });
    }

    for (point_id, overrides) in expand_grid(&set.grid)? {
        if !seen.insert(point_id.clone()) {
            return Err(anyhow!("grid point '{}' collides with an explicit point", point_id));
        }
        resolved.push(ResolvedPoint {
            point_id,
            description: None,
            tags: defaults.tags.clone(),
            overrides: defaults.overrides.merged(&overrides),
        });
    }

    Ok(resolved)
}

pub fn validate(set: &SweepSet) -> Result<()> {
    resolve_points(set).map(|_| ())
}

/// Cartesian product of the grid axes, first axis slowest.
fn expand_grid(grid: &IndexMap<String, Vec<f64>>) -> Result<Vec<(String, ParameterOverrides)>> {
    if grid.is_empty() {
        return Ok(Vec::new());
    }
    let mut points: Vec<(Vec<String>, ParameterOverrides)> =
        vec![(Vec::new(), ParameterOverrides::default())];

    for (axis, values) in grid {
        if values.is_empty() {
            return Err(anyhow!("grid axis '{}' has no values", axis));
        }
        let mut next = Vec::with_capacity(points.len() * values.len());
        for (labels, overrides) in &points {
            for value in values {
                let mut overrides = overrides.clone();
                set_axis(&mut overrides, axis, *value)
                    .with_context(|| format!("expanding grid axis '{}'", axis))?;
                let mut labels = labels.clone();
                labels.push(format!("{}={}", axis, value));
                next.push((labels, overrides));
            }
        }
        points = next;
    }

    Ok(points
        .into_iter()
        .map(|(labels, overrides)| (labels.join(","), overrides))
        .collect())
}

fn set_axis(overrides: &mut ParameterOverrides, axis: &str, value: f64) -> Result<()> {
    if !value.is_finite() {
        return Err(anyhow!("value {} is not finite", value));
    }
    match axis {
        "saf_premium" => overrides.saf_premium = Some(value),
        "eth_premium" => overrides.eth_premium = Some(value),
        "blend" => overrides.blend = Some(value),
        "max_saf_capacity" => overrides.max_saf_capacity = Some(value),
        "breakpoints" => {
            if value < 0.0 || value.fract() != 0.0 {
                return Err(anyhow!("breakpoints must be a whole number, got {}", value));
            }
            overrides.breakpoints = Some(value as usize);
        }
        "greenfield_factor" => overrides.greenfield_factor = Some(value),
        "big_m" => overrides.big_m = Some(value),
        "reference_capex" => overrides.reference_capex = Some(value),
        "logistics_rate" => overrides.logistics_rate = Some(value),
        "fixed_logistics_rate" => overrides.fixed_logistics_rate = Some(value),
        "sugar_demand" => overrides.sugar_demand = Some(value),
        "ground_demand" => overrides.ground_demand = Some(value),
        other => {
            return Err(anyhow!(
                "unknown grid axis '{}'; supported axes: {}",
                other,
                GRID_AXES.join(", ")
            ))
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use atj_algo::ObjectiveMode;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SPEC_YAML: &str = r#"
version: 1
case_file: case.yaml
defaults:
  overrides:
    objective: profit
    saf_premium: 100.0
  tags: [baseline]
points:
  - point_id: cost-view
    description: system cost at a 10% mandate
    overrides:
      objective: cost
      blend: 0.1
grid:
  blend: [0.0, 0.1, 0.2]
  saf_premium: [0.0, 500.0]
"#;

    fn write_spec(text: &str, suffix: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_and_resolves_yaml_spec() {
        let file = write_spec(SPEC_YAML, ".yaml");
        let set = load_spec_from_path(file.path()).unwrap();
        assert_eq!(set.case_file.as_deref(), Some("case.yaml"));

        let points = resolve_points(&set).unwrap();
        assert_eq!(points.len(), 1 + 3 * 2);

        let explicit = &points[0];
        assert_eq!(explicit.point_id, "cost-view");
        assert_eq!(explicit.overrides.objective, Some(ObjectiveMode::Cost));
        assert_eq!(explicit.overrides.saf_premium, Some(100.0));
        assert_eq!(explicit.tags, vec!["baseline".to_string()]);

        assert_eq!(points[1].point_id, "blend=0,saf_premium=0");
        assert_eq!(points[2].point_id, "blend=0,saf_premium=500");
        assert_eq!(points[6].overrides.blend, Some(0.2));
        assert_eq!(points[6].overrides.saf_premium, Some(500.0));
        assert_eq!(points[6].overrides.objective, Some(ObjectiveMode::Profit));
    }

    #[test]
    fn json_spec_parses_by_extension() {
        let file = write_spec(
            r#"{"points": [{"point_id": "p1", "overrides": {"blend": 0.05}}]}"#,
            ".json",
        );
        let set = load_spec_from_path(file.path()).unwrap();
        let points = resolve_points(&set).unwrap();
        assert_eq!(points[0].overrides.blend, Some(0.05));
    }

    #[test]
    fn rejects_empty_and_duplicate_points() {
        assert!(resolve_points(&SweepSet::default()).is_err());

        let point = SweepPointSpec {
            point_id: "dup".into(),
            description: None,
            tags: None,
            overrides: ParameterOverrides::default(),
        };
        let set = SweepSet {
            points: vec![point.clone(), point],
            ..Default::default()
        };
        let err = resolve_points(&set).unwrap_err();
        assert!(err.to_string().contains("duplicate point_id 'dup'"));
    }

    #[test]
    fn rejects_unknown_axis_and_fractional_breakpoints() {
        let mut set = SweepSet::default();
        set.grid.insert("wind_speed".into(), vec![1.0]);
        let err = format!("{:#}", resolve_points(&set).unwrap_err());
        assert!(err.contains("unknown grid axis 'wind_speed'"));

        let mut set = SweepSet::default();
        set.grid.insert("breakpoints".into(), vec![2.5]);
        assert!(resolve_points(&set).is_err());

        let mut set = SweepSet::default();
        set.grid.insert("blend".into(), vec![]);
        assert!(validate(&set).is_err());
    }
}
