use std::fs;
use std::path::Path;

use super::SimulatePayload;
use super::error::ScenarioError;

/// Reads a TOML scenario. Keys are the same camelCase names the JSON API accepts.
pub fn load_scenario(path: &Path) -> Result<SimulatePayload, ScenarioError> {
    let content = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_scenario(&content)
}

pub fn parse_scenario(content: &str) -> Result<SimulatePayload, ScenarioError> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DisposalPolicy;

    #[test]
    fn parses_scalars_items_and_policy() {
        let content = r#"
            horizonYears = 12.5
            remanCost = 21000
            disposalPolicy = "every-cycle"

            [[acquisitionCostItems]]
            label = "Housing"
            amount = 30000

            [[acquisitionCostItems]]
            label = "Sensor pack"
            amount = 4500.5
        "#;

        let payload = parse_scenario(content).expect("scenario should parse");
        assert_eq!(payload.horizon_years, Some(12.5));
        assert_eq!(payload.reman_cost, Some(21_000.0));
        assert_eq!(payload.disposal_policy, Some(DisposalPolicy::EveryCycle));
        let items = payload.acquisition_cost_items.expect("items present");
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].label, "Sensor pack");
    }

    #[test]
    fn empty_file_changes_nothing() {
        let payload = parse_scenario("").expect("empty scenario is valid");
        assert!(payload.horizon_years.is_none());
        assert!(payload.acquisition_cost_items.is_none());
    }

    #[test]
    fn rejects_wrong_value_type() {
        let err = parse_scenario("horizonYears = \"ten\"").expect_err("must reject string");
        assert!(err.to_string().contains("invalid scenario file"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_scenario(Path::new("does/not/exist.toml")).expect_err("must fail");
        assert!(err.to_string().contains("does/not/exist.toml"));
    }
}
