use atj_core::*;

const CASE_JSON: &str = r#"{
  "mills": [
    { "name": "Usina A", "capacity": 10000 },
    { "name": "Usina B", "capacity": 8000 }
  ],
  "airports": [ { "name": "GRU", "demand": 1000 } ],
  "refineries": [ { "name": "REPLAN" } ],
  "annexed_mills": ["Usina A"],
  "ethanol_mills": ["Usina B"],
  "distances": {
    "mill_mill": { "Usina A": { "Usina B": 40 }, "Usina B": { "Usina A": 40 } },
    "airport_mill": { "GRU": { "Usina A": 90, "Usina B": 110 } },
    "refinery_mill": { "REPLAN": { "Usina A": 30, "Usina B": 60 } },
    "refinery_airport": { "REPLAN": { "GRU": 100 } }
  },
  "conversions": { "sc_to_jui": 0.8, "jui_to_et": 0.08 },
  "prices": {
    "et": { "price": 3.0, "cost": 1.5 },
    "g": { "price": 3.0 }
  }
}"#;

#[test]
fn json_case_file_loads_every_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("case.json");
    std::fs::write(&path, CASE_JSON).unwrap();

    let case = CaseData::load(&path).unwrap();
    assert_eq!(case.num_mills(), 2);
    assert_eq!(case.num_airports(), 1);
    assert_eq!(case.num_refineries(), 1);
    assert_eq!(case.annexed_mills, vec!["Usina A"]);
    assert_eq!(
        case.distances
            .airport_mill
            .require("distances.airport_mill", "GRU", "Usina B")
            .unwrap(),
        110.0
    );
    assert_eq!(case.prices["et"].cost, Some(1.5));
}

#[test]
fn yaml_and_json_describe_the_same_case() {
    let dir = tempfile::tempdir().unwrap();
    let json_path = dir.path().join("case.json");
    std::fs::write(&json_path, CASE_JSON).unwrap();
    let from_json = CaseData::load(&json_path).unwrap();

    let yaml_path = dir.path().join("case.yml");
    std::fs::write(&yaml_path, serde_yaml::to_string(&from_json).unwrap()).unwrap();
    let from_yaml = CaseData::load(&yaml_path).unwrap();

    assert_eq!(from_json, from_yaml);
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = CaseData::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, AtjError::Io(_)));
}
