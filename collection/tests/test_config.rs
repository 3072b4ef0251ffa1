//! Tests for the equipment configuration and the parsing of initialization commands.

use std::{io::Write, time::Duration};

use rstest::*;
use serde_json::{Map, Value, json};

use equipment_collection::*;

fn args(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("arguments must be an object"),
    }
}

#[fixture]
fn bench() -> EquipmentConfig {
    EquipmentConfig::from_value(json!({
        "source_v_in": {
            "object": "Sorensen_SGA",
            "address": "TCPIP0::10.0.0.5::5025::SOCKET",
            "definition": "equipment.power_supplies.sorensen_sga",
            "kwargs": {"timeout": 2.5, "clear": true},
            "init": [["set_voltage", {"voltage": 0}], ["off", {}]]
        },
        "DMM_vin": {
            "object": "HP_34401A",
            "address": "GPIB0::22::INSTR",
            "kwargs": {"factor": 2.0, "baud_rate": 115200}
        },
        "scope": {
            "object": "Tektronix_DPO4xxx",
            "address": "TCPIP0::10.0.0.20::4000::SOCKET"
        }
    }))
    .unwrap()
}

#[rstest]
fn test_order_preserved(bench: EquipmentConfig) {
    assert_eq!(
        bench.names().collect::<Vec<_>>(),
        vec!["source_v_in", "DMM_vin", "scope"]
    );
    assert_eq!(bench.len(), 3);
}

#[rstest]
fn test_device_fields(bench: EquipmentConfig) {
    let psu = bench.get("source_v_in").unwrap();
    assert_eq!(psu.object, "Sorensen_SGA");
    assert_eq!(psu.init.len(), 2);
    assert_eq!(psu.init[0].name(), "set_voltage");
    assert_eq!(psu.init[1].args(), &Map::new());

    let scope = bench.get("scope").unwrap();
    assert!(scope.kwargs.is_empty());
    assert!(scope.init.is_empty());
    assert_eq!(scope.definition, None);
}

#[rstest]
fn test_connection_settings(bench: EquipmentConfig) {
    let settings = bench.get("source_v_in").unwrap().connection_settings().unwrap();
    assert_eq!(settings.timeout, Duration::from_millis(2500));
    assert_eq!(settings.open_timeout, Duration::from_secs(1));
    assert!(settings.clear);

    let settings = bench.get("DMM_vin").unwrap().connection_settings().unwrap();
    assert_eq!(settings.baud_rate, 115200);
    assert_eq!(settings.timeout, Duration::from_secs(1));
}

#[rstest]
#[case(json!({"timeout": "long"}))]
#[case(json!({"timeout": -1.0}))]
#[case(json!({"clear": 1}))]
#[case(json!({"baud_rate": -9600}))]
fn test_invalid_kwargs(#[case] kwargs: Value) {
    let mut device = DeviceConfig::new("Sorensen_SGA", "TCPIP0::10.0.0.5::5025::SOCKET");
    device.kwargs = args(kwargs);
    assert!(matches!(
        device.connection_settings(),
        Err(CollectionError::Config(_))
    ));
}

#[rstest]
fn test_kwarg_f64(bench: EquipmentConfig) {
    let dmm = bench.get("DMM_vin").unwrap();
    assert_eq!(dmm.kwarg_f64("factor").unwrap(), Some(2.0));
    assert_eq!(dmm.kwarg_f64("line_frequency").unwrap(), None);
}

#[rstest]
fn test_retain_names(mut bench: EquipmentConfig) {
    bench.retain_names(&["scope", "source_v_in"]).unwrap();
    assert_eq!(
        bench.names().collect::<Vec<_>>(),
        vec!["source_v_in", "scope"]
    );
}

#[rstest]
fn test_retain_names_missing(mut bench: EquipmentConfig) {
    match bench.retain_names(&["scope", "load", "dmm2"]) {
        Err(CollectionError::MissingResources(missing)) => {
            assert_eq!(missing, vec!["load", "dmm2"])
        }
        other => panic!("unexpected result: {other:?}"),
    }
    assert_eq!(bench.len(), 3);
}

#[rstest]
#[case(json!([1, 2, 3]))]
#[case(json!({"psu": {"object": "Sorensen_SGA"}}))]
#[case(json!({"psu": {"object": "Sorensen_SGA", "address": "x", "init": [["off"]]}}))]
fn test_invalid_config(#[case] value: Value) {
    assert!(matches!(
        EquipmentConfig::from_value(value),
        Err(CollectionError::Config(_))
    ));
}

#[rstest]
fn test_from_path() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(
        file,
        r#"{{"load": {{"object": "Chroma_6310", "address": "GPIB0::7::INSTR"}}}}"#
    )
    .unwrap();
    let config = EquipmentConfig::from_path(file.path()).unwrap();
    assert_eq!(config.get("load").unwrap().object, "Chroma_6310");
}

#[rstest]
fn test_from_path_errors() {
    assert!(matches!(
        EquipmentConfig::from_path("/nonexistent/equipment.json"),
        Err(CollectionError::Io(_))
    ));
    assert!(matches!(
        "{not json".parse::<EquipmentConfig>(),
        Err(CollectionError::Json(_))
    ));
}

#[rstest]
fn test_insert_replaces() {
    let mut config = EquipmentConfig::default();
    config.insert("a", DeviceConfig::new("Sorensen_SGA", "x"));
    config.insert("b", DeviceConfig::new("Chroma_6310", "y"));
    config.insert("a", DeviceConfig::new("HP_34401A", "z"));
    assert_eq!(config.names().collect::<Vec<_>>(), vec!["b", "a"]);
    assert_eq!(config.get("a").unwrap().object, "HP_34401A");
}

#[rstest]
#[case("reset", json!({}), InitCommand::Reset)]
#[case("off", json!({}), InitCommand::Off { channel: None })]
#[case("on", json!({"channel": 2}), InitCommand::On { channel: Some(2) })]
#[case(
    "set_voltage",
    json!({"voltage": 0}),
    InitCommand::SetVoltage { voltage: 0.0, channel: None }
)]
#[case(
    "set_current",
    json!({"current": 1.5, "level": 2}),
    InitCommand::SetCurrent { current: 1.5, channel: None, level: Some(2) }
)]
#[case(
    "config",
    json!({"mode": "VOLT", "acdc": "AC", "nplc": 10}),
    InitCommand::Config {
        mode: "VOLT".to_string(),
        acdc: Some("AC".to_string()),
        signal_range: None,
        resolution: None,
        nplc: Some(10.0),
    }
)]
#[case(
    "set_waveform_config",
    json!({"channel": 1, "frequency": 1000.0}),
    InitCommand::SetWaveformConfig {
        channel: 1,
        waveform: None,
        frequency: Some(1000.0),
        amplitude: None,
        offset: None,
    }
)]
fn test_parse_command(#[case] name: &str, #[case] arguments: Value, #[case] exp: InitCommand) {
    assert_eq!(InitCommand::parse(name, &args(arguments)).unwrap(), exp);
}

#[rstest]
#[case("explode", json!({}))]
#[case("reset", json!({"hard": true}))]
#[case("set_voltage", json!({}))]
#[case("set_voltage", json!({"voltage": "zero"}))]
#[case("set_voltage", json!({"voltage": 1.0, "volts": 1.0}))]
#[case("set_frequency", json!({"frequency": 1000.0}))]
fn test_parse_command_invalid(#[case] name: &str, #[case] arguments: Value) {
    assert!(InitCommand::parse(name, &args(arguments)).is_err());
}
