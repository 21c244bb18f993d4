//! Whole-model construction from the sample hub

use ehub_algo::construct_all;
use ehub_core::technology::PerformanceFunction;
use ehub_core::{load_model_from_path, EhubError};
use std::io::Write;
use std::path::PathBuf;

fn sample_hub() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../data/hub.yaml")
}

#[test]
fn sample_hub_builds_and_relaxes() {
    let model = load_model_from_path(&sample_hub()).unwrap();
    let (technologies, diagnostics) = construct_all(&model).unwrap();

    assert_eq!(technologies.len(), 6);
    assert_eq!(diagnostics.warning_count(), 0, "{}", diagnostics.summary());
    for tech in &technologies {
        let summary = tech.block.summary();
        assert_eq!(summary.pending_disjunctions, 0, "{} left pending", tech.name);
    }

    let names: Vec<&str> = technologies.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec!["pv", "boiler", "chp", "electrolyser", "battery", "ocean_battery"]
    );

    let electrolyser = &technologies[3];
    assert!(electrolyser.states.is_some());
    assert_eq!(electrolyser.block.disjunctions().len(), 24);
    assert!(technologies[5].ocean_battery.is_some());
}

#[test]
fn unknown_performance_function_is_fatal() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(
        file,
        "horizon: {{ steps: 2 }}\n\
         technologies:\n\
         \x20 - name: boiler\n\
         \x20   technology_model: CONV1\n\
         \x20   input_carriers: [gas]\n\
         \x20   output_carriers: [heat]\n\
         \x20   size_max: 10\n\
         \x20   fit:\n\
         \x20     performance_function_type: 4\n\
         \x20     alpha1: 0.9"
    )
    .unwrap();
    let result = load_model_from_path(file.path());
    assert!(matches!(result, Err(EhubError::Parse(_))));
}

#[test]
fn missing_carrier_coefficient_aborts_model() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"{{
            "horizon": {{ "steps": 2 }},
            "technologies": [
                {{
                    "name": "chp",
                    "technology_model": "CONV2",
                    "input_carriers": ["gas"],
                    "output_carriers": ["electricity", "heat"],
                    "size_max": 10,
                    "fit": {{ "alpha1": {{ "electricity": 0.4 }} }}
                }}
            ]
        }}"#
    )
    .unwrap();
    let model = load_model_from_path(file.path()).unwrap();
    let result = construct_all(&model);
    assert!(matches!(
        result,
        Err(EhubError::MissingCarrierCoefficient { ref carrier, .. }) if carrier == "heat"
    ));
}

#[test]
fn omitted_performance_function_defaults_with_warning() {
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    write!(
        file,
        r#"{{
            "horizon": {{ "steps": 2 }},
            "technologies": [
                {{
                    "name": "boiler",
                    "technology_model": "CONV1",
                    "input_carriers": ["gas"],
                    "output_carriers": ["heat"],
                    "size_max": 10,
                    "fit": {{ "alpha1": 0.9 }}
                }}
            ]
        }}"#
    )
    .unwrap();
    let model = load_model_from_path(file.path()).unwrap();
    let boiler = &model.technologies[0];
    assert_eq!(boiler.fit.performance_function_type, None);
    assert_eq!(
        boiler.fit.function_type(),
        PerformanceFunction::LinearThroughOrigin
    );

    let (_, diagnostics) = construct_all(&model).unwrap();
    let defaults: Vec<_> = diagnostics.issues_by_category("defaults").collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].entity.as_deref(), Some("boiler"));
    assert!(defaults[0].message.contains("performance_function_type"));
}
