//! Variable bounds derived from a technology specification.
//!
//! Every flow gets a finite upper bound so that the big-M pass can size its
//! constants from variable bounds alone.

use ehub_core::block::{FlowBounds, SizeBounds};
use ehub_core::technology::{
    Coefficients, PerformanceFunction, SegmentValues, TechnologyModel, TechnologySpec,
};

pub fn size_bounds(spec: &TechnologySpec) -> SizeBounds {
    SizeBounds {
        min: spec.size_min,
        max: spec.size_max,
        integer: spec.size_is_int,
    }
}

/// Largest absolute value a coefficient takes over carriers and segments.
fn max_abs(coefficients: Option<&Coefficients>) -> f64 {
    let segment_max = |values: &SegmentValues| match values {
        SegmentValues::Single(v) => v.abs(),
        SegmentValues::Segments(vs) => {
            vs.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
        }
    };
    match coefficients {
        None => 0.0,
        Some(Coefficients::Uniform(values)) => segment_max(values),
        Some(Coefficients::PerCarrier(map)) => map.values().map(segment_max).fold(0.0, f64::max),
    }
}

pub fn flow_bounds(spec: &TechnologySpec) -> FlowBounds {
    let fit = &spec.fit;
    match spec.technology_model {
        TechnologyModel::Res => {
            let cf_max = fit.capacity_factor.iter().fold(0.0_f64, |acc, cf| acc.max(*cf));
            FlowBounds {
                input_max: 0.0,
                output_max: cf_max * spec.size_max,
            }
        }
        TechnologyModel::Conv1 | TechnologyModel::Conv2 | TechnologyModel::Conv3 => {
            // Relation input (total or main carrier) is capped by size · rated_power.
            let relation_max = spec.size_max * fit.rated_power;
            let ratio_max = fit.input_ratios.values().fold(1.0_f64, |acc, r| acc.max(*r));
            let intercept_scale = spec.size_max * fit.rated_power.max(1.0);
            let output_max = match fit.function_type() {
                PerformanceFunction::LinearThroughOrigin => {
                    max_abs(fit.alpha1.as_ref()) * relation_max
                }
                _ => {
                    max_abs(fit.alpha2.as_ref()) * relation_max
                        + max_abs(fit.alpha1.as_ref()) * intercept_scale
                }
            };
            FlowBounds {
                input_max: relation_max * ratio_max,
                output_max,
            }
        }
        TechnologyModel::Stor => {
            let (eta_in, eta_out) = spec
                .storage
                .as_ref()
                .map(|s| (s.eta_in, s.eta_out))
                .unwrap_or((1.0, 1.0));
            FlowBounds {
                input_max: eta_in * spec.size_max,
                output_max: eta_out * spec.size_max,
            }
        }
        TechnologyModel::OceanBattery => match &spec.ocean_battery {
            Some(params) => {
                let pump_eff = params
                    .pump_archetypes
                    .iter()
                    .fold(0.0_f64, |acc, a| acc.max(a.efficiency));
                FlowBounds {
                    input_max: params.pump_slots as f64 * params.slot_size_max * pump_eff,
                    output_max: params.turbine_slots as f64
                        * params.slot_size_max
                        * params.turbine_efficiency,
                }
            }
            None => FlowBounds {
                input_max: 0.0,
                output_max: 0.0,
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ehub_core::technology::PerformanceFit;
    use ehub_core::CarrierId;
    use std::collections::BTreeMap;

    #[test]
    fn test_offset_curve_bounds_cover_intercept() {
        let mut alpha1 = BTreeMap::new();
        alpha1.insert(CarrierId::new("heat"), SegmentValues::Segments(vec![0.1, -0.3]));
        let spec = TechnologySpec::new("chp", TechnologyModel::Conv2, 10.0)
            .with_carriers(&["gas"], &["heat"])
            .with_fit(PerformanceFit {
                performance_function_type: Some(PerformanceFunction::PiecewiseLinear),
                bp_x: vec![0.0, 0.5, 1.0],
                alpha1: Some(Coefficients::PerCarrier(alpha1)),
                alpha2: Some(Coefficients::Uniform(SegmentValues::Single(0.8))),
                ..PerformanceFit::default()
            });
        let b = flow_bounds(&spec);
        assert_eq!(b.input_max, 10.0);
        assert!((b.output_max - (8.0 + 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_renewable_bound_uses_peak_capacity_factor() {
        let mut spec = TechnologySpec::new("pv", TechnologyModel::Res, 4.0)
            .with_carriers(&[], &["electricity"]);
        spec.fit.capacity_factor = vec![0.1, 0.75, 0.3];
        let b = flow_bounds(&spec);
        assert_eq!((b.input_max, b.output_max), (0.0, 3.0));
    }
}
