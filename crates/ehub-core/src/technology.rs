//! Technology specifications and fitted performance data.
//!
//! A [`TechnologySpec`] is what the curve-fitting collaborator hands over for
//! one technology: its model, carrier sets, size bounds, the fitted
//! [`PerformanceFit`] and optional storage or dynamics parameters. Specs are
//! plain serde types so they can be read from model files directly.

use crate::error::{EhubError, EhubResult};
use crate::time::TimeIndex;
use crate::CarrierId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Technology model, selecting which engines build the sub-model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TechnologyModel {
    /// Renewable: no inputs, output follows a capacity factor
    Res,
    /// n inputs → n outputs, total output vs total input
    Conv1,
    /// n inputs → n outputs, each output vs total input
    Conv2,
    /// Main input plus fixed-ratio secondary inputs → n outputs
    Conv3,
    /// Single-carrier storage
    Stor,
    /// Multi-component storage built from pump and turbine slots
    OceanBattery,
}

impl TechnologyModel {
    pub fn is_conversion(&self) -> bool {
        matches!(
            self,
            TechnologyModel::Conv1 | TechnologyModel::Conv2 | TechnologyModel::Conv3
        )
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, TechnologyModel::Stor | TechnologyModel::OceanBattery)
    }
}

impl fmt::Display for TechnologyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TechnologyModel::Res => "RES",
            TechnologyModel::Conv1 => "CONV1",
            TechnologyModel::Conv2 => "CONV2",
            TechnologyModel::Conv3 => "CONV3",
            TechnologyModel::Stor => "STOR",
            TechnologyModel::OceanBattery => "OCEAN_BATTERY",
        };
        write!(f, "{}", name)
    }
}

/// Shape of the fitted input/output relation (`performance_function_type`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PerformanceFunction {
    /// Type 1: `output = alpha1 · input`
    #[default]
    LinearThroughOrigin,
    /// Type 2: `output = alpha2 · input + alpha1 · size` when on
    LinearWithOffset,
    /// Type 3: one affine relation per breakpoint interval
    PiecewiseLinear,
}

impl TryFrom<u8> for PerformanceFunction {
    type Error = EhubError;

    fn try_from(code: u8) -> EhubResult<Self> {
        match code {
            1 => Ok(PerformanceFunction::LinearThroughOrigin),
            2 => Ok(PerformanceFunction::LinearWithOffset),
            3 => Ok(PerformanceFunction::PiecewiseLinear),
            other => Err(EhubError::UnknownPerformanceFunction(other)),
        }
    }
}

impl From<PerformanceFunction> for u8 {
    fn from(f: PerformanceFunction) -> u8 {
        match f {
            PerformanceFunction::LinearThroughOrigin => 1,
            PerformanceFunction::LinearWithOffset => 2,
            PerformanceFunction::PiecewiseLinear => 3,
        }
    }
}

/// Renewable curtailment mode (codes 0, 1, 2)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum CurtailmentMode {
    None,
    Continuous,
    /// Whole units switched off; needs an integer unit count per step
    Discrete,
}

impl TryFrom<u8> for CurtailmentMode {
    type Error = EhubError;

    fn try_from(code: u8) -> EhubResult<Self> {
        match code {
            0 => Ok(CurtailmentMode::None),
            1 => Ok(CurtailmentMode::Continuous),
            2 => Ok(CurtailmentMode::Discrete),
            other => Err(EhubError::UnknownCurtailment(other)),
        }
    }
}

impl From<CurtailmentMode> for u8 {
    fn from(mode: CurtailmentMode) -> u8 {
        match mode {
            CurtailmentMode::None => 0,
            CurtailmentMode::Continuous => 1,
            CurtailmentMode::Discrete => 2,
        }
    }
}

/// A coefficient for one curve: a single value or one value per segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SegmentValues {
    Single(f64),
    Segments(Vec<f64>),
}

impl SegmentValues {
    /// Value for a 0-based segment; a single value applies to every segment.
    pub fn get(&self, segment: usize) -> Option<f64> {
        match self {
            SegmentValues::Single(v) => Some(*v),
            SegmentValues::Segments(values) => values.get(segment).copied(),
        }
    }
}

/// Fitted coefficient, either shared by all output carriers or indexed by carrier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coefficients {
    Uniform(SegmentValues),
    PerCarrier(BTreeMap<CarrierId, SegmentValues>),
}

impl Coefficients {
    pub fn is_per_carrier(&self) -> bool {
        matches!(self, Coefficients::PerCarrier(_))
    }

    /// Value shared by all carriers. Carrier-indexed coefficients are rejected.
    pub fn uniform(
        &self,
        technology: &str,
        coefficient: &'static str,
        segment: usize,
    ) -> EhubResult<f64> {
        match self {
            Coefficients::Uniform(values) => values.get(segment).ok_or_else(|| {
                EhubError::MissingSegmentCoefficient {
                    technology: technology.to_string(),
                    coefficient,
                    segment: segment + 1,
                }
            }),
            Coefficients::PerCarrier(_) => Err(EhubError::config(
                technology,
                format!("{} must not be indexed by carrier for this model", coefficient),
            )),
        }
    }

    /// Value for one output carrier. Uniform coefficients apply to every carrier.
    pub fn for_carrier(
        &self,
        technology: &str,
        coefficient: &'static str,
        carrier: &CarrierId,
        segment: usize,
    ) -> EhubResult<f64> {
        let values = match self {
            Coefficients::Uniform(values) => values,
            Coefficients::PerCarrier(map) => {
                map.get(carrier)
                    .ok_or_else(|| EhubError::MissingCarrierCoefficient {
                        technology: technology.to_string(),
                        coefficient,
                        carrier: carrier.to_string(),
                    })?
            }
        };
        values
            .get(segment)
            .ok_or_else(|| EhubError::MissingSegmentCoefficient {
                technology: technology.to_string(),
                coefficient,
                segment: segment + 1,
            })
    }
}

/// Fitted performance characteristics of a technology
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceFit {
    /// Absent in the model file means type 1, reported as a defaulted field
    #[serde(default)]
    pub performance_function_type: Option<PerformanceFunction>,
    /// Ratio (type 1) or intercept per unit size (types 2, 3)
    #[serde(default)]
    pub alpha1: Option<Coefficients>,
    /// Slope (types 2, 3)
    #[serde(default)]
    pub alpha2: Option<Coefficients>,
    /// Size-normalized breakpoints (type 3)
    #[serde(default)]
    pub bp_x: Vec<f64>,
    #[serde(default)]
    pub min_part_load: Option<f64>,
    #[serde(default)]
    pub curtailment: Option<CurtailmentMode>,
    /// Separate request for discrete curtailment; must agree with `curtailment`
    #[serde(default)]
    pub curtailment_discrete: Option<bool>,
    #[serde(default = "default_rated_power")]
    pub rated_power: f64,
    /// Carrier that drives CONV3 relations and dynamic load limits
    #[serde(default)]
    pub main_input_carrier: Option<CarrierId>,
    /// Secondary input per unit of main input (CONV3)
    #[serde(default)]
    pub input_ratios: BTreeMap<CarrierId, f64>,
    /// Per-step availability of renewables
    #[serde(default)]
    pub capacity_factor: Vec<f64>,
}

fn default_rated_power() -> f64 {
    1.0
}

impl Default for PerformanceFit {
    fn default() -> Self {
        Self {
            performance_function_type: Some(PerformanceFunction::default()),
            alpha1: None,
            alpha2: None,
            bp_x: Vec::new(),
            min_part_load: None,
            curtailment: None,
            curtailment_discrete: None,
            rated_power: default_rated_power(),
            main_input_carrier: None,
            input_ratios: BTreeMap::new(),
            capacity_factor: Vec::new(),
        }
    }
}

impl PerformanceFit {
    /// Declared curve shape, type 1 when the key was left out.
    pub fn function_type(&self) -> PerformanceFunction {
        self.performance_function_type.unwrap_or_default()
    }

    /// Number of "on" segments of the curve.
    pub fn segment_count(&self) -> usize {
        match self.function_type() {
            PerformanceFunction::PiecewiseLinear => self.bp_x.len().saturating_sub(1),
            _ => 1,
        }
    }

    pub fn alpha1(&self, technology: &str) -> EhubResult<&Coefficients> {
        self.alpha1
            .as_ref()
            .ok_or_else(|| EhubError::config(technology, "alpha1 is required"))
    }

    pub fn alpha2(&self, technology: &str) -> EhubResult<&Coefficients> {
        self.alpha2
            .as_ref()
            .ok_or_else(|| EhubError::config(technology, "alpha2 is required"))
    }

    /// Effective curtailment mode and whether it was defaulted.
    ///
    /// `curtailment = none` (or continuous) together with
    /// `curtailment_discrete = true` is rejected, as is `curtailment = discrete`
    /// with `curtailment_discrete = false`.
    pub fn resolve_curtailment(&self, technology: &str) -> EhubResult<(CurtailmentMode, bool)> {
        match (self.curtailment, self.curtailment_discrete) {
            (None, None) | (None, Some(false)) => Ok((CurtailmentMode::None, true)),
            (None, Some(true)) => Ok((CurtailmentMode::Discrete, false)),
            (Some(CurtailmentMode::Discrete), Some(false)) => {
                Err(EhubError::ConflictingCurtailment {
                    technology: technology.to_string(),
                    message: "curtailment is discrete but curtailment_discrete is false".into(),
                })
            }
            (Some(mode), Some(true)) if mode != CurtailmentMode::Discrete => {
                Err(EhubError::ConflictingCurtailment {
                    technology: technology.to_string(),
                    message: format!(
                        "curtailment mode {} does not allow discrete curtailment",
                        u8::from(mode)
                    ),
                })
            }
            (Some(mode), _) => Ok((mode, false)),
        }
    }
}

/// Coefficients of a simple storage technology
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageCoefficients {
    pub eta_in: f64,
    pub eta_out: f64,
    /// Self-discharge per step
    #[serde(default)]
    pub lambda: f64,
    /// Ambient-dependent loss per step; empty means no ambient loss
    #[serde(default)]
    pub ambient_loss: Vec<f64>,
    #[serde(default)]
    pub allow_only_one_direction: bool,
}

/// Pump archetype: fixed efficiency and capex multiplier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PumpArchetype {
    pub efficiency: f64,
    pub capex_factor: f64,
}

/// Parameters of a multi-component ("ocean battery") storage device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OceanBatteryParams {
    #[serde(default)]
    pub lambda: f64,
    #[serde(default)]
    pub min_fill: f64,
    pub pump_slots: usize,
    pub turbine_slots: usize,
    #[serde(default = "default_slot_size_max")]
    pub slot_size_max: f64,
    #[serde(default = "default_pump_capex_rate")]
    pub pump_capex_rate: f64,
    #[serde(default = "default_turbine_capex_rate")]
    pub turbine_capex_rate: f64,
    #[serde(default = "default_turbine_efficiency")]
    pub turbine_efficiency: f64,
    /// Capex per unit of reservoir size
    #[serde(default = "default_base_capex_rate")]
    pub base_capex_rate: f64,
    #[serde(default = "default_pump_archetypes")]
    pub pump_archetypes: Vec<PumpArchetype>,
}

fn default_slot_size_max() -> f64 {
    10.0
}

fn default_pump_capex_rate() -> f64 {
    5.0
}

fn default_turbine_capex_rate() -> f64 {
    2.0
}

fn default_turbine_efficiency() -> f64 {
    0.8
}

fn default_base_capex_rate() -> f64 {
    10.0
}

fn default_pump_archetypes() -> Vec<PumpArchetype> {
    vec![
        PumpArchetype {
            efficiency: 0.99,
            capex_factor: 1.0,
        },
        PumpArchetype {
            efficiency: 0.70,
            capex_factor: 0.8,
        },
    ]
}

impl OceanBatteryParams {
    pub fn new(pump_slots: usize, turbine_slots: usize) -> Self {
        Self {
            lambda: 0.0,
            min_fill: 0.0,
            pump_slots,
            turbine_slots,
            slot_size_max: default_slot_size_max(),
            pump_capex_rate: default_pump_capex_rate(),
            turbine_capex_rate: default_turbine_capex_rate(),
            turbine_efficiency: default_turbine_efficiency(),
            base_capex_rate: default_base_capex_rate(),
            pump_archetypes: default_pump_archetypes(),
        }
    }
}

/// Startup/shutdown behavior of a conversion technology
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicsParams {
    #[serde(rename = "SU_time", alias = "su_time", default)]
    pub su_time: usize,
    #[serde(rename = "SD_time", alias = "sd_time", default)]
    pub sd_time: usize,
    #[serde(default)]
    pub min_uptime: usize,
    #[serde(default)]
    pub min_downtime: usize,
    /// -1 means unlimited
    #[serde(default = "default_max_startups")]
    pub max_startups: i64,
    #[serde(rename = "SU_load", alias = "su_load", default = "default_load")]
    pub su_load: f64,
    #[serde(rename = "SD_load", alias = "sd_load", default = "default_load")]
    pub sd_load: f64,
    /// Maximum input change per step and unit size; 0 disables the limit
    #[serde(default)]
    pub ramping_rate: f64,
}

fn default_max_startups() -> i64 {
    -1
}

fn default_load() -> f64 {
    1.0
}

impl Default for DynamicsParams {
    fn default() -> Self {
        Self {
            su_time: 0,
            sd_time: 0,
            min_uptime: 0,
            min_downtime: 0,
            max_startups: default_max_startups(),
            su_load: default_load(),
            sd_load: default_load(),
            ramping_rate: 0.0,
        }
    }
}

impl DynamicsParams {
    /// Trajectories are needed as soon as a ramp spans a step.
    pub fn is_slow(&self) -> bool {
        self.su_time > 0 || self.sd_time > 0
    }

    /// Downtime including both ramp durations.
    pub fn effective_min_downtime(&self) -> usize {
        self.min_downtime + self.su_time + self.sd_time
    }

    pub fn startup_cap(&self, technology: &str) -> EhubResult<Option<usize>> {
        match self.max_startups {
            -1 => Ok(None),
            n if n < 0 => Err(EhubError::config(
                technology,
                format!("max_startups must be -1 or non-negative, got {}", n),
            )),
            n => Ok(Some(n as usize)),
        }
    }
}

/// Everything needed to build one technology sub-model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnologySpec {
    pub name: String,
    pub technology_model: TechnologyModel,
    #[serde(default)]
    pub input_carriers: Vec<CarrierId>,
    #[serde(default)]
    pub output_carriers: Vec<CarrierId>,
    #[serde(default)]
    pub size_min: f64,
    pub size_max: f64,
    #[serde(default)]
    pub size_is_int: bool,
    #[serde(default)]
    pub fit: PerformanceFit,
    #[serde(default)]
    pub storage: Option<StorageCoefficients>,
    #[serde(default)]
    pub ocean_battery: Option<OceanBatteryParams>,
    #[serde(default)]
    pub dynamics: Option<DynamicsParams>,
}

impl TechnologySpec {
    pub fn new(name: impl Into<String>, technology_model: TechnologyModel, size_max: f64) -> Self {
        Self {
            name: name.into(),
            technology_model,
            input_carriers: Vec::new(),
            output_carriers: Vec::new(),
            size_min: 0.0,
            size_max,
            size_is_int: false,
            fit: PerformanceFit::default(),
            storage: None,
            ocean_battery: None,
            dynamics: None,
        }
    }

    pub fn with_carriers(mut self, inputs: &[&str], outputs: &[&str]) -> Self {
        self.input_carriers = inputs.iter().map(|c| CarrierId::new(*c)).collect();
        self.output_carriers = outputs.iter().map(|c| CarrierId::new(*c)).collect();
        self
    }

    pub fn with_fit(mut self, fit: PerformanceFit) -> Self {
        self.fit = fit;
        self
    }

    pub fn with_dynamics(mut self, dynamics: DynamicsParams) -> Self {
        self.dynamics = Some(dynamics);
        self
    }

    /// Carrier whose input drives load limits: the declared main carrier,
    /// otherwise `None` (meaning the sum of all inputs).
    pub fn main_carrier(&self) -> Option<&CarrierId> {
        match self.technology_model {
            TechnologyModel::Conv3 => self.fit.main_input_carrier.as_ref(),
            _ => None,
        }
    }

    /// Reject every structurally invalid configuration before any variable is created.
    pub fn validate(&self, time: &TimeIndex) -> EhubResult<()> {
        let name = self.name.as_str();
        if !self.size_max.is_finite() || self.size_min < 0.0 || self.size_min > self.size_max {
            return Err(EhubError::config(
                name,
                format!(
                    "size bounds [{}, {}] are invalid",
                    self.size_min, self.size_max
                ),
            ));
        }

        self.validate_carriers()?;
        self.validate_fit(time)?;

        match self.technology_model {
            TechnologyModel::Stor => {
                let storage = self
                    .storage
                    .as_ref()
                    .ok_or_else(|| EhubError::config(name, "STOR requires storage coefficients"))?;
                if storage.eta_in <= 0.0 || storage.eta_out <= 0.0 {
                    return Err(EhubError::config(name, "storage efficiencies must be positive"));
                }
                if !storage.ambient_loss.is_empty() && storage.ambient_loss.len() != time.len() {
                    return Err(EhubError::SeriesLength {
                        technology: name.to_string(),
                        series: "ambient_loss",
                        expected: time.len(),
                        found: storage.ambient_loss.len(),
                    });
                }
            }
            TechnologyModel::OceanBattery => {
                let params = self.ocean_battery.as_ref().ok_or_else(|| {
                    EhubError::config(name, "OCEAN_BATTERY requires ocean_battery parameters")
                })?;
                if params.pump_archetypes.is_empty() {
                    return Err(EhubError::config(name, "at least one pump archetype is required"));
                }
                if !(0.0..=1.0).contains(&params.min_fill) {
                    return Err(EhubError::config(name, "min_fill must lie in [0, 1]"));
                }
            }
            _ => {}
        }

        if let Some(dynamics) = &self.dynamics {
            self.validate_dynamics(dynamics, time)?;
        }
        Ok(())
    }

    fn validate_carriers(&self) -> EhubResult<()> {
        let name = self.name.as_str();
        let inputs = self.input_carriers.len();
        let outputs = self.output_carriers.len();
        match self.technology_model {
            TechnologyModel::Res if inputs != 0 || outputs == 0 => Err(EhubError::config(
                name,
                "RES takes no inputs and at least one output carrier",
            )),
            m if m.is_conversion() && (inputs == 0 || outputs == 0) => Err(EhubError::config(
                name,
                format!("{} needs at least one input and one output carrier", m),
            )),
            m if m.is_storage()
                && (inputs != 1 || outputs != 1 || self.input_carriers != self.output_carriers) =>
            {
                Err(EhubError::config(
                    name,
                    format!("{} stores exactly one carrier (same input and output)", m),
                ))
            }
            TechnologyModel::Conv3 => {
                let main = self.fit.main_input_carrier.as_ref().ok_or_else(|| {
                    EhubError::config(name, "CONV3 requires main_input_carrier")
                })?;
                if !self.input_carriers.contains(main) {
                    return Err(EhubError::config(
                        name,
                        format!("main input carrier {} is not an input carrier", main),
                    ));
                }
                for carrier in self.input_carriers.iter().filter(|c| *c != main) {
                    if !self.fit.input_ratios.contains_key(carrier) {
                        return Err(EhubError::MissingCarrierCoefficient {
                            technology: name.to_string(),
                            coefficient: "input_ratios",
                            carrier: carrier.to_string(),
                        });
                    }
                }
                if let Some(extra) = self
                    .fit
                    .input_ratios
                    .keys()
                    .find(|c| *c == main || !self.input_carriers.contains(c))
                {
                    return Err(EhubError::config(
                        name,
                        format!("input ratio given for {} which is not a secondary input", extra),
                    ));
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    fn validate_fit(&self, time: &TimeIndex) -> EhubResult<()> {
        let name = self.name.as_str();
        let fit = &self.fit;
        match self.technology_model {
            TechnologyModel::Res => {
                if fit.capacity_factor.len() != time.len() {
                    return Err(EhubError::SeriesLength {
                        technology: name.to_string(),
                        series: "capacity_factor",
                        expected: time.len(),
                        found: fit.capacity_factor.len(),
                    });
                }
                fit.resolve_curtailment(name)?;
            }
            m if m.is_conversion() => {
                if fit.function_type() == PerformanceFunction::PiecewiseLinear {
                    if fit.bp_x.len() < 2 {
                        return Err(EhubError::config(
                            name,
                            "piecewise fits need at least two breakpoints",
                        ));
                    }
                    if let Some(index) = fit.bp_x.windows(2).position(|w| w[1] <= w[0]) {
                        return Err(EhubError::BreakpointsNotIncreasing {
                            technology: name.to_string(),
                            index: index + 1,
                        });
                    }
                }
                if let Some(mpl) = fit.min_part_load {
                    if !(0.0..=1.0).contains(&mpl) {
                        return Err(EhubError::config(name, "min_part_load must lie in [0, 1]"));
                    }
                }
                self.validate_coefficients(m)?;
            }
            _ => {}
        }
        Ok(())
    }

    /// Every output carrier must find a value for every segment.
    fn validate_coefficients(&self, model: TechnologyModel) -> EhubResult<()> {
        let name = self.name.as_str();
        let fit = &self.fit;
        let mut required = vec![("alpha1", fit.alpha1(name)?)];
        if fit.function_type() != PerformanceFunction::LinearThroughOrigin {
            required.push(("alpha2", fit.alpha2(name)?));
        }
        for (coefficient, values) in required {
            for segment in 0..fit.segment_count() {
                if model == TechnologyModel::Conv1 {
                    values.uniform(name, coefficient, segment)?;
                } else {
                    for carrier in &self.output_carriers {
                        values.for_carrier(name, coefficient, carrier, segment)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn validate_dynamics(&self, dynamics: &DynamicsParams, time: &TimeIndex) -> EhubResult<()> {
        let name = self.name.as_str();
        if !self.technology_model.is_conversion() {
            return Err(EhubError::config(
                name,
                format!(
                    "dynamics apply to conversion technologies only, not {}",
                    self.technology_model
                ),
            ));
        }
        for (kind, length) in [("startup", dynamics.su_time), ("shutdown", dynamics.sd_time)] {
            if length > 0 && length >= time.len() {
                return Err(EhubError::TrajectoryExceedsHorizon {
                    technology: name.to_string(),
                    kind,
                    length,
                    horizon: time.len(),
                });
            }
        }
        if dynamics.is_slow()
            && self.fit.function_type() == PerformanceFunction::PiecewiseLinear
        {
            return Err(EhubError::config(
                name,
                "startup/shutdown trajectories require a single-segment performance fit",
            ));
        }
        dynamics.startup_cap(name)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn horizon(n: usize) -> TimeIndex {
        TimeIndex::new(n).unwrap()
    }

    fn boiler() -> TechnologySpec {
        TechnologySpec::new("boiler", TechnologyModel::Conv1, 10.0)
            .with_carriers(&["gas"], &["heat"])
            .with_fit(PerformanceFit {
                alpha1: Some(Coefficients::Uniform(SegmentValues::Single(0.9))),
                rated_power: 1.0,
                ..PerformanceFit::default()
            })
    }

    #[test]
    fn test_performance_function_codes() {
        let f: PerformanceFunction = serde_json::from_str("3").unwrap();
        assert_eq!(f, PerformanceFunction::PiecewiseLinear);
        let err = serde_json::from_str::<PerformanceFunction>("4").unwrap_err();
        assert!(err.to_string().contains("Unknown performance function type 4"));
    }

    #[test]
    fn test_coefficients_untagged_forms() {
        let c: Coefficients = serde_json::from_str("0.5").unwrap();
        assert_eq!(c.uniform("t", "alpha1", 3).unwrap(), 0.5);

        let c: Coefficients = serde_json::from_str(r#"{"heat": [0.1, 0.2]}"#).unwrap();
        let heat = CarrierId::new("heat");
        assert_eq!(c.for_carrier("t", "alpha1", &heat, 1).unwrap(), 0.2);
        assert!(matches!(
            c.for_carrier("t", "alpha1", &heat, 2),
            Err(EhubError::MissingSegmentCoefficient { segment: 3, .. })
        ));
        assert!(matches!(
            c.for_carrier("t", "alpha1", &CarrierId::new("power"), 0),
            Err(EhubError::MissingCarrierCoefficient { .. })
        ));
    }

    #[test]
    fn test_curtailment_resolution() {
        let mut fit = PerformanceFit::default();
        assert_eq!(fit.resolve_curtailment("pv").unwrap(), (CurtailmentMode::None, true));

        fit.curtailment_discrete = Some(true);
        assert_eq!(
            fit.resolve_curtailment("pv").unwrap(),
            (CurtailmentMode::Discrete, false)
        );

        fit.curtailment = Some(CurtailmentMode::None);
        assert!(matches!(
            fit.resolve_curtailment("pv"),
            Err(EhubError::ConflictingCurtailment { .. })
        ));

        fit.curtailment = Some(CurtailmentMode::Discrete);
        fit.curtailment_discrete = Some(false);
        assert!(fit.resolve_curtailment("pv").is_err());
    }

    #[test]
    fn test_breakpoints_must_increase() {
        let mut spec = boiler();
        spec.fit.performance_function_type = Some(PerformanceFunction::PiecewiseLinear);
        spec.fit.bp_x = vec![0.0, 0.5, 0.5, 1.0];
        spec.fit.alpha2 = Some(Coefficients::Uniform(SegmentValues::Single(0.9)));
        let err = spec.validate(&horizon(4)).unwrap_err();
        assert!(matches!(
            err,
            EhubError::BreakpointsNotIncreasing { index: 2, .. }
        ));
    }

    #[test]
    fn test_missing_carrier_coefficient() {
        let mut spec = TechnologySpec::new("chp", TechnologyModel::Conv2, 10.0)
            .with_carriers(&["gas"], &["heat", "electricity"]);
        let mut map = BTreeMap::new();
        map.insert(CarrierId::new("heat"), SegmentValues::Single(0.5));
        spec.fit.alpha1 = Some(Coefficients::PerCarrier(map));
        assert!(matches!(
            spec.validate(&horizon(2)),
            Err(EhubError::MissingCarrierCoefficient { .. })
        ));
    }

    #[test]
    fn test_trajectory_longer_than_horizon() {
        let spec = boiler().with_dynamics(DynamicsParams {
            su_time: 4,
            ..DynamicsParams::default()
        });
        assert!(matches!(
            spec.validate(&horizon(4)),
            Err(EhubError::TrajectoryExceedsHorizon { length: 4, .. })
        ));
        assert!(spec.validate(&horizon(5)).is_ok());
    }

    #[test]
    fn test_dynamics_rejected_on_storage() {
        let mut spec = TechnologySpec::new("battery", TechnologyModel::Stor, 10.0)
            .with_carriers(&["electricity"], &["electricity"]);
        spec.storage = Some(StorageCoefficients {
            eta_in: 0.95,
            eta_out: 0.95,
            lambda: 0.0,
            ambient_loss: Vec::new(),
            allow_only_one_direction: false,
        });
        assert!(spec.validate(&horizon(3)).is_ok());
        spec.dynamics = Some(DynamicsParams::default());
        assert!(spec.validate(&horizon(3)).is_err());
    }

    #[test]
    fn test_startup_cap() {
        let mut d = DynamicsParams::default();
        assert_eq!(d.startup_cap("t").unwrap(), None);
        d.max_startups = 3;
        assert_eq!(d.startup_cap("t").unwrap(), Some(3));
        d.max_startups = -2;
        assert!(d.startup_cap("t").is_err());
    }

    #[test]
    fn test_dynamics_field_names() {
        let d: DynamicsParams =
            serde_json::from_str(r#"{"SU_time": 2, "SD_time": 1, "min_uptime": 3}"#).unwrap();
        assert_eq!((d.su_time, d.sd_time, d.min_uptime), (2, 1, 3));
        assert_eq!(d.effective_min_downtime(), 3);
        assert!(d.is_slow());
    }
}
