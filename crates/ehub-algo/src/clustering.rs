//! Linking a full-resolution series to its clustered counterpart.
//!
//! When the horizon is represented by typical days, each full-resolution step
//! `t` maps to a clustered step `sequence[t]` (1-based). Linking emits
//! `full[t] == clustered[sequence[t]]` for every `t`.

use ehub_core::{EhubError, EhubResult, LinearConstraint, VarId};

/// Equalities tying `full` to `clustered` through `sequence`.
///
/// `name` prefixes the constraint names (`"{name}[t]"`). `sequence` must hold
/// one entry per full-resolution step, each naming a clustered step.
pub fn link_full_resolution_to_clustered(
    name: &str,
    full: &[VarId],
    clustered: &[VarId],
    sequence: &[usize],
) -> EhubResult<Vec<LinearConstraint>> {
    if sequence.len() != full.len() {
        return Err(EhubError::SeriesLength {
            technology: name.to_string(),
            series: "sequence",
            expected: full.len(),
            found: sequence.len(),
        });
    }
    full.iter()
        .zip(sequence)
        .enumerate()
        .map(|(i, (var, &step))| {
            if step == 0 || step > clustered.len() {
                return Err(EhubError::config(
                    name,
                    format!(
                        "sequence entry {} points to clustered step {} outside 1..={}",
                        i + 1,
                        step,
                        clustered.len()
                    ),
                ));
            }
            Ok(LinearConstraint::eq(
                format!("{}[{}]", name, i + 1),
                *var,
                clustered[step - 1],
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ehub_core::{VarDomain, VariableArena};

    fn arena(full: usize, clustered: usize) -> (VariableArena, Vec<VarId>, Vec<VarId>) {
        let mut vars = VariableArena::new();
        let f = (1..=full)
            .map(|t| vars.add(format!("full[{}]", t), VarDomain::Continuous, 0.0, 10.0))
            .collect();
        let c = (1..=clustered)
            .map(|t| vars.add(format!("clustered[{}]", t), VarDomain::Continuous, 0.0, 10.0))
            .collect();
        (vars, f, c)
    }

    #[test]
    fn test_links_follow_sequence() {
        let (vars, full, clustered) = arena(4, 2);
        let links = link_full_resolution_to_clustered("level", &full, &clustered, &[1, 2, 2, 1]).unwrap();
        assert_eq!(links.len(), 4);

        let mut values = vec![0.0; vars.len()];
        values[clustered[0].index()] = 3.0;
        values[clustered[1].index()] = 7.0;
        for (f, v) in full.iter().zip([3.0, 7.0, 7.0, 3.0]) {
            values[f.index()] = v;
        }
        assert!(links.iter().all(|c| c.is_satisfied(&values, 1e-9)));

        values[full[2].index()] = 3.0;
        assert!(!links[2].is_satisfied(&values, 1e-9));
    }

    #[test]
    fn test_out_of_range_sequence_rejected() {
        let (_, full, clustered) = arena(2, 2);
        assert!(matches!(
            link_full_resolution_to_clustered("level", &full, &clustered, &[1, 3]),
            Err(EhubError::Config { .. })
        ));
        assert!(matches!(
            link_full_resolution_to_clustered("level", &full, &clustered, &[1]),
            Err(EhubError::SeriesLength { .. })
        ));
    }
}
