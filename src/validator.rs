use crate::error::{TbError, TbResult};
use crate::signal::SimObject;
use crate::sim_if::sim;
use crate::value::LogicVec;

/// Value of one output group captured at the check point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampledOutput {
    pub name: String,
    pub value: LogicVec,
    pub defined: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CheckReport {
    samples: Vec<SampledOutput>,
}

impl CheckReport {
    pub fn samples(&self) -> &[SampledOutput] {
        &self.samples
    }

    pub fn sample(&self, name: &str) -> Option<&SampledOutput> {
        self.samples.iter().find(|s| s.name == name)
    }

    pub fn passed(&self) -> bool {
        self.samples.iter().all(|s| s.defined)
    }

    pub fn undefined(&self) -> impl Iterator<Item = &SampledOutput> {
        self.samples.iter().filter(|s| !s.defined)
    }

    /// `Ok` if every group is defined, otherwise an error naming the first undefined group.
    pub fn verdict(&self) -> TbResult {
        let groups: Vec<(String, String)> = self
            .undefined()
            .map(|s| (s.name.clone(), s.value.to_bin_string()))
            .collect();
        match groups.first() {
            None => Ok(()),
            Some((first, _)) => Err(TbError::UndefinedOutputs {
                first: first.clone(),
                groups,
            }),
        }
    }
}

/// Samples named output groups and checks that every bit is a concrete 0 or 1.
#[derive(Clone, Debug, Default)]
pub struct OutputValidator {
    groups: Vec<(String, SimObject)>,
}

impl OutputValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, name: &str, obj: SimObject) -> Self {
        self.groups.push((name.to_string(), obj));
        self
    }

    /// Reads every group once and logs its value. Undefined groups are logged as errors.
    pub fn sample(&self) -> TbResult<CheckReport> {
        let sim = sim()?;
        let mut samples = Vec::with_capacity(self.groups.len());
        for (name, obj) in &self.groups {
            let value = obj.value()?;
            let defined = value.is_defined();
            match defined {
                true => sim.log(&format!("{} = {}", name, value)),
                false => sim.log_error(&format!(
                    "{} = {} is undefined (bits {:?} are X/Z)",
                    name,
                    value,
                    value.undefined_bits()
                )),
            }
            samples.push(SampledOutput {
                name: name.clone(),
                value,
                defined,
            });
        }
        Ok(CheckReport { samples })
    }

    /// Samples all groups; fails if any of them is not fully defined.
    pub fn check(&self) -> TbResult<CheckReport> {
        let report = self.sample()?;
        report.verdict()?;
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(name: &str, bits: &str) -> SampledOutput {
        let value = LogicVec::from_bin_str(bits).unwrap();
        SampledOutput {
            name: name.to_string(),
            defined: value.is_defined(),
            value,
        }
    }

    #[test]
    fn all_defined_passes() {
        let report = CheckReport {
            samples: vec![sample("uo_out", "00000000"), sample("uio_out", "11110000")],
        };
        assert!(report.passed());
        assert_eq!(report.verdict(), Ok(()));
    }

    #[test]
    fn reports_every_undefined_group_and_names_the_first() {
        let report = CheckReport {
            samples: vec![
                sample("uo_out", "0000000x"),
                sample("uio_out", "00000000"),
                sample("uio_oe", "zzzzzzzz"),
            ],
        };
        assert!(!report.passed());
        assert_eq!(
            report.verdict(),
            Err(TbError::UndefinedOutputs {
                first: "uo_out".to_string(),
                groups: vec![
                    ("uo_out".to_string(), "0000000x".to_string()),
                    ("uio_oe".to_string(), "zzzzzzzz".to_string()),
                ],
            })
        );
        assert!(report.sample("uio_out").unwrap().defined);
    }
}
