use serde::{Deserialize, Serialize};

use crate::models::{ClinicalEntry, Patient};

/// Which part of a reading a rule inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    /// The whole value as a single number.
    #[default]
    Value,
    /// First half of a `"systolic/diastolic"` reading.
    Systolic,
    /// Second half of a `"systolic/diastolic"` reading.
    Diastolic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    pub fn holds(self, reading: f64, threshold: f64) -> bool {
        match self {
            Comparison::Lt => reading < threshold,
            Comparison::Le => reading <= threshold,
            Comparison::Gt => reading > threshold,
            Comparison::Ge => reading >= threshold,
        }
    }
}

/// A single `{vitalType, component, comparison, threshold}` predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CriticalRule {
    pub vital_type: String,
    #[serde(default)]
    pub component: Component,
    pub comparison: Comparison,
    pub threshold: f64,
}

impl CriticalRule {
    pub fn new(vital_type: &str, component: Component, comparison: Comparison, threshold: f64) -> Self {
        Self {
            vital_type: vital_type.to_string(),
            component,
            comparison,
            threshold,
        }
    }

    /// Unparseable readings never match.
    pub fn matches(&self, entry: &ClinicalEntry) -> bool {
        if !entry.kind.trim().eq_ignore_ascii_case(self.vital_type.trim()) {
            return false;
        }

        let reading = match self.component {
            Component::Value => entry.numeric_value(),
            Component::Systolic => entry.blood_pressure().map(|(s, _)| s),
            Component::Diastolic => entry.blood_pressure().map(|(_, d)| d),
        };

        reading.is_some_and(|r| self.comparison.holds(r, self.threshold))
    }
}

/// Table of critical-condition predicates. A record is critical when any of its
/// clinical entries matches any rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CriticalRules {
    rules: Vec<CriticalRule>,
}

impl CriticalRules {
    pub fn new(rules: Vec<CriticalRule>) -> Self {
        Self { rules }
    }

    /// Parses a JSON array of rules.
    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn rules(&self) -> &[CriticalRule] {
        &self.rules
    }

    pub fn matches_any(&self, entries: &[ClinicalEntry]) -> bool {
        entries
            .iter()
            .any(|entry| self.rules.iter().any(|rule| rule.matches(entry)))
    }

    pub fn is_critical(&self, patient: &Patient) -> bool {
        self.matches_any(&patient.clinical_entries())
    }

    pub fn filter(&self, patients: Vec<Patient>) -> Vec<Patient> {
        patients.into_iter().filter(|p| self.is_critical(p)).collect()
    }
}

impl Default for CriticalRules {
    fn default() -> Self {
        Self::new(vec![
            CriticalRule::new("Blood Pressure", Component::Systolic, Comparison::Gt, 150.0),
            CriticalRule::new("Blood Pressure", Component::Diastolic, Comparison::Gt, 100.0),
            CriticalRule::new("Blood Oxygen Level", Component::Value, Comparison::Lt, 92.0),
            CriticalRule::new("Heartbeat Rate", Component::Value, Comparison::Lt, 40.0),
            CriticalRule::new("Heartbeat Rate", Component::Value, Comparison::Gt, 120.0),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn entry(kind: &str, value: Value) -> ClinicalEntry {
        ClinicalEntry {
            kind: kind.to_string(),
            value,
            date: "2024-05-01T08:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_low_blood_oxygen_is_critical() {
        let rules = CriticalRules::default();
        assert!(rules.matches_any(&[entry("Blood Oxygen Level", json!("85"))]));
        assert!(!rules.matches_any(&[entry("Blood Oxygen Level", json!("92"))]));
        assert!(!rules.matches_any(&[entry("Blood Oxygen Level", json!(97))]));
    }

    #[test]
    fn test_heartbeat_outside_range_is_critical() {
        let rules = CriticalRules::default();
        assert!(rules.matches_any(&[entry("Heartbeat Rate", json!(35))]));
        assert!(rules.matches_any(&[entry("Heartbeat Rate", json!("130"))]));
        assert!(!rules.matches_any(&[entry("Heartbeat Rate", json!(40))]));
        assert!(!rules.matches_any(&[entry("Heartbeat Rate", json!(120))]));
        assert!(!rules.matches_any(&[entry("Heartbeat Rate", json!(72))]));
    }

    #[test]
    fn test_high_blood_pressure_is_critical() {
        let rules = CriticalRules::default();
        assert!(rules.matches_any(&[entry("Blood Pressure", json!("160/90"))]));
        assert!(rules.matches_any(&[entry("Blood Pressure", json!("140/105"))]));
        assert!(!rules.matches_any(&[entry("Blood Pressure", json!("150/100"))]));
        assert!(!rules.matches_any(&[entry("Blood Pressure", json!("120/80"))]));
        assert!(!rules.matches_any(&[entry("Blood Pressure", json!("n/a"))]));
    }

    #[test]
    fn test_value_rule_ignores_composite_readings() {
        let rules = CriticalRules::new(vec![CriticalRule::new(
            "Blood Pressure",
            Component::Value,
            Comparison::Gt,
            100.0,
        )]);
        assert!(!rules.matches_any(&[entry("Blood Pressure", json!("120/80"))]));
        assert!(!rules.matches_any(&[entry("Blood Pressure", json!("130/abc"))]));
        assert!(rules.matches_any(&[entry("Blood Pressure", json!("130 mmHg"))]));
    }

    #[test]
    fn test_type_match_is_case_insensitive() {
        let rules = CriticalRules::default();
        assert!(rules.matches_any(&[entry(" blood oxygen level ", json!(80))]));
        assert!(!rules.matches_any(&[entry("Temperature", json!(80))]));
    }

    #[test]
    fn test_any_entry_matches() {
        let rules = CriticalRules::default();
        let entries = [
            entry("Heartbeat Rate", json!(72)),
            entry("Blood Oxygen Level", json!(88)),
        ];
        assert!(rules.matches_any(&entries));
        assert!(!rules.matches_any(&[]));
    }

    #[test]
    fn test_is_critical_reads_patient_clinical_data() {
        let mut content = Map::new();
        content.insert(
            "clinicalData".into(),
            json!([{"type": "Blood Oxygen Level", "value": "85", "date": "2024-05-01"}]),
        );
        let patient = Patient::new(1, content);
        assert!(CriticalRules::default().is_critical(&patient));
    }

    #[test]
    fn test_rules_from_json() {
        let rules = CriticalRules::from_json(
            r#"[
                {"vitalType": "Temperature", "comparison": "ge", "threshold": 39.5},
                {"vitalType": "Blood Pressure", "component": "systolic", "comparison": "lt", "threshold": 90}
            ]"#,
        )
        .unwrap();

        assert_eq!(rules.rules().len(), 2);
        assert_eq!(rules.rules()[0].component, Component::Value);
        assert!(rules.matches_any(&[entry("Temperature", json!("39.5"))]));
        assert!(rules.matches_any(&[entry("Blood Pressure", json!("85/60"))]));
        assert!(!rules.matches_any(&[entry("Blood Oxygen Level", json!(80))]));
    }

    #[test]
    fn test_rules_from_json_rejects_unknown_comparison() {
        assert!(CriticalRules::from_json(
            r#"[{"vitalType": "Temperature", "comparison": "between", "threshold": 1}]"#
        )
        .is_err());
    }
}
