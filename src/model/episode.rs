use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            other => Err(format!("Unknown risk level: {}", other)),
        }
    }
}

/// One row of the readmissions listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EpisodeSummary {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub unit: String,
    pub admission_date: NaiveDateTime,
    /// Absent while the patient is still admitted
    pub discharge_date: Option<NaiveDateTime>,
    pub risk_level: RiskLevel,
    /// Length of stay in days
    pub length_of_stay: Option<f64>,
    pub diagnosis: String,
}

// Who wrote an enrichable field
// - human: entered by clinical staff (or stored by the backend without a generation marker)
// - generated: produced by the insight generator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Human,
    Generated,
}

/// Narrative text tagged with where it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EnrichedText {
    pub text: String,
    pub provenance: Provenance,
    pub generated_at: Option<DateTime<Utc>>,
}

impl EnrichedText {
    pub fn human(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            provenance: Provenance::Human,
            generated_at: None,
        }
    }

    pub fn generated(text: impl Into<String>, generated_at: Option<DateTime<Utc>>) -> Self {
        Self {
            text: text.into(),
            provenance: Provenance::Generated,
            generated_at,
        }
    }
}

/// Full episode record as shown in the detail view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EpisodeDetail {
    #[serde(flatten)]
    pub episode: EpisodeSummary,
    pub narrative_summary: Option<EnrichedText>,
    pub risk_rationale: Option<EnrichedText>,
    pub recommended_action: Option<EnrichedText>,
    /// Timestamp of the latest merged insight batch
    pub insights_generated_at: Option<DateTime<Utc>>,
}

impl EpisodeDetail {
    pub fn new(episode: EpisodeSummary) -> Self {
        Self {
            episode,
            narrative_summary: None,
            risk_rationale: None,
            recommended_action: None,
            insights_generated_at: None,
        }
    }

    /// Merge generated insights into this record.
    ///
    /// Present fields replace the current value and are stamped as generated
    /// with the batch timestamp. Absent or blank fields leave the current
    /// value untouched. Returns the number of fields that were written.
    pub fn merge_insights(&mut self, result: &EnrichmentResult) -> usize {
        let at = result.generated_at;
        let merged = [
            merge_field(
                &mut self.narrative_summary,
                result.narrative_summary.as_deref(),
                at,
            ),
            merge_field(&mut self.risk_rationale, result.risk_rationale.as_deref(), at),
            merge_field(
                &mut self.recommended_action,
                result.recommended_action.as_deref(),
                at,
            ),
        ]
        .into_iter()
        .filter(|written| *written)
        .count();

        if at.is_some() {
            self.insights_generated_at = at;
        }

        merged
    }
}

fn merge_field(
    slot: &mut Option<EnrichedText>,
    incoming: Option<&str>,
    generated_at: Option<DateTime<Utc>>,
) -> bool {
    match incoming {
        Some(text) if !text.trim().is_empty() => {
            *slot = Some(EnrichedText::generated(text, generated_at));
            true
        }
        _ => false,
    }
}

/// Partial set of generated fields returned by the insight generator
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnrichmentResult {
    pub narrative_summary: Option<String>,
    pub risk_rationale: Option<String>,
    pub recommended_action: Option<String>,
    pub generated_at: Option<DateTime<Utc>>,
}

impl EnrichmentResult {
    pub fn field_count(&self) -> usize {
        [
            &self.narrative_summary,
            &self.risk_rationale,
            &self.recommended_action,
        ]
        .into_iter()
        .filter(|f| f.as_deref().is_some_and(|t| !t.trim().is_empty()))
        .count()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use chrono::NaiveDate;

    pub fn summary(id: &str, diagnosis: &str) -> EpisodeSummary {
        EpisodeSummary {
            id: id.to_string(),
            patient_id: format!("P-{}", id),
            patient_name: "Jordan Doe".to_string(),
            unit: "Cardiology".to_string(),
            admission_date: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(8, 30, 0)
                .unwrap(),
            discharge_date: None,
            risk_level: RiskLevel::High,
            length_of_stay: Some(4.5),
            diagnosis: diagnosis.to_string(),
        }
    }

    pub fn detail(id: &str, diagnosis: &str) -> EpisodeDetail {
        EpisodeDetail::new(summary(id, diagnosis))
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::detail;
    use super::*;
    use chrono::TimeZone;

    fn stamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 2, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_absent_field_keeps_existing_value() {
        let mut d = detail("E1", "Heart failure");
        d.narrative_summary = Some(EnrichedText::human("Written by the ward nurse"));

        let result = EnrichmentResult {
            risk_rationale: Some("Two admissions in 90 days".to_string()),
            generated_at: Some(stamp()),
            ..Default::default()
        };
        let merged = d.merge_insights(&result);

        assert_eq!(merged, 1);
        assert_eq!(
            d.narrative_summary,
            Some(EnrichedText::human("Written by the ward nurse"))
        );
        let rationale = d.risk_rationale.as_ref().unwrap();
        assert_eq!(rationale.text, "Two admissions in 90 days");
        assert_eq!(rationale.provenance, Provenance::Generated);
        assert_eq!(rationale.generated_at, Some(stamp()));
        assert_eq!(d.insights_generated_at, Some(stamp()));
    }

    #[test]
    fn test_blank_field_counts_as_absent() {
        let mut d = detail("E1", "COPD");
        d.recommended_action = Some(EnrichedText::human("Call in 48h"));

        let result = EnrichmentResult {
            recommended_action: Some("   ".to_string()),
            ..Default::default()
        };

        assert_eq!(d.merge_insights(&result), 0);
        assert_eq!(d.recommended_action, Some(EnrichedText::human("Call in 48h")));
    }

    #[test]
    fn test_merge_is_idempotent() {
        let result = EnrichmentResult {
            narrative_summary: Some("Admitted with pneumonia".to_string()),
            recommended_action: Some("1. Follow up in 7 days".to_string()),
            generated_at: Some(stamp()),
            ..Default::default()
        };

        let mut once = detail("E1", "Pneumonia");
        once.risk_rationale = Some(EnrichedText::human("Prior readmission"));
        once.merge_insights(&result);

        let mut twice = once.clone();
        twice.merge_insights(&result);

        assert_eq!(once, twice);
    }

    #[test]
    fn test_missing_timestamp_does_not_clear_previous_one() {
        let mut d = detail("E1", "Sepsis");
        d.merge_insights(&EnrichmentResult {
            narrative_summary: Some("First pass".to_string()),
            generated_at: Some(stamp()),
            ..Default::default()
        });
        d.merge_insights(&EnrichmentResult {
            risk_rationale: Some("Second pass".to_string()),
            generated_at: None,
            ..Default::default()
        });

        assert_eq!(d.insights_generated_at, Some(stamp()));
        assert_eq!(d.risk_rationale.as_ref().unwrap().generated_at, None);
        assert_eq!(
            d.narrative_summary.as_ref().unwrap().generated_at,
            Some(stamp())
        );
    }

    #[test]
    fn test_field_count_ignores_blank_values() {
        let result = EnrichmentResult {
            narrative_summary: Some("text".to_string()),
            risk_rationale: Some(String::new()),
            recommended_action: None,
            generated_at: None,
        };
        assert_eq!(result.field_count(), 1);
    }

    #[test]
    fn test_risk_level_parsing() {
        assert_eq!("high".parse::<RiskLevel>(), Ok(RiskLevel::High));
        assert_eq!(" Medium ".parse::<RiskLevel>(), Ok(RiskLevel::Medium));
        assert!("severe".parse::<RiskLevel>().is_err());
    }
}
