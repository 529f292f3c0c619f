//! Backend payload shapes and their conversion into domain types
//!
//! Only the fields the detail view consumes are modelled here.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;

use super::RetrieverError;
use crate::model::{EnrichedText, EnrichmentResult, EpisodeDetail, EpisodeSummary, RiskLevel};

/// Row returned by `/readmissions/list` and the base of `/readmissions/{id}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeRow {
    pub id: String,
    pub patient_id: String,
    pub patient_name: String,
    pub unit: String,
    pub admission_date: String,
    pub discharge_date: Option<String>,
    pub risk_level: RiskLevel,
    pub los: Option<f64>,
    pub diagnosis: String,
}

/// Payload of `/readmissions/{id}`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodePayload {
    #[serde(flatten)]
    pub row: EpisodeRow,
    pub summary: Option<String>,
    pub risk_explanation: Option<String>,
    pub next_best_action: Option<String>,
    // Alternate names the backend uses for generated text
    #[serde(rename = "summary_text")]
    pub summary_text: Option<String>,
    pub recommendations: Option<String>,
}

/// Payload of `/llm/generate-all/{id}`
#[derive(Debug, Deserialize)]
pub struct InsightsPayload {
    pub summary: Option<String>,
    pub risk_explanation: Option<String>,
    pub recommendations: Option<String>,
    pub generated_at: Option<String>,
}

/// FastAPI error body
#[derive(Debug, Deserialize)]
pub struct ErrorPayload {
    pub detail: serde_json::Value,
}

impl EpisodeRow {
    pub fn into_summary(self) -> Result<EpisodeSummary, RetrieverError> {
        let admission_date = parse_naive(&self.admission_date).ok_or_else(|| {
            RetrieverError::ParseError(format!(
                "Invalid admission date for {}: {}",
                self.id, self.admission_date
            ))
        })?;

        let discharge_date = match self.discharge_date.as_deref() {
            Some(raw) => Some(parse_naive(raw).ok_or_else(|| {
                RetrieverError::ParseError(format!(
                    "Invalid discharge date for {}: {}",
                    self.id, raw
                ))
            })?),
            None => None,
        };

        Ok(EpisodeSummary {
            id: self.id,
            patient_id: self.patient_id,
            patient_name: self.patient_name,
            unit: self.unit,
            admission_date,
            discharge_date,
            risk_level: self.risk_level,
            length_of_stay: self.los,
            diagnosis: self.diagnosis,
        })
    }
}

impl EpisodePayload {
    /// Convert to a detail record.
    ///
    /// The backend copies generated text into the primary field as well, so
    /// a value under the alternate name marks the field as generated. A
    /// primary value alone is human text. This runs once per fetch, so later
    /// merges never see the alternate names.
    pub fn into_detail(self) -> Result<EpisodeDetail, RetrieverError> {
        let mut detail = EpisodeDetail::new(self.row.into_summary()?);

        detail.narrative_summary = pick_text(self.summary, self.summary_text);
        detail.risk_rationale = non_blank(self.risk_explanation).map(EnrichedText::human);
        detail.recommended_action = pick_text(self.next_best_action, self.recommendations);

        Ok(detail)
    }
}

impl InsightsPayload {
    pub fn into_result(self, episode_id: &str) -> EnrichmentResult {
        let generated_at = self.generated_at.as_deref().and_then(|raw| {
            let parsed = parse_timestamp(raw);
            if parsed.is_none() {
                tracing::warn!(
                    episode_id = %episode_id,
                    generated_at = %raw,
                    "Unparseable insight timestamp, treating as absent"
                );
            }
            parsed
        });

        EnrichmentResult {
            narrative_summary: non_blank(self.summary),
            risk_rationale: non_blank(self.risk_explanation),
            recommended_action: non_blank(self.recommendations),
            generated_at,
        }
    }
}

impl ErrorPayload {
    pub fn message(&self) -> String {
        match &self.detail {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

fn pick_text(primary: Option<String>, alternate: Option<String>) -> Option<EnrichedText> {
    match (non_blank(primary), non_blank(alternate)) {
        (_, Some(text)) => Some(EnrichedText::generated(text, None)),
        (Some(text), None) => Some(EnrichedText::human(text)),
        (None, None) => None,
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Parse a backend date. Python `isoformat()` output carries no offset.
fn parse_naive(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// Parse a timestamp, reading offset-less values as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    parse_naive(raw).map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    use crate::model::Provenance;

    fn detail_json(extra: serde_json::Value) -> EpisodePayload {
        let mut base = serde_json::json!({
            "id": "EP000042",
            "patientId": "PT0042",
            "patientName": "Alex Moreno",
            "unit": "Cardiology",
            "admissionDate": "2024-02-10T00:00:00",
            "dischargeDate": null,
            "riskLevel": "High",
            "los": null,
            "diagnosis": "Heart Failure"
        });
        if let (Some(obj), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                obj.insert(k.clone(), v.clone());
            }
        }
        serde_json::from_value(base).unwrap()
    }

    #[test]
    fn test_primary_names_alone_are_human_text() {
        let detail = detail_json(serde_json::json!({
            "summary": "Nurse summary",
            "summary_text": null,
            "riskExplanation": "Frequent admissions",
            "nextBestAction": "Book follow-up",
            "recommendations": null
        }))
        .into_detail()
        .unwrap();

        let summary = detail.narrative_summary.unwrap();
        assert_eq!(summary.text, "Nurse summary");
        assert_eq!(summary.provenance, Provenance::Human);
        assert_eq!(detail.risk_rationale.unwrap().text, "Frequent admissions");

        let action = detail.recommended_action.unwrap();
        assert_eq!(action.text, "Book follow-up");
        assert_eq!(action.provenance, Provenance::Human);
    }

    #[test]
    fn test_previously_enriched_record_is_generated() {
        // Enriched records carry the same text under both names
        let detail = detail_json(serde_json::json!({
            "summary": "Admitted with CHF exacerbation",
            "summary_text": "Admitted with CHF exacerbation",
            "nextBestAction": "1. Cardiology follow-up within 7 days",
            "recommendations": "1. Cardiology follow-up within 7 days"
        }))
        .into_detail()
        .unwrap();

        let summary = detail.narrative_summary.unwrap();
        assert_eq!(summary.text, "Admitted with CHF exacerbation");
        assert_eq!(summary.provenance, Provenance::Generated);

        let action = detail.recommended_action.unwrap();
        assert_eq!(action.text, "1. Cardiology follow-up within 7 days");
        assert_eq!(action.provenance, Provenance::Generated);
    }

    #[test]
    fn test_alternate_names_substitute_as_generated() {
        let detail = detail_json(serde_json::json!({
            "summary": null,
            "summary_text": "Generated summary",
            "nextBestAction": "",
            "recommendations": "1. Medication review"
        }))
        .into_detail()
        .unwrap();

        let summary = detail.narrative_summary.unwrap();
        assert_eq!(summary.text, "Generated summary");
        assert_eq!(summary.provenance, Provenance::Generated);
        assert_eq!(summary.generated_at, None);

        let action = detail.recommended_action.unwrap();
        assert_eq!(action.text, "1. Medication review");
        assert_eq!(action.provenance, Provenance::Generated);
        assert!(detail.risk_rationale.is_none());
    }

    #[test]
    fn test_summary_fields_are_converted() {
        let detail = detail_json(serde_json::json!({
            "dischargeDate": "2024-02-14T00:00:00",
            "los": 4.0
        }))
        .into_detail()
        .unwrap();

        assert_eq!(detail.episode.id, "EP000042");
        assert_eq!(detail.episode.risk_level, RiskLevel::High);
        assert_eq!(detail.episode.length_of_stay, Some(4.0));
        assert_eq!(
            detail.episode.discharge_date.map(|d| d.date()),
            NaiveDate::from_ymd_opt(2024, 2, 14)
        );
    }

    #[test]
    fn test_invalid_admission_date_is_parse_error() {
        let payload = detail_json(serde_json::json!({ "admissionDate": "last tuesday" }));
        assert!(matches!(
            payload.into_detail(),
            Err(RetrieverError::ParseError(_))
        ));
    }

    #[test]
    fn test_naive_timestamp_reads_as_utc() {
        let parsed = parse_timestamp("2024-05-01T12:34:56.123456").unwrap();
        assert_eq!(parsed.hour(), 12);
        assert_eq!(parsed.nanosecond(), 123_456_000);

        let offset = parse_timestamp("2024-05-01T12:34:56+02:00").unwrap();
        assert_eq!(offset, Utc.with_ymd_and_hms(2024, 5, 1, 10, 34, 56).unwrap());

        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_insights_payload_conversion() {
        let payload: InsightsPayload = serde_json::from_value(serde_json::json!({
            "episode_id": "EP000042",
            "risk_explanation": "High score driven by prior readmission",
            "generated_at": "2024-05-01T09:00:00"
        }))
        .unwrap();

        let result = payload.into_result("EP000042");
        assert_eq!(result.narrative_summary, None);
        assert_eq!(
            result.risk_rationale.as_deref(),
            Some("High score driven by prior readmission")
        );
        assert_eq!(
            result.generated_at,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_unparseable_generated_at_is_absent() {
        let payload = InsightsPayload {
            summary: Some("s".to_string()),
            risk_explanation: None,
            recommendations: None,
            generated_at: Some("soon".to_string()),
        };
        assert_eq!(payload.into_result("EP1").generated_at, None);
    }

    #[test]
    fn test_error_payload_message() {
        let body: ErrorPayload =
            serde_json::from_str(r#"{"detail": "OPENAI_API_KEY not set"}"#).unwrap();
        assert_eq!(body.message(), "OPENAI_API_KEY not set");
    }
}
