//! Domain record types. Plain serde DTOs, one struct per entity in the data
//! model; parent-child links are by id, never by embedded pointer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LegislationType {
    Ukpga,
    Ukla,
    Apni,
    Asp,
    Asc,
    Aosp,
    Nia,
    Apgb,
    Aep,
    Gbla,
    Ukcm,
    Uksi,
    Wsi,
    Ssi,
    Nisi,
    Ukmo,
    Uksro,
    Nisro,
    Ukci,
    Scdsi,
    NisroR,
    Ukdsi,
    Ukppa,
    Asnip,
    Mwa,
    Mnia,
    Ukia,
    Drsi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Court {
    Uksc,
    Ukpc,
    Ewca,
    Ewhc,
    Ewcop,
    Ewfc,
    Ukut,
    Ukftt,
    Ukeat,
    Uksiac,
    Ukait,
    Csih,
    Csoh,
    Nica,
    Nihc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Division {
    Civil,
    Criminal,
    Family,
    Admin,
    Commercial,
    Chancery,
    QueensOrKingsBench,
    Patents,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoteType {
    Overview,
    PolicyBackground,
    LegalBackground,
    Extent,
    Provisions,
    Commencement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SectionType {
    Section,
    Schedule,
    Part,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeOfEffect(pub String);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Legislation {
    pub id: String,
    pub r#type: LegislationType,
    pub year: i32,
    pub number: i32,
    pub title: String,
    pub description: Option<String>,
    pub enactment_date: Option<DateTime<Utc>>,
    pub modified_date: Option<DateTime<Utc>>,
    pub status: String,
    pub extent: Vec<String>,
    pub number_of_provisions: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegislationSection {
    pub id: String,
    pub legislation_id: String,
    pub legislation_type: LegislationType,
    pub year: i32,
    pub number: i32,
    pub provision_type: String,
    pub title: Option<String>,
    pub text: String,
    pub extent: Vec<String>,
    pub order: i32,
    pub sort_key: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Amendment {
    pub id: String,
    pub changed_legislation: String,
    pub changed_year: i32,
    pub changed_number: i32,
    pub changed_url: String,
    pub changed_provision: Option<String>,
    pub changed_provision_url: Option<String>,
    pub affecting_legislation: String,
    pub affecting_year: i32,
    pub affecting_number: i32,
    pub affecting_url: String,
    pub affecting_provision: Option<String>,
    pub affecting_provision_url: Option<String>,
    pub type_of_effect: String,
    pub ai_explanation: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Amendment {
    /// Build the canonical amendment id, refusing to do so when either url
    /// is empty.
    pub fn build_id(changed_url: &str, affecting_url: &str) -> Result<String, ValidationError> {
        if changed_url.is_empty() || affecting_url.is_empty() {
            return Err(ValidationError::EmptyAmendmentUrl);
        }
        Ok(format!("changed-{changed_url}-affecting-{affecting_url}"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplanatoryNote {
    pub id: String,
    pub legislation_id: String,
    pub note_type: NoteType,
    pub section_type: Option<SectionType>,
    pub section_number: Option<i32>,
    pub route: Vec<String>,
    pub order: i32,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Caselaw {
    pub id: String,
    pub court: Court,
    pub division: Option<Division>,
    pub year: i32,
    pub number: i32,
    pub name: String,
    pub cite_as: String,
    pub date: DateTime<Utc>,
    pub text: String,
    pub caselaw_references: Vec<String>,
    pub legislation_references: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaselawSection {
    pub id: String,
    pub caselaw_id: String,
    pub court: Court,
    pub division: Option<Division>,
    pub year: i32,
    pub number: i32,
    pub cite_as: String,
    pub route: Vec<String>,
    pub order: i32,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaselawSummary {
    pub id: String,
    pub caselaw_id: String,
    pub court: Court,
    pub division: Option<Division>,
    pub year: i32,
    pub number: i32,
    pub name: String,
    pub cite_as: String,
    pub date: DateTime<Utc>,
    pub text: String,
    pub ai_model: String,
    pub ai_timestamp: DateTime<Utc>,
    pub source_text_length: usize,
    pub source_text_truncated: bool,
    pub created_at: DateTime<Utc>,
}

impl CaselawSummary {
    pub fn id_for(caselaw_id: &str) -> String {
        format!("{caselaw_id}-summary")
    }
}

/// Minimum source text length below which Stage-2 skips summary generation
///.
pub const SUMMARY_MIN_SOURCE_CHARS: usize = 500;

/// Token cap above which case-law text is truncated for OCR/summary input
///.
pub const SUMMARY_TRUNCATE_CHARS: usize = 900_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn amendment_id_is_symmetric_under_rescrape() {
        let a = Amendment::build_id("http://x/1", "http://y/2").unwrap();
        let b = Amendment::build_id("http://x/1", "http://y/2").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn amendment_id_rejects_empty_urls() {
        assert!(Amendment::build_id("", "http://y/2").is_err());
        assert!(Amendment::build_id("http://x/1", "").is_err());
    }

    #[test]
    fn caselaw_summary_id_is_derived() {
        assert_eq!(
            CaselawSummary::id_for("http://caselaw/ewca/civ/2020/1"),
            "http://caselaw/ewca/civ/2020/1-summary"
        );
    }
}
