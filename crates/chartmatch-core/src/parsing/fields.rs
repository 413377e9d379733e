use std::sync::LazyLock;

use regex::Regex;

use crate::model::DateField;
use crate::parsing::normalize::{dob_field, dos_field};

/// The labels looked up in the left column of every chart table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetField {
    PatientName,
    Dob,
    DiagnosisCc,
    Therapist,
    Dos,
    VisitNo,
}

impl TargetField {
    pub const ALL: [TargetField; 6] = [
        TargetField::PatientName,
        TargetField::Dob,
        TargetField::DiagnosisCc,
        TargetField::Therapist,
        TargetField::Dos,
        TargetField::VisitNo,
    ];

    pub fn label(self) -> &'static str {
        match self {
            TargetField::PatientName => "Patient Name",
            TargetField::Dob => "DOB",
            TargetField::DiagnosisCc => "Diagnosis/CC",
            TargetField::Therapist => "Therapist",
            TargetField::Dos => "DOS",
            TargetField::VisitNo => "Visit No.",
        }
    }
}

/// Values collected for one table before it is accepted as a record.
#[derive(Debug, Default)]
pub(crate) struct RecordDraft {
    pub patient_name: Option<String>,
    pub dob: DateField,
    pub diagnosis: Option<String>,
    pub therapist: Option<String>,
    pub dos: DateField,
    pub visit_no: Option<String>,
    pub authorization_no: Option<String>,
}

/// How a target field is found and what is done with its value.
pub(crate) struct FieldRule {
    pub field: TargetField,
    pub pattern: Regex,
    pub apply: fn(&str, &mut RecordDraft),
}

/// `# 3 / 40` style visit counter.
static VISIT_NO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\s*([0-9]+\s*(?:/\s*[0-9]+)?)").expect("valid regex"));

/// Authorization code in parentheses, e.g. `(AT-0001361137)`.
static AUTH_NO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s*(AT-[^)]+)\s*\)").expect("valid regex"));

/// Ordered table of target fields. Adding a field means adding one entry.
pub(crate) static TARGET_FIELDS: LazyLock<Vec<FieldRule>> = LazyLock::new(|| {
    vec![
        rule(TargetField::PatientName, r"Patient\s*Name", |v, d| {
            d.patient_name = Some(v.to_string())
        }),
        rule(TargetField::Dob, r"DOB", |v, d| d.dob = dob_field(v)),
        rule(TargetField::DiagnosisCc, r"Diagnosis/CC", |v, d| {
            d.diagnosis = Some(v.to_string())
        }),
        rule(TargetField::Therapist, r"Therapist", |v, d| {
            d.therapist = Some(v.to_string())
        }),
        rule(TargetField::Dos, r"DOS", |v, d| d.dos = dos_field(v)),
        rule(TargetField::VisitNo, r"Visit\s*No", |v, d| {
            let (visit, auth) = split_visit_value(v);
            d.visit_no = visit;
            d.authorization_no = auth;
        }),
    ]
});

fn rule(field: TargetField, pattern: &str, apply: fn(&str, &mut RecordDraft)) -> FieldRule {
    FieldRule {
        field,
        pattern: Regex::new(&format!(r"(?i){pattern}")).expect("valid label pattern"),
        apply,
    }
}

/// Split a combined `Visit No.` cell into the visit counter and the
/// authorization code. Either part may be absent.
pub fn split_visit_value(raw: &str) -> (Option<String>, Option<String>) {
    let visit = VISIT_NO
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string());
    let auth = AUTH_NO
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string());
    (visit, auth)
}
