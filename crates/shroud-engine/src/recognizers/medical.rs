//! Medical recognizers: provider numbers, insurance identifiers, diagnosis
//! codes, record numbers, and a deny-list of common medications.

use shroud_core::EntityType;

use super::Recognizer;

const COMMON_DRUGS: &[&str] = &[
    "Metformin", "Lisinopril", "Amlodipine", "Metoprolol", "Atorvastatin",
    "Omeprazole", "Losartan", "Albuterol", "Gabapentin", "Hydrochlorothiazide",
    "Sertraline", "Simvastatin", "Montelukast", "Escitalopram", "Rosuvastatin",
    "Bupropion", "Furosemide", "Pantoprazole", "Duloxetine", "Prednisone",
    "Amoxicillin", "Azithromycin", "Ibuprofen", "Acetaminophen", "Aspirin",
    "Warfarin", "Clopidogrel", "Insulin", "Levothyroxine", "Fluoxetine",
];

pub fn recognizers() -> Vec<Recognizer> {
    vec![
        Recognizer::new(EntityType::Icd10Code, "Icd10Recognizer")
            .pattern("icd10", r"\b[A-TV-Z]\d{2}(?:\.\d{1,4})?\b", 0.6)
            .context(&["diagnosis", "icd", "code", "dx", "condition"]),
        Recognizer::new(EntityType::MedicalRecordNumber, "MrnRecognizer")
            .pattern("mrn_dashes", r"\b\d{3}-\d{3}-\d{3}\b", 0.4)
            .pattern("mrn_plain", r"\b\d{7,10}\b", 0.2)
            .context(&["mrn", "medical record", "patient id", "chart"]),
        Recognizer::new(EntityType::DrugName, "DrugNameRecognizer")
            .deny_list(COMMON_DRUGS, 0.8)
            .context(&["taking", "prescribed", "medication", "drug", "dose", "mg", "daily"]),
        Recognizer::new(EntityType::NpiNumber, "NpiRecognizer")
            .pattern("npi", r"\b\d{10}\b", 0.3)
            .context(&["npi", "provider", "national provider", "prescriber"]),
        Recognizer::new(EntityType::DeaNumber, "DeaRecognizer")
            .pattern("dea", r"\b[A-Z]{2}\d{7}\b", 0.6)
            .context(&["dea", "prescriber", "controlled substance", "schedule"]),
        Recognizer::new(EntityType::InsuranceId, "InsuranceIdRecognizer")
            .pattern("policy_number", r"\bPOL-?\d{4}-?\d{5,10}\b", 0.7)
            .pattern("claim_number", r"\bCLM-?\d{4}-?\d{5,10}\b", 0.7)
            .pattern("insurance_alphanum", r"\b[A-Z]{2,4}-?\d{6,12}\b", 0.4)
            .context(&[
                "insurance", "policy", "claim", "member", "subscriber",
                "group", "coverage", "id", "number",
            ]),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::recognizers::RecognizerRegistry;
    use shroud_core::EntitySpan;

    fn scan(text: &str) -> Vec<EntitySpan> {
        let registry = RecognizerRegistry::with_builtins();
        registry.scan(text, None, &HashSet::new())
    }

    fn best(spans: &[EntitySpan], entity_type: EntityType) -> Option<&EntitySpan> {
        spans
            .iter()
            .filter(|s| s.entity_type == entity_type)
            .max_by(|a, b| a.score.partial_cmp(&b.score).unwrap())
    }

    #[test]
    fn detects_icd10_code() {
        let spans = scan("Diagnosis code: E11.9 confirmed");
        let icd = best(&spans, EntityType::Icd10Code).expect("icd10 span");
        assert!(icd.score > 0.6, "context should boost diagnosis code");
    }

    #[test]
    fn detects_dashed_mrn() {
        let spans = scan("MRN 123-456-789 on the chart");
        let mrn = best(&spans, EntityType::MedicalRecordNumber).expect("mrn span");
        assert!(mrn.score > 0.4);
    }

    #[test]
    fn detects_drug_names_from_deny_list() {
        let spans = scan("Patient is taking Metformin 500mg daily");
        let drug = best(&spans, EntityType::DrugName).expect("drug span");
        assert!((drug.score - 1.0).abs() < 1e-9, "0.8 base + 0.35 boost, capped");
    }

    #[test]
    fn detects_dea_number() {
        let spans = scan("DEA: AB1234567");
        assert!(spans.iter().any(|s| s.entity_type == EntityType::DeaNumber));
    }

    #[test]
    fn detects_policy_and_claim_numbers() {
        let spans = scan("policy POL-2024-123456 claim CLM-2024-654321");
        let ids: Vec<_> = spans
            .iter()
            .filter(|s| s.entity_type == EntityType::InsuranceId && s.score > 0.7)
            .collect();
        assert!(ids.len() >= 2);
    }

    #[test]
    fn npi_without_context_scores_low() {
        let spans = scan("ref 1234567890 attached");
        let npi = best(&spans, EntityType::NpiNumber).expect("npi span");
        assert!(npi.score < 0.4);
    }
}
