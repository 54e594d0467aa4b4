use async_trait::async_trait;

use super::{AdviceResolver, ResolverError};
use crate::models::{AdviceRecord, SymptomCategory};

/// A symptom category and the substrings that select it.
struct CategoryRule {
    category: SymptomCategory,
    keywords: &'static [&'static str],
}

/// Evaluated top to bottom; the first rule with any keyword hit wins.
const CATEGORY_RULES: &[CategoryRule] = &[
    CategoryRule {
        category: SymptomCategory::Headache,
        keywords: &["headache", "head pain"],
    },
    CategoryRule {
        category: SymptomCategory::Fever,
        keywords: &["fever", "temperature"],
    },
    CategoryRule {
        category: SymptomCategory::Cough,
        keywords: &["cough", "coughing"],
    },
    CategoryRule {
        category: SymptomCategory::Cold,
        keywords: &["cold", "flu", "sneeze"],
    },
    CategoryRule {
        category: SymptomCategory::Stomach,
        keywords: &["stomach", "nausea", "vomit", "diarrhea"],
    },
    CategoryRule {
        category: SymptomCategory::Allergy,
        keywords: &["allergy", "allergic", "pollen"],
    },
];

struct CannedAdvice {
    result: &'static str,
    recommendations: &'static str,
}

const HEADACHE: CannedAdvice = CannedAdvice {
    result: "Based on your description of headache symptoms, here's some general information:\n\n\
        • Common causes include tension, dehydration, lack of sleep, or eye strain\n\
        • Over-the-counter pain relievers like ibuprofen or acetaminophen may help\n\
        • Rest in a quiet, dark room and stay hydrated\n\n\
        ⚠️ Seek immediate medical attention if you experience: sudden severe headache, headache with fever/stiff neck, headache after head injury, or headache with confusion/speech problems.",
    recommendations: "Rest, hydration, OTC pain relievers. Consult a doctor if symptoms persist beyond 48 hours.",
};

const FEVER: CannedAdvice = CannedAdvice {
    result: "Regarding fever symptoms:\n\n\
        • Rest and stay hydrated\n\
        • Use fever-reducing medications like acetaminophen or ibuprofen as directed\n\
        • Monitor temperature regularly\n\
        • Use a cool compress for comfort\n\n\
        🚨 Emergency signs: fever over 103°F (39.4°C), difficulty breathing, severe headache, rash, confusion, persistent vomiting.",
    recommendations: "Monitor temperature every 4 hours, stay hydrated, rest. Seek medical care if fever persists >3 days.",
};

const COUGH: CannedAdvice = CannedAdvice {
    result: "For cough symptoms:\n\n\
        • Stay hydrated with warm fluids\n\
        • Use honey for cough (if over 1 year old)\n\
        • Try over-the-counter cough suppressants for dry cough\n\
        • Use humidifier or steam inhalation\n\n\
        ⚠️ See a doctor if you have: coughing up blood, shortness of breath, fever over 100.4°F (38°C) for more than 3 days, or chest pain.",
    recommendations: "Warm fluids, rest, monitor breathing. Medical attention if breathing difficulties occur.",
};

const COLD: CannedAdvice = CannedAdvice {
    result: "For common cold symptoms:\n\n\
        • Rest and stay hydrated\n\
        • Use saline nasal spray for congestion\n\
        • Warm fluids like tea with honey can soothe throat\n\
        • Over-the-counter cold medications may help symptoms\n\n\
        Most colds resolve within 7-10 days. See a doctor if symptoms worsen or persist.",
    recommendations: "Rest, hydration, symptomatic treatment. Monitor for fever or breathing difficulties.",
};

const STOMACH: CannedAdvice = CannedAdvice {
    result: "For stomach discomfort:\n\n\
        • Stay hydrated with clear fluids\n\
        • Eat bland foods (BRAT diet: bananas, rice, applesauce, toast)\n\
        • Avoid spicy, fatty, or dairy foods\n\
        • Rest and apply heat pad for cramps\n\n\
        ⚠️ Seek medical attention for: severe pain, bloody stools, persistent vomiting, or dehydration signs.",
    recommendations: "Clear liquids, bland diet, rest. Medical attention if severe or persistent.",
};

const ALLERGY: CannedAdvice = CannedAdvice {
    result: "For allergy symptoms:\n\n\
        • Antihistamines like cetirizine or loratadine may help\n\
        • Use saline nasal rinse for congestion\n\
        • Avoid known allergens when possible\n\
        • Keep windows closed during high pollen days\n\n\
        See an allergist if symptoms are severe or persistent.",
    recommendations: "Antihistamines, allergen avoidance. Consult allergist for persistent symptoms.",
};

const GENERAL: CannedAdvice = CannedAdvice {
    result: "I understand you're seeking medical information. While I can provide general guidance, please remember:\n\n\
        • This information is for educational purposes only\n\
        • Always consult with healthcare professionals for medical advice\n\
        • In emergencies, call your local emergency number immediately\n\n\
        Could you provide more specific details about your symptoms? This will help me give you more relevant information.",
    recommendations: "Please provide more specific details about your symptoms for personalized guidance.",
};

fn canned(category: SymptomCategory) -> &'static CannedAdvice {
    match category {
        SymptomCategory::Headache => &HEADACHE,
        SymptomCategory::Fever => &FEVER,
        SymptomCategory::Cough => &COUGH,
        SymptomCategory::Cold => &COLD,
        SymptomCategory::Stomach => &STOMACH,
        SymptomCategory::Allergy => &ALLERGY,
        SymptomCategory::Default => &GENERAL,
    }
}

/// Pick the symptom category for a query. Total: unmatched input is `Default`.
pub fn classify(query: &str) -> SymptomCategory {
    let lowered = query.to_lowercase();
    CATEGORY_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| lowered.contains(k)))
        .map(|rule| rule.category)
        .unwrap_or(SymptomCategory::Default)
}

/// The canned record for a category.
pub fn advice_for(category: SymptomCategory) -> AdviceRecord {
    let advice = canned(category);
    AdviceRecord {
        result: advice.result.to_string(),
        recommendations: advice.recommendations.to_string(),
    }
}

/// Classify and look up in one step.
pub fn lookup(query: &str) -> AdviceRecord {
    advice_for(classify(query))
}

/// Keyword-table resolver. Pure and infallible.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleTableResolver;

#[async_trait]
impl AdviceResolver for RuleTableResolver {
    async fn resolve(&self, query: &str) -> Result<AdviceRecord, ResolverError> {
        let category = classify(query);
        tracing::debug!(category = %category, "Resolved advice category");
        Ok(advice_for(category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fever_keywords_match_case_insensitively() {
        assert_eq!(classify("I have a FEVER"), SymptomCategory::Fever);
        assert_eq!(classify("my Temperature is high"), SymptomCategory::Fever);
    }

    #[test]
    fn headache_wins_over_fever() {
        let query = "I have a bad headache and slight fever";
        assert_eq!(classify(query), SymptomCategory::Headache);
        assert!(lookup(query).result.contains("tension, dehydration"));
    }

    #[test]
    fn stomach_recommendations_are_exact() {
        let record = lookup("my stomach hurts and I feel nauseous");
        assert_eq!(
            record.recommendations,
            "Clear liquids, bland diet, rest. Medical attention if severe or persistent."
        );
    }

    #[test]
    fn rule_order_is_significant() {
        assert_eq!(classify("head pain with a cough"), SymptomCategory::Headache);
        assert_eq!(classify("fever and coughing"), SymptomCategory::Fever);
        assert_eq!(classify("cough after a cold"), SymptomCategory::Cough);
        assert_eq!(classify("flu with nausea"), SymptomCategory::Cold);
        assert_eq!(classify("allergic reaction made me vomit"), SymptomCategory::Stomach);
        assert_eq!(classify("pollen season"), SymptomCategory::Allergy);
    }

    #[test]
    fn keywords_match_as_substrings() {
        assert_eq!(classify("headaches every morning"), SymptomCategory::Headache);
        assert_eq!(classify("influenza"), SymptomCategory::Cold);
        assert_eq!(classify("vomiting since noon"), SymptomCategory::Stomach);
    }

    #[test]
    fn unmatched_and_blank_queries_fall_back_to_default() {
        assert_eq!(classify(""), SymptomCategory::Default);
        assert_eq!(classify("   "), SymptomCategory::Default);
        assert_eq!(classify("my knee is sore"), SymptomCategory::Default);
        assert!(lookup("").result.contains("more specific details"));
    }

    #[test]
    fn every_category_has_text() {
        for rule in CATEGORY_RULES {
            let record = advice_for(rule.category);
            assert!(!record.result.is_empty());
            assert!(!record.recommendations.is_empty());
        }
    }

    #[tokio::test]
    async fn resolver_never_fails() {
        let resolver = RuleTableResolver;
        for query in ["", "   ", "sneeze", "??", "I feel fine"] {
            assert!(resolver.resolve(query).await.is_ok());
        }
    }
}
