use crate::models::domain::{CandidateItem, Course, MultiItem, OpenItem, Proposition};

#[cfg(test)]
pub mod fixtures {
    use super::*;

    /// A course with a fixed id and only raw content.
    pub fn test_course() -> Course {
        let mut course = Course::new(
            2,
            "Biochimie métabolique",
            "La glycolyse transforme le glucose en pyruvate.\n\nLe cycle de Krebs oxyde l'acétyl-CoA.",
        );
        course.id = "course-test".to_string();
        course
    }

    pub fn open_item(prompt: &str) -> CandidateItem {
        CandidateItem::Open(OpenItem {
            prompt: prompt.to_string(),
            reference_answer: "Réponse de référence".to_string(),
            difficulty: 3,
        })
    }

    /// Multi-select item whose true propositions are the given labels.
    pub fn multi_item(stem: &str, true_labels: &[&str]) -> CandidateItem {
        let propositions = ["A", "B", "C", "D", "E"]
            .iter()
            .map(|label| Proposition {
                label: label.to_string(),
                text: format!("Proposition {}", label),
                is_true: true_labels.contains(label),
                explanation: String::new(),
            })
            .collect();

        CandidateItem::Multi(MultiItem {
            stem: stem.to_string(),
            propositions,
            difficulty: 3,
        })
    }
}

#[cfg(test)]
pub mod test_helpers {
    use actix_web::http::StatusCode;

    /// Asserts that a status code represents an error (4xx or 5xx)
    pub fn assert_error_status(status: StatusCode) {
        assert!(
            status.is_client_error() || status.is_server_error(),
            "Expected error status, got: {}",
            status
        );
    }

    /// Asserts that a status code represents success (2xx)
    pub fn assert_success_status(status: StatusCode) {
        assert!(
            status.is_success(),
            "Expected success status, got: {}",
            status
        );
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::test_helpers::*;
    use super::CandidateItem;
    use actix_web::http::StatusCode;

    #[test]
    fn test_course_uses_raw_content_as_source() {
        let course = test_course();
        assert_eq!(course.id, "course-test");
        assert!(course.generation_source().starts_with("La glycolyse"));
    }

    #[test]
    fn multi_item_marks_requested_labels_true() {
        match multi_item("Stem", &["B", "D"]) {
            CandidateItem::Multi(item) => {
                let truths: Vec<bool> = item.propositions.iter().map(|p| p.is_true).collect();
                assert_eq!(truths, vec![false, true, false, true, false]);
            }
            other => panic!("unexpected item {:?}", other),
        }
        assert_eq!(open_item("Question ?").stem(), "Question ?");
    }

    #[test]
    fn test_status_helpers() {
        assert_success_status(StatusCode::OK);
        assert_error_status(StatusCode::CONFLICT);
    }
}
