pub mod accessibility;
pub mod answer_matcher;
pub mod grading_service;
pub mod quiz_attempt_service;
pub mod quiz_service;
pub mod semantic_grader;
