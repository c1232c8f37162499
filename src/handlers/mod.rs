pub mod attempt_handler;
pub mod health_handler;
pub mod quiz_handler;

use actix_web::web;

use crate::auth::AuthMiddleware;

pub use attempt_handler::{
    attempt_result, begin_attempt, begin_from_link, resume_attempt, save_progress, submit_attempt,
};
pub use health_handler::{health_check, health_check_ready};
pub use quiz_handler::{shared_quiz, shared_quizzes};

/// Registers every route. Expects `web::Data<Arc<AppState>>` and
/// `web::Data<JwtService>` on the app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health_check)
        .service(health_check_ready)
        .service(
            web::scope("/api/quizzes")
                .wrap(AuthMiddleware)
                .service(shared_quizzes)
                .service(shared_quiz)
                .service(begin_attempt),
        )
        .service(
            web::scope("/api/attempts")
                .service(begin_from_link)
                .service(resume_attempt)
                .service(save_progress)
                .service(submit_attempt)
                .service(attempt_result),
        );
}
