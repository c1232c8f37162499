use std::sync::Arc;

use actix_web::{get, web, HttpResponse};
use chrono::Utc;

use crate::{app_state::AppState, auth::AuthenticatedStudent, errors::AppError};

#[get("/shared")]
async fn shared_quizzes(
    state: web::Data<Arc<AppState>>,
    student: AuthenticatedStudent,
) -> Result<HttpResponse, AppError> {
    let quizzes = state
        .quiz_service
        .list_shared_with(student.email(), Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(quizzes))
}

#[get("/{quiz_id}")]
async fn shared_quiz(
    state: web::Data<Arc<AppState>>,
    quiz_id: web::Path<String>,
    student: AuthenticatedStudent,
) -> Result<HttpResponse, AppError> {
    let quiz = state
        .quiz_service
        .get_shared_quiz(&quiz_id, student.email(), Utc::now())
        .await?;
    Ok(HttpResponse::Ok().json(quiz))
}
