use std::sync::Arc;

use actix_web::{get, post, put, web, HttpResponse};
use chrono::Utc;
use validator::Validate;

use crate::{
    app_state::AppState,
    auth::AuthenticatedStudent,
    errors::AppError,
    models::dto::{
        request::{BeginAttemptRequest, LinkAttemptRequest, SaveProgressRequest, SubmitAttemptRequest},
        response::{AttemptResultResponse, AttemptSessionResponse, SaveProgressResponse},
    },
    repositories::AttemptLookup,
    services::quiz_attempt_service::Submission,
};

fn session_response(resumed: bool, body: AttemptSessionResponse) -> HttpResponse {
    if resumed {
        HttpResponse::Ok().json(body)
    } else {
        HttpResponse::Created().json(body)
    }
}

/// Begin or resume as the signed-in student.
#[post("/{quiz_id}/attempts")]
async fn begin_attempt(
    state: web::Data<Arc<AppState>>,
    quiz_id: web::Path<String>,
    request: web::Json<BeginAttemptRequest>,
    student: AuthenticatedStudent,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let identity = request.student.into_identity(student.email());
    let session = state
        .attempt_service
        .begin(&quiz_id, identity, Utc::now())
        .await?;

    Ok(session_response(session.resumed, session.into()))
}

/// Begin or resume from an emailed quiz link.
#[post("/link")]
async fn begin_from_link(
    state: web::Data<Arc<AppState>>,
    request: web::Json<LinkAttemptRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let link = state.jwt_service.validate_quiz_link_token(&request.token)?;
    let identity = request.student.into_identity(&link.email);
    let session = state
        .attempt_service
        .begin(&link.quiz_id, identity, Utc::now())
        .await?;

    Ok(session_response(session.resumed, session.into()))
}

#[get("/{token}")]
async fn resume_attempt(
    state: web::Data<Arc<AppState>>,
    token: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let session = state.attempt_service.resume(&token, Utc::now()).await?;
    Ok(HttpResponse::Ok().json(AttemptSessionResponse::from(session)))
}

#[put("/{token}/progress")]
async fn save_progress(
    state: web::Data<Arc<AppState>>,
    token: web::Path<String>,
    request: web::Json<SaveProgressRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let answers = request.answers.into_iter().map(Into::into).collect();
    let attempt = state
        .attempt_service
        .save_progress(AttemptLookup::Token(token.into_inner()), answers, Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(SaveProgressResponse::from(attempt)))
}

#[post("/{token}/submit")]
async fn submit_attempt(
    state: web::Data<Arc<AppState>>,
    token: web::Path<String>,
    request: web::Json<SubmitAttemptRequest>,
) -> Result<HttpResponse, AppError> {
    let request = request.into_inner();
    request.validate()?;

    let submission = Submission {
        answers: request.answers.into_iter().map(Into::into).collect(),
        violation_reason: request.violation_reason,
        is_auto_submit: request.is_auto_submit,
    };
    let attempt = state
        .attempt_service
        .submit(AttemptLookup::Token(token.into_inner()), submission, Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(AttemptResultResponse::from(attempt)))
}

#[get("/{token}/result")]
async fn attempt_result(
    state: web::Data<Arc<AppState>>,
    token: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let attempt = state
        .attempt_service
        .result(AttemptLookup::Token(token.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(AttemptResultResponse::from(attempt)))
}
