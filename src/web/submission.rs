//! Submission endpoints
//!
//! A submission is created lazily on first form visit: create-or-get is
//! idempotent, backed by the UNIQUE (form_id, user_id) constraint. Losing the
//! insert race just means re-reading the winner's row.

use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::orm::{submission, submission_answers};
use actix_web::{error, post, web, Error, HttpResponse};
use sea_orm::{entity::*, query::*, ColumnTrait, DatabaseConnection, DbErr, EntityTrait};
use serde::{Deserialize, Serialize};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(create_or_get).service(save_answer_post);
}

#[derive(Serialize)]
struct SubmissionResponse {
    id: i32,
    form_id: i32,
    user_id: i32,
}

/// Finds the submission for (form, user) or creates it. Two concurrent first
/// visits race on the unique index; the loser's insert fails and falls back
/// to selecting the winner's row, so both callers see the same id.
pub async fn create_or_get_submission(
    db: &DatabaseConnection,
    form_id: i32,
    user_id: i32,
) -> Result<submission::Model, DbErr> {
    let existing = submission::Entity::find()
        .filter(submission::Column::FormId.eq(form_id))
        .filter(submission::Column::UserId.eq(user_id))
        .one(db)
        .await?;

    if let Some(model) = existing {
        return Ok(model);
    }

    let inserted = submission::Entity::insert(submission::ActiveModel {
        form_id: Set(form_id),
        user_id: Set(user_id),
        ..Default::default()
    })
    .exec(db)
    .await;

    match inserted {
        Ok(result) => submission::Entity::find_by_id(result.last_insert_id)
            .one(db)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound("submission".to_owned())),
        Err(insert_err) => {
            // Unique violation: another request created it between our select
            // and insert.
            match submission::Entity::find()
                .filter(submission::Column::FormId.eq(form_id))
                .filter(submission::Column::UserId.eq(user_id))
                .one(db)
                .await?
            {
                Some(model) => Ok(model),
                None => Err(insert_err),
            }
        }
    }
}

/// Upserts the answer row for (submission, question). Two concurrent first
/// saves race on the unique index, same as create-or-get above; the loser's
/// insert fails and falls back to updating the winner's row.
pub async fn save_answer(
    db: &DatabaseConnection,
    submission_id: i32,
    question_id: i32,
    answer: String,
) -> Result<(), DbErr> {
    let existing = submission_answers::Entity::find()
        .filter(submission_answers::Column::SubmissionId.eq(submission_id))
        .filter(submission_answers::Column::QuestionId.eq(question_id))
        .one(db)
        .await?;

    if let Some(model) = existing {
        let mut active: submission_answers::ActiveModel = model.into();
        active.answer = Set(answer);
        active.update(db).await?;
        return Ok(());
    }

    let inserted = submission_answers::Entity::insert(submission_answers::ActiveModel {
        submission_id: Set(submission_id),
        question_id: Set(question_id),
        answer: Set(answer.to_owned()),
        ..Default::default()
    })
    .exec(db)
    .await;

    if let Err(insert_err) = inserted {
        // Unique violation: another request inserted between our select and
        // insert. Update the winner's row instead.
        match submission_answers::Entity::find()
            .filter(submission_answers::Column::SubmissionId.eq(submission_id))
            .filter(submission_answers::Column::QuestionId.eq(question_id))
            .one(db)
            .await?
        {
            Some(model) => {
                let mut active: submission_answers::ActiveModel = model.into();
                active.answer = Set(answer);
                active.update(db).await?;
            }
            None => return Err(insert_err),
        }
    }

    Ok(())
}

#[derive(Deserialize)]
pub struct SubmissionFormData {
    form_id: i32,
    user_id: i32,
}

#[post("/api/submission")]
pub async fn create_or_get(
    client: ClientCtx,
    form: web::Json<SubmissionFormData>,
) -> Result<HttpResponse, Error> {
    client.require_login()?;

    let model = create_or_get_submission(get_db_pool(), form.form_id, form.user_id)
        .await
        .map_err(|e| {
            log::error!("create_or_get: {}", e);
            error::ErrorInternalServerError("")
        })?;

    Ok(HttpResponse::Ok().json(SubmissionResponse {
        id: model.id,
        form_id: model.form_id,
        user_id: model.user_id,
    }))
}

#[derive(Deserialize)]
pub struct AnswerFormData {
    question_id: i32,
    answer: String,
}

#[post("/api/submission/{submission_id}/answer")]
pub async fn save_answer_post(
    client: ClientCtx,
    path: web::Path<i32>,
    form: web::Json<AnswerFormData>,
) -> Result<HttpResponse, Error> {
    client.require_login()?;

    save_answer(
        get_db_pool(),
        path.into_inner(),
        form.question_id,
        form.answer.to_owned(),
    )
    .await
    .map_err(|e| {
        log::error!("save_answer_post: {}", e);
        error::ErrorInternalServerError("")
    })?;

    Ok(HttpResponse::Ok().finish())
}
