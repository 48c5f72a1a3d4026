//! Form builder endpoints
//!
//! The nested read collapses Form → Section → Question → Choice into one
//! document; archived questions are excluded at the query level. The bulk
//! edit (PUT .../all) reconciles a submitted document against storage via
//! `crate::reconcile` inside a single transaction.

use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::orm::{forms, multiple_choice_answers, question, sections};
use crate::reconcile::{self, ChoiceNode, FormTree, QuestionNode, SectionNode};
use actix_web::{error, get, post, put, web, Error, HttpResponse};
use sea_orm::{entity::*, query::*, ColumnTrait, DatabaseConnection, DbErr, EntityTrait};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Literal segments before `{form_id}` routes.
    conf.service(create_section)
        .service(create_question)
        .service(list_forms)
        .service(view_form_tree)
        .service(update_form_tree)
        .service(create_form);
}

#[derive(Serialize)]
struct FormSummary {
    id: i32,
    name: String,
}

/// Loads the nested document for one form, or None if the form does not
/// exist. Sections and questions come back stable-sorted by (order, id);
/// archived questions are filtered out in the query.
pub async fn load_form_tree(
    db: &DatabaseConnection,
    form_id: i32,
) -> Result<Option<FormTree>, DbErr> {
    let form = match forms::Entity::find_by_id(form_id).one(db).await? {
        Some(form) => form,
        None => return Ok(None),
    };

    let section_rows = sections::Entity::find()
        .filter(sections::Column::FormId.eq(form_id))
        .order_by_asc(sections::Column::Order)
        .order_by_asc(sections::Column::Id)
        .all(db)
        .await?;
    let section_ids: Vec<i32> = section_rows.iter().map(|s| s.id).collect();

    let question_rows = question::Entity::find()
        .filter(question::Column::SectionId.is_in(section_ids))
        .filter(question::Column::Archived.eq(false))
        .order_by_asc(question::Column::Order)
        .order_by_asc(question::Column::Id)
        .all(db)
        .await?;
    let question_ids: Vec<i32> = question_rows.iter().map(|q| q.id).collect();

    let choice_rows = multiple_choice_answers::Entity::find()
        .filter(multiple_choice_answers::Column::QuestionId.is_in(question_ids))
        .order_by_asc(multiple_choice_answers::Column::Id)
        .all(db)
        .await?;

    let mut choices_by_question: HashMap<i32, Vec<ChoiceNode>> = HashMap::new();
    for choice in choice_rows {
        choices_by_question
            .entry(choice.question_id)
            .or_default()
            .push(ChoiceNode {
                id: Some(choice.id),
                answer: choice.answer,
            });
    }

    let mut questions_by_section: HashMap<i32, Vec<QuestionNode>> = HashMap::new();
    for row in question_rows {
        questions_by_section
            .entry(row.section_id)
            .or_default()
            .push(QuestionNode {
                id: Some(row.id),
                question: row.question,
                description: row.description,
                order: row.order,
                answer_type: row.answer_type,
                answers: choices_by_question.remove(&row.id).unwrap_or_default(),
            });
    }

    let tree_sections = section_rows
        .into_iter()
        .map(|row| SectionNode {
            id: Some(row.id),
            name: row.name,
            description: row.description,
            order: row.order,
            questions: questions_by_section.remove(&row.id).unwrap_or_default(),
        })
        .collect();

    Ok(Some(FormTree {
        id: form.id,
        name: form.name,
        sections: tree_sections,
    }))
}

#[get("/api/form")]
pub async fn list_forms() -> Result<HttpResponse, Error> {
    let form_rows = forms::Entity::find()
        .order_by_asc(forms::Column::Id)
        .all(get_db_pool())
        .await
        .map_err(|e| {
            log::error!("list_forms: {}", e);
            error::ErrorInternalServerError("")
        })?;

    Ok(HttpResponse::Ok().json(
        form_rows
            .into_iter()
            .map(|f| FormSummary {
                id: f.id,
                name: f.name,
            })
            .collect::<Vec<_>>(),
    ))
}

#[get("/api/form/{form_id}/all")]
pub async fn view_form_tree(path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let tree = load_form_tree(get_db_pool(), path.into_inner())
        .await
        .map_err(|e| {
            log::error!("view_form_tree: {}", e);
            error::ErrorInternalServerError("")
        })?
        .ok_or_else(|| error::ErrorNotFound("Form not found."))?;

    Ok(HttpResponse::Ok().json(tree))
}

#[derive(Deserialize, Validate)]
pub struct FormFormData {
    #[validate(length(min = 1, max = 255), custom = "super::not_blank")]
    name: String,
}

#[post("/api/form")]
pub async fn create_form(
    client: ClientCtx,
    form: web::Json<FormFormData>,
) -> Result<HttpResponse, Error> {
    client.require_login()?;
    form.validate().map_err(|e| {
        log::debug!("create_form validation failed: {}", e);
        error::ErrorBadRequest("Form name is required")
    })?;

    let name = form.name.trim().to_owned();
    let result = forms::Entity::insert(forms::ActiveModel {
        name: Set(name.to_owned()),
        ..Default::default()
    })
    .exec(get_db_pool())
    .await
    .map_err(|e| {
        log::error!("create_form: {}", e);
        error::ErrorInternalServerError("")
    })?;

    // No initial sections; the builder adds them separately.
    Ok(HttpResponse::Created().json(FormSummary {
        id: result.last_insert_id,
        name,
    }))
}

#[derive(Deserialize, Validate)]
pub struct SectionFormData {
    form_id: i32,
    #[validate(length(min = 1, max = 255), custom = "super::not_blank")]
    name: String,
    description: Option<String>,
    order: i32,
}

#[post("/api/form/section")]
pub async fn create_section(
    client: ClientCtx,
    form: web::Json<SectionFormData>,
) -> Result<HttpResponse, Error> {
    client.require_login()?;
    form.validate().map_err(|e| {
        log::debug!("create_section validation failed: {}", e);
        error::ErrorBadRequest("Section name is required")
    })?;

    sections::Entity::insert(sections::ActiveModel {
        form_id: Set(form.form_id),
        name: Set(form.name.trim().to_owned()),
        description: Set(form.description.to_owned()),
        order: Set(form.order),
        ..Default::default()
    })
    .exec(get_db_pool())
    .await
    .map_err(|e| {
        log::error!("create_section: {}", e);
        error::ErrorInternalServerError("")
    })?;

    Ok(HttpResponse::Created().finish())
}

#[derive(Deserialize, Validate)]
pub struct QuestionFormData {
    section_id: i32,
    #[validate(length(min = 1), custom = "super::not_blank")]
    question: String,
    description: Option<String>,
    order: i32,
    #[validate(length(min = 1, max = 64))]
    answer_type: String,
    /// Choice options, for choice-based answer types.
    #[serde(default)]
    answers: Vec<String>,
}

#[post("/api/form/question")]
pub async fn create_question(
    client: ClientCtx,
    form: web::Json<QuestionFormData>,
) -> Result<HttpResponse, Error> {
    client.require_login()?;
    form.validate().map_err(|e| {
        log::debug!("create_question validation failed: {}", e);
        error::ErrorBadRequest("Question text and answer type are required")
    })?;

    let db = get_db_pool();
    let txn = db.begin().await.map_err(|e| {
        log::error!("create_question: begin: {}", e);
        error::ErrorInternalServerError("")
    })?;

    let result = question::Entity::insert(question::ActiveModel {
        section_id: Set(form.section_id),
        question: Set(form.question.trim().to_owned()),
        description: Set(form.description.to_owned()),
        order: Set(form.order),
        answer_type: Set(form.answer_type.to_owned()),
        archived: Set(false),
        ..Default::default()
    })
    .exec(&txn)
    .await
    .map_err(|e| {
        log::error!("create_question: {}", e);
        error::ErrorInternalServerError("")
    })?;

    for answer in &form.answers {
        multiple_choice_answers::Entity::insert(multiple_choice_answers::ActiveModel {
            question_id: Set(result.last_insert_id),
            answer: Set(answer.to_owned()),
            ..Default::default()
        })
        .exec(&txn)
        .await
        .map_err(|e| {
            log::error!("create_question: choice insert: {}", e);
            error::ErrorInternalServerError("")
        })?;
    }

    txn.commit().await.map_err(|e| {
        log::error!("create_question: commit: {}", e);
        error::ErrorInternalServerError("")
    })?;

    Ok(HttpResponse::Created().finish())
}

#[put("/api/form/{form_id}/all")]
pub async fn update_form_tree(
    client: ClientCtx,
    path: web::Path<i32>,
    form: web::Json<FormTree>,
) -> Result<HttpResponse, Error> {
    client.require_login()?;

    let db = get_db_pool();
    let form_id = path.into_inner();

    let stored = load_form_tree(db, form_id)
        .await
        .map_err(|e| {
            log::error!("update_form_tree: load: {}", e);
            error::ErrorInternalServerError("")
        })?
        .ok_or_else(|| error::ErrorNotFound("Form not found."))?;

    let ops = reconcile::diff(&stored, &form.into_inner());

    let txn = db.begin().await.map_err(|e| {
        log::error!("update_form_tree: begin: {}", e);
        error::ErrorInternalServerError("")
    })?;
    reconcile::apply(&txn, form_id, &ops).await.map_err(|e| {
        log::error!("update_form_tree: apply: {}", e);
        error::ErrorInternalServerError("")
    })?;
    txn.commit().await.map_err(|e| {
        log::error!("update_form_tree: commit: {}", e);
        error::ErrorInternalServerError("")
    })?;

    // Return the reconciled document as stored.
    let refreshed = load_form_tree(db, form_id)
        .await
        .map_err(|e| {
            log::error!("update_form_tree: reload: {}", e);
            error::ErrorInternalServerError("")
        })?
        .ok_or_else(|| error::ErrorNotFound("Form not found."))?;

    Ok(HttpResponse::Ok().json(refreshed))
}
