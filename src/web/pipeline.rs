//! Pipeline, pipeline status, and user status (Kanban) endpoints

use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::orm::{pipeline, pipeline_status, user_status, users};
use actix_web::{delete, error, get, post, put, web, Error, HttpResponse};
use sea_orm::sea_query::Expr;
use sea_orm::{
    entity::*, query::*, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, FromQueryResult,
    JoinType,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Literal segments before `{pipeline_id}` routes.
    conf.service(create_status)
        .service(update_status)
        .service(delete_status)
        .service(assign_user)
        .service(move_user)
        .service(remove_user)
        .service(list_pipelines)
        .service(view_pipeline)
        .service(create_pipeline)
        .service(update_pipeline)
        .service(delete_pipeline);
}

#[derive(Serialize)]
struct PipelineSummary {
    id: i32,
    name: String,
}

/// One flat row of the Kanban board. The client groups rows by status to
/// render columns; statuses with nobody assigned come back with null user
/// fields so empty columns still render.
#[derive(Debug, FromQueryResult, Serialize)]
pub struct PipelineDetailRow {
    pub pipeline_name: String,
    pub pipeline_status_id: i32,
    pub pipeline_status_name: String,
    pub order: i32,
    pub user_id: Option<i32>,
    pub username: Option<String>,
}

/// Flat board rows for one pipeline, stable-sorted by (order, status id).
/// The order column is an unconstrained integer, so duplicates and gaps are
/// possible; the id tie-break keeps the column sequence deterministic.
pub async fn pipeline_detail(
    db: &DatabaseConnection,
    pipeline_id: i32,
) -> Result<Vec<PipelineDetailRow>, DbErr> {
    pipeline_status::Entity::find()
        .filter(pipeline_status::Column::PipelineId.eq(pipeline_id))
        .join(JoinType::InnerJoin, pipeline_status::Relation::Pipeline.def())
        .join(
            JoinType::LeftJoin,
            pipeline_status::Relation::UserStatus.def(),
        )
        .join(JoinType::LeftJoin, user_status::Relation::User.def())
        .select_only()
        .column_as(pipeline::Column::Name, "pipeline_name")
        .column_as(pipeline_status::Column::Id, "pipeline_status_id")
        .column_as(pipeline_status::Column::Name, "pipeline_status_name")
        .column(pipeline_status::Column::Order)
        .column_as(user_status::Column::UserId, "user_id")
        .column_as(users::Column::Username, "username")
        .order_by_asc(pipeline_status::Column::Order)
        .order_by_asc(pipeline_status::Column::Id)
        .into_model::<PipelineDetailRow>()
        .all(db)
        .await
}

/// Moves a user into `pipeline_status_id`, replacing whatever row they had
/// within that status's pipeline. One row per (user, pipeline) is an
/// application-level rule, so the clear and the insert share a transaction.
pub async fn assign_user_status(
    db: &DatabaseConnection,
    user_id: i32,
    pipeline_status_id: i32,
) -> Result<(), DbErr> {
    let status = pipeline_status::Entity::find_by_id(pipeline_status_id)
        .one(db)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound("pipeline_status".to_owned()))?;

    let sibling_ids = status_ids_of_pipeline(db, status.pipeline_id).await?;

    let txn = db.begin().await?;
    user_status::Entity::delete_many()
        .filter(user_status::Column::UserId.eq(user_id))
        .filter(user_status::Column::PipelineStatusId.is_in(sibling_ids))
        .exec(&txn)
        .await?;
    user_status::Entity::insert(user_status::ActiveModel {
        user_id: Set(user_id),
        pipeline_status_id: Set(pipeline_status_id),
    })
    .exec(&txn)
    .await?;
    txn.commit().await?;

    Ok(())
}

/// Unconditional UPDATE of the user's row within the target status's
/// pipeline. Any status can move to any other; there is no transition table
/// and no history. A user with no row in that pipeline is a no-op.
pub async fn move_user_status(
    db: &DatabaseConnection,
    user_id: i32,
    new_status_id: i32,
) -> Result<(), DbErr> {
    let status = match pipeline_status::Entity::find_by_id(new_status_id).one(db).await? {
        Some(status) => status,
        None => return Ok(()),
    };

    let sibling_ids = status_ids_of_pipeline(db, status.pipeline_id).await?;

    user_status::Entity::update_many()
        .col_expr(
            user_status::Column::PipelineStatusId,
            Expr::value(new_status_id),
        )
        .filter(user_status::Column::UserId.eq(user_id))
        .filter(user_status::Column::PipelineStatusId.is_in(sibling_ids))
        .exec(db)
        .await?;

    Ok(())
}

/// Takes the user off the given pipeline's board entirely.
pub async fn remove_user_status(
    db: &DatabaseConnection,
    pipeline_id: i32,
    user_id: i32,
) -> Result<(), DbErr> {
    let status_ids = status_ids_of_pipeline(db, pipeline_id).await?;

    user_status::Entity::delete_many()
        .filter(user_status::Column::UserId.eq(user_id))
        .filter(user_status::Column::PipelineStatusId.is_in(status_ids))
        .exec(db)
        .await?;

    Ok(())
}

async fn status_ids_of_pipeline(
    db: &DatabaseConnection,
    pipeline_id: i32,
) -> Result<Vec<i32>, DbErr> {
    Ok(pipeline_status::Entity::find()
        .filter(pipeline_status::Column::PipelineId.eq(pipeline_id))
        .all(db)
        .await?
        .iter()
        .map(|status| status.id)
        .collect())
}

#[get("/api/pipeline")]
pub async fn list_pipelines() -> Result<HttpResponse, Error> {
    let db = get_db_pool();
    let pipelines = pipeline::Entity::find()
        .order_by_asc(pipeline::Column::Id)
        .all(db)
        .await
        .map_err(|e| {
            log::error!("list_pipelines: {}", e);
            error::ErrorInternalServerError("")
        })?;

    Ok(HttpResponse::Ok().json(
        pipelines
            .into_iter()
            .map(|p| PipelineSummary {
                id: p.id,
                name: p.name,
            })
            .collect::<Vec<_>>(),
    ))
}

#[get("/api/pipeline/{pipeline_id}")]
pub async fn view_pipeline(path: web::Path<i32>) -> Result<HttpResponse, Error> {
    let rows = pipeline_detail(get_db_pool(), path.into_inner())
        .await
        .map_err(|e| {
            log::error!("view_pipeline: {}", e);
            error::ErrorInternalServerError("")
        })?;

    Ok(HttpResponse::Ok().json(rows))
}

#[derive(Deserialize, Validate)]
pub struct PipelineFormData {
    #[validate(length(min = 1, max = 255), custom = "super::not_blank")]
    name: String,
}

#[post("/api/pipeline")]
pub async fn create_pipeline(
    client: ClientCtx,
    form: web::Json<PipelineFormData>,
) -> Result<HttpResponse, Error> {
    client.require_login()?;
    form.validate().map_err(|e| {
        log::debug!("create_pipeline validation failed: {}", e);
        error::ErrorBadRequest("Pipeline name is required")
    })?;

    let db = get_db_pool();
    let name = form.name.trim().to_owned();
    let result = pipeline::Entity::insert(pipeline::ActiveModel {
        name: Set(name.to_owned()),
        ..Default::default()
    })
    .exec(db)
    .await
    .map_err(|e| {
        log::error!("create_pipeline: {}", e);
        error::ErrorInternalServerError("")
    })?;

    Ok(HttpResponse::Created().json(PipelineSummary {
        id: result.last_insert_id,
        name,
    }))
}

#[put("/api/pipeline/{pipeline_id}")]
pub async fn update_pipeline(
    client: ClientCtx,
    path: web::Path<i32>,
    form: web::Json<PipelineFormData>,
) -> Result<HttpResponse, Error> {
    client.require_login()?;
    form.validate().map_err(|e| {
        log::debug!("update_pipeline validation failed: {}", e);
        error::ErrorBadRequest("Pipeline name is required")
    })?;

    // A rename of a nonexistent id affects zero rows and still returns 200.
    pipeline::Entity::update_many()
        .col_expr(pipeline::Column::Name, Expr::value(form.name.trim()))
        .filter(pipeline::Column::Id.eq(path.into_inner()))
        .exec(get_db_pool())
        .await
        .map_err(|e| {
            log::error!("update_pipeline: {}", e);
            error::ErrorInternalServerError("")
        })?;

    Ok(HttpResponse::Ok().finish())
}

#[delete("/api/pipeline/{pipeline_id}")]
pub async fn delete_pipeline(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    client.require_login()?;

    // Statuses and user_status rows go with it via FK cascade.
    pipeline::Entity::delete_by_id(path.into_inner())
        .exec(get_db_pool())
        .await
        .map_err(|e| {
            log::error!("delete_pipeline: {}", e);
            error::ErrorInternalServerError("")
        })?;

    Ok(HttpResponse::NoContent().finish())
}

#[derive(Deserialize, Validate)]
pub struct CreateStatusFormData {
    pipeline_id: i32,
    order: i32,
    #[validate(length(min = 1, max = 255), custom = "super::not_blank")]
    name: String,
}

#[post("/api/pipeline/status")]
pub async fn create_status(
    client: ClientCtx,
    form: web::Json<CreateStatusFormData>,
) -> Result<HttpResponse, Error> {
    client.require_login()?;
    form.validate().map_err(|e| {
        log::debug!("create_status validation failed: {}", e);
        error::ErrorBadRequest("Status name is required")
    })?;

    pipeline_status::Entity::insert(pipeline_status::ActiveModel {
        pipeline_id: Set(form.pipeline_id),
        order: Set(form.order),
        name: Set(form.name.trim().to_owned()),
        ..Default::default()
    })
    .exec(get_db_pool())
    .await
    .map_err(|e| {
        log::error!("create_status: {}", e);
        error::ErrorInternalServerError("")
    })?;

    Ok(HttpResponse::Created().finish())
}

#[derive(Deserialize, Validate)]
pub struct UpdateStatusFormData {
    order: i32,
    #[validate(length(min = 1, max = 255), custom = "super::not_blank")]
    name: String,
}

#[put("/api/pipeline/status/{status_id}")]
pub async fn update_status(
    client: ClientCtx,
    path: web::Path<i32>,
    form: web::Json<UpdateStatusFormData>,
) -> Result<HttpResponse, Error> {
    client.require_login()?;
    form.validate().map_err(|e| {
        log::debug!("update_status validation failed: {}", e);
        error::ErrorBadRequest("Status name is required")
    })?;

    pipeline_status::Entity::update_many()
        .col_expr(pipeline_status::Column::Order, Expr::value(form.order))
        .col_expr(pipeline_status::Column::Name, Expr::value(form.name.trim()))
        .filter(pipeline_status::Column::Id.eq(path.into_inner()))
        .exec(get_db_pool())
        .await
        .map_err(|e| {
            log::error!("update_status: {}", e);
            error::ErrorInternalServerError("")
        })?;

    Ok(HttpResponse::Ok().finish())
}

#[delete("/api/pipeline/status/{status_id}")]
pub async fn delete_status(client: ClientCtx, path: web::Path<i32>) -> Result<HttpResponse, Error> {
    client.require_login()?;

    pipeline_status::Entity::delete_by_id(path.into_inner())
        .exec(get_db_pool())
        .await
        .map_err(|e| {
            log::error!("delete_status: {}", e);
            error::ErrorInternalServerError("")
        })?;

    Ok(HttpResponse::NoContent().finish())
}

#[derive(Deserialize)]
pub struct UserStatusFormData {
    user_id: i32,
    pipeline_status_id: i32,
}

#[post("/api/pipeline/user_status")]
pub async fn assign_user(
    client: ClientCtx,
    form: web::Json<UserStatusFormData>,
) -> Result<HttpResponse, Error> {
    client.require_login()?;

    assign_user_status(get_db_pool(), form.user_id, form.pipeline_status_id)
        .await
        .map_err(|e| {
            log::error!("assign_user: {}", e);
            error::ErrorInternalServerError("")
        })?;

    Ok(HttpResponse::Created().finish())
}

#[put("/api/pipeline/user_status")]
pub async fn move_user(
    client: ClientCtx,
    form: web::Json<UserStatusFormData>,
) -> Result<HttpResponse, Error> {
    client.require_login()?;

    move_user_status(get_db_pool(), form.user_id, form.pipeline_status_id)
        .await
        .map_err(|e| {
            log::error!("move_user: {}", e);
            error::ErrorInternalServerError("")
        })?;

    Ok(HttpResponse::Ok().finish())
}

#[delete("/api/pipeline/{pipeline_id}/user_status/{user_id}")]
pub async fn remove_user(
    client: ClientCtx,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse, Error> {
    client.require_login()?;

    let (pipeline_id, user_id) = path.into_inner();
    remove_user_status(get_db_pool(), pipeline_id, user_id)
        .await
        .map_err(|e| {
            log::error!("remove_user: {}", e);
            error::ErrorInternalServerError("")
        })?;

    Ok(HttpResponse::NoContent().finish())
}
