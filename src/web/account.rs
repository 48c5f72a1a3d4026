//! User registration endpoint

use crate::db::get_db_pool;
use crate::orm::users;
use crate::session;
use actix_web::{error, post, web, Error, HttpResponse};
use chrono::Utc;
use sea_orm::{entity::*, DbErr, InsertResult};
use serde::{Deserialize, Serialize};
use validator::Validate;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(create_user_post);
}

#[derive(Deserialize, Validate)]
pub struct FormData {
    #[validate(length(min = 1, max = 255), custom = "super::not_blank")]
    username: String,
    #[validate(length(min = 1, max = 255), custom = "super::not_blank")]
    first_name: String,
    #[validate(length(min = 1, max = 255), custom = "super::not_blank")]
    last_name: String,
    #[validate(email)]
    email: String,
    #[validate(length(min = 8, max = 1000))]
    password: String,
}

#[derive(Serialize)]
struct CreatedUser {
    id: i32,
    username: String,
}

async fn insert_new_user(
    username: &str,
    first_name: &str,
    last_name: &str,
    email: &str,
    password_hash: &str,
) -> Result<InsertResult<users::ActiveModel>, DbErr> {
    let db = get_db_pool();

    let user = users::ActiveModel {
        username: Set(username.to_owned()),
        first_name: Set(first_name.to_owned()),
        last_name: Set(last_name.to_owned()),
        email: Set(email.to_owned()),
        password: Set(password_hash.to_owned()),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default() // all other attributes are `Unset`
    };
    users::Entity::insert(user).exec(db).await
}

#[post("/api/user")]
pub async fn create_user_post(form: web::Json<FormData>) -> Result<HttpResponse, Error> {
    form.validate().map_err(|e| {
        log::debug!("User registration validation failed: {}", e);
        error::ErrorBadRequest("Invalid registration data")
    })?;

    let username = form.username.trim();
    let email = form.email.trim().to_lowercase();

    let password_hash = session::hash_password(&form.password).map_err(|e| {
        log::error!("Failed to hash password: {}", e);
        error::ErrorInternalServerError("Failed to create user")
    })?;

    let result = insert_new_user(
        username,
        form.first_name.trim(),
        form.last_name.trim(),
        &email,
        &password_hash,
    )
    .await
    .map_err(|e| {
        log::error!("Failed to create user: {}", e);
        error::ErrorInternalServerError("Failed to create user")
    })?;

    log::info!(
        "New user registered: {} (user_id: {})",
        username,
        result.last_insert_id
    );

    Ok(HttpResponse::Created().json(CreatedUser {
        id: result.last_insert_id,
        username: username.to_owned(),
    }))
}
