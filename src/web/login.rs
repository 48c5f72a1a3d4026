//! Session login endpoint

use crate::db::get_db_pool;
use crate::orm::users;
use crate::session;
use actix_web::{error, post, web, Error, HttpResponse};
use sea_orm::{query::*, ColumnTrait, DbErr, EntityTrait};
use serde::{Deserialize, Serialize};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_login);
}

#[derive(Deserialize)]
pub struct FormData {
    username: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    id: i32,
    username: String,
}

#[derive(Debug)]
pub enum LoginResultStatus {
    Success,
    BadName,
    BadPassword,
}

pub struct LoginResult {
    pub result: LoginResultStatus,
    pub user_id: Option<i32>,
}

impl LoginResult {
    fn success(user_id: i32) -> Self {
        Self {
            result: LoginResultStatus::Success,
            user_id: Some(user_id),
        }
    }
    fn fail(result: LoginResultStatus) -> Self {
        Self {
            result,
            user_id: None,
        }
    }
}

pub async fn login(name: &str, pass: &str) -> Result<LoginResult, DbErr> {
    let db = get_db_pool();

    let user = users::Entity::find()
        .filter(users::Column::Username.eq(name.trim()))
        .one(db)
        .await?;

    let user = match user {
        Some(user) => user,
        None => return Ok(LoginResult::fail(LoginResultStatus::BadName)),
    };

    if !session::verify_password(pass, &user.password) {
        return Ok(LoginResult::fail(LoginResultStatus::BadPassword));
    }

    Ok(LoginResult::success(user.id))
}

#[post("/api/login")]
pub async fn post_login(
    cookies: actix_session::Session,
    form: web::Json<FormData>,
) -> Result<HttpResponse, Error> {
    let result = login(&form.username, &form.password).await.map_err(|e| {
        log::error!("post_login: {}", e);
        error::ErrorInternalServerError("")
    })?;

    match result.result {
        LoginResultStatus::Success => {
            // LoginResult::success always carries the id.
            let user_id = result
                .user_id
                .ok_or_else(|| error::ErrorInternalServerError(""))?;

            session::start_session(&cookies, user_id).map_err(|e| {
                log::error!("post_login: session write: {}", e);
                error::ErrorInternalServerError("")
            })?;

            Ok(HttpResponse::Ok().json(LoginResponse {
                id: user_id,
                username: form.username.trim().to_owned(),
            }))
        }
        // Bad name and bad password are indistinguishable to the caller.
        _ => Err(error::ErrorUnauthorized("Invalid credentials")),
    }
}
