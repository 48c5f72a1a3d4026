//! Session logout endpoint

use crate::session;
use actix_web::{post, Error, HttpResponse};

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(post_logout);
}

#[post("/api/logout")]
pub async fn post_logout(cookies: actix_session::Session) -> Result<HttpResponse, Error> {
    session::end_session(&cookies);
    Ok(HttpResponse::NoContent().finish())
}
