//! User profile lookup.

use crate::orm::users;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait};

/// The slice of a user row that request handling cares about.
#[derive(Clone, Debug, PartialEq)]
pub struct Profile {
    pub id: i32,
    pub username: String,
}

impl From<&users::Model> for Profile {
    fn from(user: &users::Model) -> Self {
        Self {
            id: user.id,
            username: user.username.to_owned(),
        }
    }
}

pub async fn find_profile(
    db: &DatabaseConnection,
    user_id: i32,
) -> Result<Option<Profile>, DbErr> {
    Ok(users::Entity::find_by_id(user_id)
        .one(db)
        .await?
        .as_ref()
        .map(Profile::from))
}
