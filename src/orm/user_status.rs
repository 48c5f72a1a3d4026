//! SeaORM Entity for user_status table
//!
//! One row per (user, pipeline). The schema does not enforce this; the
//! assignment path clears any sibling row inside a transaction instead.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "user_status")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub pipeline_status_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
    #[sea_orm(
        belongs_to = "super::pipeline_status::Entity",
        from = "Column::PipelineStatusId",
        to = "super::pipeline_status::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    PipelineStatus,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::pipeline_status::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PipelineStatus.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
