//! SeaORM Entity for pipeline table

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "pipeline")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::pipeline_status::Entity")]
    PipelineStatus,
}

impl Related<super::pipeline_status::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PipelineStatus.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
