//! SeaORM Entity for question table

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "question")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub section_id: i32,
    pub question: String,
    pub description: Option<String>,
    pub order: i32,
    pub answer_type: String,
    /// Archived questions are hidden from form reads, never deleted, so
    /// existing submission answers keep their referent.
    pub archived: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::sections::Entity",
        from = "Column::SectionId",
        to = "super::sections::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Section,
    #[sea_orm(has_many = "super::multiple_choice_answers::Entity")]
    MultipleChoiceAnswers,
    #[sea_orm(has_many = "super::submission_answers::Entity")]
    SubmissionAnswers,
}

impl Related<super::sections::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Section.def()
    }
}

impl Related<super::multiple_choice_answers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MultipleChoiceAnswers.def()
    }
}

impl Related<super::submission_answers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::SubmissionAnswers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
