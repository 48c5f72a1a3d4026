//! Reconciliation of a submitted form document against the stored one.
//!
//! The bulk form editor sends the whole nested Form → Section → Question →
//! Choice document back at once. `diff` is a pure function turning (stored
//! tree, submitted tree) into an ordered list of operations, so it can be
//! tested without a database; `apply` runs those operations against one
//! transaction. Questions are archived, never hard-deleted; sections and
//! choice answers are hard-deleted.

use crate::orm::{multiple_choice_answers, question, sections};
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, ColumnTrait, DatabaseTransaction, DbErr, EntityTrait};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Nested form document, as stored and as submitted by the editor.
/// Nodes without an id are new.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FormTree {
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub sections: Vec<SectionNode>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectionNode {
    #[serde(default)]
    pub id: Option<i32>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub order: i32,
    #[serde(default)]
    pub questions: Vec<QuestionNode>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct QuestionNode {
    #[serde(default)]
    pub id: Option<i32>,
    pub question: String,
    #[serde(default)]
    pub description: Option<String>,
    pub order: i32,
    pub answer_type: String,
    #[serde(default)]
    pub answers: Vec<ChoiceNode>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChoiceNode {
    #[serde(default)]
    pub id: Option<i32>,
    pub answer: String,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReconcileOp {
    RenameForm {
        name: String,
    },
    /// Inserts the section and everything nested under it.
    InsertSection {
        section: SectionNode,
    },
    UpdateSection {
        id: i32,
        name: String,
        description: Option<String>,
        order: i32,
    },
    DeleteSection {
        id: i32,
    },
    /// Inserts the question and its choices under an existing section.
    InsertQuestion {
        section_id: i32,
        question: QuestionNode,
    },
    UpdateQuestion {
        id: i32,
        question: String,
        description: Option<String>,
        order: i32,
        answer_type: String,
    },
    ArchiveQuestion {
        id: i32,
    },
    InsertChoice {
        question_id: i32,
        answer: String,
    },
    UpdateChoice {
        id: i32,
        answer: String,
    },
    DeleteChoice {
        id: i32,
    },
}

/// Computes the ordered operation list that transforms `old` into `new`.
///
/// Submitted nodes carrying an id that does not exist in `old` are treated as
/// inserts; the stale id is discarded rather than trusted.
pub fn diff(old: &FormTree, new: &FormTree) -> Vec<ReconcileOp> {
    let mut ops = Vec::new();

    if old.name != new.name {
        ops.push(ReconcileOp::RenameForm {
            name: new.name.to_owned(),
        });
    }

    let old_sections: HashMap<i32, &SectionNode> = old
        .sections
        .iter()
        .filter_map(|s| s.id.map(|id| (id, s)))
        .collect();
    let mut seen_sections = Vec::new();

    for section in &new.sections {
        match section.id.and_then(|id| old_sections.get(&id)) {
            Some(old_section) => {
                let id = old_section.id.unwrap_or_default();
                seen_sections.push(id);
                if (&old_section.name, &old_section.description, old_section.order)
                    != (&section.name, &section.description, section.order)
                {
                    ops.push(ReconcileOp::UpdateSection {
                        id,
                        name: section.name.to_owned(),
                        description: section.description.to_owned(),
                        order: section.order,
                    });
                }
                diff_questions(id, &old_section.questions, &section.questions, &mut ops);
            }
            None => {
                let mut section = section.clone();
                section.id = None;
                ops.push(ReconcileOp::InsertSection { section });
            }
        }
    }

    for old_section in &old.sections {
        if let Some(id) = old_section.id {
            if !seen_sections.contains(&id) {
                ops.push(ReconcileOp::DeleteSection { id });
            }
        }
    }

    ops
}

fn diff_questions(
    section_id: i32,
    old_questions: &[QuestionNode],
    new_questions: &[QuestionNode],
    ops: &mut Vec<ReconcileOp>,
) {
    let old_by_id: HashMap<i32, &QuestionNode> = old_questions
        .iter()
        .filter_map(|q| q.id.map(|id| (id, q)))
        .collect();
    let mut seen = Vec::new();

    for question in new_questions {
        match question.id.and_then(|id| old_by_id.get(&id)) {
            Some(old_question) => {
                let id = old_question.id.unwrap_or_default();
                seen.push(id);
                if (
                    &old_question.question,
                    &old_question.description,
                    old_question.order,
                    &old_question.answer_type,
                ) != (
                    &question.question,
                    &question.description,
                    question.order,
                    &question.answer_type,
                ) {
                    ops.push(ReconcileOp::UpdateQuestion {
                        id,
                        question: question.question.to_owned(),
                        description: question.description.to_owned(),
                        order: question.order,
                        answer_type: question.answer_type.to_owned(),
                    });
                }
                diff_choices(id, &old_question.answers, &question.answers, ops);
            }
            None => {
                let mut question = question.clone();
                question.id = None;
                ops.push(ReconcileOp::InsertQuestion {
                    section_id,
                    question,
                });
            }
        }
    }

    for old_question in old_questions {
        if let Some(id) = old_question.id {
            if !seen.contains(&id) {
                ops.push(ReconcileOp::ArchiveQuestion { id });
            }
        }
    }
}

fn diff_choices(
    question_id: i32,
    old_choices: &[ChoiceNode],
    new_choices: &[ChoiceNode],
    ops: &mut Vec<ReconcileOp>,
) {
    let old_by_id: HashMap<i32, &ChoiceNode> = old_choices
        .iter()
        .filter_map(|c| c.id.map(|id| (id, c)))
        .collect();
    let mut seen = Vec::new();

    for choice in new_choices {
        match choice.id.and_then(|id| old_by_id.get(&id)) {
            Some(old_choice) => {
                let id = old_choice.id.unwrap_or_default();
                seen.push(id);
                if old_choice.answer != choice.answer {
                    ops.push(ReconcileOp::UpdateChoice {
                        id,
                        answer: choice.answer.to_owned(),
                    });
                }
            }
            None => {
                ops.push(ReconcileOp::InsertChoice {
                    question_id,
                    answer: choice.answer.to_owned(),
                });
            }
        }
    }

    for old_choice in old_choices {
        if let Some(id) = old_choice.id {
            if !seen.contains(&id) {
                ops.push(ReconcileOp::DeleteChoice { id });
            }
        }
    }
}

/// Applies an operation list inside the caller's transaction.
pub async fn apply(
    txn: &DatabaseTransaction,
    form_id: i32,
    ops: &[ReconcileOp],
) -> Result<(), DbErr> {
    use crate::orm::forms;

    for op in ops {
        match op {
            ReconcileOp::RenameForm { name } => {
                forms::Entity::update_many()
                    .col_expr(forms::Column::Name, Expr::value(name.to_owned()))
                    .filter(forms::Column::Id.eq(form_id))
                    .exec(txn)
                    .await?;
            }
            ReconcileOp::InsertSection { section } => {
                insert_section(txn, form_id, section).await?;
            }
            ReconcileOp::UpdateSection {
                id,
                name,
                description,
                order,
            } => {
                sections::Entity::update_many()
                    .col_expr(sections::Column::Name, Expr::value(name.to_owned()))
                    .col_expr(
                        sections::Column::Description,
                        Expr::value(description.to_owned()),
                    )
                    .col_expr(sections::Column::Order, Expr::value(*order))
                    .filter(sections::Column::Id.eq(*id))
                    .exec(txn)
                    .await?;
            }
            ReconcileOp::DeleteSection { id } => {
                sections::Entity::delete_many()
                    .filter(sections::Column::Id.eq(*id))
                    .exec(txn)
                    .await?;
            }
            ReconcileOp::InsertQuestion {
                section_id,
                question,
            } => {
                insert_question(txn, *section_id, question).await?;
            }
            ReconcileOp::UpdateQuestion {
                id,
                question,
                description,
                order,
                answer_type,
            } => {
                question::Entity::update_many()
                    .col_expr(question::Column::Question, Expr::value(question.to_owned()))
                    .col_expr(
                        question::Column::Description,
                        Expr::value(description.to_owned()),
                    )
                    .col_expr(question::Column::Order, Expr::value(*order))
                    .col_expr(
                        question::Column::AnswerType,
                        Expr::value(answer_type.to_owned()),
                    )
                    .filter(question::Column::Id.eq(*id))
                    .exec(txn)
                    .await?;
            }
            ReconcileOp::ArchiveQuestion { id } => {
                question::Entity::update_many()
                    .col_expr(question::Column::Archived, Expr::value(true))
                    .filter(question::Column::Id.eq(*id))
                    .exec(txn)
                    .await?;
            }
            ReconcileOp::InsertChoice {
                question_id,
                answer,
            } => {
                multiple_choice_answers::Entity::insert(multiple_choice_answers::ActiveModel {
                    question_id: Set(*question_id),
                    answer: Set(answer.to_owned()),
                    ..Default::default()
                })
                .exec(txn)
                .await?;
            }
            ReconcileOp::UpdateChoice { id, answer } => {
                multiple_choice_answers::Entity::update_many()
                    .col_expr(
                        multiple_choice_answers::Column::Answer,
                        Expr::value(answer.to_owned()),
                    )
                    .filter(multiple_choice_answers::Column::Id.eq(*id))
                    .exec(txn)
                    .await?;
            }
            ReconcileOp::DeleteChoice { id } => {
                multiple_choice_answers::Entity::delete_many()
                    .filter(multiple_choice_answers::Column::Id.eq(*id))
                    .exec(txn)
                    .await?;
            }
        }
    }

    Ok(())
}

async fn insert_section(
    txn: &DatabaseTransaction,
    form_id: i32,
    section: &SectionNode,
) -> Result<(), DbErr> {
    let res = sections::Entity::insert(sections::ActiveModel {
        form_id: Set(form_id),
        name: Set(section.name.to_owned()),
        description: Set(section.description.to_owned()),
        order: Set(section.order),
        ..Default::default()
    })
    .exec(txn)
    .await?;

    for question in &section.questions {
        insert_question(txn, res.last_insert_id, question).await?;
    }

    Ok(())
}

async fn insert_question(
    txn: &DatabaseTransaction,
    section_id: i32,
    question_node: &QuestionNode,
) -> Result<(), DbErr> {
    let res = question::Entity::insert(question::ActiveModel {
        section_id: Set(section_id),
        question: Set(question_node.question.to_owned()),
        description: Set(question_node.description.to_owned()),
        order: Set(question_node.order),
        answer_type: Set(question_node.answer_type.to_owned()),
        archived: Set(false),
        ..Default::default()
    })
    .exec(txn)
    .await?;

    for choice in &question_node.answers {
        multiple_choice_answers::Entity::insert(multiple_choice_answers::ActiveModel {
            question_id: Set(res.last_insert_id),
            answer: Set(choice.answer.to_owned()),
            ..Default::default()
        })
        .exec(txn)
        .await?;
    }

    Ok(())
}
