//! Integration tests for the form builder and nested form reads

mod common;
use serial_test::serial;

use common::{database::*, fixtures::*};
use sea_orm::{entity::*, query::*, ActiveValue::Set, ColumnTrait, EntityTrait, QueryFilter};
use talentflow::orm::{multiple_choice_answers, question, sections};
use talentflow::reconcile;
use talentflow::web::form::load_form_tree;

#[actix_rt::test]
#[serial]
async fn test_nested_document_structure_and_ordering() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let form = create_form(&db, "Engineering Application")
        .await
        .expect("Failed to create form");
    // Sections inserted against their order values.
    let later = create_section(&db, form.id, "Experience", 2)
        .await
        .expect("Failed to create section");
    let first = create_section(&db, form.id, "Basics", 1)
        .await
        .expect("Failed to create section");

    let q1 = create_question(&db, first.id, "Years of experience?", 1, "multiple_choice")
        .await
        .expect("Failed to create question");
    create_choice(&db, q1.id, "0-2").await.expect("choice");
    create_choice(&db, q1.id, "3-5").await.expect("choice");
    create_question(&db, later.id, "Describe a recent project.", 1, "text")
        .await
        .expect("Failed to create question");

    let tree = load_form_tree(&db, form.id)
        .await
        .expect("Failed to load tree")
        .expect("Form should exist");

    assert_eq!(tree.name, "Engineering Application");
    assert_eq!(tree.sections.len(), 2);
    assert_eq!(tree.sections[0].name, "Basics");
    assert_eq!(tree.sections[1].name, "Experience");

    let basics = &tree.sections[0];
    assert_eq!(basics.questions.len(), 1);
    assert_eq!(basics.questions[0].question, "Years of experience?");
    let answers: Vec<&str> = basics.questions[0]
        .answers
        .iter()
        .map(|a| a.answer.as_str())
        .collect();
    assert_eq!(answers, vec!["0-2", "3-5"]);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_missing_form_yields_none() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let tree = load_form_tree(&db, 999_999)
        .await
        .expect("Query should not fail");
    assert!(tree.is_none());
}

#[actix_rt::test]
#[serial]
async fn test_archived_question_hidden_but_retained() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let form = create_form(&db, "Screening").await.expect("form");
    let section = create_section(&db, form.id, "Questions", 1)
        .await
        .expect("section");
    let keep = create_question(&db, section.id, "Keep me", 1, "text")
        .await
        .expect("question");
    let archive = create_question(&db, section.id, "Archive me", 2, "text")
        .await
        .expect("question");

    let mut active: question::ActiveModel = archive.clone().into();
    active.archived = Set(true);
    active.update(&db).await.expect("Failed to archive");

    let tree = load_form_tree(&db, form.id)
        .await
        .expect("Failed to load tree")
        .expect("Form should exist");
    let question_ids: Vec<i32> = tree.sections[0]
        .questions
        .iter()
        .filter_map(|q| q.id)
        .collect();
    assert_eq!(question_ids, vec![keep.id], "Archived question must be hidden");

    // The row itself stays in storage.
    let stored = question::Entity::find_by_id(archive.id)
        .one(&db)
        .await
        .expect("Failed to fetch")
        .expect("Archived row must still exist");
    assert!(stored.archived);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_reconcile_applies_inside_one_transaction() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let form = create_form(&db, "Bulk Edit").await.expect("form");
    let section = create_section(&db, form.id, "Main", 1).await.expect("section");
    let dropped = create_question(&db, section.id, "Old question", 1, "text")
        .await
        .expect("question");
    let edited = create_question(&db, section.id, "Qestion with typo", 2, "text")
        .await
        .expect("question");

    let stored = load_form_tree(&db, form.id)
        .await
        .expect("load")
        .expect("exists");

    // The editor fixes a typo, drops one question, and adds another.
    let mut submitted = stored.clone();
    submitted.sections[0].questions.retain(|q| q.id != Some(dropped.id));
    for q in &mut submitted.sections[0].questions {
        if q.id == Some(edited.id) {
            q.question = "Question without typo".to_string();
        }
    }
    submitted.sections[0].questions.push(reconcile::QuestionNode {
        id: None,
        question: "Brand new question".to_string(),
        description: None,
        order: 3,
        answer_type: "multiple_choice".to_string(),
        answers: vec![reconcile::ChoiceNode {
            id: None,
            answer: "Yes".to_string(),
        }],
    });

    let ops = reconcile::diff(&stored, &submitted);
    let txn = db.begin().await.expect("begin");
    reconcile::apply(&txn, form.id, &ops).await.expect("apply");
    txn.commit().await.expect("commit");

    let refreshed = load_form_tree(&db, form.id)
        .await
        .expect("load")
        .expect("exists");
    let texts: Vec<&str> = refreshed.sections[0]
        .questions
        .iter()
        .map(|q| q.question.as_str())
        .collect();
    assert_eq!(texts, vec!["Question without typo", "Brand new question"]);

    // Dropped question was archived, not deleted.
    let archived_row = question::Entity::find_by_id(dropped.id)
        .one(&db)
        .await
        .expect("fetch")
        .expect("row must remain");
    assert!(archived_row.archived);

    // The new question got its choice row.
    let new_choices = multiple_choice_answers::Entity::find()
        .filter(multiple_choice_answers::Column::Answer.eq("Yes"))
        .count(&db)
        .await
        .expect("count");
    assert_eq!(new_choices, 1);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn test_reconcile_deletes_removed_section() {
    let db = setup_test_database()
        .await
        .expect("Failed to connect to test database");
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let form = create_form(&db, "Shrinking Form").await.expect("form");
    let keep = create_section(&db, form.id, "Keep", 1).await.expect("section");
    let drop_me = create_section(&db, form.id, "Drop", 2).await.expect("section");

    let stored = load_form_tree(&db, form.id)
        .await
        .expect("load")
        .expect("exists");
    let mut submitted = stored.clone();
    submitted.sections.retain(|s| s.id != Some(drop_me.id));

    let ops = reconcile::diff(&stored, &submitted);
    let txn = db.begin().await.expect("begin");
    reconcile::apply(&txn, form.id, &ops).await.expect("apply");
    txn.commit().await.expect("commit");

    let remaining = sections::Entity::find()
        .filter(sections::Column::FormId.eq(form.id))
        .all(&db)
        .await
        .expect("fetch");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep.id);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
