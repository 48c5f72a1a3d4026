//! Test fixtures for creating test data
#![allow(dead_code)]

use chrono::Utc;
use sea_orm::{entity::*, ActiveValue::Set, DatabaseConnection, DbErr};
use talentflow::orm::{
    forms, multiple_choice_answers, pipeline, pipeline_status, question, sections, user_status,
    users,
};

/// Test user fixture
pub struct TestUser {
    pub id: i32,
    pub username: String,
    pub password: String, // Plain text password for testing
}

/// Create a test user with known credentials
pub async fn create_test_user(
    db: &DatabaseConnection,
    username: &str,
    password: &str,
) -> Result<TestUser, DbErr> {
    // Use the same Argon2 instance that the login path uses
    let password_hash = talentflow::session::hash_password(password)
        .map_err(|e| DbErr::Custom(format!("Password hashing failed: {}", e)))?;

    let user = users::ActiveModel {
        username: Set(username.to_string()),
        first_name: Set("Test".to_string()),
        last_name: Set("User".to_string()),
        email: Set(format!("{}@test.com", username)),
        password: Set(password_hash),
        created_at: Set(Utc::now().naive_utc()),
        ..Default::default()
    };
    let user_model = user.insert(db).await?;

    Ok(TestUser {
        id: user_model.id,
        username: username.to_string(),
        password: password.to_string(),
    })
}

/// Create a pipeline with statuses at the given (name, order) positions.
/// Statuses are inserted in the order given, which need not match `order`.
pub async fn create_pipeline_with_statuses(
    db: &DatabaseConnection,
    name: &str,
    statuses: &[(&str, i32)],
) -> Result<(pipeline::Model, Vec<pipeline_status::Model>), DbErr> {
    let pipeline_model = pipeline::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    let mut status_models = Vec::new();
    for (status_name, order) in statuses {
        let status = pipeline_status::ActiveModel {
            pipeline_id: Set(pipeline_model.id),
            name: Set(status_name.to_string()),
            order: Set(*order),
            ..Default::default()
        }
        .insert(db)
        .await?;
        status_models.push(status);
    }

    Ok((pipeline_model, status_models))
}

/// Place a user directly into a pipeline status, bypassing the API.
pub async fn place_user_in_status(
    db: &DatabaseConnection,
    user_id: i32,
    pipeline_status_id: i32,
) -> Result<(), DbErr> {
    user_status::ActiveModel {
        user_id: Set(user_id),
        pipeline_status_id: Set(pipeline_status_id),
    }
    .insert(db)
    .await?;
    Ok(())
}

pub async fn create_form(db: &DatabaseConnection, name: &str) -> Result<forms::Model, DbErr> {
    forms::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn create_section(
    db: &DatabaseConnection,
    form_id: i32,
    name: &str,
    order: i32,
) -> Result<sections::Model, DbErr> {
    sections::ActiveModel {
        form_id: Set(form_id),
        name: Set(name.to_string()),
        description: Set(None),
        order: Set(order),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn create_question(
    db: &DatabaseConnection,
    section_id: i32,
    text: &str,
    order: i32,
    answer_type: &str,
) -> Result<question::Model, DbErr> {
    question::ActiveModel {
        section_id: Set(section_id),
        question: Set(text.to_string()),
        description: Set(None),
        order: Set(order),
        answer_type: Set(answer_type.to_string()),
        archived: Set(false),
        ..Default::default()
    }
    .insert(db)
    .await
}

pub async fn create_choice(
    db: &DatabaseConnection,
    question_id: i32,
    answer: &str,
) -> Result<multiple_choice_answers::Model, DbErr> {
    multiple_choice_answers::ActiveModel {
        question_id: Set(question_id),
        answer: Set(answer.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
}
