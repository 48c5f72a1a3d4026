pub mod forms;
pub mod multiple_choice_answers;
pub mod pipeline;
pub mod pipeline_status;
pub mod question;
pub mod sections;
pub mod submission;
pub mod submission_answers;
pub mod user_status;
pub mod users;
