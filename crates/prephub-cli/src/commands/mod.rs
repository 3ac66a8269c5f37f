pub mod compare;
pub mod init;
pub mod login;
pub mod quizzes;
pub mod subjects;
pub mod take;
pub mod validate;
