//! Database entities.

#![allow(missing_docs)]

pub mod attachment;
pub mod certificate;
pub mod chapter;
pub mod course;
pub mod enrollment;
pub mod lesson;
pub mod lesson_progress;
pub mod review;
pub mod user;

pub use attachment::Entity as Attachment;
pub use certificate::Entity as Certificate;
pub use chapter::Entity as Chapter;
pub use course::Entity as Course;
pub use enrollment::Entity as Enrollment;
pub use lesson::Entity as Lesson;
pub use lesson_progress::Entity as LessonProgress;
pub use review::Entity as Review;
pub use user::Entity as User;
