//! Repository layer.
//!
//! Repositories wrap the database connection and expose typed query
//! methods. Uniqueness invariants (one enrollment per user per course,
//! one progress row per user per lesson, one certificate per user per
//! course, one review per user per course) are enforced by the unique
//! indexes created in the migrations; the write paths here translate
//! constraint violations instead of pre-checking.

pub mod certificate;
pub mod chapter;
pub mod course;
pub mod enrollment;
pub mod lesson;
pub mod lesson_progress;
pub mod review;
pub mod user;

pub use certificate::CertificateRepository;
pub use chapter::ChapterRepository;
pub use course::{CourseFilter, CourseRepository, CourseSort, PriceRange};
pub use enrollment::EnrollmentRepository;
pub use lesson::LessonRepository;
pub use lesson_progress::LessonProgressRepository;
pub use review::ReviewRepository;
pub use user::UserRepository;
