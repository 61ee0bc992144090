//! Business logic services.

#![allow(missing_docs)]

pub mod certificate;
pub mod chapter;
pub mod course;
pub mod enrollment;
pub mod lesson;
pub mod policy;
pub mod progress;
pub mod purchase;
pub mod review;
pub mod stats;
pub mod user;

pub use certificate::{CertificateService, CertificateWithCourse};
pub use chapter::{ChapterService, CreateChapterInput, UpdateChapterInput};
pub use course::{
    COURSE_CATEGORIES, ChapterContent, CourseDetail, CoursePage, CourseService, CourseSummary,
    CreateCourseInput, UpdateCourseInput,
};
pub use enrollment::{EnrolledCourse, EnrollmentService};
pub use lesson::{
    AttachmentInput, CreateLessonInput, LessonService, LessonWithAttachments, UpdateLessonInput,
};
pub use progress::{ProgressService, ProgressUpdate};
pub use purchase::{CheckoutSession, PurchaseService};
pub use review::{CreateReviewInput, ReviewPage, ReviewService, ReviewWithAuthor};
pub use stats::{AdminStats, InstructorStats, StatsService, UserStats};
pub use user::{LoginInput, RegisterInput, UpdateProfileInput, UserService};
