//! Course repository.

use std::sync::Arc;

use opencourse_common::{AppError, AppResult};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, Order,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, SqlErr, sea_query::Expr,
};
use serde::Deserialize;

use crate::entities::{Course, course, course::CourseLevel, course::CourseStatus};

/// Catalog filters applied to published-course queries.
#[derive(Debug, Clone, Default)]
pub struct CourseFilter {
    /// Exact category match.
    pub category: Option<String>,
    /// Exact level match.
    pub level: Option<CourseLevel>,
    /// Substring match over title, description and small description.
    pub search: Option<String>,
    /// Price bucket.
    pub price: Option<PriceRange>,
}

/// Price buckets for catalog filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceRange {
    /// No price, or a price of zero.
    Free,
    /// Any positive price.
    Paid,
    /// Positive and under 50.
    Under50,
    /// Between 50 and 100 inclusive.
    #[serde(rename = "50to100")]
    FiftyTo100,
    /// Over 100.
    Over100,
}

/// Catalog sort orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CourseSort {
    /// Most recently created first.
    #[default]
    Newest,
    /// Oldest first.
    Oldest,
    /// Most enrollments first.
    Popular,
    /// Highest average rating first.
    Rating,
    /// Cheapest first (free counts as zero).
    PriceLow,
    /// Most expensive first.
    PriceHigh,
}

/// Course repository for database operations.
#[derive(Clone)]
pub struct CourseRepository {
    db: Arc<DatabaseConnection>,
}

impl CourseRepository {
    /// Create a new course repository.
    #[must_use]
    pub const fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Find a course by ID.
    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<course::Model>> {
        Course::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a course by ID, returning an error if not found.
    pub async fn get_by_id(&self, id: &str) -> AppResult<course::Model> {
        self.find_by_id(id)
            .await?
            .ok_or_else(|| AppError::CourseNotFound(id.to_string()))
    }

    /// Find courses by IDs.
    pub async fn find_by_ids(&self, ids: &[String]) -> AppResult<Vec<course::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        Course::find()
            .filter(course::Column::Id.is_in(ids.to_vec()))
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find a course by slug.
    pub async fn find_by_slug(&self, slug: &str) -> AppResult<Option<course::Model>> {
        Course::find()
            .filter(course::Column::Slug.eq(slug))
            .one(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    fn published_query(filter: &CourseFilter) -> Select<Course> {
        let mut query = Course::find().filter(course::Column::Status.eq(CourseStatus::Published));

        if let Some(category) = &filter.category {
            query = query.filter(course::Column::Category.eq(category));
        }

        if let Some(level) = filter.level {
            query = query.filter(course::Column::Level.eq(level));
        }

        if let Some(search) = &filter.search {
            query = query.filter(
                Condition::any()
                    .add(course::Column::Title.contains(search))
                    .add(course::Column::Description.contains(search))
                    .add(course::Column::SmallDescription.contains(search)),
            );
        }

        match filter.price {
            Some(PriceRange::Free) => query.filter(
                Condition::any()
                    .add(course::Column::Price.is_null())
                    .add(course::Column::Price.lte(0.0)),
            ),
            Some(PriceRange::Paid) => query.filter(course::Column::Price.gt(0.0)),
            Some(PriceRange::Under50) => query
                .filter(course::Column::Price.gt(0.0))
                .filter(course::Column::Price.lt(50.0)),
            Some(PriceRange::FiftyTo100) => query
                .filter(course::Column::Price.gte(50.0))
                .filter(course::Column::Price.lte(100.0)),
            Some(PriceRange::Over100) => query.filter(course::Column::Price.gt(100.0)),
            None => query,
        }
    }

    /// Find published courses matching the catalog filters.
    pub async fn find_published(
        &self,
        filter: &CourseFilter,
        sort: CourseSort,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<course::Model>> {
        let query = Self::published_query(filter);

        // Popularity and rating come from correlated subqueries so that
        // pagination stays correct without fetching the whole catalog.
        let query = match sort {
            CourseSort::Newest => query.order_by(course::Column::CreatedAt, Order::Desc),
            CourseSort::Oldest => query.order_by(course::Column::CreatedAt, Order::Asc),
            CourseSort::Popular => query.order_by(
                Expr::cust("(SELECT COUNT(*) FROM enrollment WHERE enrollment.course_id = course.id)"),
                Order::Desc,
            ),
            CourseSort::Rating => query.order_by(
                Expr::cust("(SELECT COALESCE(AVG(rating), 0) FROM review WHERE review.course_id = course.id)"),
                Order::Desc,
            ),
            CourseSort::PriceLow => {
                query.order_by(Expr::cust("COALESCE(price, 0)"), Order::Asc)
            }
            CourseSort::PriceHigh => {
                query.order_by(Expr::cust("COALESCE(price, 0)"), Order::Desc)
            }
        };

        query
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count published courses matching the catalog filters.
    pub async fn count_published(&self, filter: &CourseFilter) -> AppResult<u64> {
        Self::published_query(filter)
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find published courses sharing a category or level with the given
    /// sets, excluding the given course IDs.
    pub async fn find_published_similar(
        &self,
        categories: &[String],
        levels: &[CourseLevel],
        exclude_ids: &[String],
        limit: u64,
    ) -> AppResult<Vec<course::Model>> {
        if categories.is_empty() && levels.is_empty() {
            return Ok(vec![]);
        }

        let mut condition = Condition::any();
        if !categories.is_empty() {
            condition = condition.add(course::Column::Category.is_in(categories.to_vec()));
        }
        if !levels.is_empty() {
            condition = condition.add(course::Column::Level.is_in(levels.to_vec()));
        }

        let mut query = Course::find()
            .filter(course::Column::Status.eq(CourseStatus::Published))
            .filter(condition);

        if !exclude_ids.is_empty() {
            query = query.filter(course::Column::Id.is_not_in(exclude_ids.to_vec()));
        }

        query
            .order_by(
                Expr::cust("(SELECT COUNT(*) FROM enrollment WHERE enrollment.course_id = course.id)"),
                Order::Desc,
            )
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find courses owned by a user, most recently touched first.
    pub async fn find_by_owner(
        &self,
        user_id: &str,
        limit: u64,
        offset: u64,
    ) -> AppResult<Vec<course::Model>> {
        Course::find()
            .filter(course::Column::UserId.eq(user_id))
            .order_by(course::Column::UpdatedAt, Order::Desc)
            .order_by(course::Column::CreatedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find all courses owned by a user.
    pub async fn find_all_by_owner(&self, user_id: &str) -> AppResult<Vec<course::Model>> {
        Course::find()
            .filter(course::Column::UserId.eq(user_id))
            .order_by(course::Column::CreatedAt, Order::Desc)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count courses owned by a user.
    pub async fn count_by_owner(&self, user_id: &str) -> AppResult<u64> {
        Course::find()
            .filter(course::Column::UserId.eq(user_id))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Find courses of any status (admin listing), newest first.
    pub async fn find_all(&self, limit: u64, offset: u64) -> AppResult<Vec<course::Model>> {
        Course::find()
            .order_by(course::Column::CreatedAt, Order::Desc)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count all courses.
    pub async fn count(&self) -> AppResult<u64> {
        Course::find()
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count courses with the given status.
    pub async fn count_by_status(&self, status: CourseStatus) -> AppResult<u64> {
        Course::find()
            .filter(course::Column::Status.eq(status))
            .count(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create a new course. A duplicate slug surfaces as Conflict.
    pub async fn create(&self, model: course::ActiveModel) -> AppResult<course::Model> {
        model.insert(self.db.as_ref()).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                AppError::Conflict("Course slug already in use".to_string())
            }
            _ => AppError::Database(e.to_string()),
        })
    }

    /// Update a course.
    pub async fn update(&self, model: course::ActiveModel) -> AppResult<course::Model> {
        model
            .update(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Delete a course permanently. Chapters, lessons, enrollments and
    /// the rest of the owned rows go with it via FK cascades.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        Course::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    fn create_test_course(id: &str, user_id: &str, title: &str) -> course::Model {
        course::Model {
            id: id.to_string(),
            user_id: user_id.to_string(),
            title: title.to_string(),
            description: "A course".to_string(),
            small_description: "Short".to_string(),
            slug: title.to_lowercase().replace(' ', "-"),
            image_url: None,
            price: None,
            duration: 10,
            level: CourseLevel::Beginner,
            category: "Development".to_string(),
            status: CourseStatus::Published,
            requirements: serde_json::json!([]),
            what_you_will_learn: serde_json::json!([]),
            created_at: Utc::now().into(),
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn test_find_by_slug() {
        let course = create_test_course("c1", "u1", "Rust Basics");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[course]])
                .into_connection(),
        );

        let repo = CourseRepository::new(db);
        let result = repo.find_by_slug("rust-basics").await.unwrap();

        assert!(result.is_some());
        assert_eq!(result.unwrap().id, "c1");
    }

    #[tokio::test]
    async fn test_find_published_with_filters() {
        let c1 = create_test_course("c1", "u1", "Rust Basics");
        let c2 = create_test_course("c2", "u1", "Advanced Rust");

        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([[c1, c2]])
                .into_connection(),
        );

        let repo = CourseRepository::new(db);
        let filter = CourseFilter {
            category: Some("Development".to_string()),
            search: Some("Rust".to_string()),
            ..CourseFilter::default()
        };
        let result = repo
            .find_published(&filter, CourseSort::Newest, 10, 0)
            .await
            .unwrap();

        assert_eq!(result.len(), 2);
    }

    #[tokio::test]
    async fn test_find_published_similar_empty_input() {
        let db = Arc::new(MockDatabase::new(DatabaseBackend::Postgres).into_connection());

        let repo = CourseRepository::new(db);
        let result = repo.find_published_similar(&[], &[], &[], 10).await.unwrap();

        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_delete() {
        let db = Arc::new(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_exec_results([MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                }])
                .into_connection(),
        );

        let repo = CourseRepository::new(db);
        let result = repo.delete("c1").await;

        assert!(result.is_ok());
    }
}
