//! Activity board service.

use std::str::FromStr;

use alumni_common::{AppError, AppResult, IdGenerator};
use alumni_db::{
    entities::activity,
    repositories::{ActivityOrder, ActivityRepository},
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::Set;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;
use validator::Validate;

/// Activities per page.
pub const PAGE_SIZE: u64 = 6;

/// Sort order requested by the board.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActivitySort {
    #[default]
    DateDesc,
    DateAsc,
    Title,
}

impl FromStr for ActivitySort {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "date_desc" => Ok(Self::DateDesc),
            "date_asc" => Ok(Self::DateAsc),
            "title" => Ok(Self::Title),
            other => Err(AppError::BadRequest(format!("Unknown sort order: {other}"))),
        }
    }
}

impl From<ActivitySort> for ActivityOrder {
    fn from(sort: ActivitySort) -> Self {
        match sort {
            ActivitySort::DateDesc => Self::DateDesc,
            ActivitySort::DateAsc => Self::DateAsc,
            ActivitySort::Title => Self::Title,
        }
    }
}

/// Listing parameters.
#[derive(Debug, Clone, Default)]
pub struct ListActivitiesInput {
    pub query: Option<String>,
    pub sort: ActivitySort,
    /// 1-based; 0 is read as 1.
    pub page: u64,
}

/// One page of the board.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPage {
    pub items: Vec<activity::Model>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateActivityInput {
    #[validate(length(min = 1, max = 200))]
    pub title: String,

    #[validate(length(min = 1, max = 10000))]
    pub description: String,

    /// `YYYY-MM-DD` or RFC 3339.
    pub date: String,

    #[validate(url)]
    pub image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateActivityInput {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,

    #[validate(length(min = 1, max = 10000))]
    pub description: Option<String>,

    pub date: Option<String>,

    /// `null` clears the image.
    #[serde(default, deserialize_with = "nullable")]
    #[validate(url)]
    pub image_url: Option<Option<String>>,
}

fn nullable<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// Parse a calendar date given as `YYYY-MM-DD` or as an RFC 3339 timestamp.
pub fn parse_date(value: &str) -> AppResult<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
        .map_err(|_| AppError::Validation(format!("Invalid date: {value}")))
}

/// Number of pages needed for `total` items.
#[must_use]
pub const fn total_pages(total: u64) -> u64 {
    total.div_ceil(PAGE_SIZE)
}

/// Service for the activity board.
#[derive(Clone)]
pub struct ActivityService {
    activity_repo: ActivityRepository,
    id_gen: IdGenerator,
}

impl ActivityService {
    /// Create a new activity service.
    #[must_use]
    pub const fn new(activity_repo: ActivityRepository) -> Self {
        Self {
            activity_repo,
            id_gen: IdGenerator::new(),
        }
    }

    /// Search, sort and paginate the board.
    pub async fn list(&self, input: ListActivitiesInput) -> AppResult<ActivityPage> {
        let page = input.page.max(1);
        let query = input.query.as_deref();

        let total = self.activity_repo.count(query).await?;
        let pages = total_pages(total);

        // Past the last page: nothing to fetch.
        let items = if page > pages {
            Vec::new()
        } else {
            self.activity_repo
                .search(
                    query,
                    input.sort.into(),
                    PAGE_SIZE,
                    (page - 1).saturating_mul(PAGE_SIZE),
                )
                .await?
        };

        Ok(ActivityPage {
            items,
            page,
            page_size: PAGE_SIZE,
            total,
            total_pages: pages,
        })
    }

    /// Get an activity by ID.
    pub async fn get(&self, id: &str) -> AppResult<activity::Model> {
        self.activity_repo.get_by_id(id).await
    }

    /// Publish an activity.
    pub async fn create(
        &self,
        author_id: &str,
        input: CreateActivityInput,
    ) -> AppResult<activity::Model> {
        input.validate()?;
        let date = parse_date(&input.date)?;

        let activity = self
            .activity_repo
            .create(activity::ActiveModel {
                id: Set(self.id_gen.generate()),
                title: Set(input.title.trim().to_string()),
                description: Set(input.description),
                date: Set(date),
                image_url: Set(input.image_url.filter(|url| !url.trim().is_empty())),
                created_by: Set(Some(author_id.to_string())),
                created_at: Set(Utc::now()),
                updated_at: Set(None),
            })
            .await?;

        info!(activity_id = %activity.id, "Activity created");
        Ok(activity)
    }

    /// Apply a partial update.
    pub async fn update(&self, id: &str, input: UpdateActivityInput) -> AppResult<activity::Model> {
        input.validate()?;
        let date = input.date.as_deref().map(parse_date).transpose()?;

        let activity = self.activity_repo.get_by_id(id).await?;
        let mut active: activity::ActiveModel = activity.into();

        if let Some(title) = input.title {
            active.title = Set(title.trim().to_string());
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(date) = date {
            active.date = Set(date);
        }
        if let Some(image_url) = input.image_url {
            active.image_url = Set(image_url.filter(|url| !url.trim().is_empty()));
        }

        active.updated_at = Set(Some(Utc::now()));

        let activity = self.activity_repo.update(active).await?;
        info!(activity_id = %activity.id, "Activity updated");
        Ok(activity)
    }

    /// Delete an activity.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        if !self.activity_repo.delete(id).await? {
            return Err(AppError::NotFound(format!("Activity not found: {id}")));
        }

        info!(activity_id = %id, "Activity deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, DatabaseConnection, MockDatabase, MockExecResult};
    use std::sync::Arc;

    fn create_mock_activity(id: &str, day: u32) -> activity::Model {
        activity::Model {
            id: id.to_string(),
            title: format!("Activity {id}"),
            description: "Alumni gathering".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 5, day).unwrap(),
            image_url: None,
            created_by: Some("admin1".to_string()),
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    fn total_rows(n: i64) -> std::collections::BTreeMap<&'static str, sea_orm::Value> {
        maplit::btreemap! {
            "num_items" => sea_orm::Value::BigInt(Some(n))
        }
    }

    fn create_test_service(db: DatabaseConnection) -> ActivityService {
        ActivityService::new(ActivityRepository::new(Arc::new(db)))
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();

        assert_eq!(parse_date("2025-03-14").unwrap(), expected);
        assert_eq!(parse_date("2025-03-14T09:30:00Z").unwrap(), expected);
        assert_eq!(parse_date("2025-03-14T23:30:00+02:00").unwrap(), expected);
        assert!(matches!(parse_date("14/03/2025"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0), 0);
        assert_eq!(total_pages(6), 1);
        assert_eq!(total_pages(7), 2);
        assert_eq!(total_pages(13), 3);
    }

    #[test]
    fn test_sort_parsing() {
        assert_eq!("date_desc".parse::<ActivitySort>().unwrap(), ActivitySort::DateDesc);
        assert_eq!("date_asc".parse::<ActivitySort>().unwrap(), ActivitySort::DateAsc);
        assert_eq!("title".parse::<ActivitySort>().unwrap(), ActivitySort::Title);
        assert!(matches!(
            "random".parse::<ActivitySort>(),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_update_input_distinguishes_null_from_missing() {
        let cleared: UpdateActivityInput =
            serde_json::from_value(serde_json::json!({ "imageUrl": null })).unwrap();
        assert_eq!(cleared.image_url, Some(None));

        let untouched: UpdateActivityInput =
            serde_json::from_value(serde_json::json!({ "title": "Gala" })).unwrap();
        assert_eq!(untouched.image_url, None);
    }

    #[tokio::test]
    async fn test_list_page_zero_reads_as_first_page() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[total_rows(8)]])
            .append_query_results([(1..=6).map(|d| create_mock_activity(&format!("a{d}"), d))])
            .into_connection();

        let service = create_test_service(db);
        let page = service
            .list(ListActivitiesInput {
                page: 0,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.page, 1);
        assert_eq!(page.page_size, 6);
        assert_eq!(page.items.len(), 6);
        assert_eq!(page.total, 8);
        assert_eq!(page.total_pages, 2);
    }

    #[tokio::test]
    async fn test_list_huge_page_is_empty() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[total_rows(3)]])
            .into_connection();

        let service = create_test_service(db);
        let page = service
            .list(ListActivitiesInput {
                page: u64::MAX,
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(page.page, u64::MAX);
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_bad_date() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let service = create_test_service(db);

        let result = service
            .create(
                "admin1",
                CreateActivityInput {
                    title: "Gala".to_string(),
                    description: "Annual gala".to_string(),
                    date: "next friday".to_string(),
                    image_url: None,
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_activity() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[create_mock_activity("a1", 14)]])
            .into_connection();

        let service = create_test_service(db);
        let activity = service
            .create(
                "admin1",
                CreateActivityInput {
                    title: "Activity a1".to_string(),
                    description: "Alumni gathering".to_string(),
                    date: "2025-05-14".to_string(),
                    image_url: Some("https://example.com/gala.png".to_string()),
                },
            )
            .await
            .unwrap();

        assert_eq!(activity.id, "a1");
        assert_eq!(serde_json::to_value(&activity).unwrap()["date"], "2025-05-14");
    }

    #[tokio::test]
    async fn test_update_missing_activity() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<activity::Model>::new()])
            .into_connection();

        let service = create_test_service(db);
        let result = service
            .update(
                "missing",
                UpdateActivityInput {
                    title: Some("New title".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_missing_activity() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let service = create_test_service(db);
        assert!(matches!(
            service.delete("missing").await,
            Err(AppError::NotFound(_))
        ));
    }
}
