use std::str::FromStr;

use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{NewProject, Project};

/// Orderings offered to clients of the project listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ProjectSort {
    /// Creation order, oldest first.
    #[default]
    Created,
    /// Most backers first.
    Trending,
    /// Campaigns closing soonest first; open-ended ones last.
    Ending,
    /// Highest share of the goal pledged first.
    Funded,
}

impl ProjectSort {
    fn order_by(self) -> &'static str {
        match self {
            ProjectSort::Created => "created_at ASC, id ASC",
            ProjectSort::Trending => "backers DESC, created_at ASC, id ASC",
            ProjectSort::Ending => "ends_on ASC NULLS LAST, created_at ASC, id ASC",
            ProjectSort::Funded => {
                "CASE WHEN goal_amount > 0 THEN LEAST(funded_amount::float8 / goal_amount, 1.0) ELSE 0 END DESC, \
                 created_at ASC, id ASC"
            }
        }
    }
}

impl FromStr for ProjectSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(ProjectSort::Created),
            "trending" => Ok(ProjectSort::Trending),
            "ending" => Ok(ProjectSort::Ending),
            "funded" => Ok(ProjectSort::Funded),
            other => Err(format!(
                "Unknown sort '{other}', expected one of: created, trending, ending, funded"
            )),
        }
    }
}

/// Every project, oldest first.
pub async fn list_all(pool: &PgPool) -> Result<Vec<Project>, sqlx::Error> {
    list(pool, None, ProjectSort::Created).await
}

/// Projects in one category (all when `None`), in the requested order.
pub async fn list(
    pool: &PgPool,
    category: Option<&str>,
    sort: ProjectSort,
) -> Result<Vec<Project>, sqlx::Error> {
    // No stored category can contain NUL, and Postgres rejects it as a parameter.
    if category.is_some_and(|c| c.contains('\0')) {
        return Ok(Vec::new());
    }
    let sql = format!(
        "SELECT * FROM projects WHERE $1::text IS NULL OR category = $1 ORDER BY {}",
        sort.order_by()
    );
    sqlx::query_as::<_, Project>(&sql)
        .bind(category)
        .fetch_all(pool)
        .await
}

/// Distinct non-empty categories, alphabetical.
pub async fn categories(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT DISTINCT category FROM projects WHERE category <> '' ORDER BY category",
    )
    .fetch_all(pool)
    .await
}

pub async fn create(
    pool: &PgPool,
    project: &NewProject,
    image: Option<&str>,
) -> Result<Project, sqlx::Error> {
    let campaign = &project.campaign;
    sqlx::query_as::<_, Project>(
        "INSERT INTO projects
            (id, title, description, image, category, funded_amount, goal_amount, backers, ends_on, featured)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(&project.title)
    .bind(&project.description)
    .bind(image)
    .bind(&campaign.category)
    .bind(campaign.funded_amount)
    .bind(campaign.goal_amount)
    .bind(campaign.backers)
    .bind(campaign.ends_on)
    .bind(campaign.featured)
    .fetch_one(pool)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn update(
    pool: &PgPool,
    id: Uuid,
    project: &NewProject,
    image: Option<&str>,
) -> Result<Project, sqlx::Error> {
    let campaign = &project.campaign;
    sqlx::query_as::<_, Project>(
        "UPDATE projects SET
            title = $2, description = $3, image = $4, category = $5, funded_amount = $6,
            goal_amount = $7, backers = $8, ends_on = $9, featured = $10, updated_at = now()
         WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&project.title)
    .bind(&project.description)
    .bind(image)
    .bind(&campaign.category)
    .bind(campaign.funded_amount)
    .bind(campaign.goal_amount)
    .bind(campaign.backers)
    .bind(campaign.ends_on)
    .bind(campaign.featured)
    .fetch_one(pool)
    .await
}

/// Returns whether a row was deleted.
pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM projects WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Case-insensitive substring search over title, description and category, newest first.
pub async fn search(
    pool: &PgPool,
    query: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "SELECT * FROM projects
         WHERE $1::text IS NULL
            OR title ILIKE $1 ESCAPE '\\'
            OR description ILIKE $1 ESCAPE '\\'
            OR category ILIKE $1 ESCAPE '\\'
         ORDER BY created_at DESC, id DESC
         LIMIT $2 OFFSET $3",
    )
    .bind(query.map(like_pattern))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn count_matching(pool: &PgPool, query: Option<&str>) -> Result<i64, sqlx::Error> {
    let row: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM projects
         WHERE $1::text IS NULL
            OR title ILIKE $1 ESCAPE '\\'
            OR description ILIKE $1 ESCAPE '\\'
            OR category ILIKE $1 ESCAPE '\\'",
    )
    .bind(query.map(like_pattern))
    .fetch_one(pool)
    .await?;
    Ok(row.0)
}

fn like_pattern(query: &str) -> String {
    let escaped = query
        .replace('\0', "")
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}
