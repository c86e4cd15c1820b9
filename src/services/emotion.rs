use crate::{
    error::{AppError, AppResult},
    models::{emotion, Emotion, EmotionModel},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, ModelTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr,
};

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Default, Clone)]
pub struct EmotionChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub avatar: Option<String>,
}

pub struct EmotionService {
    db: DatabaseConnection,
}

impl EmotionService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Live emotions ordered by name.
    pub async fn list(&self, page: u64, per_page: u64) -> AppResult<(Vec<EmotionModel>, u64)> {
        let paginator = Emotion::find()
            .filter(emotion::Column::DeletedAt.is_null())
            .order_by_asc(emotion::Column::Name)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    /// Soft-deleted emotions, most recently deleted first.
    pub async fn list_trashed(
        &self,
        page: u64,
        per_page: u64,
    ) -> AppResult<(Vec<EmotionModel>, u64)> {
        let paginator = Emotion::find()
            .filter(emotion::Column::DeletedAt.is_not_null())
            .order_by_desc(emotion::Column::DeletedAt)
            .paginate(&self.db, per_page);

        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    pub async fn get(&self, id: i32) -> AppResult<EmotionModel> {
        Emotion::find_by_id(id)
            .filter(emotion::Column::DeletedAt.is_null())
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)
    }

    pub async fn create(
        &self,
        name: &str,
        description: Option<String>,
        avatar: Option<String>,
    ) -> AppResult<EmotionModel> {
        let name = normalize_name(name)?;
        self.ensure_name_available(&name, None).await?;

        let now = chrono::Utc::now().naive_utc();
        let model = emotion::ActiveModel {
            name: Set(name),
            description: Set(description),
            avatar: Set(avatar),
            created_at: Set(now),
            updated_at: Set(now),
            deleted_at: Set(None),
            ..Default::default()
        };

        let created = model.insert(&self.db).await.map_err(name_taken)?;
        tracing::info!(emotion_id = created.id, name = %created.name, "Emotion created");
        Ok(created)
    }

    pub async fn update(&self, id: i32, changes: EmotionChanges) -> AppResult<EmotionModel> {
        let existing = self.get(id).await?;
        let mut active: emotion::ActiveModel = existing.into();

        if let Some(name) = changes.name {
            let name = normalize_name(&name)?;
            self.ensure_name_available(&name, Some(id)).await?;
            active.name = Set(name);
        }
        if let Some(description) = changes.description {
            active.description = Set(Some(description));
        }
        if let Some(avatar) = changes.avatar {
            active.avatar = Set(Some(avatar));
        }
        active.updated_at = Set(chrono::Utc::now().naive_utc());

        Ok(active.update(&self.db).await.map_err(name_taken)?)
    }

    pub async fn soft_delete(&self, id: i32) -> AppResult<EmotionModel> {
        let existing = self.get(id).await?;
        let now = chrono::Utc::now().naive_utc();

        let mut active: emotion::ActiveModel = existing.into();
        active.deleted_at = Set(Some(now));
        active.updated_at = Set(now);

        let deleted = active.update(&self.db).await?;
        tracing::info!(emotion_id = id, "Emotion soft-deleted");
        Ok(deleted)
    }

    pub async fn restore(&self, id: i32) -> AppResult<EmotionModel> {
        let trashed = Emotion::find_by_id(id)
            .filter(emotion::Column::DeletedAt.is_not_null())
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        // A live emotion may have taken the name in the meantime.
        self.ensure_name_available(&trashed.name, Some(id)).await?;

        let mut active: emotion::ActiveModel = trashed.into();
        active.deleted_at = Set(None);
        active.updated_at = Set(chrono::Utc::now().naive_utc());

        let restored = active.update(&self.db).await.map_err(name_taken)?;
        tracing::info!(emotion_id = id, "Emotion restored");
        Ok(restored)
    }

    /// Permanently delete, trashed or not. Reactions using it cascade away.
    pub async fn force_delete(&self, id: i32) -> AppResult<EmotionModel> {
        let existing = Emotion::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or(AppError::NotFound)?;

        existing.clone().delete(&self.db).await?;
        tracing::info!(emotion_id = id, "Emotion permanently deleted");
        Ok(existing)
    }

    async fn ensure_name_available(&self, name: &str, except: Option<i32>) -> AppResult<()> {
        let mut query = Emotion::find()
            .filter(emotion::Column::Name.eq(name))
            .filter(emotion::Column::DeletedAt.is_null());
        if let Some(id) = except {
            query = query.filter(emotion::Column::Id.ne(id));
        }

        if query.count(&self.db).await? > 0 {
            return Err(name_conflict());
        }
        Ok(())
    }
}

fn name_conflict() -> AppError {
    AppError::Conflict("Emotion name already exists".to_string())
}

/// A concurrent writer can take the name between the check and the write;
/// the live-name unique index then rejects it.
fn name_taken(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => name_conflict(),
        _ => err.into(),
    }
}

fn normalize_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::Validation(
            "Emotion name cannot be empty".to_string(),
        ));
    }
    Ok(name.to_string())
}
