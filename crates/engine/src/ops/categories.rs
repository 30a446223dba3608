use std::collections::HashMap;

use sea_orm::{
    ActiveModelTrait, ActiveValue, Condition, ConnectionTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Category, CategoryKind, CategoryUpdate, CategoryUsage, EngineError, NewCategoryCmd,
    ResultEngine, TenantScope, categories, entries,
    util::{normalize_optional_text, normalize_required_name, require_name_key},
};

use super::{Engine, with_tx};

impl Engine {
    pub async fn new_category(
        &self,
        scope: &TenantScope,
        cmd: NewCategoryCmd,
    ) -> ResultEngine<Category> {
        let name = normalize_required_name(&cmd.name, "category")?;
        let name_norm = require_name_key(&name, "category")?;
        with_tx!(self, |db_tx| {
            self.ensure_category_name_free(&db_tx, scope, cmd.kind, &name_norm, None)
                .await?;
            let model = categories::ActiveModel {
                id: ActiveValue::Set(Uuid::new_v4().to_string()),
                tenant_id: ActiveValue::Set(scope.tenant_key()),
                owner_id: ActiveValue::Set(scope.owner_key()),
                kind: ActiveValue::Set(cmd.kind.as_str().to_string()),
                name: ActiveValue::Set(name),
                name_norm: ActiveValue::Set(name_norm),
                color: ActiveValue::Set(normalize_optional_text(cmd.color.as_deref())),
                icon: ActiveValue::Set(normalize_optional_text(cmd.icon.as_deref())),
            }
            .insert(&db_tx)
            .await?;
            Category::try_from(model)
        })
    }

    pub async fn update_category(
        &self,
        scope: &TenantScope,
        category_id: Uuid,
        update: CategoryUpdate,
    ) -> ResultEngine<Category> {
        with_tx!(self, |db_tx| {
            let model = self.require_category(&db_tx, scope, category_id).await?;
            let current_kind = CategoryKind::try_from(model.kind.as_str())?;
            let kind = update.kind.unwrap_or(current_kind);
            if kind != current_kind {
                let used = self.category_usage(&db_tx, scope, category_id).await?;
                if used > 0 {
                    return Err(EngineError::Conflict(format!(
                        "cannot change the kind of category {}: it is used in {used} entries",
                        model.name
                    )));
                }
            }

            let name = match update.name.as_deref() {
                Some(name) => normalize_required_name(name, "category")?,
                None => model.name.clone(),
            };
            let name_norm = require_name_key(&name, "category")?;
            if kind != current_kind || name_norm != model.name_norm {
                self.ensure_category_name_free(&db_tx, scope, kind, &name_norm, Some(category_id))
                    .await?;
            }

            let mut active: categories::ActiveModel = model.into();
            active.kind = ActiveValue::Set(kind.as_str().to_string());
            active.name = ActiveValue::Set(name);
            active.name_norm = ActiveValue::Set(name_norm);
            if let Some(color) = update.color.as_deref() {
                active.color = ActiveValue::Set(normalize_optional_text(Some(color)));
            }
            if let Some(icon) = update.icon.as_deref() {
                active.icon = ActiveValue::Set(normalize_optional_text(Some(icon)));
            }
            let model = active.update(&db_tx).await?;
            Category::try_from(model)
        })
    }

    pub async fn category(&self, scope: &TenantScope, category_id: Uuid) -> ResultEngine<Category> {
        let model = self
            .require_category(&self.database, scope, category_id)
            .await?;
        Category::try_from(model)
    }

    /// Categories ordered by name, each with the number of entries using it.
    pub async fn list_categories(
        &self,
        scope: &TenantScope,
        kind: Option<CategoryKind>,
    ) -> ResultEngine<Vec<CategoryUsage>> {
        let mut query = categories::Entity::find()
            .filter(categories::Column::TenantId.eq(scope.tenant_key()))
            .filter(categories::Column::OwnerId.eq(scope.owner_key()));
        if let Some(kind) = kind {
            query = query.filter(categories::Column::Kind.eq(kind.as_str()));
        }
        let models = query
            .order_by_asc(categories::Column::NameNorm)
            .all(&self.database)
            .await?;

        let counts: HashMap<String, i64> = entries::Entity::find()
            .select_only()
            .column(entries::Column::CategoryId)
            .column_as(Expr::col(entries::Column::Id).count(), "entries")
            .filter(entries::Column::TenantId.eq(scope.tenant_key()))
            .filter(entries::Column::OwnerId.eq(scope.owner_key()))
            .filter(entries::Column::CategoryId.is_not_null())
            .group_by(entries::Column::CategoryId)
            .into_tuple::<(Option<String>, i64)>()
            .all(&self.database)
            .await?
            .into_iter()
            .filter_map(|(id, n)| id.map(|id| (id, n)))
            .collect();

        models
            .into_iter()
            .map(|model| {
                let used = counts.get(&model.id).copied().unwrap_or(0);
                Ok(CategoryUsage {
                    category: Category::try_from(model)?,
                    entries: u64::try_from(used).unwrap_or(0),
                })
            })
            .collect()
    }

    /// Delete a category no entry is filed under.
    pub async fn delete_category(&self, scope: &TenantScope, category_id: Uuid) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = self.require_category(&db_tx, scope, category_id).await?;
            let used = self.category_usage(&db_tx, scope, category_id).await?;
            if used > 0 {
                return Err(EngineError::Conflict(format!(
                    "cannot delete category {}: it is used in {used} entries",
                    model.name
                )));
            }
            model.delete(&db_tx).await?;
            tracing::info!(category = %category_id, "category deleted");
            Ok(())
        })
    }

    async fn category_usage<C: ConnectionTrait>(
        &self,
        db: &C,
        scope: &TenantScope,
        category_id: Uuid,
    ) -> ResultEngine<u64> {
        self.count_entries_where(
            db,
            scope,
            Condition::all().add(entries::Column::CategoryId.eq(category_id.to_string())),
        )
        .await
    }

    async fn ensure_category_name_free<C: ConnectionTrait>(
        &self,
        db: &C,
        scope: &TenantScope,
        kind: CategoryKind,
        name_norm: &str,
        except: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = categories::Entity::find()
            .filter(categories::Column::TenantId.eq(scope.tenant_key()))
            .filter(categories::Column::OwnerId.eq(scope.owner_key()))
            .filter(categories::Column::Kind.eq(kind.as_str()))
            .filter(categories::Column::NameNorm.eq(name_norm));
        if let Some(except) = except {
            query = query.filter(categories::Column::Id.ne(except.to_string()));
        }
        if let Some(existing) = query.one(db).await? {
            return Err(EngineError::ExistingKey(existing.name));
        }
        Ok(())
    }
}
