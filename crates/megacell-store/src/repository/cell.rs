//! # Cell Repository
//!
//! Database operations for cells.
//!
//! A cell is split over two tables: `cells` holds what the host configures
//! (variant, tier, partition, upgrade flags) and `cell_fields` holds the
//! 32-bit fields the accountants persist. Fields are replaced wholesale on
//! save so keys an accountant removed disappear from the table too.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use megacell_core::{
    open_cell, Cell, CellInventory, CellKind, CellVariant, CoreResult, Host, PartitionConfig,
    TagRecord, UpgradeFlags,
};

use crate::error::{StoreError, StoreResult};

// =============================================================================
// Stored Cell
// =============================================================================

/// A cell together with its database identity.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredCell {
    pub id: String,
    pub label: String,
    pub variant: CellVariant,
    pub cell: Cell<TagRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredCell {
    /// A blank cell with a fresh UUID v4 id.
    pub fn new(label: impl Into<String>, variant: CellVariant, tier: usize) -> Self {
        let now = Utc::now();
        StoredCell {
            id: Uuid::new_v4().to_string(),
            label: label.into(),
            variant,
            cell: Cell::new(tier),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_partition(mut self, partition: PartitionConfig) -> Self {
        self.cell.partition = partition;
        self
    }

    pub fn with_upgrades(mut self, upgrades: UpgradeFlags) -> Self {
        self.cell.upgrades = upgrades;
        self
    }

    /// Opens the accountant for this cell's variant.
    pub fn open<'a>(
        &'a mut self,
        kind: &'a CellKind,
        host: Host<'a>,
    ) -> CoreResult<Box<dyn CellInventory + 'a>> {
        open_cell(self.variant, &mut self.cell, kind, host)
    }
}

#[derive(Debug, FromRow)]
struct CellRow {
    id: String,
    label: String,
    variant: String,
    tier: i64,
    partition: String,
    fuzzy: bool,
    inverted: bool,
    overflow_void: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CellRow {
    fn into_stored(self, record: TagRecord) -> StoreResult<StoredCell> {
        let variant: CellVariant = self
            .variant
            .parse()
            .map_err(|reason: String| StoreError::invalid_row("cells", &self.id, reason))?;
        let tier = usize::try_from(self.tier)
            .map_err(|_| StoreError::invalid_row("cells", &self.id, "negative tier"))?;
        let partition: PartitionConfig = serde_json::from_str(&self.partition)
            .map_err(|e| StoreError::invalid_row("cells", &self.id, e.to_string()))?;

        let cell = Cell::with_record(tier, record)
            .with_partition(partition)
            .with_upgrades(UpgradeFlags {
                fuzzy: self.fuzzy,
                inverted: self.inverted,
                overflow_void: self.overflow_void,
            });

        Ok(StoredCell {
            id: self.id,
            label: self.label,
            variant,
            cell,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_CELL: &str = r#"
    SELECT id, label, variant, tier, partition, fuzzy, inverted, overflow_void,
           created_at, updated_at
    FROM cells
"#;

// =============================================================================
// Repository
// =============================================================================

/// Repository for cell database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.cells();
/// let mut stored = StoredCell::new("ores", CellVariant::Direct, 0);
/// repo.insert(&stored).await?;
///
/// stored.open(&kind, host)?.inject(what, Actionable::Modulate);
/// repo.save(&mut stored).await?;
/// ```
#[derive(Debug, Clone)]
pub struct CellRepository {
    pool: SqlitePool,
}

impl CellRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CellRepository { pool }
    }

    /// Inserts a new cell and its fields.
    pub async fn insert(&self, stored: &StoredCell) -> StoreResult<()> {
        let partition = serde_json::to_string(&stored.cell.partition)?;
        let upgrades = stored.cell.upgrades;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO cells (
                id, label, variant, tier, partition, fuzzy, inverted, overflow_void,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.label)
        .bind(stored.variant.to_string())
        .bind(tier_column(stored.cell.tier))
        .bind(&partition)
        .bind(upgrades.fuzzy)
        .bind(upgrades.inverted)
        .bind(upgrades.overflow_void)
        .bind(stored.created_at)
        .bind(stored.updated_at)
        .execute(&mut *tx)
        .await?;

        for (field, value) in stored.cell.record.iter() {
            insert_field(&mut tx, &stored.id, field, value).await?;
        }

        tx.commit().await?;

        debug!(
            id = %stored.id,
            variant = %stored.variant,
            fields = stored.cell.record.len(),
            "Inserted cell"
        );
        Ok(())
    }

    /// Gets a cell by id.
    ///
    /// ## Returns
    /// * `Ok(Some(StoredCell))` - Cell found
    /// * `Ok(None)` - No such cell
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<StoredCell>> {
        let query = format!("{SELECT_CELL} WHERE id = ?1");
        let row: Option<CellRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let record = self.load_fields(&row.id).await?;
                row.into_stored(record).map(Some)
            }
            None => Ok(None),
        }
    }

    /// Like [`get_by_id`](Self::get_by_id), but a missing cell is an error.
    pub async fn load(&self, id: &str) -> StoreResult<StoredCell> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| StoreError::not_found("Cell", id))
    }

    /// Writes back a cell's configuration and replaces its fields.
    ///
    /// Bumps `updated_at` on the passed cell.
    pub async fn save(&self, stored: &mut StoredCell) -> StoreResult<()> {
        let partition = serde_json::to_string(&stored.cell.partition)?;
        let upgrades = stored.cell.upgrades;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE cells
            SET label = ?2, variant = ?3, tier = ?4, partition = ?5,
                fuzzy = ?6, inverted = ?7, overflow_void = ?8, updated_at = ?9
            WHERE id = ?1
            "#,
        )
        .bind(&stored.id)
        .bind(&stored.label)
        .bind(stored.variant.to_string())
        .bind(tier_column(stored.cell.tier))
        .bind(&partition)
        .bind(upgrades.fuzzy)
        .bind(upgrades.inverted)
        .bind(upgrades.overflow_void)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("Cell", &stored.id));
        }

        sqlx::query("DELETE FROM cell_fields WHERE cell_id = ?1")
            .bind(&stored.id)
            .execute(&mut *tx)
            .await?;

        for (field, value) in stored.cell.record.iter() {
            insert_field(&mut tx, &stored.id, field, value).await?;
        }

        tx.commit().await?;
        stored.updated_at = now;

        debug!(id = %stored.id, fields = stored.cell.record.len(), "Saved cell");
        Ok(())
    }

    /// Deletes a cell; its fields go with it.
    ///
    /// Returns `false` if there was no such cell.
    pub async fn delete(&self, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM cells WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        debug!(id = %id, deleted, "Deleted cell");
        Ok(deleted)
    }

    /// Lists cells, oldest first.
    pub async fn list(&self, limit: u32) -> StoreResult<Vec<StoredCell>> {
        let query = format!("{SELECT_CELL} ORDER BY created_at, id LIMIT ?1");
        let rows: Vec<CellRow> = sqlx::query_as(&query)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        let mut cells = Vec::with_capacity(rows.len());
        for row in rows {
            let record = self.load_fields(&row.id).await?;
            cells.push(row.into_stored(record)?);
        }
        Ok(cells)
    }

    pub async fn count(&self) -> StoreResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cells")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn load_fields(&self, cell_id: &str) -> StoreResult<TagRecord> {
        let rows: Vec<(String, i32)> =
            sqlx::query_as("SELECT field, value FROM cell_fields WHERE cell_id = ?1")
                .bind(cell_id)
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().collect())
    }
}

async fn insert_field(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    cell_id: &str,
    field: &str,
    value: i32,
) -> StoreResult<()> {
    sqlx::query("INSERT INTO cell_fields (cell_id, field, value) VALUES (?1, ?2, ?3)")
        .bind(cell_id)
        .bind(field)
        .bind(value)
        .execute(&mut **tx)
        .await?;
    Ok(())
}

fn tier_column(tier: usize) -> i64 {
    i64::try_from(tier).unwrap_or(i64::MAX)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use megacell_core::record::{read_u64, PersistedRecord};
    use megacell_core::{
        Actionable, CompressionRecipe, ItemChannel, ItemKey, KeyAmount, PartitionPolicy,
        RecipeDecomposer,
    };

    const COBBLE: ItemKey = ItemKey::new(4);
    const NUGGET: ItemKey = ItemKey::new(10);
    const INGOT: ItemKey = ItemKey::new(11);
    const BLOCK: ItemKey = ItemKey::new(12);

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_insert_and_load_roundtrip() {
        let db = db().await;
        let repo = db.cells();

        let mut stored = StoredCell::new("ores", CellVariant::Direct, 1)
            .with_partition(PartitionConfig::from_keys([COBBLE, ItemKey::new(u32::MAX)]))
            .with_upgrades(UpgradeFlags {
                inverted: true,
                ..Default::default()
            });
        stored.cell.record.put_int("types", 0);
        repo.insert(&stored).await.unwrap();

        let loaded = repo.load(&stored.id).await.unwrap();
        assert_eq!(loaded.label, "ores");
        assert_eq!(loaded.variant, CellVariant::Direct);
        assert_eq!(loaded.cell.tier, 1);
        assert_eq!(loaded.cell.partition, stored.cell.partition);
        assert!(loaded.cell.upgrades.inverted);
        assert_eq!(loaded.cell.record.get_int("types"), Some(0));
    }

    #[tokio::test]
    async fn test_missing_cell() {
        let db = db().await;
        let repo = db.cells();

        assert!(repo.get_by_id("nope").await.unwrap().is_none());
        assert!(matches!(
            repo.load("nope").await,
            Err(StoreError::NotFound { .. })
        ));

        let mut ghost = StoredCell::new("ghost", CellVariant::Direct, 0);
        assert!(matches!(
            repo.save(&mut ghost).await,
            Err(StoreError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_direct_cell_survives_save_and_reload() {
        let db = db().await;
        let repo = db.cells();
        let kind = CellKind::standard();
        let channel = ItemChannel::default();
        let policy = PartitionPolicy;

        let mut stored = StoredCell::new("bulk", CellVariant::Direct, 0);
        repo.insert(&stored).await.unwrap();

        {
            let mut inv = stored.open(&kind, Host::new(&channel, &policy)).unwrap();
            let huge = KeyAmount::new(COBBLE, 5_000_000_000_000);
            assert_eq!(inv.inject(huge, Actionable::Modulate), None);
        }
        repo.save(&mut stored).await.unwrap();

        let mut reloaded = repo.load(&stored.id).await.unwrap();
        assert_eq!(read_u64(&reloaded.cell.record, "type0Count"), 5_000_000_000_000);

        let inv = reloaded.open(&kind, Host::new(&channel, &policy)).unwrap();
        assert_eq!(inv.stored_quantity(COBBLE), 5_000_000_000_000);
    }

    #[tokio::test]
    async fn test_save_drops_removed_fields() {
        let db = db().await;
        let repo = db.cells();
        let kind = CellKind::standard();
        let channel = ItemChannel::default();
        let policy = PartitionPolicy;

        let mut stored = StoredCell::new("churn", CellVariant::Direct, 0);
        {
            let mut inv = stored.open(&kind, Host::new(&channel, &policy)).unwrap();
            inv.inject(KeyAmount::new(COBBLE, 10), Actionable::Modulate);
            inv.inject(KeyAmount::new(NUGGET, 10), Actionable::Modulate);
        }
        repo.insert(&stored).await.unwrap();

        {
            let mut inv = stored.open(&kind, Host::new(&channel, &policy)).unwrap();
            inv.extract(KeyAmount::new(NUGGET, 10), Actionable::Modulate);
        }
        repo.save(&mut stored).await.unwrap();

        let reloaded = repo.load(&stored.id).await.unwrap();
        assert_eq!(reloaded.cell.record, stored.cell.record);
        assert!(!reloaded.cell.record.contains("type1Key"));
    }

    #[tokio::test]
    async fn test_compacting_cell_keeps_chain() {
        let db = db().await;
        let repo = db.cells();
        let kind = CellKind::standard();
        let channel = ItemChannel::default();
        let policy = PartitionPolicy;
        let decomposer = RecipeDecomposer::from_recipes(&[
            CompressionRecipe::new(NUGGET, INGOT, 9),
            CompressionRecipe::new(INGOT, BLOCK, 9),
        ]);

        let mut stored = StoredCell::new("iron", CellVariant::Compacting, 0)
            .with_partition(PartitionConfig::from_keys([INGOT]));
        repo.insert(&stored).await.unwrap();
        {
            let host = Host::new(&channel, &policy).with_decomposer(&decomposer);
            let mut inv = stored.open(&kind, host).unwrap();
            assert_eq!(inv.inject(KeyAmount::new(BLOCK, 2), Actionable::Modulate), None);
        }
        repo.save(&mut stored).await.unwrap();

        // Reopen without a decomposer: the chain comes from the stored fields
        let mut reloaded = repo.load(&stored.id).await.unwrap();
        let inv = reloaded.open(&kind, Host::new(&channel, &policy)).unwrap();
        assert_eq!(inv.stored_quantity(NUGGET), 162);
        assert_eq!(inv.stored_quantity(INGOT), 18);
        assert_eq!(inv.report().stored_count, 18);
    }

    #[tokio::test]
    async fn test_delete_list_and_count() {
        let db = db().await;
        let repo = db.cells();

        let mut first = StoredCell::new("a", CellVariant::Direct, 0);
        first.cell.record.put_int("types", 0);
        let second = StoredCell::new("b", CellVariant::Compacting, 2);
        repo.insert(&first).await.unwrap();
        repo.insert(&second).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 2);
        assert_eq!(repo.list(10).await.unwrap().len(), 2);
        assert_eq!(repo.list(1).await.unwrap().len(), 1);

        assert!(repo.delete(&first.id).await.unwrap());
        assert!(!repo.delete(&first.id).await.unwrap());
        assert_eq!(repo.count().await.unwrap(), 1);

        let orphaned: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cell_fields WHERE cell_id = ?1")
            .bind(&first.id)
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(orphaned, 0);
    }

    #[tokio::test]
    async fn test_corrupt_row_is_reported() {
        let db = db().await;
        let repo = db.cells();
        let stored = StoredCell::new("bad", CellVariant::Direct, 0);
        repo.insert(&stored).await.unwrap();

        sqlx::query("UPDATE cells SET partition = 'not json' WHERE id = ?1")
            .bind(&stored.id)
            .execute(db.pool())
            .await
            .unwrap();

        assert!(matches!(
            repo.load(&stored.id).await,
            Err(StoreError::InvalidRow { .. })
        ));
    }
}
