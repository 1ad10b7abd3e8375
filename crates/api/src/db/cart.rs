//! Cart repository for database operations.

use axle_core::{CartLine, CartRow, CartRowId, CartUpsert, ProductId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::MySqlPool;

use super::RepositoryError;

const SELECT_COLUMNS: &str = "id, user_id, product_id, name, price, image, category, quantity, \
                              created_at, updated_at";

/// Row as stored in `cart_items`.
#[derive(Debug, sqlx::FromRow)]
struct CartItemRecord {
    id: i64,
    user_id: String,
    product_id: String,
    name: String,
    price: Decimal,
    image: Option<String>,
    category: Option<String>,
    quantity: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartItemRecord> for CartRow {
    fn from(r: CartItemRecord) -> Self {
        Self {
            id: CartRowId::new(r.id),
            user_id: UserId::new(r.user_id),
            product_id: ProductId::new(r.product_id),
            name: r.name,
            price: r.price,
            image: r.image,
            category: r.category,
            quantity: r.quantity,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a MySqlPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a MySqlPool) -> Self {
        Self { pool }
    }

    /// All rows for a user, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn rows_for_user(&self, user: &UserId) -> Result<Vec<CartRow>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartItemRecord>(&format!(
            "SELECT {SELECT_COLUMNS} FROM cart_items WHERE user_id = ? ORDER BY created_at ASC, id ASC"
        ))
        .bind(user.as_str())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Add a product to a user's cart, or increment the existing row.
    /// Returns the resulting row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the upsert or re-read fails.
    pub async fn upsert(&self, req: &CartUpsert) -> Result<CartRow, RepositoryError> {
        sqlx::query(
            "INSERT INTO cart_items (user_id, product_id, name, price, image, category, quantity) \
             VALUES (?, ?, ?, ?, ?, ?, ?) \
             ON DUPLICATE KEY UPDATE quantity = quantity + VALUES(quantity)",
        )
        .bind(req.user_id.as_str())
        .bind(req.product_id.as_str())
        .bind(&req.name)
        .bind(req.price)
        .bind(req.image.as_deref())
        .bind(req.category.as_deref())
        .bind(req.quantity)
        .execute(self.pool)
        .await?;

        let row = sqlx::query_as::<_, CartItemRecord>(&format!(
            "SELECT {SELECT_COLUMNS} FROM cart_items WHERE user_id = ? AND product_id = ?"
        ))
        .bind(req.user_id.as_str())
        .bind(req.product_id.as_str())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Set a row's quantity. Returns `false` when the row does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn update_quantity(
        &self,
        row: CartRowId,
        quantity: u32,
    ) -> Result<bool, RepositoryError> {
        // Existence is checked separately: MySQL reports zero affected rows
        // for an UPDATE that leaves the value unchanged.
        let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM cart_items WHERE id = ?")
            .bind(row.as_i64())
            .fetch_optional(self.pool)
            .await?;
        if exists.is_none() {
            return Ok(false);
        }

        sqlx::query("UPDATE cart_items SET quantity = ? WHERE id = ?")
            .bind(quantity)
            .bind(row.as_i64())
            .execute(self.pool)
            .await?;

        Ok(true)
    }

    /// Delete one row. Returns `false` when the row does not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete_row(&self, row: CartRowId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE id = ?")
            .bind(row.as_i64())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Delete every row belonging to a user. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn clear_user(&self, user: &UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = ?")
            .bind(user.as_str())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Replace a user's entire cart with the given lines, atomically.
    ///
    /// Zero-quantity lines are skipped - they must not exist as rows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any statement fails; the
    /// transaction rolls back and the previous cart stays intact.
    pub async fn replace_all(
        &self,
        user: &UserId,
        lines: &[CartLine],
    ) -> Result<Vec<CartRow>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM cart_items WHERE user_id = ?")
            .bind(user.as_str())
            .execute(&mut *tx)
            .await?;

        for line in lines.iter().filter(|l| l.quantity > 0) {
            sqlx::query(
                "INSERT INTO cart_items (user_id, product_id, name, price, image, category, quantity) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(user.as_str())
            .bind(line.product_id.as_str())
            .bind(&line.name)
            .bind(line.price)
            .bind(line.image.as_deref())
            .bind(line.category.as_deref())
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        self.rows_for_user(user).await
    }
}
