use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: String, // generated by the database
    pub name: String,
    pub price: f64,
}

/// Client-supplied fields for create and update. No validation beyond JSON
/// decoding: absent fields take their zero value, and empty names or negative
/// prices are accepted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductRequest {
    pub name: String,
    pub price: f64,
}

impl Product {
    /// Lists every product
    pub async fn list(conn: &mut PgConnection) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT id::text AS id, name, price FROM products
            "#,
        )
        .fetch_all(conn)
        .await
    }

    /// Fetches exactly one product. A missing id is `sqlx::Error::RowNotFound`.
    pub async fn find_by_id(conn: &mut PgConnection, id: &str) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT id::text AS id, name, price FROM products WHERE id::text = $1
            "#,
        )
        .bind(id)
        .fetch_one(conn)
        .await
    }

    pub async fn insert(conn: &mut PgConnection, req: &ProductRequest) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO products (name, price) VALUES ($1, $2)
            "#,
        )
        .bind(&req.name)
        .bind(req.price)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Overwrites name and price. Returns the number of rows changed.
    pub async fn update(
        conn: &mut PgConnection,
        id: &str,
        req: &ProductRequest,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE products SET name = $1, price = $2 WHERE id::text = $3
            "#,
        )
        .bind(&req.name)
        .bind(req.price)
        .bind(id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }

    /// Returns the number of rows removed.
    pub async fn delete(conn: &mut PgConnection, id: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM products WHERE id::text = $1
            "#,
        )
        .bind(id)
        .execute(conn)
        .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_serializes_with_id() {
        let product = Product {
            id: "42".to_string(),
            name: "Widget".to_string(),
            price: 9.99,
        };
        let value = serde_json::to_value(&product).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "id": "42", "name": "Widget", "price": 9.99 })
        );
    }

    #[test]
    fn test_request_parsing() {
        let req: ProductRequest =
            serde_json::from_str(r#"{"name":"Widget","price":9.99}"#).unwrap();
        assert_eq!(req.name, "Widget");
        assert_eq!(req.price, 9.99);
    }

    #[test]
    fn test_request_accepts_unvalidated_values() {
        let req: ProductRequest = serde_json::from_str(r#"{"name":"","price":-1}"#).unwrap();
        assert!(req.name.is_empty());
        assert_eq!(req.price, -1.0);
    }

    #[test]
    fn test_request_missing_fields_default_to_zero() {
        let req: ProductRequest = serde_json::from_str(r#"{"name":"Widget"}"#).unwrap();
        assert_eq!(req.name, "Widget");
        assert_eq!(req.price, 0.0);

        let req: ProductRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req, ProductRequest::default());
    }

    #[test]
    fn test_request_rejects_wrong_types() {
        let result: Result<ProductRequest, _> =
            serde_json::from_str(r#"{"name":"Widget","price":"cheap"}"#);
        assert!(result.is_err());

        let result: Result<ProductRequest, _> = serde_json::from_str(r#""Widget""#);
        assert!(result.is_err());
    }
}
