use crate::entities::product_entity as products;
use crate::error::{AppError, AppResult};
use crate::models::*;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, QueryOrder, Set};

#[derive(Clone)]
pub struct ProductService {
    pool: DatabaseConnection,
}

impl ProductService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    pub async fn list_products(&self) -> AppResult<Vec<ProductResponse>> {
        let items = products::Entity::find()
            .order_by_asc(products::Column::Name)
            .all(&self.pool)
            .await?
            .into_iter()
            .map(ProductResponse::from)
            .collect();
        Ok(items)
    }

    pub async fn create_product(&self, request: CreateProductRequest) -> AppResult<ProductResponse> {
        if request.name.trim().is_empty() {
            return Err(AppError::ValidationError("商品名称不能为空".to_string()));
        }
        if request.price < 0 || request.stock_quantity < 0 {
            return Err(AppError::ValidationError(
                "价格和库存不能为负数".to_string(),
            ));
        }

        let product = products::ActiveModel {
            name: Set(request.name.trim().to_string()),
            price: Set(request.price),
            stock_quantity: Set(request.stock_quantity),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        Ok(ProductResponse::from(product))
    }
}
