use crate::entities::ticket_entity;
use crate::error::AppResult;
use rand::Rng;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

const CODE_LEN: usize = 32;
const CODE_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// 生成随机核销码。码值与票的主键无关，不可枚举伪造。
pub fn generate_ticket_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_CHARS[rng.gen_range(0..CODE_CHARS.len())] as char)
        .collect()
}

/// 生成未被占用的核销码
pub async fn generate_unique_ticket_code<C: ConnectionTrait>(db: &C) -> AppResult<String> {
    loop {
        let code = generate_ticket_code();

        let exists = ticket_entity::Entity::find()
            .filter(ticket_entity::Column::Code.eq(code.clone()))
            .count(db)
            .await?;

        if exists == 0 {
            return Ok(code);
        }
    }
}

/// 生成对外订单号
pub fn generate_order_number() -> String {
    format!("SP-{}", Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ticket_code() {
        let code = generate_ticket_code();
        assert_eq!(code.len(), CODE_LEN);
        assert!(code.bytes().all(|b| CODE_CHARS.contains(&b)));
    }

    #[test]
    fn test_codes_are_not_repeating() {
        // 32 位字符集、32 长度，两次撞码说明生成器坏了
        let a = generate_ticket_code();
        let b = generate_ticket_code();
        assert_ne!(a, b);
    }

    #[test]
    fn test_generate_order_number() {
        let n = generate_order_number();
        assert!(n.starts_with("SP-"));
        assert_eq!(n.len(), 3 + 32);
    }
}
