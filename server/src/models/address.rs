// larder/server/src/models/address.rs

use larder::Address;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct AddressRow {
  pub id: Uuid,
  pub user_id: Uuid,
  pub address: String,
}

impl From<AddressRow> for Address {
  fn from(row: AddressRow) -> Self {
    Address {
      id: row.id,
      user_id: row.user_id,
      address: row.address,
    }
  }
}
