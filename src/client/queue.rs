use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::Quantity;

/// Cart change waiting to be replayed against the server
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CartAction{
    Add{
        product_id: Uuid,
        variant_id: Option<Uuid>,
        quantity: Quantity
    },
    Update{
        cart_item_id: Uuid,
        quantity: i32
    },
    Remove{
        cart_item_id: Uuid
    },
    Clear
}

/// Entry of the persisted sync queue. `op_id` identifies the entry so it can
/// be acknowledged on its own once the server accepts it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SyncOperation{
    pub op_id: Uuid,
    pub user_id: Uuid,
    #[serde(flatten)]
    pub action: CartAction,
    pub queued_at: DateTime<Utc>
}

impl SyncOperation {
    pub fn new(user_id: Uuid, action: CartAction) -> Self{
        SyncOperation{
            op_id: Uuid::new_v4(),
            user_id,
            action,
            queued_at: Utc::now()
        }
    }

    pub fn is_pending_add_for(&self, user_id: Uuid, product_id: Uuid, variant_id: Option<Uuid>) -> bool{
        self.user_id == user_id && matches!(
            self.action,
            CartAction::Add{ product_id: p, variant_id: v, .. } if p == product_id && v == variant_id
        )
    }
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;

    #[test]
    fn operations_serialize_with_an_action_tag(){
        let op = SyncOperation::new(Uuid::new_v4(), CartAction::Remove{ cart_item_id: Uuid::new_v4() });
        let json = serde_json::to_value(&op).unwrap();

        assert_eq!(json["action"], "remove");
        assert!(json.get("op_id").is_some());

        let clear: SyncOperation = serde_json::from_value(serde_json::json!({
            "op_id": Uuid::new_v4(),
            "user_id": Uuid::new_v4(),
            "action": "clear",
            "queued_at": "2025-01-15T10:00:00Z"
        }))
        .unwrap();
        assert_eq!(clear.action, CartAction::Clear);
    }

    #[test]
    fn pending_add_matches_on_owner_and_key(){
        let (user, product) = (Uuid::new_v4(), Uuid::new_v4());
        let op = SyncOperation::new(user, CartAction::Add{ product_id: product, variant_id: None, quantity: Quantity::ONE });

        assert!(op.is_pending_add_for(user, product, None));
        assert!(!op.is_pending_add_for(Uuid::new_v4(), product, None));
        assert!(!op.is_pending_add_for(user, product, Some(Uuid::new_v4())));
    }
}
