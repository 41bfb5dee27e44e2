use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle of a transaction. `pending` is the only non-terminal state.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum TransactionStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "failed")]
    Failed,
    #[sea_orm(string_value = "expired")]
    Expired,
}

impl TransactionStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }

    /// Whether an administrator may move a transaction from `self` to `next`.
    /// `paid` is only reachable through payment confirmation.
    pub fn admin_can_transition_to(self, next: TransactionStatus) -> bool {
        matches!(
            (self, next),
            (
                TransactionStatus::Pending,
                TransactionStatus::Failed | TransactionStatus::Expired
            )
        )
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "bank_transfer")]
    BankTransfer,
    #[sea_orm(string_value = "credit_card")]
    CreditCard,
    #[sea_orm(string_value = "e_wallet")]
    EWallet,
    #[sea_orm(string_value = "cod")]
    Cod,
}

/// Transaction header. Money columns are frozen at checkout.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: TransactionStatus,
    /// Merchandise subtotal plus shipping
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub total_amount: Decimal,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub shipping_cost: Decimal,
    #[sea_orm(column_type = "Text")]
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
    pub payment_url: Option<String>,
    pub payment_proof: Option<String>,
    #[sea_orm(column_type = "Text", nullable)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::auth::user::Entity",
        from = "Column::UserId",
        to = "crate::auth::user::Column::Id"
    )]
    User,
    #[sea_orm(has_many = "super::transaction_item::Entity")]
    Items,
}

impl Related<crate::auth::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::transaction_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn only_pending_to_failed_or_expired_is_allowed_for_admins() {
        use TransactionStatus::*;
        assert!(Pending.admin_can_transition_to(Failed));
        assert!(Pending.admin_can_transition_to(Expired));
        assert!(!Pending.admin_can_transition_to(Paid));
        assert!(!Pending.admin_can_transition_to(Pending));
        for terminal in [Paid, Failed, Expired] {
            assert!(terminal.is_terminal());
            assert!(!terminal.admin_can_transition_to(Failed));
            assert!(!terminal.admin_can_transition_to(Expired));
        }
    }

    #[test]
    fn status_and_method_use_snake_case_names() {
        assert_eq!(TransactionStatus::Pending.to_string(), "pending");
        assert_eq!(
            TransactionStatus::from_str("expired").unwrap(),
            TransactionStatus::Expired
        );
        assert_eq!(PaymentMethod::BankTransfer.to_string(), "bank_transfer");
        assert_eq!(PaymentMethod::EWallet.to_string(), "e_wallet");
        assert_eq!(
            serde_json::from_str::<PaymentMethod>("\"credit_card\"").unwrap(),
            PaymentMethod::CreditCard
        );
        assert!(serde_json::from_str::<PaymentMethod>("\"bitcoin\"").is_err());
    }
}
