pub mod credit_transactions;
pub mod events;
pub mod memberships;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod ticket_types;
pub mod tickets;
pub mod users;
pub mod waitlist_entries;

pub use credit_transactions as credit_transaction_entity;
pub use events as event_entity;
pub use memberships as membership_entity;
pub use order_items as order_item_entity;
pub use orders as order_entity;
pub use products as product_entity;
pub use ticket_types as ticket_type_entity;
pub use tickets as ticket_entity;
pub use users as user_entity;
pub use waitlist_entries as waitlist_entry_entity;

pub use credit_transactions::CreditTransactionKind;
pub use memberships::{MembershipStatus, MembershipTier};
pub use order_items::OrderItemType;
pub use orders::{OrderStatus, PaymentMethod};
pub use tickets::TicketStatus;
pub use users::UserRole;
pub use waitlist_entries::WaitlistStatus;
