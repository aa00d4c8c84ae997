//! Domain models for crm-service.

mod customer;
mod price_history;
mod product;
mod quotation;
mod quotation_detail;
mod reminder;
mod stock_movement;

pub use customer::{CreateCustomer, Customer, UpdateCustomer};
pub use price_history::{PriceHistory, PriceUpdate};
pub use product::{
    CreateProduct, LowStockProduct, MinimumStockUpdate, Product, UpdateProduct,
};
pub use quotation::{
    CreateQuotation, Quotation, QuotationStatus, QuotationWithCustomer, UpdateQuotation,
};
pub use quotation_detail::{
    line_total, CreateQuotationDetail, QuotationDetail, QuotationDetailWithProduct,
    UpdateQuotationDetail,
};
pub use reminder::{
    CreateReminder, ListRemindersFilter, Reminder, ReminderPriority, ReminderStatus,
    UpdateReminder,
};
pub use stock_movement::{
    CreateStockMovement, MovementFilter, MovementType, StockMovement, StockMovementWithProduct,
    StockUpdate,
};
