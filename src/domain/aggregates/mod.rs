//! Aggregates module
pub mod product;
pub mod user;
pub mod order;
pub mod cart;

pub use product::{categories, Product, ProductDraft, ProductError, ProductQuery, SortKey};
pub use user::{Address, AddressInput, AddressPatch, NewUser, Role, User, UserError, WishlistEntry, MAX_ADDRESSES};
pub use order::{
    items_total, Confirmation, CustomerInfo, CustomerRules, LineItem, NewOrder, Order, OrderError, OrderStatus, PaymentMethod,
    PaymentStatus,
};
pub use cart::{Cart, CartError, CartLine};
