pub mod cart;
pub mod order;
pub mod product;

pub use cart::{CartItem, CartState, SelectionLine};
pub use order::{Order, OrderItem, OrderStatus, PaymentMethod};
pub use product::Product;
