pub mod category;
pub mod customer;
pub mod movement;
pub mod print_job;
pub mod product;
pub mod product_unit;
pub mod sales_order;
pub mod supplier;
