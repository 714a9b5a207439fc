pub mod category;
pub mod customer;
pub mod in_record;
pub mod out_record;
pub mod print_job;
pub mod product;
pub mod product_unit;
pub mod sales_order;
pub mod supplier;
