pub mod event;
pub mod work_item;
