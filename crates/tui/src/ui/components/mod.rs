pub mod alert;
pub mod form;
pub mod hints;
pub mod money;
pub mod pager;
pub mod tabs;
pub mod toast;
