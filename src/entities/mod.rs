pub mod cash_sale;
pub mod cash_sale_item;
pub mod category;
pub mod city;
pub mod group;
pub mod item;
pub mod purchase;
pub mod purchase_item;
pub mod teacher;
