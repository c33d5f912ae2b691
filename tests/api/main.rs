mod helpers;
mod health_check;
mod authentication;
mod admin_access;
mod cart;
mod marketplace;
