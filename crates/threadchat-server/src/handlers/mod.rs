pub mod health;
pub mod history;
pub mod sessions;
pub mod stop;
pub mod threads;
pub mod turn;
pub mod ui;
