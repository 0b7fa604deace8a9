pub mod controller;
pub mod debounce;
pub mod filter;
pub mod paginate;
pub mod proximity;
pub mod retry;
