mod auth;
mod balances;
mod helpers;
mod mocks;
mod orders;
mod withdrawals;
