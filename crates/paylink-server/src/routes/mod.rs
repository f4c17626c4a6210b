pub mod ens;
pub mod health;
pub mod links;
pub mod requests;
