mod cart;
mod catalog;
mod expense;
mod ledger;
mod money;
mod sale;

pub use cart::*;
pub use catalog::*;
pub use expense::*;
pub use ledger::*;
pub use money::*;
pub use sale::*;
