pub mod query;
pub mod session;
pub mod transaction;

pub use query::QueryService;
pub use session::{Connection, Session, SessionManager, SessionReader, Subscription};
pub use transaction::{CallSite, TransactionOrchestrator};
