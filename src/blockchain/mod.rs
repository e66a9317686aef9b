pub mod contract;
pub mod ethereum;
pub mod mock;
pub mod traits;

pub use ethereum::RpcWalletProvider;
pub use traits::{
    AccountSigner, LandRegistry, ProviderEvent, RemoteFailure, TransactionHandle, WalletControl,
    WalletProvider,
};
