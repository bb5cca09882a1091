pub mod ehi;
pub mod gateway;
pub mod hashing;
pub mod intent;
pub mod jwt;
pub mod notifier;
pub mod provisioner;
pub mod rate_limit;
pub mod reconciler;
pub mod remote;
pub mod security;
pub mod sweeper;
pub mod trial;
