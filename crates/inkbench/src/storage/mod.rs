pub mod vault;

pub use vault::SampleVault;
