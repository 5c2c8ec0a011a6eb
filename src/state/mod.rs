// Configuration state held by the wizard

mod store;

pub use store::ConfigurationStore;
