pub mod directory;
pub mod permissions;
pub mod provisioner;
pub mod relay;
pub mod space;
