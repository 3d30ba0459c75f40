//! Helpers shared by the public modules

pub(crate) mod network;
